//! Candidate repository — identity, contact freshness and GDPR writes.

use chrono::{DateTime, Utc};
use rusqlite::{params, Row};

use crate::candidate::Candidate;

use super::{decode_err, format_timestamp, parse_timestamp, Database, DatabaseError};

/// Placeholder written over identity fields on anonymisation.
pub const ANONYMISED_NAME: &str = "Anonymised";

fn from_row(row: &Row<'_>) -> Result<Candidate, rusqlite::Error> {
    Ok(Candidate {
        id: row.get("id")?,
        full_name: row.get("full_name")?,
        email: row.get("email")?,
        phone: row.get("phone")?,
        last_contact_at: optional_timestamp(row, "last_contact_at")?,
        consent_given_at: optional_timestamp(row, "consent_given_at")?,
        consent_expires_at: optional_timestamp(row, "consent_expires_at")?,
        anonymised_at: optional_timestamp(row, "anonymised_at")?,
        confidence_score: row.get("confidence_score")?,
        suggested_status: row.get("suggested_status")?,
        ai_reasoning: row.get("ai_reasoning")?,
        created_at: required_timestamp(row, "created_at")?,
        updated_at: required_timestamp(row, "updated_at")?,
    })
}

fn optional_timestamp(row: &Row<'_>, col: &str) -> Result<Option<DateTime<Utc>>, rusqlite::Error> {
    let raw: Option<String> = row.get(col)?;
    raw.map(|s| parse_timestamp(&s)).transpose().map_err(decode_err)
}

fn required_timestamp(row: &Row<'_>, col: &str) -> Result<DateTime<Utc>, rusqlite::Error> {
    let raw: String = row.get(col)?;
    parse_timestamp(&raw).map_err(decode_err)
}

/// Inserts a new candidate row.
pub fn insert(db: &Database, candidate: &Candidate) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO candidates (id, full_name, email, phone, last_contact_at,
             consent_given_at, consent_expires_at, anonymised_at, confidence_score,
             suggested_status, ai_reasoning, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                candidate.id,
                candidate.full_name,
                candidate.email,
                candidate.phone,
                candidate.last_contact_at.map(format_timestamp),
                candidate.consent_given_at.map(format_timestamp),
                candidate.consent_expires_at.map(format_timestamp),
                candidate.anonymised_at.map(format_timestamp),
                candidate.confidence_score,
                candidate.suggested_status,
                candidate.ai_reasoning,
                format_timestamp(candidate.created_at),
                format_timestamp(candidate.updated_at),
            ],
        )?;
        Ok(())
    })
}

/// Finds a candidate by ID.
pub fn find_by_id(db: &Database, id: &str) -> Result<Option<Candidate>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM candidates WHERE id = ?1")?;
        let mut rows = stmt.query_map(params![id], from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

/// Lists all candidates, newest first.
pub fn list(db: &Database) -> Result<Vec<Candidate>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM candidates ORDER BY created_at DESC")?;
        let rows: Vec<Candidate> = stmt
            .query_map([], from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Records a contact touch — the only candidate mutation pipeline flows make.
pub fn touch_contact(
    db: &Database,
    id: &str,
    at: DateTime<Utc>,
) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute(
            "UPDATE candidates SET last_contact_at = ?2, updated_at = ?2 WHERE id = ?1",
            params![id, format_timestamp(at)],
        )?;
        Ok(changed > 0)
    })
}

/// Rewrites the identity fields of a live (non-anonymised) candidate.
///
/// The `anonymised_at IS NULL` guard makes anonymisation one-way: once
/// set, no call through this repository can restore identity data.
pub fn update_identity(
    db: &Database,
    id: &str,
    full_name: &str,
    email: Option<&str>,
    phone: Option<&str>,
    at: DateTime<Utc>,
) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute(
            "UPDATE candidates SET full_name = ?2, email = ?3, phone = ?4, updated_at = ?5
             WHERE id = ?1 AND anonymised_at IS NULL",
            params![id, full_name, email, phone, format_timestamp(at)],
        )?;
        Ok(changed > 0)
    })
}

/// Overwrites identity fields with placeholders and stamps `anonymised_at`.
///
/// Conditional on the row not being anonymised already, so a repeat call
/// changes nothing and reports `false`.
pub fn anonymise(db: &Database, id: &str, at: DateTime<Utc>) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute(
            "UPDATE candidates SET full_name = ?2, email = NULL, phone = NULL,
             ai_reasoning = NULL, anonymised_at = ?3, updated_at = ?3
             WHERE id = ?1 AND anonymised_at IS NULL",
            params![id, ANONYMISED_NAME, format_timestamp(at)],
        )?;
        Ok(changed > 0)
    })
}

/// Hard-deletes a candidate. Returns whether a row was removed.
pub fn delete(db: &Database, id: &str) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute("DELETE FROM candidates WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    })
}
