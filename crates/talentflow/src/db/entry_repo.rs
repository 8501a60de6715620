//! Pipeline entry repository — CRUD plus the transactional stage commit.

use rusqlite::{params, Row};

use crate::pipeline::{Placement, PipelineEntry, StageTransitionRecord};
use crate::stage::Stage;

use super::{audit_repo, decode_err, format_timestamp, parse_timestamp, placement_repo};
use super::{Database, DatabaseError};

fn from_row(row: &Row<'_>) -> Result<PipelineEntry, rusqlite::Error> {
    let stage: String = row.get("stage")?;
    let held_from: Option<String> = row.get("held_from")?;
    let created_at: String = row.get("created_at")?;
    let updated_at: String = row.get("updated_at")?;

    Ok(PipelineEntry {
        id: row.get("id")?,
        job_id: row.get("job_id")?,
        candidate_id: row.get("candidate_id")?,
        stage: stage.parse::<Stage>().map_err(decode_err)?,
        held_from: held_from
            .map(|s| s.parse::<Stage>())
            .transpose()
            .map_err(decode_err)?,
        priority: row.get("priority")?,
        assigned_to: row.get("assigned_to")?,
        notes: row.get("notes")?,
        created_at: parse_timestamp(&created_at).map_err(decode_err)?,
        updated_at: parse_timestamp(&updated_at).map_err(decode_err)?,
    })
}

/// Query filter parameters for entry listing.
#[derive(Debug, Default, Clone)]
pub struct EntryFilter {
    pub job_id: Option<String>,
    pub candidate_id: Option<String>,
    pub stage: Option<Stage>,
    pub assigned_to: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// Inserts a new pipeline entry.
pub fn insert(db: &Database, entry: &PipelineEntry) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO pipeline_entries (id, job_id, candidate_id, stage, held_from,
             priority, assigned_to, notes, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                entry.id,
                entry.job_id,
                entry.candidate_id,
                entry.stage.as_str(),
                entry.held_from.map(|s| s.as_str()),
                entry.priority,
                entry.assigned_to,
                entry.notes,
                format_timestamp(entry.created_at),
                format_timestamp(entry.updated_at),
            ],
        )?;
        Ok(())
    })
}

/// Finds an entry by its ID.
pub fn find_by_id(db: &Database, id: &str) -> Result<Option<PipelineEntry>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM pipeline_entries WHERE id = ?1")?;
        let mut rows = stmt.query_map(params![id], from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

/// Queries entries with filters, returning (rows, total_count).
pub fn query(
    db: &Database,
    filter: &EntryFilter,
) -> Result<(Vec<PipelineEntry>, u64), DatabaseError> {
    db.with_conn(|conn| {
        let mut conditions = Vec::new();
        let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        if let Some(ref job_id) = filter.job_id {
            conditions.push(format!("job_id = ?{}", param_values.len() + 1));
            param_values.push(Box::new(job_id.clone()));
        }
        if let Some(ref candidate_id) = filter.candidate_id {
            conditions.push(format!("candidate_id = ?{}", param_values.len() + 1));
            param_values.push(Box::new(candidate_id.clone()));
        }
        if let Some(stage) = filter.stage {
            conditions.push(format!("stage = ?{}", param_values.len() + 1));
            param_values.push(Box::new(stage.as_str().to_string()));
        }
        if let Some(ref assigned_to) = filter.assigned_to {
            conditions.push(format!("assigned_to = ?{}", param_values.len() + 1));
            param_values.push(Box::new(assigned_to.clone()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        // Count total matching rows.
        let count_sql = format!("SELECT COUNT(*) FROM pipeline_entries {}", where_clause);
        let params_ref: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(|p| p.as_ref()).collect();
        let total: u64 = conn.query_row(&count_sql, params_ref.as_slice(), |r| r.get(0))?;

        // Fetch paginated results.
        let limit = filter.limit.unwrap_or(100) as i64;
        let offset = filter.offset.unwrap_or(0) as i64;
        param_values.push(Box::new(limit));
        param_values.push(Box::new(offset));
        let query_sql = format!(
            "SELECT * FROM pipeline_entries {} ORDER BY priority DESC, created_at DESC LIMIT ?{} OFFSET ?{}",
            where_clause,
            param_values.len() - 1,
            param_values.len()
        );

        let params_ref: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(|p| p.as_ref()).collect();
        let mut stmt = conn.prepare(&query_sql)?;
        let rows: Vec<PipelineEntry> = stmt
            .query_map(params_ref.as_slice(), from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok((rows, total))
    })
}

/// Counts entries currently in the given stage.
pub fn count_by_stage(db: &Database, stage: Stage) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let count: u64 = conn.query_row(
            "SELECT COUNT(*) FROM pipeline_entries WHERE stage = ?1",
            params![stage.as_str()],
            |r| r.get(0),
        )?;
        Ok(count)
    })
}

/// Atomically applies an accepted stage transition.
///
/// The entry update is conditional on `expected_updated_at` still being
/// the stored token; the audit record and optional placement are written
/// in the same transaction. Returns `false` (with nothing written) when
/// the token is stale — a concurrent writer got there first.
pub fn commit_transition(
    db: &Database,
    entry: &PipelineEntry,
    expected_updated_at: chrono::DateTime<chrono::Utc>,
    record: &StageTransitionRecord,
    placement: Option<&Placement>,
) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let tx = conn.unchecked_transaction()?;

        let changed = tx.execute(
            "UPDATE pipeline_entries SET stage = ?2, held_from = ?3, updated_at = ?4
             WHERE id = ?1 AND updated_at = ?5",
            params![
                entry.id,
                entry.stage.as_str(),
                entry.held_from.map(|s| s.as_str()),
                format_timestamp(entry.updated_at),
                format_timestamp(expected_updated_at),
            ],
        )?;
        if changed == 0 {
            // Dropping the transaction rolls it back.
            return Ok(false);
        }

        audit_repo::insert_with(&tx, record)?;
        if let Some(placement) = placement {
            placement_repo::insert_with(&tx, placement)?;
        }

        tx.commit()?;
        Ok(true)
    })
}

/// Conditionally updates priority, assignee and notes.
///
/// Same stale-token contract as [`commit_transition`].
pub fn update_details_checked(
    db: &Database,
    entry: &PipelineEntry,
    expected_updated_at: chrono::DateTime<chrono::Utc>,
) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute(
            "UPDATE pipeline_entries SET priority = ?2, assigned_to = ?3, notes = ?4,
             updated_at = ?5
             WHERE id = ?1 AND updated_at = ?6",
            params![
                entry.id,
                entry.priority,
                entry.assigned_to,
                entry.notes,
                format_timestamp(entry.updated_at),
                format_timestamp(expected_updated_at),
            ],
        )?;
        Ok(changed > 0)
    })
}

/// Hard-deletes an entry. Returns whether a row was removed.
pub fn delete(db: &Database, id: &str) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute("DELETE FROM pipeline_entries WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    })
}
