//! Placement repository — the commercial record behind a completed hire.

use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};

use crate::pipeline::Placement;

use super::{decode_err, format_timestamp, parse_timestamp, Database, DatabaseError};

fn from_row(row: &Row<'_>) -> Result<Placement, rusqlite::Error> {
    let start_date: String = row.get("start_date")?;
    let guarantee_expiry: String = row.get("guarantee_expiry")?;
    let created_at: String = row.get("created_at")?;

    Ok(Placement {
        id: row.get("id")?,
        entry_id: row.get("entry_id")?,
        start_date: parse_date(&start_date)?,
        salary: row.get("salary")?,
        fee_percentage: row.get("fee_percentage")?,
        fee_value: row.get("fee_value")?,
        guarantee_period_days: row.get("guarantee_period_days")?,
        guarantee_expiry: parse_date(&guarantee_expiry)?,
        created_at: parse_timestamp(&created_at).map_err(decode_err)?,
    })
}

fn parse_date(raw: &str) -> Result<NaiveDate, rusqlite::Error> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(decode_err)
}

/// Inserts a placement on an existing connection — used inside the
/// transition transaction.
pub(crate) fn insert_with(conn: &Connection, placement: &Placement) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO placements (id, entry_id, start_date, salary, fee_percentage,
         fee_value, guarantee_period_days, guarantee_expiry, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            placement.id,
            placement.entry_id,
            placement.start_date.to_string(),
            placement.salary,
            placement.fee_percentage,
            placement.fee_value,
            placement.guarantee_period_days,
            placement.guarantee_expiry.to_string(),
            format_timestamp(placement.created_at),
        ],
    )?;
    Ok(())
}

/// Inserts a placement outside any larger transaction.
pub fn insert(db: &Database, placement: &Placement) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        insert_with(conn, placement)?;
        Ok(())
    })
}

/// Finds the placement created for a pipeline entry, if any.
pub fn find_by_entry(db: &Database, entry_id: &str) -> Result<Option<Placement>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM placements WHERE entry_id = ?1")?;
        let mut rows = stmt.query_map(params![entry_id], from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

/// Lists placements whose start date falls in `[from, to]`, oldest first.
pub fn list_starting_between(
    db: &Database,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<Placement>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT * FROM placements WHERE start_date >= ?1 AND start_date <= ?2
             ORDER BY start_date ASC",
        )?;
        let rows: Vec<Placement> = stmt
            .query_map(params![from.to_string(), to.to_string()], from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}
