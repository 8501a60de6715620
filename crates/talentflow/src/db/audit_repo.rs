//! Stage transition audit trail — append-only.
//!
//! There are deliberately no update or delete functions here.

use rusqlite::{params, Connection, Row};

use crate::pipeline::StageTransitionRecord;
use crate::stage::Stage;
use crate::transition::FieldBag;

use super::{decode_err, format_timestamp, parse_timestamp, Database, DatabaseError};

fn from_row(row: &Row<'_>) -> Result<StageTransitionRecord, rusqlite::Error> {
    let from_stage: String = row.get("from_stage")?;
    let to_stage: String = row.get("to_stage")?;
    let recorded_at: String = row.get("recorded_at")?;
    let supplied_fields: String = row.get("supplied_fields")?;

    Ok(StageTransitionRecord {
        id: row.get("id")?,
        entry_id: row.get("entry_id")?,
        from_stage: from_stage.parse::<Stage>().map_err(decode_err)?,
        to_stage: to_stage.parse::<Stage>().map_err(decode_err)?,
        actor_id: row.get("actor_id")?,
        recorded_at: parse_timestamp(&recorded_at).map_err(decode_err)?,
        supplied_fields: serde_json::from_str::<FieldBag>(&supplied_fields).map_err(decode_err)?,
    })
}

/// Inserts a record on an existing connection — used inside the
/// transition transaction so the audit row commits with the entry update.
pub(crate) fn insert_with(
    conn: &Connection,
    record: &StageTransitionRecord,
) -> Result<(), rusqlite::Error> {
    let supplied = serde_json::to_string(&record.supplied_fields)
        .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
    conn.execute(
        "INSERT INTO stage_transitions (id, entry_id, from_stage, to_stage, actor_id,
         recorded_at, supplied_fields)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            record.id,
            record.entry_id,
            record.from_stage.as_str(),
            record.to_stage.as_str(),
            record.actor_id,
            format_timestamp(record.recorded_at),
            supplied,
        ],
    )?;
    Ok(())
}

/// Appends a transition record outside any larger transaction.
pub fn append(db: &Database, record: &StageTransitionRecord) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        insert_with(conn, record)?;
        Ok(())
    })
}

/// Returns an entry's transition history, oldest first.
pub fn list_for_entry(
    db: &Database,
    entry_id: &str,
) -> Result<Vec<StageTransitionRecord>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT * FROM stage_transitions WHERE entry_id = ?1 ORDER BY recorded_at ASC",
        )?;
        let rows: Vec<StageTransitionRecord> = stmt
            .query_map(params![entry_id], from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}
