//! Durable activity log — append and query.

use rusqlite::{params, Row};

use crate::activity::{ActivityAction, ActivityRecord};

use super::{decode_err, format_timestamp, parse_timestamp, Database, DatabaseError};

fn from_row(row: &Row<'_>) -> Result<ActivityRecord, rusqlite::Error> {
    let action: String = row.get("action")?;
    let details: String = row.get("details")?;
    let recorded_at: String = row.get("recorded_at")?;

    Ok(ActivityRecord {
        id: row.get("id")?,
        action: action.parse::<ActivityAction>().map_err(decode_err)?,
        resource_type: row.get("resource_type")?,
        resource_id: row.get("resource_id")?,
        actor_id: row.get("actor_id")?,
        details: serde_json::from_str(&details).map_err(decode_err)?,
        recorded_at: parse_timestamp(&recorded_at).map_err(decode_err)?,
    })
}

/// Query filter parameters for the activity feed.
#[derive(Debug, Default, Clone)]
pub struct ActivityFilter {
    pub resource_type: Option<String>,
    pub resource_id: Option<String>,
    pub actor_id: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// Appends an activity record.
pub fn append(db: &Database, record: &ActivityRecord) -> Result<(), DatabaseError> {
    let details = serde_json::to_string(&record.details)
        .map_err(|e| DatabaseError::Sqlite(rusqlite::Error::ToSqlConversionFailure(Box::new(e))))?;
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO activity_log (id, action, resource_type, resource_id, actor_id,
             details, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                record.id,
                record.action.as_str(),
                record.resource_type,
                record.resource_id,
                record.actor_id,
                details,
                format_timestamp(record.recorded_at),
            ],
        )?;
        Ok(())
    })
}

/// Queries the feed with filters, newest first, returning (rows, total).
pub fn query(
    db: &Database,
    filter: &ActivityFilter,
) -> Result<(Vec<ActivityRecord>, u64), DatabaseError> {
    db.with_conn(|conn| {
        let mut conditions = Vec::new();
        let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        if let Some(ref resource_type) = filter.resource_type {
            conditions.push(format!("resource_type = ?{}", param_values.len() + 1));
            param_values.push(Box::new(resource_type.clone()));
        }
        if let Some(ref resource_id) = filter.resource_id {
            conditions.push(format!("resource_id = ?{}", param_values.len() + 1));
            param_values.push(Box::new(resource_id.clone()));
        }
        if let Some(ref actor_id) = filter.actor_id {
            conditions.push(format!("actor_id = ?{}", param_values.len() + 1));
            param_values.push(Box::new(actor_id.clone()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let count_sql = format!("SELECT COUNT(*) FROM activity_log {}", where_clause);
        let params_ref: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(|p| p.as_ref()).collect();
        let total: u64 = conn.query_row(&count_sql, params_ref.as_slice(), |r| r.get(0))?;

        let limit = filter.limit.unwrap_or(100) as i64;
        let offset = filter.offset.unwrap_or(0) as i64;
        param_values.push(Box::new(limit));
        param_values.push(Box::new(offset));
        let query_sql = format!(
            "SELECT * FROM activity_log {} ORDER BY recorded_at DESC LIMIT ?{} OFFSET ?{}",
            where_clause,
            param_values.len() - 1,
            param_values.len()
        );

        let params_ref: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(|p| p.as_ref()).collect();
        let mut stmt = conn.prepare(&query_sql)?;
        let rows: Vec<ActivityRecord> = stmt
            .query_map(params_ref.as_slice(), from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok((rows, total))
    })
}
