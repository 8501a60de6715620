//! Reporting queries — pipeline breakdown, retention summary, revenue.

use chrono::{DateTime, Utc};
use rusqlite::params;
use serde::Serialize;

use crate::gdpr::{classify, RetentionPolicy, RetentionState};
use crate::stage::{Stage, ALL_STAGES};

use super::{candidate_repo, parse_timestamp, Database, DatabaseError};

/// Entry count for one stage.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageCount {
    pub stage: Stage,
    pub total: i64,
}

/// Counts pipeline entries per stage, in canonical stage order.
/// Stages with no entries are included with a zero count.
pub fn pipeline_breakdown(db: &Database) -> Result<Vec<StageCount>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt =
            conn.prepare("SELECT stage, COUNT(*) FROM pipeline_entries GROUP BY stage")?;
        let counted: Vec<(String, i64)> = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        let breakdown = ALL_STAGES
            .iter()
            .map(|stage| StageCount {
                stage: *stage,
                total: counted
                    .iter()
                    .find(|(name, _)| name == stage.as_str())
                    .map(|(_, n)| *n)
                    .unwrap_or(0),
            })
            .collect();
        Ok(breakdown)
    })
}

/// Candidate counts per retention state.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetentionSummary {
    pub active: i64,
    pub stale: i64,
    pub at_risk: i64,
    pub expired: i64,
}

/// Classifies every candidate's contact freshness and tallies the bands.
///
/// Classification happens here in Rust, not in SQL — the thresholds
/// belong to the retention policy, not the schema.
pub fn retention_summary(
    db: &Database,
    policy: &RetentionPolicy,
    now: DateTime<Utc>,
) -> Result<RetentionSummary, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT last_contact_at FROM candidates")?;
        let contacts: Vec<Option<String>> = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut summary = RetentionSummary::default();
        for raw in contacts {
            let last_contact = raw
                .map(|s| parse_timestamp(&s))
                .transpose()
                .map_err(super::decode_err)?;
            match classify(last_contact, now, policy).status {
                RetentionState::Active => summary.active += 1,
                RetentionState::Stale => summary.stale += 1,
                RetentionState::AtRisk => summary.at_risk += 1,
                RetentionState::Expired => summary.expired += 1,
            }
        }
        Ok(summary)
    })
}

/// Placement revenue for one calendar month.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueMonth {
    /// `YYYY-MM` of the placement start date.
    pub month: String,
    pub placements: i64,
    pub fee_total: i64,
}

/// Sums placement fees by start month, oldest first.
pub fn revenue_by_month(db: &Database) -> Result<Vec<RevenueMonth>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT substr(start_date, 1, 7) AS month, COUNT(*), SUM(fee_value)
             FROM placements GROUP BY month ORDER BY month ASC",
        )?;
        let rows: Vec<RevenueMonth> = stmt
            .query_map([], |row| {
                Ok(RevenueMonth {
                    month: row.get(0)?,
                    placements: row.get(1)?,
                    fee_total: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Candidates whose retention status needs review: already at risk or
/// expired, or expiring within `within_days`.
pub fn retention_review_queue(
    db: &Database,
    policy: &RetentionPolicy,
    now: DateTime<Utc>,
    within_days: i64,
) -> Result<Vec<(crate::candidate::Candidate, crate::gdpr::GdprStatus)>, DatabaseError> {
    let candidates = candidate_repo::list(db)?;
    let mut queue: Vec<_> = candidates
        .into_iter()
        .map(|c| {
            let status = classify(c.last_contact_at, now, policy);
            (c, status)
        })
        .filter(|(_, status)| match status.status {
            RetentionState::AtRisk | RetentionState::Expired => true,
            _ => status
                .days_until_expiry
                .is_some_and(|days| days <= within_days),
        })
        .collect();
    // Most urgent first; never-contacted records sort ahead of everything.
    queue.sort_by_key(|(_, status)| status.days_until_expiry.unwrap_or(-1));
    Ok(queue)
}
