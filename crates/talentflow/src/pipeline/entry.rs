//! Domain records for a candidate's path through a job pipeline.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::stage::Stage;
use crate::transition::{FieldBag, PlacementTerms};

/// A candidate's tracked position against one job requisition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineEntry {
    pub id: String,
    pub job_id: String,
    pub candidate_id: String,
    pub stage: Stage,
    /// Set while the entry is `on_hold`: the stage to resume to.
    pub held_from: Option<Stage>,
    pub priority: i32,
    pub assigned_to: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PipelineEntry {
    /// Creates a new entry at the start of the pipeline.
    pub fn new(job_id: &str, candidate_id: &str) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            job_id: job_id.to_string(),
            candidate_id: candidate_id.to_string(),
            stage: Stage::Sourced,
            held_from: None,
            priority: 0,
            assigned_to: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Append-only audit record of one accepted stage change.
///
/// Written atomically with the entry mutation it describes; never
/// updated or deleted afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageTransitionRecord {
    pub id: String,
    pub entry_id: String,
    pub from_stage: Stage,
    pub to_stage: Stage,
    pub actor_id: String,
    pub recorded_at: DateTime<Utc>,
    /// The field bag captured at transition time.
    pub supplied_fields: FieldBag,
}

impl StageTransitionRecord {
    pub fn new(
        entry_id: &str,
        from_stage: Stage,
        to_stage: Stage,
        actor_id: &str,
        recorded_at: DateTime<Utc>,
        supplied_fields: FieldBag,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            entry_id: entry_id.to_string(),
            from_stage,
            to_stage,
            actor_id: actor_id.to_string(),
            recorded_at,
            supplied_fields,
        }
    }
}

/// The commercial record created when an entry reaches `placed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Placement {
    pub id: String,
    pub entry_id: String,
    pub start_date: NaiveDate,
    pub salary: f64,
    pub fee_percentage: f64,
    /// Always `round(salary × fee_percentage / 100)`, never entered directly.
    pub fee_value: i64,
    pub guarantee_period_days: i64,
    /// Always `start_date + guarantee_period_days`.
    pub guarantee_expiry: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl Placement {
    pub fn from_terms(entry_id: &str, terms: &PlacementTerms, created_at: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            entry_id: entry_id.to_string(),
            start_date: terms.start_date,
            salary: terms.salary,
            fee_percentage: terms.fee_percentage,
            fee_value: terms.fee_value,
            guarantee_period_days: terms.guarantee_period_days,
            guarantee_expiry: terms.guarantee_expiry,
            created_at,
        }
    }
}
