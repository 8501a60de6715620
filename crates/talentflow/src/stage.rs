//! Pipeline stages and the transition graph between them.
//!
//! The active path runs `sourced → … → placed`. The two side stages
//! `rejected` and `on_hold` are reachable from any non-terminal stage;
//! `on_hold` resumes only to the stage the entry was paused from.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A pipeline entry's lifecycle stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Sourced,
    Contacted,
    Qualified,
    Submitted,
    #[serde(rename = "interview_1")]
    Interview1,
    #[serde(rename = "interview_2")]
    Interview2,
    /// `final` on the wire; the identifier is reserved in Rust.
    #[serde(rename = "final")]
    FinalInterview,
    Offer,
    Accepted,
    Placed,
    Rejected,
    OnHold,
}

/// The forward path from first contact to a completed placement.
pub const ACTIVE_PATH: [Stage; 10] = [
    Stage::Sourced,
    Stage::Contacted,
    Stage::Qualified,
    Stage::Submitted,
    Stage::Interview1,
    Stage::Interview2,
    Stage::FinalInterview,
    Stage::Offer,
    Stage::Accepted,
    Stage::Placed,
];

/// Every stage, active path first, side stages last.
pub const ALL_STAGES: [Stage; 12] = [
    Stage::Sourced,
    Stage::Contacted,
    Stage::Qualified,
    Stage::Submitted,
    Stage::Interview1,
    Stage::Interview2,
    Stage::FinalInterview,
    Stage::Offer,
    Stage::Accepted,
    Stage::Placed,
    Stage::Rejected,
    Stage::OnHold,
];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown stage '{0}'")]
pub struct ParseStageError(pub String);

impl Stage {
    /// Canonical wire/storage name of the stage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Sourced => "sourced",
            Stage::Contacted => "contacted",
            Stage::Qualified => "qualified",
            Stage::Submitted => "submitted",
            Stage::Interview1 => "interview_1",
            Stage::Interview2 => "interview_2",
            Stage::FinalInterview => "final",
            Stage::Offer => "offer",
            Stage::Accepted => "accepted",
            Stage::Placed => "placed",
            Stage::Rejected => "rejected",
            Stage::OnHold => "on_hold",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Stage {
    type Err = ParseStageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_STAGES
            .iter()
            .find(|stage| stage.as_str() == s)
            .copied()
            .ok_or_else(|| ParseStageError(s.to_string()))
    }
}

/// True for stages no transition ever leaves.
pub fn is_terminal(stage: Stage) -> bool {
    matches!(stage, Stage::Placed | Stage::Rejected)
}

/// The next stage on the active path, if there is one.
pub fn next_on_path(stage: Stage) -> Option<Stage> {
    let pos = ACTIVE_PATH.iter().position(|s| *s == stage)?;
    ACTIVE_PATH.get(pos + 1).copied()
}

/// Stages reachable in a single legal transition.
///
/// `held_from` is the stage an `on_hold` entry was paused from; it is
/// ignored for every other current stage. An `on_hold` entry whose
/// origin is unknown can only be rejected.
pub fn allowed_next(stage: Stage, held_from: Option<Stage>) -> Vec<Stage> {
    if is_terminal(stage) {
        return Vec::new();
    }

    if stage == Stage::OnHold {
        let mut out = Vec::new();
        if let Some(resume) = held_from {
            out.push(resume);
        }
        out.push(Stage::Rejected);
        return out;
    }

    let mut out = Vec::new();
    if let Some(next) = next_on_path(stage) {
        out.push(next);
    }
    out.push(Stage::Rejected);
    out.push(Stage::OnHold);
    out
}

/// Mandatory field keys for a transition, beyond the default notes.
///
/// Gates apply when a stage is first entered; resuming from `on_hold`
/// re-enters a stage whose gate was already passed, so only rejection
/// keeps its field requirement there.
pub fn required_fields(from: Stage, to: Stage) -> &'static [&'static str] {
    if from == Stage::OnHold && to != Stage::Rejected {
        return &[];
    }

    match to {
        Stage::Submitted => &["submission_notes", "client_contact_confirmed"],
        Stage::Interview1 => &["interview_date_time", "interview_type", "location_or_link"],
        Stage::Interview2 => &["previous_scorecard", "interview_date_time"],
        Stage::Offer => &["offer_salary", "start_date", "benefits"],
        Stage::Placed => &["start_date", "salary", "fee_percentage", "guarantee_period_days"],
        Stage::Rejected => &["rejection_reason", "rejection_category"],
        _ => &[],
    }
}
