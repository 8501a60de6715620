//! GDPR retention: contact-freshness classification and compliance actions.

pub mod actions;

pub use actions::{
    anonymise, bulk_anonymise, bulk_delete, delete, expiring_candidates, touch_contact,
    BulkOutcome, CancelFlag, GdprError,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Day thresholds that drive retention classification.
///
/// `stale_from_days` and `at_risk_from_days` are the first day of their
/// band; `horizon_days` is the last day before the record counts as
/// expired. Classification itself stays a pure function of its inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionPolicy {
    pub stale_from_days: i64,
    pub at_risk_from_days: i64,
    pub horizon_days: i64,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            stale_from_days: 183,
            at_risk_from_days: 366,
            horizon_days: 730,
        }
    }
}

/// Retention classification of a candidate's last contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetentionState {
    Active,
    Stale,
    AtRisk,
    Expired,
}

impl std::fmt::Display for RetentionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RetentionState::Active => write!(f, "active"),
            RetentionState::Stale => write!(f, "stale"),
            RetentionState::AtRisk => write!(f, "at_risk"),
            RetentionState::Expired => write!(f, "expired"),
        }
    }
}

/// Derived freshness status. Recomputed on every read, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GdprStatus {
    pub status: RetentionState,
    pub days_since_contact: Option<i64>,
    pub days_until_expiry: Option<i64>,
}

/// Classifies a last-contact timestamp against the retention policy.
///
/// A candidate who was never contacted has no retention basis at all and
/// is treated as expired with both counters unknown.
pub fn classify(
    last_contact: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    policy: &RetentionPolicy,
) -> GdprStatus {
    let Some(last) = last_contact else {
        return GdprStatus {
            status: RetentionState::Expired,
            days_since_contact: None,
            days_until_expiry: None,
        };
    };

    let days = (now - last).num_days();
    let status = if days < policy.stale_from_days {
        RetentionState::Active
    } else if days < policy.at_risk_from_days {
        RetentionState::Stale
    } else if days <= policy.horizon_days {
        RetentionState::AtRisk
    } else {
        RetentionState::Expired
    };

    GdprStatus {
        status,
        days_since_contact: Some(days),
        days_until_expiry: Some((policy.horizon_days - days).max(0)),
    }
}
