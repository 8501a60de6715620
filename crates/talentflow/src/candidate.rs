//! The candidate record tracked across jobs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A person in the talent pool, independent of any single job.
///
/// The AI fields (`confidence_score`, `suggested_status`, `ai_reasoning`)
/// are written by the external CV-scoring function and are read-only here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub last_contact_at: Option<DateTime<Utc>>,
    pub consent_given_at: Option<DateTime<Utc>>,
    pub consent_expires_at: Option<DateTime<Utc>>,
    pub anonymised_at: Option<DateTime<Utc>>,
    pub confidence_score: Option<f64>,
    pub suggested_status: Option<String>,
    pub ai_reasoning: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Candidate {
    /// Creates a fresh candidate, as on CV submission.
    pub fn new(full_name: &str, email: Option<&str>, phone: Option<&str>) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            full_name: full_name.to_string(),
            email: email.map(str::to_string),
            phone: phone.map(str::to_string),
            last_contact_at: None,
            consent_given_at: None,
            consent_expires_at: None,
            anonymised_at: None,
            confidence_score: None,
            suggested_status: None,
            ai_reasoning: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// True once the record has been irreversibly anonymised.
    pub fn is_anonymised(&self) -> bool {
        self.anonymised_at.is_some()
    }
}
