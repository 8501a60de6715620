//! Builder patterns for creating test data programmatically.

#![allow(dead_code)]

use chrono::{Duration, Utc};
use serde_json::{json, Value};
use talentflow::candidate::Candidate;
use talentflow::transition::FieldBag;

/// Builder for creating `Candidate` instances.
pub struct CandidateBuilder {
    full_name: String,
    email: Option<String>,
    phone: Option<String>,
    last_contact_days_ago: Option<i64>,
    anonymised: bool,
}

impl CandidateBuilder {
    pub fn new(full_name: &str) -> Self {
        Self {
            full_name: full_name.to_string(),
            email: None,
            phone: None,
            last_contact_days_ago: None,
            anonymised: false,
        }
    }

    pub fn email(mut self, email: &str) -> Self {
        self.email = Some(email.to_string());
        self
    }

    pub fn phone(mut self, phone: &str) -> Self {
        self.phone = Some(phone.to_string());
        self
    }

    pub fn contacted_days_ago(mut self, days: i64) -> Self {
        self.last_contact_days_ago = Some(days);
        self
    }

    pub fn anonymised(mut self) -> Self {
        self.anonymised = true;
        self
    }

    pub fn build(self) -> Candidate {
        let mut candidate =
            Candidate::new(&self.full_name, self.email.as_deref(), self.phone.as_deref());
        if let Some(days) = self.last_contact_days_ago {
            candidate.last_contact_at = Some(Utc::now() - Duration::days(days));
        }
        if self.anonymised {
            candidate.anonymised_at = Some(Utc::now());
        }
        candidate
    }
}

/// Builds a field bag from key/value pairs.
pub fn field_bag(pairs: &[(&str, Value)]) -> FieldBag {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

/// The complete gate for moving into `submitted`.
pub fn submission_fields() -> FieldBag {
    field_bag(&[
        ("submission_notes", json!("Strong profile, client expects CV today")),
        ("client_contact_confirmed", json!(true)),
    ])
}

/// The complete gate for moving into `interview_1`.
pub fn first_interview_fields() -> FieldBag {
    field_bag(&[
        ("interview_date_time", json!("2025-02-01T10:00:00Z")),
        ("interview_type", json!("video")),
        ("location_or_link", json!("https://meet.example.com/abc")),
    ])
}

/// The complete gate for moving into `interview_2`.
pub fn second_interview_fields() -> FieldBag {
    field_bag(&[
        ("previous_scorecard", json!("4/5, strong on systems design")),
        ("interview_date_time", json!("2025-02-10T14:00:00Z")),
    ])
}

/// The complete gate for moving into `offer`.
pub fn offer_fields() -> FieldBag {
    field_bag(&[
        ("offer_salary", json!(50_000)),
        ("start_date", json!("2025-03-01")),
        ("benefits", json!("standard package, 25 days holiday")),
    ])
}

/// The complete gate for moving into `placed`.
pub fn placement_fields(salary: i64, fee_percentage: f64) -> FieldBag {
    field_bag(&[
        ("start_date", json!("2025-03-01")),
        ("salary", json!(salary)),
        ("fee_percentage", json!(fee_percentage)),
        ("guarantee_period_days", json!(90)),
    ])
}

/// The complete gate for moving into `rejected`.
pub fn rejection_fields() -> FieldBag {
    field_bag(&[
        ("rejection_reason", json!("Client went with an internal hire")),
        ("rejection_category", json!("client_decision")),
    ])
}
