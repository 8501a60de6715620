//! Structured activity records and the sinks that receive them.
//!
//! Recording activity is fire-and-forget: sinks swallow their own
//! failures (logging a warning) so a broken log can never roll back the
//! mutation it describes.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::db::{activity_repo, Database};

/// What happened, in coarse categories the activity feed groups by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityAction {
    EntryCreated,
    StageChanged,
    EntryUpdated,
    EntryRemoved,
    CandidateAnonymised,
    CandidateDeleted,
    BulkAnonymise,
    BulkDelete,
}

impl ActivityAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityAction::EntryCreated => "entry_created",
            ActivityAction::StageChanged => "stage_changed",
            ActivityAction::EntryUpdated => "entry_updated",
            ActivityAction::EntryRemoved => "entry_removed",
            ActivityAction::CandidateAnonymised => "candidate_anonymised",
            ActivityAction::CandidateDeleted => "candidate_deleted",
            ActivityAction::BulkAnonymise => "bulk_anonymise",
            ActivityAction::BulkDelete => "bulk_delete",
        }
    }
}

impl std::fmt::Display for ActivityAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ActivityAction {
    type Err = UnknownActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        const ALL: [ActivityAction; 8] = [
            ActivityAction::EntryCreated,
            ActivityAction::StageChanged,
            ActivityAction::EntryUpdated,
            ActivityAction::EntryRemoved,
            ActivityAction::CandidateAnonymised,
            ActivityAction::CandidateDeleted,
            ActivityAction::BulkAnonymise,
            ActivityAction::BulkDelete,
        ];
        ALL.iter()
            .find(|a| a.as_str() == s)
            .copied()
            .ok_or_else(|| UnknownActionError(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown activity action '{0}'")]
pub struct UnknownActionError(pub String);

/// One structured activity entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub id: String,
    pub action: ActivityAction,
    pub resource_type: String,
    pub resource_id: String,
    pub actor_id: String,
    pub details: serde_json::Value,
    pub recorded_at: DateTime<Utc>,
}

impl ActivityRecord {
    pub fn new(
        action: ActivityAction,
        resource_type: &str,
        resource_id: &str,
        actor_id: &str,
        details: serde_json::Value,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            action,
            resource_type: resource_type.to_string(),
            resource_id: resource_id.to_string(),
            actor_id: actor_id.to_string(),
            details,
            recorded_at: Utc::now(),
        }
    }
}

/// Receives activity records. Implementations must not fail the caller.
pub trait ActivitySink: Send + Sync {
    fn record(&self, record: ActivityRecord);
}

/// Fans records out to in-process subscribers (UI feeds, test probes).
pub struct BroadcastSink {
    sender: broadcast::Sender<ActivityRecord>,
}

impl BroadcastSink {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ActivityRecord> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastSink {
    fn default() -> Self {
        Self::new(256)
    }
}

impl ActivitySink for BroadcastSink {
    fn record(&self, record: ActivityRecord) {
        // A send with no subscribers is not an error worth surfacing.
        let _ = self.sender.send(record);
    }
}

/// Persists records through the activity repository.
pub struct DbActivitySink {
    db: Database,
}

impl DbActivitySink {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

impl ActivitySink for DbActivitySink {
    fn record(&self, record: ActivityRecord) {
        if let Err(e) = activity_repo::append(&self.db, &record) {
            tracing::warn!(action = %record.action, "failed to persist activity record: {e}");
        }
    }
}

/// Discards everything. For tests and embedders with their own logging.
pub struct NullSink;

impl ActivitySink for NullSink {
    fn record(&self, _record: ActivityRecord) {}
}

/// Convenience for the common `Arc<dyn ActivitySink>` constructor calls.
pub fn null_sink() -> Arc<dyn ActivitySink> {
    Arc::new(NullSink)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> ActivityRecord {
        ActivityRecord::new(
            ActivityAction::StageChanged,
            "pipeline_entry",
            "e1",
            "user-1",
            json!({"from": "sourced", "to": "contacted"}),
        )
    }

    #[test]
    fn action_names_round_trip() {
        for action in [
            ActivityAction::EntryCreated,
            ActivityAction::StageChanged,
            ActivityAction::EntryUpdated,
            ActivityAction::EntryRemoved,
            ActivityAction::CandidateAnonymised,
            ActivityAction::CandidateDeleted,
            ActivityAction::BulkAnonymise,
            ActivityAction::BulkDelete,
        ] {
            assert_eq!(action.as_str().parse::<ActivityAction>().unwrap(), action);
        }
    }

    #[test]
    fn broadcast_sink_delivers_to_subscribers() {
        let sink = BroadcastSink::default();
        let mut rx = sink.subscribe();

        sink.record(sample());

        let received = rx.try_recv().unwrap();
        assert_eq!(received.action, ActivityAction::StageChanged);
        assert_eq!(received.resource_id, "e1");
    }

    #[test]
    fn broadcast_sink_without_subscribers_does_not_panic() {
        let sink = BroadcastSink::default();
        sink.record(sample());
    }

    #[test]
    fn db_sink_persists_records() {
        let db = Database::open_in_memory().unwrap();
        let sink = DbActivitySink::new(db.clone());

        sink.record(sample());

        let (rows, total) =
            activity_repo::query(&db, &activity_repo::ActivityFilter::default()).unwrap();
        assert_eq!(total, 1);
        assert_eq!(rows[0].actor_id, "user-1");
    }
}
