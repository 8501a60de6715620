//! GDPR compliance actions: contact touches, anonymisation, deletion.
//!
//! Bulk variants process ids one at a time, keep going past individual
//! failures, and check a shared cancel flag between items so an
//! abandoned batch stops issuing further writes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;
use thiserror::Error;
use tracing::{info, warn};

use crate::activity::{ActivityAction, ActivityRecord, ActivitySink};
use crate::candidate::Candidate;
use crate::db::{candidate_repo, stats_repo, Database, DatabaseError};
use crate::gdpr::{GdprStatus, RetentionPolicy};

#[derive(Error, Debug)]
pub enum GdprError {
    #[error("candidate '{0}' not found")]
    NotFound(String),

    #[error("candidate '{0}' is already anonymised")]
    AlreadyAnonymised(String),

    #[error("database error: {0}")]
    Database(#[from] DatabaseError),
}

/// Cooperative cancellation for bulk batches. Cloning shares the flag.
#[derive(Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Tally of a bulk batch. Failures carry the id that caused them.
#[derive(Debug, Default)]
pub struct BulkOutcome {
    pub succeeded: usize,
    pub failed: Vec<(String, GdprError)>,
}

/// Records a contact with the candidate, resetting the retention clock.
pub fn touch_contact(
    db: &Database,
    candidate_id: &str,
    at: DateTime<Utc>,
) -> Result<(), GdprError> {
    if !candidate_repo::touch_contact(db, candidate_id, at)? {
        return Err(GdprError::NotFound(candidate_id.to_string()));
    }
    Ok(())
}

/// Irreversibly anonymises a candidate's identity fields.
pub fn anonymise(
    db: &Database,
    sink: &dyn ActivitySink,
    candidate_id: &str,
    actor_id: &str,
    at: DateTime<Utc>,
) -> Result<(), GdprError> {
    let candidate = candidate_repo::find_by_id(db, candidate_id)?
        .ok_or_else(|| GdprError::NotFound(candidate_id.to_string()))?;
    if candidate.is_anonymised() {
        return Err(GdprError::AlreadyAnonymised(candidate_id.to_string()));
    }

    if !candidate_repo::anonymise(db, candidate_id, at)? {
        // The row was anonymised between the read and the write.
        return Err(GdprError::AlreadyAnonymised(candidate_id.to_string()));
    }

    info!(candidate_id, "candidate anonymised");
    sink.record(ActivityRecord::new(
        ActivityAction::CandidateAnonymised,
        "candidate",
        candidate_id,
        actor_id,
        json!({}),
    ));
    Ok(())
}

/// Hard-deletes a candidate record.
pub fn delete(
    db: &Database,
    sink: &dyn ActivitySink,
    candidate_id: &str,
    actor_id: &str,
) -> Result<(), GdprError> {
    if !candidate_repo::delete(db, candidate_id)? {
        return Err(GdprError::NotFound(candidate_id.to_string()));
    }

    info!(candidate_id, "candidate deleted");
    sink.record(ActivityRecord::new(
        ActivityAction::CandidateDeleted,
        "candidate",
        candidate_id,
        actor_id,
        json!({}),
    ));
    Ok(())
}

/// Anonymises a batch of candidates, never aborting on a single failure.
pub fn bulk_anonymise(
    db: &Database,
    sink: &dyn ActivitySink,
    candidate_ids: &[String],
    actor_id: &str,
    cancel: &CancelFlag,
) -> BulkOutcome {
    let outcome = run_bulk(candidate_ids, cancel, |id| {
        anonymise(db, sink, id, actor_id, Utc::now())
    });
    record_bulk(sink, ActivityAction::BulkAnonymise, actor_id, candidate_ids, &outcome);
    outcome
}

/// Deletes a batch of candidates, never aborting on a single failure.
pub fn bulk_delete(
    db: &Database,
    sink: &dyn ActivitySink,
    candidate_ids: &[String],
    actor_id: &str,
    cancel: &CancelFlag,
) -> BulkOutcome {
    let outcome = run_bulk(candidate_ids, cancel, |id| delete(db, sink, id, actor_id));
    record_bulk(sink, ActivityAction::BulkDelete, actor_id, candidate_ids, &outcome);
    outcome
}

fn run_bulk<F>(candidate_ids: &[String], cancel: &CancelFlag, mut op: F) -> BulkOutcome
where
    F: FnMut(&str) -> Result<(), GdprError>,
{
    let mut outcome = BulkOutcome::default();
    for id in candidate_ids {
        if cancel.is_cancelled() {
            warn!(
                processed = outcome.succeeded + outcome.failed.len(),
                total = candidate_ids.len(),
                "bulk batch cancelled"
            );
            break;
        }
        match op(id) {
            Ok(()) => outcome.succeeded += 1,
            Err(e) => {
                warn!(candidate_id = %id, "bulk item failed: {e}");
                outcome.failed.push((id.clone(), e));
            }
        }
    }
    outcome
}

fn record_bulk(
    sink: &dyn ActivitySink,
    action: ActivityAction,
    actor_id: &str,
    candidate_ids: &[String],
    outcome: &BulkOutcome,
) {
    sink.record(ActivityRecord::new(
        action,
        "candidate",
        "batch",
        actor_id,
        json!({
            "requested": candidate_ids.len(),
            "succeeded": outcome.succeeded,
            "failed": outcome.failed.len(),
        }),
    ));
}

/// The retention review queue: candidates already at risk or expired,
/// plus anyone expiring within `within_days`. Most urgent first.
pub fn expiring_candidates(
    db: &Database,
    policy: &RetentionPolicy,
    now: DateTime<Utc>,
    within_days: i64,
) -> Result<Vec<(Candidate, GdprStatus)>, GdprError> {
    Ok(stats_repo::retention_review_queue(db, policy, now, within_days)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::NullSink;
    use crate::gdpr::RetentionState;

    fn test_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn stored_candidate(db: &Database, name: &str) -> Candidate {
        let candidate = Candidate::new(name, Some("person@example.com"), None);
        candidate_repo::insert(db, &candidate).unwrap();
        candidate
    }

    #[test]
    fn touch_contact_resets_the_clock() {
        let db = test_db();
        let candidate = stored_candidate(&db, "Fresh Contact");

        touch_contact(&db, &candidate.id, Utc::now()).unwrap();

        let reloaded = candidate_repo::find_by_id(&db, &candidate.id).unwrap().unwrap();
        let status = crate::gdpr::classify(
            reloaded.last_contact_at,
            Utc::now(),
            &RetentionPolicy::default(),
        );
        assert_eq!(status.status, RetentionState::Active);
    }

    #[test]
    fn touch_contact_unknown_candidate() {
        let db = test_db();
        assert!(matches!(
            touch_contact(&db, "ghost", Utc::now()),
            Err(GdprError::NotFound(_))
        ));
    }

    #[test]
    fn anonymise_is_one_way() {
        let db = test_db();
        let candidate = stored_candidate(&db, "To Forget");

        anonymise(&db, &NullSink, &candidate.id, "admin-1", Utc::now()).unwrap();

        let again = anonymise(&db, &NullSink, &candidate.id, "admin-1", Utc::now());
        assert!(matches!(again, Err(GdprError::AlreadyAnonymised(_))));
    }

    #[test]
    fn delete_removes_the_record() {
        let db = test_db();
        let candidate = stored_candidate(&db, "To Delete");

        delete(&db, &NullSink, &candidate.id, "admin-1").unwrap();
        assert!(candidate_repo::find_by_id(&db, &candidate.id).unwrap().is_none());
        assert!(matches!(
            delete(&db, &NullSink, &candidate.id, "admin-1"),
            Err(GdprError::NotFound(_))
        ));
    }

    #[test]
    fn bulk_anonymise_continues_past_failures() {
        let db = test_db();
        let a = stored_candidate(&db, "A");
        let b = stored_candidate(&db, "B");
        let ids = vec![a.id.clone(), "missing".to_string(), b.id.clone()];

        let outcome = bulk_anonymise(&db, &NullSink, &ids, "admin-1", &CancelFlag::new());
        assert_eq!(outcome.succeeded, 2);
        assert_eq!(outcome.failed.len(), 1);
        assert_eq!(outcome.failed[0].0, "missing");

        // Both real candidates were anonymised despite the failure between them.
        for id in [&a.id, &b.id] {
            assert!(candidate_repo::find_by_id(&db, id).unwrap().unwrap().is_anonymised());
        }
    }

    #[test]
    fn bulk_stops_after_cancellation() {
        let db = test_db();
        let a = stored_candidate(&db, "A");
        let b = stored_candidate(&db, "B");
        let cancel = CancelFlag::new();
        cancel.cancel();

        let outcome = bulk_delete(
            &db,
            &NullSink,
            &[a.id.clone(), b.id.clone()],
            "admin-1",
            &cancel,
        );
        assert_eq!(outcome.succeeded, 0);
        assert!(outcome.failed.is_empty());
        assert!(candidate_repo::find_by_id(&db, &a.id).unwrap().is_some());
    }

    #[test]
    fn expiring_candidates_surfaces_the_risky_ones() {
        let db = test_db();
        let mut risky = Candidate::new("Risky", None, None);
        risky.last_contact_at = Some(Utc::now() - chrono::Duration::days(700));
        candidate_repo::insert(&db, &risky).unwrap();

        let mut fresh = Candidate::new("Fresh", None, None);
        fresh.last_contact_at = Some(Utc::now());
        candidate_repo::insert(&db, &fresh).unwrap();

        let queue =
            expiring_candidates(&db, &RetentionPolicy::default(), Utc::now(), 30).unwrap();
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].0.id, risky.id);
        assert_eq!(queue[0].1.status, RetentionState::AtRisk);
    }
}
