//! Applies validated stage transitions to persisted pipeline entries.
//!
//! The service performs one transition at a time: load, validate, then a
//! single conditional write that commits the stage change, the audit
//! record and (for placements) the commercial record together. Two
//! concurrent transitions against the same entry cannot both win — the
//! loser gets [`TransitionError::Conflict`] and should reload and retry.
//!
//! Authorization happens before this layer: callers pass an already
//! authorized `actor_id`.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{debug, info, info_span};

use crate::activity::{ActivityAction, ActivityRecord, ActivitySink};
use crate::db::{audit_repo, candidate_repo, entry_repo, Database};
use crate::stage::Stage;
use crate::transition::{validate, FieldBag, TransitionRequest};

use super::entry::{Placement, PipelineEntry, StageTransitionRecord};
use super::error::TransitionError;

/// Metadata-only changes to an entry. `None` leaves a field untouched.
#[derive(Debug, Default, Clone)]
pub struct DetailsPatch {
    pub priority: Option<i32>,
    pub assigned_to: Option<String>,
    pub notes: Option<String>,
}

pub struct PipelineService {
    db: Database,
    sink: Arc<dyn ActivitySink>,
}

impl PipelineService {
    pub fn new(db: Database, sink: Arc<dyn ActivitySink>) -> Self {
        Self { db, sink }
    }

    /// Adds a candidate to a job's pipeline at the `sourced` stage.
    pub fn add_to_pipeline(
        &self,
        job_id: &str,
        candidate_id: &str,
        actor_id: &str,
    ) -> Result<PipelineEntry, TransitionError> {
        let entry = PipelineEntry::new(job_id, candidate_id);
        entry_repo::insert(&self.db, &entry)?;

        info!(entry_id = %entry.id, job_id, candidate_id, "candidate added to pipeline");
        self.sink.record(ActivityRecord::new(
            ActivityAction::EntryCreated,
            "pipeline_entry",
            &entry.id,
            actor_id,
            json!({ "job_id": job_id, "candidate_id": candidate_id }),
        ));

        Ok(entry)
    }

    /// Moves an entry to `target`, enforcing the transition graph and
    /// field gates, and writes the audit trail atomically.
    pub fn transition(
        &self,
        entry_id: &str,
        target: Stage,
        fields: FieldBag,
        actor_id: &str,
    ) -> Result<PipelineEntry, TransitionError> {
        let _span = info_span!("transition", entry_id, target = %target).entered();

        let entry = entry_repo::find_by_id(&self.db, entry_id)?
            .ok_or_else(|| TransitionError::NotFound(entry_id.to_string()))?;

        let request = TransitionRequest {
            current: entry.stage,
            held_from: entry.held_from,
            target,
            fields: &fields,
        };
        let accepted = match validate(&request) {
            Ok(accepted) => accepted,
            Err(reason) => {
                debug!(from = %entry.stage, "transition rejected: {reason:?}");
                return Err(reason.into());
            }
        };

        let now = Utc::now();
        let mut updated = entry.clone();
        updated.stage = target;
        updated.held_from = if target == Stage::OnHold {
            Some(entry.stage)
        } else {
            None
        };
        updated.updated_at = now;

        let record = StageTransitionRecord::new(
            &entry.id,
            accepted.from,
            accepted.to,
            actor_id,
            now,
            fields,
        );
        let placement = accepted
            .placement
            .as_ref()
            .map(|terms| Placement::from_terms(&entry.id, terms, now));

        let committed = entry_repo::commit_transition(
            &self.db,
            &updated,
            entry.updated_at,
            &record,
            placement.as_ref(),
        )?;
        if !committed {
            return Err(TransitionError::Conflict);
        }

        // Contact with the candidate is implicit in moving them forward.
        candidate_repo::touch_contact(&self.db, &entry.candidate_id, now)?;

        info!(from = %accepted.from, to = %accepted.to, "stage changed");
        self.sink.record(ActivityRecord::new(
            ActivityAction::StageChanged,
            "pipeline_entry",
            &entry.id,
            actor_id,
            json!({
                "from": accepted.from,
                "to": accepted.to,
                "placement_id": placement.as_ref().map(|p| p.id.clone()),
            }),
        ));

        Ok(updated)
    }

    /// Edits priority, assignee or notes without touching the stage.
    pub fn update_details(
        &self,
        entry_id: &str,
        patch: DetailsPatch,
        actor_id: &str,
    ) -> Result<PipelineEntry, TransitionError> {
        let entry = entry_repo::find_by_id(&self.db, entry_id)?
            .ok_or_else(|| TransitionError::NotFound(entry_id.to_string()))?;

        let mut updated = entry.clone();
        if let Some(priority) = patch.priority {
            updated.priority = priority;
        }
        if let Some(assigned_to) = patch.assigned_to {
            updated.assigned_to = Some(assigned_to);
        }
        if let Some(notes) = patch.notes {
            updated.notes = Some(notes);
        }
        updated.updated_at = Utc::now();

        if !entry_repo::update_details_checked(&self.db, &updated, entry.updated_at)? {
            return Err(TransitionError::Conflict);
        }

        self.sink.record(ActivityRecord::new(
            ActivityAction::EntryUpdated,
            "pipeline_entry",
            &entry.id,
            actor_id,
            json!({ "priority": updated.priority, "assigned_to": updated.assigned_to }),
        ));

        Ok(updated)
    }

    /// Hard-deletes an entry regardless of stage. The caller is expected
    /// to have gated this behind an admin permission check.
    pub fn remove(&self, entry_id: &str, actor_id: &str) -> Result<(), TransitionError> {
        let entry = entry_repo::find_by_id(&self.db, entry_id)?
            .ok_or_else(|| TransitionError::NotFound(entry_id.to_string()))?;

        if !entry_repo::delete(&self.db, entry_id)? {
            return Err(TransitionError::NotFound(entry_id.to_string()));
        }

        info!(entry_id, stage = %entry.stage, "pipeline entry removed");
        self.sink.record(ActivityRecord::new(
            ActivityAction::EntryRemoved,
            "pipeline_entry",
            entry_id,
            actor_id,
            json!({ "stage": entry.stage }),
        ));

        Ok(())
    }

    /// Returns an entry's transition history, oldest first.
    pub fn history(
        &self,
        entry_id: &str,
    ) -> Result<Vec<StageTransitionRecord>, TransitionError> {
        Ok(audit_repo::list_for_entry(&self.db, entry_id)?)
    }
}
