use thiserror::Error;

use crate::db::DatabaseError;
use crate::stage::Stage;
use crate::transition::RejectionReason;

/// Everything a pipeline operation can fail with.
///
/// The first three variants are recoverable and meant for direct display;
/// `NotFound` and `Database` are fatal for the single operation.
#[derive(Error, Debug)]
pub enum TransitionError {
    #[error("stage change from '{from}' to '{to}' is not allowed")]
    Illegal { from: Stage, to: Stage },

    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    #[error("field '{key}' is invalid: {reason}")]
    InvalidField { key: String, reason: String },

    #[error("the entry was changed by someone else; reload and retry")]
    Conflict,

    #[error("pipeline entry '{0}' not found")]
    NotFound(String),

    #[error("database error: {0}")]
    Database(#[from] DatabaseError),
}

impl From<RejectionReason> for TransitionError {
    fn from(reason: RejectionReason) -> Self {
        match reason {
            RejectionReason::IllegalTransition { from, to } => TransitionError::Illegal { from, to },
            RejectionReason::MissingRequiredFields(keys) => TransitionError::MissingFields(keys),
            RejectionReason::InvalidField { key, reason } => {
                TransitionError::InvalidField { key, reason }
            }
        }
    }
}
