pub mod activity;
pub mod candidate;
pub mod config;
pub mod db;
pub mod dedupe;
pub mod error;
pub mod gdpr;
pub mod logging;
pub mod pipeline;
pub mod stage;
pub mod transition;

pub use activity::{ActivityAction, ActivityRecord, ActivitySink, BroadcastSink, DbActivitySink, NullSink};
pub use candidate::Candidate;
pub use config::{load_config, load_config_from_str, Config};
pub use error::{ConfigError, Result, TalentflowError};
pub use gdpr::{classify, GdprError, GdprStatus, RetentionPolicy, RetentionState};
pub use pipeline::{PipelineEntry, PipelineService, Placement, StageTransitionRecord, TransitionError};
pub use stage::Stage;
pub use transition::{validate, AcceptedTransition, FieldBag, RejectionReason};
