//! Pipeline entries and the service that mutates them.

pub mod entry;
pub mod error;
pub mod service;

pub use entry::{Placement, PipelineEntry, StageTransitionRecord};
pub use error::TransitionError;
pub use service::{DetailsPatch, PipelineService};
