//! Moderation state machine shared by every content kind.
//!
//! `workflow` and `ticker` hold the pure transition rules; `engine` loads a
//! row, applies a rule and writes it back under a version check.

mod engine;
mod kinds;
pub mod ticker;
pub mod workflow;

pub use engine::{ContentEngine, Decision, PageRequest, PublicFilter};
pub use kinds::{ApprovalPolicies, ApprovalPolicy, KindDescriptor, descriptor};
pub use ticker::Track;
pub use workflow::SubmitIntent;

use crate::db::DbError;

#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Invalid(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Storage(#[from] DbError),
}
