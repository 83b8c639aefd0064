//! Error types for `portal-dashboard`.
//!
//! Backend failures are boxed at this boundary so the dashboard stays generic
//! over the transport.

use portal_core::{
  ValidationError,
  application::{ApplicationId, ApplicationStatus},
  posting::PostingId,
  session::ViewerRole,
};
use thiserror::Error;

use crate::Generation;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum LoadError {
  #[error("failed to load applications for {role}: {source}")]
  Backend {
    role:       ViewerRole,
    /// The load that failed; the store was emptied as of this generation.
    generation: Generation,
    #[source]
    source:     BoxError,
  },

  /// A later load started before this one finished; its result was dropped.
  #[error("load {generation} was superseded by load {current}")]
  Superseded {
    generation: Generation,
    current:    Generation,
  },
}

#[derive(Debug, Error)]
pub enum ScoreFetchError {
  #[error("score request for application {id} failed: {source}")]
  Backend {
    id:     ApplicationId,
    #[source]
    source: BoxError,
  },

  #[error("score for application {id} is unusable: {source}")]
  Invalid {
    id:     ApplicationId,
    #[source]
    source: portal_core::Error,
  },

  #[error("asked for the score of application {expected}, got one for {got}")]
  Mismatch {
    expected: ApplicationId,
    got:      ApplicationId,
  },
}

#[derive(Debug, Error)]
#[error("a status change for application {id} is already awaiting confirmation")]
pub struct ConcurrentUpdateError {
  pub id: ApplicationId,
}

/// The server did not confirm a status change. The local row keeps showing
/// `attempted` until the change is reverted or the set is reloaded.
#[derive(Debug, Error)]
#[error(
  "server did not confirm {attempted} for application {id} (was {previous}): {source}"
)]
pub struct StatusUpdateError {
  pub id:        ApplicationId,
  pub previous:  ApplicationStatus,
  pub attempted: ApplicationStatus,
  #[source]
  pub source:    BoxError,
}

#[derive(Debug, Error)]
pub enum WorkflowError {
  #[error("{role} sessions may not change application status")]
  Forbidden { role: ViewerRole },

  #[error("application {0} is not loaded")]
  NotFound(ApplicationId),

  #[error("application {id} cannot move from {from} to {to}")]
  InvalidTransition {
    id:   ApplicationId,
    from: ApplicationStatus,
    to:   ApplicationStatus,
  },

  #[error(transparent)]
  Concurrent(#[from] ConcurrentUpdateError),

  #[error(transparent)]
  StatusUpdate(#[from] StatusUpdateError),

  #[error("application {0} has no failed change to revert")]
  NothingToRevert(ApplicationId),
}

#[derive(Debug, Error)]
pub enum SubmitError {
  #[error("{role} sessions may not submit applications")]
  Forbidden { role: ViewerRole },

  #[error("posting {0} does not exist")]
  UnknownPosting(PostingId),

  #[error(transparent)]
  Validation(#[from] ValidationError),

  #[error("submission failed: {0}")]
  Backend(#[source] BoxError),
}

#[derive(Debug, Error)]
pub enum PostingError {
  #[error("{role} sessions may not manage postings")]
  Forbidden { role: ViewerRole },

  #[error("posting {0} does not exist")]
  NotFound(PostingId),

  #[error(transparent)]
  Validation(#[from] ValidationError),

  #[error("posting request failed: {0}")]
  Backend(#[source] BoxError),
}
