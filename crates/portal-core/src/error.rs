//! Error types for `portal-core`.

use thiserror::Error;

use crate::{application::ApplicationStatus, posting::PostingId};

#[derive(Debug, Error)]
pub enum Error {
  #[error("cannot move an application from {from} to {to}")]
  InvalidTransition {
    from: ApplicationStatus,
    to:   ApplicationStatus,
  },

  #[error("malformed score payload: {0:?}")]
  MalformedScore(String),

  #[error("score {0} is outside the 0-10 range")]
  ScoreOutOfRange(f64),

  #[error(transparent)]
  Validation(#[from] ValidationError),
}

/// A precondition that failed locally, before any request was attempted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
  #[error("resume {filename:?} is not a PDF")]
  NotPdf {
    filename:     String,
    content_type: Option<String>,
  },

  #[error("resume {0:?} is empty")]
  EmptyResume(String),

  #[error("resume is {size} bytes; the limit is {limit}")]
  ResumeTooLarge { size: usize, limit: usize },

  #[error("posting {0} is closed to new applications")]
  PostingClosed(PostingId),

  #[error("missing required field: {0}")]
  MissingField(&'static str),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
