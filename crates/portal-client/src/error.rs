//! Error type for `portal-client`.

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
  #[error("failed to build HTTP client: {0}")]
  Build(#[source] reqwest::Error),

  #[error("{method} {path} failed: {source}")]
  Transport {
    method: &'static str,
    path:   String,
    #[source]
    source: reqwest::Error,
  },

  #[error("{method} {path} → {status}: {message}")]
  Status {
    method:  &'static str,
    path:    String,
    status:  StatusCode,
    message: String,
  },

  #[error("deserialising {what}: {source}")]
  Decode {
    what:   &'static str,
    #[source]
    source: reqwest::Error,
  },

  #[error("invalid resume part: {0}")]
  Multipart(#[source] reqwest::Error),

  #[error("access token is malformed: {0}")]
  Token(String),

  #[error(transparent)]
  Validation(#[from] portal_core::ValidationError),
}

impl ClientError {
  /// The HTTP status the server answered with, if the request got that far.
  pub fn status(&self) -> Option<StatusCode> {
    match self {
      Self::Status { status, .. } => Some(*status),
      _ => None,
    }
  }
}

pub type Result<T, E = ClientError> = std::result::Result<T, E>;
