//! The viewer's session: who is looking, in which role, with which token.
//!
//! A session is created at login and dropped at logout. Components receive it
//! by value or reference; nothing reads it from global storage.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The capability set of the current viewer.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ViewerRole {
  Candidate,
  Recruiter,
}

impl ViewerRole {
  /// Recruiters own status transitions and posting writes.
  pub fn can_review(self) -> bool { matches!(self, Self::Recruiter) }

  /// Only candidates submit applications.
  pub fn can_apply(self) -> bool { matches!(self, Self::Candidate) }
}

/// An authenticated viewer.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
  pub username: String,
  pub role:     ViewerRole,
  /// Bearer access token.
  pub token:    String,
}

impl Session {
  pub fn new(
    username: impl Into<String>,
    role: ViewerRole,
    token: impl Into<String>,
  ) -> Self {
    Self {
      username: username.into(),
      role,
      token: token.into(),
    }
  }
}

// Keeps the token out of logs.
impl fmt::Debug for Session {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Session")
      .field("username", &self.username)
      .field("role", &self.role)
      .field("token", &"<redacted>")
      .finish()
  }
}
