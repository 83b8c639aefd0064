//! Applications: a candidate's submission against one posting.
//!
//! The status of an application is owned by the recruiter role. Candidates
//! observe it but never set it.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use strum::IntoEnumIterator;

use crate::{Error, Result, posting::PostingId};

// ─── Identity ────────────────────────────────────────────────────────────────

/// Server-assigned application identifier.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ApplicationId(pub u64);

impl fmt::Display for ApplicationId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

// ─── Status ──────────────────────────────────────────────────────────────────

/// Recruiter-controlled review status.
///
/// `Sent` is the only initial state and can never be re-entered. The four
/// reviewed states form a fully connected graph: recruiters may correct a
/// status at any time, so there is no terminal state.
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
  strum::EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum ApplicationStatus {
  /// Wire name is `Applied`.
  #[serde(rename = "Applied", alias = "Sent")]
  #[strum(to_string = "Sent", serialize = "applied")]
  Sent,
  Interviewed,
  Selected,
  Rejected,
  #[serde(rename = "On Hold", alias = "OnHold")]
  #[strum(
    to_string = "On Hold",
    serialize = "onhold",
    serialize = "on-hold",
    serialize = "on_hold"
  )]
  OnHold,
}

impl ApplicationStatus {
  pub fn is_initial(self) -> bool { matches!(self, Self::Sent) }

  /// Every state a recruiter may move an application into.
  pub fn reviewed() -> impl Iterator<Item = Self> {
    Self::iter().filter(|s| !s.is_initial())
  }

  pub fn can_transition_to(self, target: Self) -> bool { !target.is_initial() }

  /// Validate a move from `self` to `target`.
  pub fn transition(self, target: Self) -> Result<Self> {
    if self.can_transition_to(target) {
      Ok(target)
    } else {
      Err(Error::InvalidTransition {
        from: self,
        to:   target,
      })
    }
  }
}

// ─── Application ─────────────────────────────────────────────────────────────

/// An application as returned by the portal API.
///
/// The posting is referenced by id only; `job_title` is a denormalised copy
/// the server includes for display and search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
  pub id:            ApplicationId,
  #[serde(rename = "job")]
  pub posting_id:    PostingId,
  /// Empty when the server sends `null` (the posting was deleted).
  #[serde(default, deserialize_with = "null_as_empty")]
  pub job_title:     String,
  #[serde(rename = "candidate_username", default, deserialize_with = "null_as_empty")]
  pub candidate:     String,
  #[serde(rename = "resumeUrl", default)]
  pub resume_url:    Option<String>,
  /// Opaque summary produced by the resume parser.
  #[serde(default)]
  pub parsed_fields: Option<String>,
  pub applied_at:    DateTime<Utc>,
  pub status:        ApplicationStatus,
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
  Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
