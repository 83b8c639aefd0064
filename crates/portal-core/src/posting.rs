//! Job postings: recruiter-authored openings with an open/closed lifecycle.
//!
//! Postings are owned by the backend. Applications reference them by
//! [`PostingId`] only and never embed a copy.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::ValidationError;

// ─── Identity ────────────────────────────────────────────────────────────────

/// Posting identifier.
///
/// The API emits posting ids as strings on `/jobs/` and as integers inside
/// application records, so both shapes are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct PostingId(pub String);

impl<'de> Deserialize<'de> for PostingId {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
      Text(String),
      Number(u64),
    }

    Ok(match RawId::deserialize(deserializer)? {
      RawId::Text(s) => Self(s),
      RawId::Number(n) => Self(n.to_string()),
    })
  }
}

impl fmt::Display for PostingId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl From<&str> for PostingId {
  fn from(value: &str) -> Self { Self(value.to_owned()) }
}

// ─── Status ──────────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, strum::Display,
)]
#[strum(serialize_all = "lowercase")]
pub enum PostingStatus {
  #[default]
  #[serde(rename = "open")]
  Open,
  /// Written as `close`, which is what the web client checks for. `closed`
  /// is accepted on read.
  #[serde(rename = "close", alias = "closed")]
  Closed,
}

// ─── Posting ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobPosting {
  pub id:          PostingId,
  pub title:       String,
  pub description: String,
  #[serde(default)]
  pub company:     String,
  #[serde(default)]
  pub location:    String,
  #[serde(default)]
  pub status:      PostingStatus,
  /// Username of the recruiter who created the posting. Read-only.
  #[serde(default)]
  pub posted_by:   Option<String>,
}

impl JobPosting {
  pub fn is_open(&self) -> bool { self.status == PostingStatus::Open }

  /// Candidates may only apply to open postings.
  pub fn ensure_open(&self) -> Result<(), ValidationError> {
    if self.is_open() {
      Ok(())
    } else {
      Err(ValidationError::PostingClosed(self.id.clone()))
    }
  }

  /// The editable fields of this posting, e.g. to re-submit with a new status.
  pub fn to_draft(&self) -> NewPosting {
    NewPosting {
      title:       self.title.clone(),
      description: self.description.clone(),
      company:     self.company.clone(),
      location:    self.location.clone(),
      status:      self.status,
    }
  }
}

// ─── NewPosting ──────────────────────────────────────────────────────────────

/// Input to [`crate::backend::PortalBackend::create_posting`] and
/// [`crate::backend::PortalBackend::update_posting`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewPosting {
  pub title:       String,
  pub description: String,
  pub company:     String,
  pub location:    String,
  pub status:      PostingStatus,
}

impl NewPosting {
  /// Reject drafts with blank required fields.
  pub fn validate(&self) -> Result<(), ValidationError> {
    if self.title.trim().is_empty() {
      return Err(ValidationError::MissingField("title"));
    }
    if self.description.trim().is_empty() {
      return Err(ValidationError::MissingField("description"));
    }
    Ok(())
  }
}
