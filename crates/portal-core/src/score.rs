//! Match scores, the sidecar value attached 1:1 to an application.
//!
//! Scores are produced by an external rating service. The client only fetches,
//! caches, and aggregates them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result, application::ApplicationId};

/// Upper bound of the rating scale.
pub const SCORE_SCALE: f64 = 10.0;

// ─── MatchScore ──────────────────────────────────────────────────────────────

/// A resolved numeric score, or one of the two sentinel states.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum MatchScore {
  /// A rating in `[0, 10]`.
  Numeric(f64),
  /// Not yet fetched, or a fetch is in flight.
  #[default]
  Pending,
  /// The fetch failed or the service could not rate the resume.
  Unavailable,
}

impl MatchScore {
  /// Build a numeric score, rejecting values outside `[0, 10]`.
  pub fn numeric(value: f64) -> Result<Self> {
    if value.is_finite() && (0.0..=SCORE_SCALE).contains(&value) {
      Ok(Self::Numeric(value))
    } else {
      Err(Error::ScoreOutOfRange(value))
    }
  }

  pub fn value(&self) -> Option<f64> {
    match self {
      Self::Numeric(v) => Some(*v),
      _ => None,
    }
  }

  pub fn is_resolved(&self) -> bool { matches!(self, Self::Numeric(_)) }

  pub fn is_pending(&self) -> bool { matches!(self, Self::Pending) }

  pub fn band(&self) -> ScoreBand {
    self.value().map_or(ScoreBand::Unclassified, ScoreBand::classify)
  }

  /// Progress-bar position: score × 10, clamped to `[0, 100]`.
  pub fn progress(&self) -> u8 {
    match self.value() {
      Some(v) => (v * 10.0).clamp(0.0, 100.0).round() as u8,
      None => 0,
    }
  }
}

impl fmt::Display for MatchScore {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Numeric(v) => write!(f, "{v}/10"),
      Self::Pending => f.write_str("Calculating..."),
      Self::Unavailable => f.write_str("N/A"),
    }
  }
}

// ─── ScoreBand ───────────────────────────────────────────────────────────────

/// Presentation class for a score. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ScoreBand {
  Low,
  Medium,
  Good,
  Excellent,
  Unclassified,
}

impl ScoreBand {
  pub fn classify(score: f64) -> Self {
    if score >= 8.0 {
      Self::Excellent
    } else if score >= 6.0 {
      Self::Good
    } else if score >= 4.0 {
      Self::Medium
    } else {
      Self::Low
    }
  }
}

// ─── Wire form ───────────────────────────────────────────────────────────────

/// Payload of `GET /applications/{id}/score/`: `{"application_id":7,"score":"8/10"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreReport {
  pub application_id: ApplicationId,
  pub score:          String,
}

impl ScoreReport {
  /// Interpret the `"<n>/10"` rating.
  ///
  /// `"N/A/10"` means the service answered but could not rate the resume, which
  /// maps to [`MatchScore::Unavailable`] rather than an error.
  pub fn parse(&self) -> Result<MatchScore> {
    let raw = self.score.trim();
    let numerator = match raw.rsplit_once('/') {
      Some((n, scale)) if scale.trim() == "10" => n.trim(),
      Some(_) => return Err(Error::MalformedScore(raw.to_owned())),
      None => raw,
    };

    if numerator.eq_ignore_ascii_case("n/a") {
      return Ok(MatchScore::Unavailable);
    }

    let value: f64 = numerator
      .parse()
      .map_err(|_| Error::MalformedScore(raw.to_owned()))?;
    MatchScore::numeric(value)
  }
}
