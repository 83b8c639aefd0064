//! Per-application score retrieval.

use std::sync::Arc;

use portal_core::{application::ApplicationId, backend::PortalBackend, score::MatchScore};
use tracing::warn;

use crate::ScoreFetchError;

pub struct ScoringClient<B> {
  backend: Arc<B>,
}

impl<B> Clone for ScoringClient<B> {
  fn clone(&self) -> Self {
    Self {
      backend: Arc::clone(&self.backend),
    }
  }
}

impl<B: PortalBackend> ScoringClient<B> {
  pub fn new(backend: Arc<B>) -> Self { Self { backend } }

  /// Fetch and parse one score. A well-formed `N/A/10` is `Ok(Unavailable)`;
  /// transport errors and malformed bodies are errors.
  pub async fn try_fetch(&self, id: ApplicationId) -> Result<MatchScore, ScoreFetchError> {
    let report = self
      .backend
      .fetch_score(id)
      .await
      .map_err(|e| ScoreFetchError::Backend {
        id,
        source: Box::new(e),
      })?;
    if report.application_id != id {
      return Err(ScoreFetchError::Mismatch {
        expected: id,
        got:      report.application_id,
      });
    }
    report
      .parse()
      .map_err(|source| ScoreFetchError::Invalid { id, source })
  }

  /// Like [`try_fetch`](Self::try_fetch), but any failure degrades to
  /// [`MatchScore::Unavailable`]. Never surfaces an error.
  pub async fn fetch(&self, id: ApplicationId) -> MatchScore {
    match self.try_fetch(id).await {
      Ok(score) => score,
      Err(e) => {
        warn!(%id, error = %e, "score unavailable");
        MatchScore::Unavailable
      }
    }
  }
}
