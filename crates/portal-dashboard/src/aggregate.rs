//! Concurrent score fan-out and summary metrics.
//!
//! A refresh fetches a score for every application in a snapshot that does
//! not already hold a numeric one. Fetches run concurrently and fail
//! independently. Results are merged, and metrics recomputed, only once the
//! whole batch has settled, and only if no newer load has been issued in the
//! meantime. The load counter is shared with the store, so a load that is
//! still in flight (or that failed) already makes older batches stale.

use std::{
  collections::{HashMap, HashSet},
  sync::{Mutex, MutexGuard, PoisonError},
};

use futures::future::join_all;
use portal_core::{
  application::{Application, ApplicationId},
  backend::PortalBackend,
  score::MatchScore,
};
use tracing::{debug, info, warn};

use crate::{
  Generation,
  scoring::ScoringClient,
  store::{LoadEpoch, Snapshot},
};

// ─── Metrics ─────────────────────────────────────────────────────────────────

/// Summary figures over one application set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateMetrics {
  pub total:             usize,
  pub resolved:          usize,
  pub pending:           usize,
  pub unavailable:       usize,
  /// Number of distinct postings the set spans.
  pub distinct_postings: usize,
  /// Mean of the numeric scores; `None` when there are none.
  pub average:           Option<f64>,
}

impl AggregateMetrics {
  /// Compute metrics for `applications`. Ids missing from `scores` count as
  /// pending. Only numeric scores contribute to the average.
  pub fn compute(
    applications: &[Application],
    scores: &HashMap<ApplicationId, MatchScore>,
  ) -> Self {
    let mut metrics = Self {
      total: applications.len(),
      distinct_postings: applications
        .iter()
        .map(|a| &a.posting_id)
        .collect::<HashSet<_>>()
        .len(),
      ..Self::default()
    };

    let mut sum = 0.0;
    for app in applications {
      match scores.get(&app.id).copied().unwrap_or_default() {
        MatchScore::Numeric(v) => {
          metrics.resolved += 1;
          sum += v;
        }
        MatchScore::Pending => metrics.pending += 1,
        MatchScore::Unavailable => metrics.unavailable += 1,
      }
    }
    if metrics.resolved > 0 {
      metrics.average = Some(sum / metrics.resolved as f64);
    }
    metrics
  }

  /// The average to one decimal place, or `N/A`.
  pub fn average_label(&self) -> String {
    match self.average {
      Some(avg) => format!("{avg:.1}"),
      None => "N/A".to_string(),
    }
  }
}

// ─── Aggregator ──────────────────────────────────────────────────────────────

/// What happened to a batch once it settled.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchOutcome {
  /// Results were merged; these are the new metrics.
  Applied(AggregateMetrics),
  /// A newer load was issued before or while the batch ran; nothing was
  /// merged.
  Stale {
    batch:   Generation,
    current: Generation,
  },
}

#[derive(Default)]
struct ScoreState {
  generation:   Generation,
  applications: Vec<Application>,
  scores:       HashMap<ApplicationId, MatchScore>,
  /// Reason for the last failed fetch, per application.
  failures:     HashMap<ApplicationId, String>,
  metrics:      AggregateMetrics,
}

impl ScoreState {
  /// Switch to `snapshot`, keeping numeric scores for ids that survive and
  /// marking everything else pending. Returns the ids that need a fetch.
  fn adopt(&mut self, snapshot: &Snapshot) -> Vec<ApplicationId> {
    self.generation = snapshot.generation;
    self.applications = snapshot.applications.clone();

    let previous = std::mem::take(&mut self.scores);
    let mut targets = Vec::new();
    for id in snapshot.ids() {
      match previous.get(&id) {
        Some(score @ MatchScore::Numeric(_)) => {
          self.scores.insert(id, *score);
        }
        _ => {
          self.scores.insert(id, MatchScore::Pending);
          targets.push(id);
        }
      }
    }
    self.failures.retain(|id, _| self.scores.contains_key(id));
    targets
  }

  fn merge(&mut self, id: ApplicationId, result: Result<MatchScore, crate::ScoreFetchError>) {
    match result {
      Ok(score) => {
        self.scores.insert(id, score);
        self.failures.remove(&id);
      }
      Err(e) => {
        warn!(%id, error = %e, "score fetch failed");
        self.scores.insert(id, MatchScore::Unavailable);
        self.failures.insert(id, e.to_string());
      }
    }
  }

  fn recompute(&mut self) -> AggregateMetrics {
    self.metrics = AggregateMetrics::compute(&self.applications, &self.scores);
    self.metrics.clone()
  }
}

pub struct ScoreAggregator<B> {
  scorer: ScoringClient<B>,
  epoch:  LoadEpoch,
  state:  Mutex<ScoreState>,
}

impl<B: PortalBackend> ScoreAggregator<B> {
  pub fn new(scorer: ScoringClient<B>, epoch: LoadEpoch) -> Self {
    Self {
      scorer,
      epoch,
      state: Mutex::default(),
    }
  }

  fn is_stale(&self, state: &ScoreState, batch: Generation) -> bool {
    batch < state.generation || !self.epoch.is_current(batch)
  }

  /// Score every unresolved application in `snapshot`.
  ///
  /// A snapshot from anything but the latest issued load is ignored
  /// outright.
  pub async fn refresh(&self, snapshot: &Snapshot) -> BatchOutcome {
    let batch = snapshot.generation;
    let targets = {
      let mut state = self.lock();
      if self.is_stale(&state, batch) {
        return BatchOutcome::Stale {
          batch,
          current: self.epoch.current(),
        };
      }
      state.adopt(snapshot)
    };
    debug!(generation = %batch, count = targets.len(), "score batch started");

    let results = join_all(targets.iter().map(|&id| {
      let scorer = &self.scorer;
      async move { (id, scorer.try_fetch(id).await) }
    }))
    .await;

    let mut state = self.lock();
    if state.generation != batch || !self.epoch.is_current(batch) {
      let current = self.epoch.current();
      warn!(generation = %batch, %current, "discarding stale score batch");
      return BatchOutcome::Stale { batch, current };
    }
    for (id, result) in results {
      state.merge(id, result);
    }
    let metrics = state.recompute();
    info!(
      generation = %batch,
      total = metrics.total,
      unavailable = metrics.unavailable,
      average = %metrics.average_label(),
      "scores aggregated"
    );
    BatchOutcome::Applied(metrics)
  }

  /// Fetch one score again, overwriting the cached value. Metrics are
  /// recomputed when it lands. Returns `None` if `id` is not in the adopted
  /// set or the set changed while the fetch was in flight.
  pub async fn rescore(&self, id: ApplicationId) -> Option<MatchScore> {
    let generation = {
      let state = self.lock();
      if !state.scores.contains_key(&id) {
        return None;
      }
      state.generation
    };

    let result = self.scorer.try_fetch(id).await;

    let mut state = self.lock();
    if state.generation != generation || !self.epoch.is_current(generation) {
      return None;
    }
    state.merge(id, result);
    state.recompute();
    state.scores.get(&id).copied()
  }

  /// Forget every score and metric after the load `generation` failed.
  /// Ignored if a newer snapshot has already been adopted.
  pub fn clear(&self, generation: Generation) {
    let mut state = self.lock();
    if generation < state.generation {
      return;
    }
    debug!(%generation, "clearing scores after failed load");
    *state = ScoreState {
      generation,
      ..ScoreState::default()
    };
  }

  /// The cached score for `id`; [`MatchScore::Pending`] if none is known.
  pub fn score(&self, id: ApplicationId) -> MatchScore {
    self.lock().scores.get(&id).copied().unwrap_or_default()
  }

  pub fn scores(&self) -> HashMap<ApplicationId, MatchScore> { self.lock().scores.clone() }

  pub fn failure(&self, id: ApplicationId) -> Option<String> {
    self.lock().failures.get(&id).cloned()
  }

  /// Metrics as of the last settled batch.
  pub fn metrics(&self) -> AggregateMetrics { self.lock().metrics.clone() }

  pub fn generation(&self) -> Generation { self.lock().generation }

  fn lock(&self) -> MutexGuard<'_, ScoreState> {
    self.state.lock().unwrap_or_else(PoisonError::into_inner)
  }
}
