//! The loaded application set for one session.
//!
//! Every call to [`ApplicationStore::load`] advances a shared [`LoadEpoch`]
//! before it touches the network. Work derived from a snapshot (score batches
//! in particular) carries the generation it was started for and compares it
//! against the epoch, so results that arrive after a newer load was issued can
//! be recognised and dropped.

use std::{
  collections::HashMap,
  fmt,
  sync::{
    Arc, Mutex, MutexGuard, PoisonError,
    atomic::{AtomicU64, Ordering},
  },
};

use portal_core::{
  application::{Application, ApplicationId, ApplicationStatus},
  backend::PortalBackend,
  session::ViewerRole,
};
use tracing::{debug, warn};

use crate::LoadError;

/// Monotonic load counter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl fmt::Display for Generation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "#{}", self.0) }
}

/// The most recently issued load, shared between the store and anything that
/// must notice a newer load before that load has finished.
#[derive(Debug, Clone, Default)]
pub struct LoadEpoch(Arc<AtomicU64>);

impl LoadEpoch {
  pub fn current(&self) -> Generation { Generation(self.0.load(Ordering::SeqCst)) }

  /// Whether `generation` is still the latest issued load.
  pub fn is_current(&self, generation: Generation) -> bool { self.current() == generation }

  fn advance(&self) -> Generation { Generation(self.0.fetch_add(1, Ordering::SeqCst) + 1) }
}

/// An immutable copy of the set as of one load.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
  pub generation:   Generation,
  pub applications: Vec<Application>,
}

impl Snapshot {
  pub fn ids(&self) -> impl Iterator<Item = ApplicationId> + '_ {
    self.applications.iter().map(|a| a.id)
  }
}

#[derive(Default)]
struct StoreState {
  applications: Vec<Application>,
  index:        HashMap<ApplicationId, usize>,
}

impl StoreState {
  fn replace(&mut self, incoming: Vec<Application>) {
    self.applications.clear();
    self.index.clear();
    for app in incoming {
      match self.index.get(&app.id) {
        // Duplicate id: first position, last content.
        Some(&pos) => self.applications[pos] = app,
        None => {
          self.index.insert(app.id, self.applications.len());
          self.applications.push(app);
        }
      }
    }
  }
}

pub struct ApplicationStore<B> {
  backend: Arc<B>,
  role:    ViewerRole,
  epoch:   LoadEpoch,
  state:   Mutex<StoreState>,
}

impl<B: PortalBackend> ApplicationStore<B> {
  pub fn new(backend: Arc<B>, role: ViewerRole) -> Self {
    Self {
      backend,
      role,
      epoch: LoadEpoch::default(),
      state: Mutex::default(),
    }
  }

  pub fn role(&self) -> ViewerRole { self.role }

  /// A handle on the load counter, for consumers of snapshots.
  pub fn epoch(&self) -> LoadEpoch { self.epoch.clone() }

  /// Fetch the role-appropriate set and replace the local one.
  ///
  /// On failure the set is cleared rather than left stale. If another load
  /// began while this one was in flight, this result is discarded and
  /// [`LoadError::Superseded`] is returned.
  pub async fn load(&self) -> Result<Snapshot, LoadError> {
    let generation = self.epoch.advance();
    debug!(%generation, role = %self.role, "loading applications");

    let result = self.backend.list_applications(self.role).await;

    let mut state = self.lock();
    let current = self.epoch.current();
    if current != generation {
      debug!(%generation, %current, "discarding superseded load");
      return Err(LoadError::Superseded {
        generation,
        current,
      });
    }

    match result {
      Ok(applications) => {
        state.replace(applications);
        debug!(%generation, count = state.applications.len(), "applications loaded");
        Ok(Snapshot {
          generation,
          applications: state.applications.clone(),
        })
      }
      Err(e) => {
        warn!(%generation, error = %e, "application load failed; clearing local set");
        state.replace(Vec::new());
        Err(LoadError::Backend {
          role: self.role,
          generation,
          source: Box::new(e),
        })
      }
    }
  }

  /// Replace one row's status in place. Returns the updated row, or `None`
  /// if the id is not in the current set.
  pub fn apply_status_update(
    &self,
    id: ApplicationId,
    status: ApplicationStatus,
  ) -> Option<Application> {
    let mut state = self.lock();
    let pos = *state.index.get(&id)?;
    let app = &mut state.applications[pos];
    app.status = status;
    Some(app.clone())
  }

  pub fn get(&self, id: ApplicationId) -> Option<Application> {
    let state = self.lock();
    state
      .index
      .get(&id)
      .map(|&pos| state.applications[pos].clone())
  }

  pub fn applications(&self) -> Vec<Application> { self.lock().applications.clone() }

  pub fn snapshot(&self) -> Snapshot {
    let state = self.lock();
    Snapshot {
      generation:   self.epoch.current(),
      applications: state.applications.clone(),
    }
  }

  pub fn generation(&self) -> Generation { self.epoch.current() }

  pub fn len(&self) -> usize { self.lock().applications.len() }

  pub fn is_empty(&self) -> bool { self.len() == 0 }

  fn lock(&self) -> MutexGuard<'_, StoreState> {
    self.state.lock().unwrap_or_else(PoisonError::into_inner)
  }
}
