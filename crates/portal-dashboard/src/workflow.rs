//! Recruiter status changes: optimistic local update, then server
//! confirmation.
//!
//! Each application has at most one change awaiting confirmation. While it is
//! pending, further requests for that application are refused with
//! [`ConcurrentUpdateError`]. A change that fails, or whose future is dropped
//! before the server answers, is recorded as [`ChangeState::Failed`] and the
//! row keeps its optimistic status until [`StatusWorkflow::revert`] or the
//! next reload.

use std::{
  collections::HashMap,
  sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use portal_core::{
  application::{Application, ApplicationId, ApplicationStatus},
  backend::PortalBackend,
  session::ViewerRole,
};
use tracing::{debug, info, warn};

use crate::{ConcurrentUpdateError, StatusUpdateError, WorkflowError, store::ApplicationStore};

/// Confirmation state of the most recent change to one application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeState {
  Pending {
    previous: ApplicationStatus,
    target:   ApplicationStatus,
  },
  Confirmed {
    status: ApplicationStatus,
  },
  /// The local row shows `attempted`; the server may still hold `previous`.
  Failed {
    previous:  ApplicationStatus,
    attempted: ApplicationStatus,
    reason:    String,
  },
}

impl ChangeState {
  pub fn is_pending(&self) -> bool { matches!(self, Self::Pending { .. }) }

  pub fn is_failed(&self) -> bool { matches!(self, Self::Failed { .. }) }
}

type Changes = Mutex<HashMap<ApplicationId, ChangeState>>;

fn lock(changes: &Changes) -> MutexGuard<'_, HashMap<ApplicationId, ChangeState>> {
  changes.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Marks a pending change. Dropping it unsettled records the change as
/// failed, which covers futures cancelled mid-request.
struct InFlight<'a> {
  changes:  &'a Changes,
  id:       ApplicationId,
  previous: ApplicationStatus,
  target:   ApplicationStatus,
  settled:  bool,
}

impl InFlight<'_> {
  fn settle(mut self, state: ChangeState) {
    lock(self.changes).insert(self.id, state);
    self.settled = true;
  }

  fn abandon(mut self) {
    lock(self.changes).remove(&self.id);
    self.settled = true;
  }
}

impl Drop for InFlight<'_> {
  fn drop(&mut self) {
    if self.settled {
      return;
    }
    warn!(id = %self.id, attempted = %self.target, "status change cancelled before confirmation");
    lock(self.changes).insert(self.id, ChangeState::Failed {
      previous:  self.previous,
      attempted: self.target,
      reason:    "cancelled before the server confirmed".to_string(),
    });
  }
}

pub struct StatusWorkflow<B> {
  backend: Arc<B>,
  store:   Arc<ApplicationStore<B>>,
  role:    ViewerRole,
  changes: Changes,
}

impl<B: PortalBackend> StatusWorkflow<B> {
  pub fn new(backend: Arc<B>, store: Arc<ApplicationStore<B>>, role: ViewerRole) -> Self {
    Self {
      backend,
      store,
      role,
      changes: Mutex::default(),
    }
  }

  /// Move application `id` to `target`.
  ///
  /// Checks run before anything changes locally or goes over the wire: the
  /// viewer must be a recruiter, the application must be loaded, the
  /// transition must be legal, and no other change to it may be pending. The
  /// row is then updated optimistically and the change sent to the server.
  pub async fn request_status_change(
    &self,
    id: ApplicationId,
    target: ApplicationStatus,
  ) -> Result<Application, WorkflowError> {
    if !self.role.can_review() {
      return Err(WorkflowError::Forbidden { role: self.role });
    }
    let current = self.store.get(id).ok_or(WorkflowError::NotFound(id))?.status;
    current
      .transition(target)
      .map_err(|_| WorkflowError::InvalidTransition {
        id,
        from: current,
        to: target,
      })?;

    let in_flight = self.begin(id, current, target)?;
    let previous = in_flight.previous;
    let Some(optimistic) = self.store.apply_status_update(id, target) else {
      in_flight.abandon();
      return Err(WorkflowError::NotFound(id));
    };
    debug!(%id, from = %current, to = %target, "status change sent");

    match self.backend.update_status(id, target).await {
      Ok(confirmed) => {
        let app = if confirmed == target {
          self.store.get(id)
        } else {
          warn!(%id, requested = %target, %confirmed, "server recorded a different status");
          self.store.apply_status_update(id, confirmed)
        };
        in_flight.settle(ChangeState::Confirmed { status: confirmed });
        info!(%id, status = %confirmed, "status change confirmed");
        Ok(app.unwrap_or(optimistic))
      }
      Err(e) => {
        warn!(%id, attempted = %target, error = %e, "status change not confirmed");
        in_flight.settle(ChangeState::Failed {
          previous,
          attempted: target,
          reason: e.to_string(),
        });
        Err(
          StatusUpdateError {
            id,
            previous,
            attempted: target,
            source: Box::new(e),
          }
          .into(),
        )
      }
    }
  }

  /// Restore the pre-change status of a failed change.
  pub fn revert(&self, id: ApplicationId) -> Result<Application, WorkflowError> {
    let mut changes = lock(&self.changes);
    let previous = match changes.get(&id) {
      Some(ChangeState::Failed { previous, .. }) => *previous,
      _ => return Err(WorkflowError::NothingToRevert(id)),
    };
    let app = self
      .store
      .apply_status_update(id, previous)
      .ok_or(WorkflowError::NotFound(id))?;
    changes.remove(&id);
    info!(%id, status = %previous, "failed status change reverted");
    Ok(app)
  }

  pub fn change_state(&self, id: ApplicationId) -> Option<ChangeState> {
    lock(&self.changes).get(&id).cloned()
  }

  /// Applications whose local status may differ from the server's.
  pub fn diverged(&self) -> Vec<ApplicationId> {
    let mut ids: Vec<_> = lock(&self.changes)
      .iter()
      .filter(|(_, state)| state.is_failed())
      .map(|(id, _)| *id)
      .collect();
    ids.sort();
    ids
  }

  /// Drop settled states after a reload has brought fresh server data.
  /// Pending changes are kept.
  pub fn forget_settled(&self) { lock(&self.changes).retain(|_, state| state.is_pending()); }

  /// Claim the in-flight slot for `id`. The recorded `previous` is the last
  /// status the server is known to hold: after an unconfirmed change the
  /// local row shows that change's target, so the failed change's own
  /// `previous` carries forward instead.
  fn begin(
    &self,
    id: ApplicationId,
    current: ApplicationStatus,
    target: ApplicationStatus,
  ) -> Result<InFlight<'_>, ConcurrentUpdateError> {
    let mut changes = lock(&self.changes);
    let previous = match changes.get(&id) {
      Some(ChangeState::Pending { .. }) => return Err(ConcurrentUpdateError { id }),
      Some(ChangeState::Failed { previous, .. }) => *previous,
      _ => current,
    };
    changes.insert(id, ChangeState::Pending { previous, target });
    Ok(InFlight {
      changes: &self.changes,
      id,
      previous,
      target,
      settled: false,
    })
  }
}
