//! One session's dashboard: the components wired to a shared backend.

use std::sync::Arc;

use portal_core::{
  application::{Application, ApplicationId, ApplicationStatus},
  backend::PortalBackend,
  posting::PostingId,
  resume::{DEFAULT_MAX_RESUME_BYTES, ResumeUpload},
  session::{Session, ViewerRole},
};
use tracing::warn;

use crate::{
  LoadError, SubmitError, WorkflowError,
  aggregate::{AggregateMetrics, BatchOutcome, ScoreAggregator},
  postings::Postings,
  projection::{Page, ViewState},
  scoring::ScoringClient,
  store::{ApplicationStore, Snapshot},
  submit::Submitter,
  workflow::StatusWorkflow,
};

#[derive(Debug, Clone)]
pub struct DashboardConfig {
  pub max_resume_bytes: usize,
}

impl Default for DashboardConfig {
  fn default() -> Self {
    Self {
      max_resume_bytes: DEFAULT_MAX_RESUME_BYTES,
    }
  }
}

pub struct Dashboard<B> {
  session:   Session,
  store:     Arc<ApplicationStore<B>>,
  scores:    ScoreAggregator<B>,
  workflow:  StatusWorkflow<B>,
  submitter: Submitter<B>,
  postings:  Postings<B>,
}

impl<B: PortalBackend> Dashboard<B> {
  pub fn new(backend: Arc<B>, session: Session, config: DashboardConfig) -> Self {
    let role = session.role;
    let store = Arc::new(ApplicationStore::new(Arc::clone(&backend), role));
    Self {
      scores: ScoreAggregator::new(ScoringClient::new(Arc::clone(&backend)), store.epoch()),
      workflow: StatusWorkflow::new(Arc::clone(&backend), Arc::clone(&store), role),
      submitter: Submitter::new(Arc::clone(&backend), role, config.max_resume_bytes),
      postings: Postings::new(backend, role),
      store,
      session,
    }
  }

  pub fn session(&self) -> &Session { &self.session }

  pub fn role(&self) -> ViewerRole { self.session.role }

  /// Load the application set without scoring it.
  ///
  /// A failed load empties the scores and metrics along with the store.
  pub async fn load(&self) -> Result<Snapshot, LoadError> {
    match self.store.load().await {
      Ok(snapshot) => {
        self.workflow.forget_settled();
        Ok(snapshot)
      }
      Err(e) => {
        if let LoadError::Backend { generation, .. } = &e {
          self.scores.clear(*generation);
        }
        Err(e)
      }
    }
  }

  /// Load the application set, then score it.
  pub async fn reload(&self) -> Result<BatchOutcome, LoadError> {
    let snapshot = self.load().await?;
    Ok(self.scores.refresh(&snapshot).await)
  }

  /// Change one application's status. Scores are left alone.
  pub async fn change_status(
    &self,
    id: ApplicationId,
    status: ApplicationStatus,
  ) -> Result<Application, WorkflowError> {
    self.workflow.request_status_change(id, status).await
  }

  pub fn revert(&self, id: ApplicationId) -> Result<Application, WorkflowError> {
    self.workflow.revert(id)
  }

  /// Submit a resume, then reload so the new application shows up.
  ///
  /// A failed reload is logged; the submission itself has already succeeded.
  pub async fn apply(
    &self,
    posting: PostingId,
    resume: ResumeUpload,
  ) -> Result<ApplicationId, SubmitError> {
    let id = self.submitter.submit_to(posting, resume).await?;
    if let Err(e) = self.reload().await {
      warn!(%id, error = %e, "reload after submission failed");
    }
    Ok(id)
  }

  pub fn page(&self, view: &ViewState) -> Page {
    view.project(&self.store.applications(), &self.scores.scores(), self.role())
  }

  pub fn metrics(&self) -> AggregateMetrics { self.scores.metrics() }

  pub fn store(&self) -> &ApplicationStore<B> { &self.store }

  pub fn scores(&self) -> &ScoreAggregator<B> { &self.scores }

  pub fn workflow(&self) -> &StatusWorkflow<B> { &self.workflow }

  pub fn submitter(&self) -> &Submitter<B> { &self.submitter }

  pub fn postings(&self) -> &Postings<B> { &self.postings }
}
