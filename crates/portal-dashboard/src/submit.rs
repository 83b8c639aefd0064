//! Candidate resume submission.

use std::sync::Arc;

use portal_core::{
  application::ApplicationId,
  backend::PortalBackend,
  posting::{JobPosting, PostingId},
  resume::ResumeUpload,
  session::ViewerRole,
};
use tracing::info;

use crate::SubmitError;

pub struct Submitter<B> {
  backend:          Arc<B>,
  role:             ViewerRole,
  max_resume_bytes: usize,
}

impl<B: PortalBackend> Submitter<B> {
  pub fn new(backend: Arc<B>, role: ViewerRole, max_resume_bytes: usize) -> Self {
    Self {
      backend,
      role,
      max_resume_bytes,
    }
  }

  /// Submit `resume` against an already-fetched posting.
  ///
  /// Role, resume and posting checks all run locally; a rejected submission
  /// never reaches the backend.
  pub async fn submit(
    &self,
    posting: &JobPosting,
    resume: ResumeUpload,
  ) -> Result<ApplicationId, SubmitError> {
    self.check(&resume)?;
    posting.ensure_open()?;
    self.send(posting.id.clone(), resume).await
  }

  /// Submit by posting id. The resume is validated before the posting is
  /// looked up.
  pub async fn submit_to(
    &self,
    posting: PostingId,
    resume: ResumeUpload,
  ) -> Result<ApplicationId, SubmitError> {
    self.check(&resume)?;
    let found = self
      .backend
      .get_posting(posting.clone())
      .await
      .map_err(|e| SubmitError::Backend(Box::new(e)))?
      .ok_or(SubmitError::UnknownPosting(posting))?;
    found.ensure_open()?;
    self.send(found.id, resume).await
  }

  fn check(&self, resume: &ResumeUpload) -> Result<(), SubmitError> {
    if !self.role.can_apply() {
      return Err(SubmitError::Forbidden { role: self.role });
    }
    resume.validate(self.max_resume_bytes)?;
    Ok(())
  }

  async fn send(&self, posting: PostingId, resume: ResumeUpload) -> Result<ApplicationId, SubmitError> {
    let filename = resume.filename.clone();
    let id = self
      .backend
      .submit_application(posting.clone(), resume)
      .await
      .map_err(|e| SubmitError::Backend(Box::new(e)))?;
    info!(%id, %posting, %filename, "application submitted");
    Ok(id)
  }
}
