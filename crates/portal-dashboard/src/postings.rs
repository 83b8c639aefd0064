//! Job posting management.
//!
//! Anyone may read postings. Writes are for recruiters, and the role check
//! happens before any request is made.

use std::sync::Arc;

use portal_core::{
  backend::PortalBackend,
  posting::{JobPosting, NewPosting, PostingId, PostingStatus},
  session::ViewerRole,
};
use tracing::info;

use crate::PostingError;

fn backend_err<E: std::error::Error + Send + Sync + 'static>(e: E) -> PostingError {
  PostingError::Backend(Box::new(e))
}

pub struct Postings<B> {
  backend: Arc<B>,
  role:    ViewerRole,
}

impl<B: PortalBackend> Postings<B> {
  pub fn new(backend: Arc<B>, role: ViewerRole) -> Self { Self { backend, role } }

  pub async fn list(&self) -> Result<Vec<JobPosting>, PostingError> {
    self.backend.list_postings().await.map_err(backend_err)
  }

  /// Postings still accepting applications.
  pub async fn open(&self) -> Result<Vec<JobPosting>, PostingError> {
    let mut postings = self.list().await?;
    postings.retain(JobPosting::is_open);
    Ok(postings)
  }

  pub async fn get(&self, id: PostingId) -> Result<JobPosting, PostingError> {
    self
      .backend
      .get_posting(id.clone())
      .await
      .map_err(backend_err)?
      .ok_or(PostingError::NotFound(id))
  }

  pub async fn create(&self, draft: NewPosting) -> Result<JobPosting, PostingError> {
    self.ensure_recruiter()?;
    draft.validate()?;
    let posting = self
      .backend
      .create_posting(draft)
      .await
      .map_err(backend_err)?;
    info!(id = %posting.id, title = %posting.title, "posting created");
    Ok(posting)
  }

  pub async fn update(&self, id: PostingId, draft: NewPosting) -> Result<JobPosting, PostingError> {
    self.ensure_recruiter()?;
    draft.validate()?;
    self
      .backend
      .update_posting(id, draft)
      .await
      .map_err(backend_err)
  }

  /// Stop accepting applications. Closing a closed posting is a no-op.
  pub async fn close(&self, id: PostingId) -> Result<JobPosting, PostingError> {
    self.ensure_recruiter()?;
    let posting = self.get(id.clone()).await?;
    if !posting.is_open() {
      return Ok(posting);
    }
    let draft = NewPosting {
      status: PostingStatus::Closed,
      ..posting.to_draft()
    };
    let closed = self.update(id, draft).await?;
    info!(id = %closed.id, "posting closed");
    Ok(closed)
  }

  pub async fn delete(&self, id: PostingId) -> Result<(), PostingError> {
    self.ensure_recruiter()?;
    self
      .backend
      .delete_posting(id.clone())
      .await
      .map_err(backend_err)?;
    info!(%id, "posting deleted");
    Ok(())
  }

  fn ensure_recruiter(&self) -> Result<(), PostingError> {
    if self.role.can_review() {
      Ok(())
    } else {
      Err(PostingError::Forbidden { role: self.role })
    }
  }
}
