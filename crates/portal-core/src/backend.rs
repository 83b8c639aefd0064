//! The `PortalBackend` trait: every remote operation the client consumes.
//!
//! The trait is implemented by transports (e.g. `portal-client`'s HTTP
//! backend). The dashboard depends on this abstraction, not on any concrete
//! transport, so it can be exercised against in-memory fakes.

use std::future::Future;

use crate::{
  application::{Application, ApplicationId, ApplicationStatus},
  posting::{JobPosting, NewPosting, PostingId},
  resume::ResumeUpload,
  score::ScoreReport,
  session::ViewerRole,
};

/// Abstraction over the job portal API, scoped to one authenticated session.
///
/// All methods return `Send` futures so implementations can be shared across
/// tasks. The backend is the source of truth; nothing here is cached.
pub trait PortalBackend: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Applications ──────────────────────────────────────────────────────

  /// List the applications visible to `role`: a candidate's own submissions,
  /// or every application across a recruiter's postings.
  fn list_applications(
    &self,
    role: ViewerRole,
  ) -> impl Future<Output = Result<Vec<Application>, Self::Error>> + Send + '_;

  /// Fetch the match score for one application.
  fn fetch_score(
    &self,
    id: ApplicationId,
  ) -> impl Future<Output = Result<ScoreReport, Self::Error>> + Send + '_;

  /// Persist a status change. Returns the status the server recorded.
  fn update_status(
    &self,
    id: ApplicationId,
    status: ApplicationStatus,
  ) -> impl Future<Output = Result<ApplicationStatus, Self::Error>> + Send + '_;

  /// Submit a resume against a posting, returning the new application's id.
  fn submit_application(
    &self,
    posting: PostingId,
    resume: ResumeUpload,
  ) -> impl Future<Output = Result<ApplicationId, Self::Error>> + Send + '_;

  // ── Postings ──────────────────────────────────────────────────────────

  fn list_postings(
    &self,
  ) -> impl Future<Output = Result<Vec<JobPosting>, Self::Error>> + Send + '_;

  /// Returns `None` if the posting does not exist.
  fn get_posting(
    &self,
    id: PostingId,
  ) -> impl Future<Output = Result<Option<JobPosting>, Self::Error>> + Send + '_;

  fn create_posting(
    &self,
    posting: NewPosting,
  ) -> impl Future<Output = Result<JobPosting, Self::Error>> + Send + '_;

  fn update_posting(
    &self,
    id: PostingId,
    posting: NewPosting,
  ) -> impl Future<Output = Result<JobPosting, Self::Error>> + Send + '_;

  fn delete_posting(
    &self,
    id: PostingId,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
