//! Client-side application lifecycle for the job portal.
//!
//! The pieces here sit between a [`PortalBackend`] and whatever renders the
//! dashboard:
//!
//! - [`store::ApplicationStore`] owns the loaded application set.
//! - [`aggregate::ScoreAggregator`] fans out score fetches and recomputes
//!   summary metrics once a batch settles.
//! - [`workflow::StatusWorkflow`] applies recruiter status changes
//!   optimistically and tracks their confirmation.
//! - [`projection`] filters and paginates for display.
//! - [`submit::Submitter`] validates and sends candidate resumes.
//! - [`postings::Postings`] gates posting management on the viewer's role.
//!
//! [`Dashboard`] wires them together for one session.
//!
//! [`PortalBackend`]: portal_core::backend::PortalBackend

pub mod aggregate;
pub mod dashboard;
pub mod error;
pub mod postings;
pub mod projection;
pub mod scoring;
pub mod store;
pub mod submit;
pub mod workflow;

pub use dashboard::{Dashboard, DashboardConfig};
pub use error::{
  ConcurrentUpdateError, LoadError, PostingError, ScoreFetchError, StatusUpdateError, SubmitError,
  WorkflowError,
};
pub use store::{Generation, LoadEpoch};

#[cfg(test)]
mod tests;
