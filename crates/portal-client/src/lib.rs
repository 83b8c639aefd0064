//! HTTP transport for the job portal.
//!
//! [`HttpBackend`] implements [`portal_core::backend::PortalBackend`] against
//! the portal's JSON REST API using `reqwest`. Establishing a session (login)
//! lives in [`auth`].

pub mod auth;
pub mod client;
pub mod error;

pub use client::{ApiConfig, HttpBackend};
pub use error::{ClientError, Result};
