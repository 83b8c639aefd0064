//! Core types and trait definitions for the job portal client.
//!
//! This crate is deliberately free of HTTP dependencies. The dashboard and the
//! HTTP backend both depend on it; it depends on nothing portal-specific.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod application;
pub mod backend;
pub mod error;
pub mod posting;
pub mod resume;
pub mod score;
pub mod session;

pub use error::{Error, Result, ValidationError};
