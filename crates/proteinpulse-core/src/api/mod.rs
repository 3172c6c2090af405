//! Remote service module for the Protein Pulse backend.
//!
//! This module provides the `RemoteService` trait the repository talks to,
//! and `RestClient`, its implementation against a PostgREST-style HTTP API
//! (profiles, saved foods, food entries and daily goals tables).
//!
//! Requests are authenticated with the project's anon key plus the signed-in
//! user's bearer token. Password sign-in goes through the `/auth/v1` endpoint.

pub mod client;
pub mod error;
pub mod rows;
pub mod service;

pub use client::RestClient;
pub use error::{FailureKind, RemoteError};
pub use service::RemoteService;
