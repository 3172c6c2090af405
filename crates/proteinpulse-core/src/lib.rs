//! Protein Pulse core library.
//!
//! Offline-first data access for a protein intake tracker. The
//! [`Repository`](repository::Repository) is the entry point: it reads and
//! writes user profiles, saved foods, daily logs and daily goals, keeping a
//! local on-disk copy of everything and syncing with a remote backend when
//! one is configured and a user is signed in.

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod models;
pub mod repository;

pub use repository::{Propagation, Repository, SyncReport};
