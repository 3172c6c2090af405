//! Local durable store for offline data access.
//!
//! This module provides the `LocalStore` for keeping the last-known state
//! of each user's data on disk. Every value is written as its own JSON file
//! inside a per-user namespace directory, so signing in as someone else on
//! the same device never surfaces the previous user's data.
//!
//! Stored data types include:
//! - User profile
//! - Saved shortcuts
//! - Daily logs and daily goals, one file per date
//! - The outbox of remote writes waiting to be replayed

pub mod manager;
pub mod outbox;

pub use manager::{CacheAges, CachedData, LocalStore, NamespaceStore, GUEST_NAMESPACE};
pub use outbox::{PendingWrite, RemoteOp};
