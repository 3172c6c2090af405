//! The single data-access façade the rest of the application calls.
//!
//! A `Repository` is built once as one of two variants:
//!
//! - **Local-Only**, when no remote backend is configured: every call goes
//!   straight to the local store.
//! - **Remote-Backed**: reads try the remote first and mirror successful
//!   results into the local store; writes land locally first and are then
//!   propagated, with retryable failures kept in an outbox.
//!
//! Both variants expose the same operations and neither ever returns an
//! error: degraded connectivity only shows up as staler data and as the
//! `Propagation` status of writes.

mod local;
mod mirror;
mod outbox;
mod remote;

use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDate;
use tracing::info;

use crate::api::{RemoteService, RestClient};
use crate::auth::SessionSource;
use crate::cache::{CacheAges, LocalStore};
use crate::config::Config;
use crate::models::{DailyGoal, DailyLog, IntakeEntry, ProfilePatch, SavedShortcut, UserProfile};

pub use local::LocalRepository;
pub use outbox::SyncReport;
pub use remote::RemoteRepository;

/// What happened to a write beyond the local store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Propagation {
    /// Stored locally only: no remote configured, or nobody signed in.
    LocalOnly,
    /// Stored locally and accepted by the remote service.
    Synced,
    /// Stored locally; the remote write is waiting in the outbox.
    Queued,
    /// Stored locally; the remote service refused the write.
    Rejected,
    /// Nothing matched locally and no remote was told: a delete of an
    /// unknown record while no remote write was possible.
    Unchanged,
}

impl std::fmt::Display for Propagation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Propagation::LocalOnly => write!(f, "saved locally"),
            Propagation::Synced => write!(f, "synced"),
            Propagation::Queued => write!(f, "saved locally, sync pending"),
            Propagation::Rejected => write!(f, "saved locally, rejected by server"),
            Propagation::Unchanged => write!(f, "not found locally, nothing changed"),
        }
    }
}

pub enum Repository {
    LocalOnly(LocalRepository),
    RemoteBacked(RemoteRepository),
}

impl Repository {
    /// Pick the variant from whether a remote service is available
    pub fn new(
        store: LocalStore,
        remote: Option<Arc<dyn RemoteService>>,
        sessions: Arc<dyn SessionSource>,
    ) -> Self {
        match remote {
            Some(remote) => Repository::RemoteBacked(RemoteRepository::new(store, remote, sessions)),
            None => Repository::LocalOnly(LocalRepository::new(store)),
        }
    }

    /// Build from configuration: the local store lives in the data directory
    /// and a `RestClient` is used when a remote backend is configured.
    pub fn from_config(config: &Config, sessions: Arc<dyn SessionSource>) -> Result<Self> {
        let store = LocalStore::new(config.data_dir()?)?;
        let remote: Option<Arc<dyn RemoteService>> = match config.remote() {
            Some(remote) => Some(Arc::new(RestClient::new(&remote.url, &remote.anon_key)?)),
            None => None,
        };
        info!(remote = remote.is_some(), data_dir = %store.root().display(), "Repository configured");
        Ok(Self::new(store, remote, sessions))
    }

    pub fn is_remote_backed(&self) -> bool {
        matches!(self, Repository::RemoteBacked(_))
    }

    /// Local store namespace used by the next call
    pub fn namespace(&self) -> String {
        match self {
            Repository::LocalOnly(repo) => repo.namespace(),
            Repository::RemoteBacked(repo) => repo.namespace(),
        }
    }

    pub fn cache_ages(&self) -> CacheAges {
        match self {
            Repository::LocalOnly(repo) => repo.cache_ages(),
            Repository::RemoteBacked(repo) => repo.cache_ages(),
        }
    }

    // ===== Profile =====

    pub async fn get_user_profile(&self) -> UserProfile {
        match self {
            Repository::LocalOnly(repo) => repo.get_user_profile(),
            Repository::RemoteBacked(repo) => repo.get_user_profile().await,
        }
    }

    pub async fn update_user_profile(&self, patch: &ProfilePatch) -> Propagation {
        match self {
            Repository::LocalOnly(repo) => repo.update_user_profile(patch),
            Repository::RemoteBacked(repo) => repo.update_user_profile(patch).await,
        }
    }

    pub async fn reset_user_profile(&self) -> Propagation {
        match self {
            Repository::LocalOnly(repo) => repo.reset_user_profile(),
            Repository::RemoteBacked(repo) => repo.reset_user_profile().await,
        }
    }

    // ===== Saved Shortcuts =====

    pub async fn get_saved_shortcuts(&self) -> Vec<SavedShortcut> {
        match self {
            Repository::LocalOnly(repo) => repo.get_saved_shortcuts(),
            Repository::RemoteBacked(repo) => repo.get_saved_shortcuts().await,
        }
    }

    pub async fn add_saved_shortcut(&self, shortcut: &SavedShortcut) -> Propagation {
        match self {
            Repository::LocalOnly(repo) => repo.add_saved_shortcut(shortcut),
            Repository::RemoteBacked(repo) => repo.add_saved_shortcut(shortcut).await,
        }
    }

    pub async fn delete_saved_shortcut(&self, id: &str) -> Propagation {
        match self {
            Repository::LocalOnly(repo) => repo.delete_saved_shortcut(id),
            Repository::RemoteBacked(repo) => repo.delete_saved_shortcut(id).await,
        }
    }

    // ===== Daily Logs =====

    pub async fn get_daily_log(&self, date: NaiveDate) -> DailyLog {
        match self {
            Repository::LocalOnly(repo) => repo.get_daily_log(date),
            Repository::RemoteBacked(repo) => repo.get_daily_log(date).await,
        }
    }

    pub async fn add_intake_entry(&self, entry: &IntakeEntry) -> Propagation {
        match self {
            Repository::LocalOnly(repo) => repo.add_intake_entry(entry),
            Repository::RemoteBacked(repo) => repo.add_intake_entry(entry).await,
        }
    }

    pub async fn delete_intake_entry(&self, date: NaiveDate, id: &str) -> Propagation {
        match self {
            Repository::LocalOnly(repo) => repo.delete_intake_entry(date, id),
            Repository::RemoteBacked(repo) => repo.delete_intake_entry(date, id).await,
        }
    }

    // ===== Daily Goals =====

    pub async fn get_daily_goal(&self, date: NaiveDate) -> Option<DailyGoal> {
        match self {
            Repository::LocalOnly(repo) => repo.get_daily_goal(date),
            Repository::RemoteBacked(repo) => repo.get_daily_goal(date).await,
        }
    }

    pub async fn set_daily_goal(&self, goal: &DailyGoal) -> Propagation {
        match self {
            Repository::LocalOnly(repo) => repo.set_daily_goal(goal),
            Repository::RemoteBacked(repo) => repo.set_daily_goal(goal).await,
        }
    }

    /// Target for `date`: its daily goal if one is set, else the profile default
    pub async fn target_for(&self, date: NaiveDate) -> f64 {
        match self.get_daily_goal(date).await {
            Some(goal) => goal.target,
            None => self.get_user_profile().await.daily_target,
        }
    }

    // ===== Outbox =====

    pub fn pending_writes(&self) -> usize {
        match self {
            Repository::LocalOnly(_) => 0,
            Repository::RemoteBacked(repo) => repo.pending_writes(),
        }
    }

    /// Replay queued remote writes for the signed-in user
    pub async fn sync_pending(&self) -> SyncReport {
        match self {
            Repository::LocalOnly(_) => SyncReport::default(),
            Repository::RemoteBacked(repo) => repo.sync_pending().await,
        }
    }
}
