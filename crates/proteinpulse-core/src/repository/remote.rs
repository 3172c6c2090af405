use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::api::{RemoteError, RemoteService};
use crate::auth::{SessionData, SessionSource};
use crate::cache::{CacheAges, LocalStore, NamespaceStore, PendingWrite, RemoteOp};
use crate::models::{DailyGoal, DailyLog, IntakeEntry, ProfilePatch, SavedShortcut, UserProfile};

use super::{local, mirror, outbox, Propagation, SyncReport};

/// Repository variant backed by a remote service, degrading to the local
/// store whenever there is no session or the remote call fails.
pub struct RemoteRepository {
    store: LocalStore,
    remote: Arc<dyn RemoteService>,
    sessions: Arc<dyn SessionSource>,
}

impl RemoteRepository {
    pub fn new(store: LocalStore, remote: Arc<dyn RemoteService>, sessions: Arc<dyn SessionSource>) -> Self {
        Self {
            store,
            remote,
            sessions,
        }
    }

    /// Current session and the local namespace that belongs to it
    fn context(&self) -> (Option<SessionData>, NamespaceStore) {
        let session = self.sessions.current_session();
        let ns = match session {
            Some(ref s) => self.store.user(&s.user_id),
            None => self.store.guest(),
        };
        (session, ns)
    }

    pub fn namespace(&self) -> String {
        self.context().1.name().to_string()
    }

    pub fn cache_ages(&self) -> CacheAges {
        self.context().1.get_cache_ages()
    }

    fn fall_back(what: &str, e: &RemoteError) {
        warn!(read = what, error = %e, "Remote read failed, using local copy");
    }

    /// Push queued writes ahead of a read so the read sees them
    async fn catch_up(&self, session: &SessionData, ns: &NamespaceStore) {
        if !ns.load_outbox().is_empty() {
            outbox::replay(self.remote.as_ref(), session, ns).await;
        }
    }

    /// Send a write to the remote, or queue it if that fails in a way a retry could fix.
    async fn propagate(&self, session: Option<&SessionData>, ns: &NamespaceStore, op: RemoteOp) -> Propagation {
        let Some(session) = session else {
            return Propagation::LocalOnly;
        };

        // Keep remote order equal to local order: never overtake queued writes
        self.catch_up(session, ns).await;
        if !ns.load_outbox().is_empty() {
            return Self::enqueue(ns, op);
        }

        match outbox::apply(self.remote.as_ref(), session, &op).await {
            Ok(()) => {
                debug!(op = op.label(), "Remote write succeeded");
                Propagation::Synced
            }
            Err(e) if e.is_retryable() => {
                warn!(op = op.label(), error = %e, "Remote write failed, queued for retry");
                Self::enqueue(ns, op)
            }
            Err(e) => {
                warn!(op = op.label(), error = %e, "Remote write rejected, keeping local copy");
                Propagation::Rejected
            }
        }
    }

    fn enqueue(ns: &NamespaceStore, op: RemoteOp) -> Propagation {
        if let Err(e) = ns.enqueue(PendingWrite::new(op)) {
            warn!(namespace = ns.name(), error = %e, "Failed to queue remote write");
        }
        Propagation::Queued
    }

    // ===== Profile =====

    pub async fn get_user_profile(&self) -> UserProfile {
        let (session, ns) = self.context();
        let Some(session) = session else {
            return ns.load_profile();
        };
        self.catch_up(&session, &ns).await;

        match self.remote.fetch_profile(&session).await {
            Ok(Some(profile)) => {
                mirror::mirror_profile(&ns, &profile);
                profile
            }
            Ok(None) => {
                // First sign-in for this user: create the remote row from
                // what this device holds, which is the default profile for
                // a brand-new user.
                let profile = ns.load_profile();
                info!(user_id = %session.user_id, "No remote profile, creating one");
                self.propagate(Some(&session), &ns, RemoteOp::UpsertProfile { profile: profile.clone() })
                    .await;
                mirror::mirror_profile(&ns, &profile);
                profile
            }
            Err(e) => {
                Self::fall_back("profile", &e);
                ns.load_profile()
            }
        }
    }

    pub async fn update_user_profile(&self, patch: &ProfilePatch) -> Propagation {
        let (session, ns) = self.context();
        let profile = local::apply_profile_patch(&ns, patch);
        self.propagate(session.as_ref(), &ns, RemoteOp::UpsertProfile { profile }).await
    }

    pub async fn reset_user_profile(&self) -> Propagation {
        let (session, ns) = self.context();
        let profile = local::reset_profile(&ns);
        self.propagate(session.as_ref(), &ns, RemoteOp::UpsertProfile { profile }).await
    }

    // ===== Saved Shortcuts =====

    pub async fn get_saved_shortcuts(&self) -> Vec<SavedShortcut> {
        let (session, ns) = self.context();
        let Some(session) = session else {
            return ns.load_shortcuts();
        };
        self.catch_up(&session, &ns).await;

        match self.remote.fetch_shortcuts(&session).await {
            Ok(shortcuts) => {
                mirror::mirror_shortcuts(&ns, &shortcuts);
                shortcuts
            }
            Err(e) => {
                Self::fall_back("saved_shortcuts", &e);
                ns.load_shortcuts()
            }
        }
    }

    pub async fn add_saved_shortcut(&self, shortcut: &SavedShortcut) -> Propagation {
        let (session, ns) = self.context();
        local::store_shortcut(&ns, shortcut);
        let op = RemoteOp::InsertShortcut {
            shortcut: shortcut.clone(),
        };
        self.propagate(session.as_ref(), &ns, op).await
    }

    pub async fn delete_saved_shortcut(&self, id: &str) -> Propagation {
        let (session, ns) = self.context();
        if !local::remove_shortcut(&ns, id) && session.is_none() {
            return Propagation::Unchanged;
        }
        let op = RemoteOp::DeleteShortcut { id: id.to_string() };
        self.propagate(session.as_ref(), &ns, op).await
    }

    // ===== Daily Logs =====

    pub async fn get_daily_log(&self, date: NaiveDate) -> DailyLog {
        let (session, ns) = self.context();
        let Some(session) = session else {
            return ns.load_daily_log(date);
        };
        self.catch_up(&session, &ns).await;

        match self.remote.fetch_entries(&session, date).await {
            // Rebuilt from the remote every time rather than mirrored
            Ok(entries) => DailyLog::from_entries(date, entries),
            Err(e) => {
                Self::fall_back("daily_log", &e);
                ns.load_daily_log(date)
            }
        }
    }

    pub async fn add_intake_entry(&self, entry: &IntakeEntry) -> Propagation {
        let (session, ns) = self.context();
        local::store_entry(&ns, entry);
        let op = RemoteOp::InsertEntry { entry: entry.clone() };
        self.propagate(session.as_ref(), &ns, op).await
    }

    pub async fn delete_intake_entry(&self, date: NaiveDate, id: &str) -> Propagation {
        let (session, ns) = self.context();
        // Entries seen only through an online read have no local copy, so a
        // signed-in delete still goes to the remote.
        if !local::remove_entry(&ns, date, id) && session.is_none() {
            return Propagation::Unchanged;
        }
        let op = RemoteOp::DeleteEntry { id: id.to_string() };
        self.propagate(session.as_ref(), &ns, op).await
    }

    // ===== Daily Goals =====

    pub async fn get_daily_goal(&self, date: NaiveDate) -> Option<DailyGoal> {
        let (session, ns) = self.context();
        let Some(session) = session else {
            return ns.load_daily_goal(date);
        };
        self.catch_up(&session, &ns).await;

        match self.remote.fetch_daily_goal(&session, date).await {
            Ok(Some(goal)) => {
                mirror::mirror_daily_goal(&ns, &goal);
                Some(goal)
            }
            Ok(None) => ns.load_daily_goal(date),
            Err(e) => {
                Self::fall_back("daily_goal", &e);
                ns.load_daily_goal(date)
            }
        }
    }

    pub async fn set_daily_goal(&self, goal: &DailyGoal) -> Propagation {
        let (session, ns) = self.context();
        local::store_goal(&ns, goal);
        let op = RemoteOp::UpsertGoal { goal: goal.clone() };
        self.propagate(session.as_ref(), &ns, op).await
    }

    // ===== Outbox =====

    pub fn pending_writes(&self) -> usize {
        self.context().1.load_outbox().len()
    }

    pub async fn sync_pending(&self) -> SyncReport {
        let (session, ns) = self.context();
        match session {
            Some(session) => outbox::replay(self.remote.as_ref(), &session, &ns).await,
            None => SyncReport {
                remaining: ns.load_outbox().len(),
                ..SyncReport::default()
            },
        }
    }
}
