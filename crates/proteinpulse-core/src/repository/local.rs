use chrono::NaiveDate;
use tracing::warn;

use crate::cache::{CacheAges, LocalStore, NamespaceStore};
use crate::models::{DailyGoal, DailyLog, IntakeEntry, ProfilePatch, SavedShortcut, UserProfile};

use super::Propagation;

/// Repository variant with no remote backend: a straight pass-through to
/// the guest namespace of the local store.
pub struct LocalRepository {
    store: LocalStore,
}

impl LocalRepository {
    pub fn new(store: LocalStore) -> Self {
        Self { store }
    }

    fn scope(&self) -> NamespaceStore {
        self.store.guest()
    }

    pub fn namespace(&self) -> String {
        self.scope().name().to_string()
    }

    pub fn cache_ages(&self) -> CacheAges {
        self.scope().get_cache_ages()
    }

    pub fn get_user_profile(&self) -> UserProfile {
        self.scope().load_profile()
    }

    pub fn update_user_profile(&self, patch: &ProfilePatch) -> Propagation {
        apply_profile_patch(&self.scope(), patch);
        Propagation::LocalOnly
    }

    pub fn reset_user_profile(&self) -> Propagation {
        reset_profile(&self.scope());
        Propagation::LocalOnly
    }

    pub fn get_saved_shortcuts(&self) -> Vec<SavedShortcut> {
        self.scope().load_shortcuts()
    }

    pub fn add_saved_shortcut(&self, shortcut: &SavedShortcut) -> Propagation {
        store_shortcut(&self.scope(), shortcut);
        Propagation::LocalOnly
    }

    pub fn delete_saved_shortcut(&self, id: &str) -> Propagation {
        if remove_shortcut(&self.scope(), id) {
            Propagation::LocalOnly
        } else {
            Propagation::Unchanged
        }
    }

    pub fn get_daily_log(&self, date: NaiveDate) -> DailyLog {
        self.scope().load_daily_log(date)
    }

    pub fn add_intake_entry(&self, entry: &IntakeEntry) -> Propagation {
        store_entry(&self.scope(), entry);
        Propagation::LocalOnly
    }

    pub fn delete_intake_entry(&self, date: NaiveDate, id: &str) -> Propagation {
        if remove_entry(&self.scope(), date, id) {
            Propagation::LocalOnly
        } else {
            Propagation::Unchanged
        }
    }

    pub fn get_daily_goal(&self, date: NaiveDate) -> Option<DailyGoal> {
        self.scope().load_daily_goal(date)
    }

    pub fn set_daily_goal(&self, goal: &DailyGoal) -> Propagation {
        store_goal(&self.scope(), goal);
        Propagation::LocalOnly
    }
}

// Local halves of each write, shared with the remote-backed variant.
// Store failures are logged and swallowed.

pub(super) fn apply_profile_patch(ns: &NamespaceStore, patch: &ProfilePatch) -> UserProfile {
    let updated = patch.apply(&ns.load_profile());
    if let Err(e) = ns.save_profile(&updated) {
        warn!(namespace = ns.name(), error = %e, "Failed to store profile");
    }
    updated
}

pub(super) fn reset_profile(ns: &NamespaceStore) -> UserProfile {
    let profile = UserProfile::default();
    if let Err(e) = ns.save_profile(&profile) {
        warn!(namespace = ns.name(), error = %e, "Failed to reset profile");
    }
    profile
}

pub(super) fn store_shortcut(ns: &NamespaceStore, shortcut: &SavedShortcut) {
    if let Err(e) = ns.add_shortcut(shortcut) {
        warn!(namespace = ns.name(), id = %shortcut.id, error = %e, "Failed to store saved shortcut");
    }
}

/// Returns whether a local shortcut was removed
pub(super) fn remove_shortcut(ns: &NamespaceStore, id: &str) -> bool {
    match ns.delete_shortcut(id) {
        Ok(true) => true,
        Ok(false) => {
            warn!(namespace = ns.name(), id, "No saved shortcut with this id in the local store");
            false
        }
        Err(e) => {
            warn!(namespace = ns.name(), id, error = %e, "Failed to delete saved shortcut");
            false
        }
    }
}

pub(super) fn store_entry(ns: &NamespaceStore, entry: &IntakeEntry) {
    if let Err(e) = ns.add_intake_entry(entry) {
        warn!(namespace = ns.name(), id = %entry.id, error = %e, "Failed to store intake entry");
    }
}

/// Returns whether a local entry was removed from the log for `date`
pub(super) fn remove_entry(ns: &NamespaceStore, date: NaiveDate, id: &str) -> bool {
    match ns.delete_intake_entry(date, id) {
        Ok(true) => true,
        Ok(false) => {
            warn!(namespace = ns.name(), %date, id, "No intake entry with this id in the local log for this date");
            false
        }
        Err(e) => {
            warn!(namespace = ns.name(), %date, id, error = %e, "Failed to delete intake entry");
            false
        }
    }
}

pub(super) fn store_goal(ns: &NamespaceStore, goal: &DailyGoal) {
    if let Err(e) = ns.save_daily_goal(goal) {
        warn!(namespace = ns.name(), date = %goal.date, error = %e, "Failed to store daily goal");
    }
}
