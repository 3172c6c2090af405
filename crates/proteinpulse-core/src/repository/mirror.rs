//! Write-back of successful remote reads into the local store.
//!
//! Daily logs are deliberately not mirrored: they are rebuilt from the
//! remote entries on every online read, so an offline read of a date that
//! was never logged on this device comes back empty.

use tracing::{debug, warn};

use crate::cache::NamespaceStore;
use crate::models::{DailyGoal, SavedShortcut, UserProfile};

pub(super) fn mirror_profile(ns: &NamespaceStore, profile: &UserProfile) {
    match ns.save_profile(profile) {
        Ok(()) => debug!(namespace = ns.name(), "Profile mirrored"),
        Err(e) => warn!(namespace = ns.name(), error = %e, "Failed to mirror profile"),
    }
}

/// Make the local collection exactly the remote one, in a single write
pub(super) fn mirror_shortcuts(ns: &NamespaceStore, shortcuts: &[SavedShortcut]) {
    match ns.save_shortcuts(shortcuts) {
        Ok(()) => debug!(namespace = ns.name(), count = shortcuts.len(), "Saved shortcuts mirrored"),
        Err(e) => warn!(namespace = ns.name(), error = %e, "Failed to mirror saved shortcuts"),
    }
}

pub(super) fn mirror_daily_goal(ns: &NamespaceStore, goal: &DailyGoal) {
    match ns.save_daily_goal(goal) {
        Ok(()) => debug!(namespace = ns.name(), date = %goal.date, "Daily goal mirrored"),
        Err(e) => warn!(namespace = ns.name(), error = %e, "Failed to mirror daily goal"),
    }
}
