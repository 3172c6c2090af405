use async_trait::async_trait;
use chrono::NaiveDate;

use crate::auth::SessionData;
use crate::models::{DailyGoal, IntakeEntry, SavedShortcut, UserProfile};

use super::RemoteError;

/// Operations the authoritative backend exposes, scoped to the session's user.
///
/// Inserts are keyed on the client-generated id, so replaying one that
/// already landed is harmless.
#[async_trait]
pub trait RemoteService: Send + Sync {
    /// `Ok(None)` when the user has no profile row yet
    async fn fetch_profile(&self, session: &SessionData) -> Result<Option<UserProfile>, RemoteError>;

    async fn upsert_profile(&self, session: &SessionData, profile: &UserProfile) -> Result<(), RemoteError>;

    async fn fetch_shortcuts(&self, session: &SessionData) -> Result<Vec<SavedShortcut>, RemoteError>;

    async fn upsert_shortcut(&self, session: &SessionData, shortcut: &SavedShortcut) -> Result<(), RemoteError>;

    async fn delete_shortcut(&self, session: &SessionData, id: &str) -> Result<(), RemoteError>;

    /// Entries whose log date is `date`, oldest first
    async fn fetch_entries(&self, session: &SessionData, date: NaiveDate) -> Result<Vec<IntakeEntry>, RemoteError>;

    async fn upsert_entry(&self, session: &SessionData, entry: &IntakeEntry) -> Result<(), RemoteError>;

    async fn delete_entry(&self, session: &SessionData, id: &str) -> Result<(), RemoteError>;

    async fn fetch_daily_goal(&self, session: &SessionData, date: NaiveDate) -> Result<Option<DailyGoal>, RemoteError>;

    async fn upsert_daily_goal(&self, session: &SessionData, goal: &DailyGoal) -> Result<(), RemoteError>;
}
