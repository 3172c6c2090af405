use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

use crate::models::{date_key, DailyGoal, DailyLog, IntakeEntry, SavedShortcut, UserProfile};

use super::PendingWrite;

/// Namespace used when nobody is signed in.
pub const GUEST_NAMESPACE: &str = "guest";

const PROFILE_KEY: &str = "profile";
const SHORTCUTS_KEY: &str = "shortcuts";
const OUTBOX_KEY: &str = "outbox";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedData<T> {
    pub data: T,
    pub cached_at: DateTime<Utc>,
}

impl<T> CachedData<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }

    pub fn age_minutes(&self) -> i64 {
        let now = Utc::now();
        (now - self.cached_at).num_minutes()
    }

    pub fn age_display(&self) -> String {
        let minutes = self.age_minutes();
        if minutes < 1 {
            // Also covers clock skew
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            format!("{}h ago", minutes / 60)
        } else {
            format!("{}d ago", minutes / 1440)
        }
    }
}

/// Root of the on-device key space. Cheap to clone.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create data directory {}", root.display()))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Key space used while nobody is signed in
    pub fn guest(&self) -> NamespaceStore {
        self.open(GUEST_NAMESPACE.to_string())
    }

    /// Key space for one signed-in user
    pub fn user(&self, user_id: &str) -> NamespaceStore {
        self.open(user_namespace(user_id))
    }

    fn open(&self, name: String) -> NamespaceStore {
        NamespaceStore {
            dir: self.root.join(&name),
            namespace: name,
        }
    }
}

/// Map a user id onto a directory name, one-to-one. Ids made of safe
/// characters keep their spelling behind `u_`; anything else is hex-encoded
/// behind `h_`. Neither form can equal `GUEST_NAMESPACE`.
fn user_namespace(user_id: &str) -> String {
    let safe = !user_id.is_empty()
        && user_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if safe {
        format!("u_{}", user_id)
    } else {
        let hex: String = user_id.bytes().map(|b| format!("{:02x}", b)).collect();
        format!("h_{}", hex)
    }
}

/// One user's slice of the local store.
///
/// Getters never fail: a missing or unreadable file yields the entity's
/// default. Setters replace the whole value in one rename, so readers see
/// either the old value or the new one.
#[derive(Debug, Clone)]
pub struct NamespaceStore {
    dir: PathBuf,
    namespace: String,
}

impl NamespaceStore {
    pub fn name(&self) -> &str {
        &self.namespace
    }

    fn cache_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", name))
    }

    fn load<T: DeserializeOwned>(&self, name: &str) -> Result<Option<CachedData<T>>> {
        let path = self.cache_path(name);
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read cache file: {}", name))?;

        let cached: CachedData<T> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse cache file: {}", name))?;

        Ok(Some(cached))
    }

    /// Load a value, treating unreadable data as "no prior state"
    fn load_or_default<T: DeserializeOwned + Default>(&self, name: &str) -> T {
        match self.load::<T>(name) {
            Ok(Some(cached)) => cached.data,
            Ok(None) => T::default(),
            Err(e) => {
                warn!(namespace = %self.namespace, cache = name, error = %e, "Discarding unreadable cache entry");
                T::default()
            }
        }
    }

    fn save<T: Serialize>(&self, name: &str, data: &T) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create namespace directory {}", self.dir.display()))?;
        let cached = CachedData::new(data);
        let contents = serde_json::to_string_pretty(&cached)?;

        let path = self.cache_path(name);
        let tmp = self.dir.join(format!("{}.json.tmp", name));
        std::fs::write(&tmp, contents)
            .with_context(|| format!("Failed to write cache file: {}", name))?;
        std::fs::rename(&tmp, &path)
            .with_context(|| format!("Failed to replace cache file: {}", name))?;
        debug!(namespace = %self.namespace, cache = name, "Cache entry written");
        Ok(())
    }

    // ===== Profile =====

    pub fn load_profile(&self) -> UserProfile {
        self.load_or_default(PROFILE_KEY)
    }

    pub fn save_profile(&self, profile: &UserProfile) -> Result<()> {
        self.save(PROFILE_KEY, profile)
    }

    // ===== Saved Shortcuts =====

    pub fn load_shortcuts(&self) -> Vec<SavedShortcut> {
        self.load_or_default(SHORTCUTS_KEY)
    }

    /// Replace the whole collection in one write
    pub fn save_shortcuts(&self, shortcuts: &[SavedShortcut]) -> Result<()> {
        self.save(SHORTCUTS_KEY, &shortcuts)
    }

    /// Insert a shortcut, replacing any existing one with the same id
    pub fn add_shortcut(&self, shortcut: &SavedShortcut) -> Result<()> {
        let mut shortcuts = self.load_shortcuts();
        match shortcuts.iter_mut().find(|s| s.id == shortcut.id) {
            Some(existing) => *existing = shortcut.clone(),
            None => shortcuts.push(shortcut.clone()),
        }
        self.save_shortcuts(&shortcuts)
    }

    /// Returns whether a shortcut was removed
    pub fn delete_shortcut(&self, id: &str) -> Result<bool> {
        let mut shortcuts = self.load_shortcuts();
        let before = shortcuts.len();
        shortcuts.retain(|s| s.id != id);
        if shortcuts.len() == before {
            return Ok(false);
        }
        self.save_shortcuts(&shortcuts)?;
        Ok(true)
    }

    // ===== Daily Logs =====

    fn log_key(date: NaiveDate) -> String {
        format!("log_{}", date_key(date))
    }

    pub fn load_daily_log(&self, date: NaiveDate) -> DailyLog {
        let key = Self::log_key(date);
        match self.load::<DailyLog>(&key) {
            Ok(Some(cached)) if cached.data.date() == date => cached.data,
            Ok(Some(_)) => {
                warn!(namespace = %self.namespace, %date, "Cached log is filed under the wrong date, ignoring");
                DailyLog::new(date)
            }
            Ok(None) => DailyLog::new(date),
            Err(e) => {
                warn!(namespace = %self.namespace, %date, error = %e, "Discarding unreadable daily log");
                DailyLog::new(date)
            }
        }
    }

    pub fn save_daily_log(&self, log: &DailyLog) -> Result<()> {
        self.save(&Self::log_key(log.date()), log)
    }

    /// Append an entry to the log for its local calendar date
    pub fn add_intake_entry(&self, entry: &IntakeEntry) -> Result<DailyLog> {
        let mut log = self.load_daily_log(entry.log_date());
        if !log.push(entry.clone()) {
            debug!(namespace = %self.namespace, id = %entry.id, "Entry already logged");
            return Ok(log);
        }
        self.save_daily_log(&log)?;
        Ok(log)
    }

    /// Returns whether an entry was removed
    pub fn delete_intake_entry(&self, date: NaiveDate, id: &str) -> Result<bool> {
        let mut log = self.load_daily_log(date);
        if log.remove(id).is_none() {
            return Ok(false);
        }
        self.save_daily_log(&log)?;
        Ok(true)
    }

    // ===== Daily Goals =====

    fn goal_key(date: NaiveDate) -> String {
        format!("goal_{}", date_key(date))
    }

    pub fn load_daily_goal(&self, date: NaiveDate) -> Option<DailyGoal> {
        self.load_or_default::<Option<DailyGoal>>(&Self::goal_key(date))
            .filter(|goal| goal.date == date)
    }

    pub fn save_daily_goal(&self, goal: &DailyGoal) -> Result<()> {
        self.save(&Self::goal_key(goal.date), &Some(goal))
    }

    // ===== Outbox =====

    pub fn load_outbox(&self) -> Vec<PendingWrite> {
        self.load_or_default(OUTBOX_KEY)
    }

    pub fn save_outbox(&self, pending: &[PendingWrite]) -> Result<()> {
        self.save(OUTBOX_KEY, &pending)
    }

    /// Append a write, dropping queued writes it overwrites
    pub fn enqueue(&self, write: PendingWrite) -> Result<()> {
        let mut pending = self.load_outbox();
        pending.retain(|queued| !write.op.supersedes(&queued.op));
        pending.push(write);
        self.save_outbox(&pending)
    }

    // ===== Cache Age Information =====

    /// Helper to load cache and log errors without failing
    fn load_age<T: DeserializeOwned>(&self, name: &str) -> Option<String> {
        match self.load::<T>(name) {
            Ok(Some(cached)) => Some(cached.age_display()),
            Ok(None) => None,
            Err(e) => {
                debug!(cache = name, error = %e, "Failed to load cache for age display");
                None
            }
        }
    }

    pub fn get_cache_ages(&self) -> CacheAges {
        CacheAges {
            profile: self.load_age::<UserProfile>(PROFILE_KEY),
            shortcuts: self.load_age::<Vec<SavedShortcut>>(SHORTCUTS_KEY),
        }
    }
}

#[derive(Debug, Default)]
pub struct CacheAges {
    pub profile: Option<String>,
    pub shortcuts: Option<String>,
}

impl CacheAges {
    pub fn profile_age(&self) -> String {
        self.profile.clone().unwrap_or_else(|| "never".to_string())
    }

    pub fn shortcuts_age(&self) -> String {
        self.shortcuts.clone().unwrap_or_else(|| "never".to_string())
    }
}

// ============================================================================
// Tests
// ============================================================================
