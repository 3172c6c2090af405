//! Behaviour of the repository variants against a scripted remote service.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone, Utc};
use tempfile::TempDir;

use proteinpulse_core::api::{RemoteError, RemoteService};
use proteinpulse_core::auth::{Session, SessionData, SessionSource};
use proteinpulse_core::cache::{LocalStore, GUEST_NAMESPACE};
use proteinpulse_core::models::{
    DailyGoal, IntakeEntry, ProfilePatch, SavedShortcut, ThemePreference, UserProfile,
};
use proteinpulse_core::{Propagation, Repository};

// ============================================================================
// Fake remote
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
enum Failure {
    Unreachable,
    Rejected,
}

impl Failure {
    fn error(self) -> RemoteError {
        match self {
            Failure::Unreachable => RemoteError::ServerError("connection reset".to_string()),
            Failure::Rejected => RemoteError::Rejected("constraint violated".to_string()),
        }
    }
}

#[derive(Default)]
struct RemoteState {
    profiles: HashMap<String, UserProfile>,
    shortcuts: HashMap<String, Vec<SavedShortcut>>,
    entries: HashMap<String, Vec<IntakeEntry>>,
    goals: HashMap<(String, NaiveDate), DailyGoal>,
}

#[derive(Default)]
struct FakeRemote {
    state: Mutex<RemoteState>,
    failure: Mutex<Option<Failure>>,
    calls: AtomicUsize,
    profile_upserts: AtomicUsize,
}

impl FakeRemote {
    fn fail_with(&self, failure: Option<Failure>) {
        *self.failure.lock().unwrap() = failure;
    }

    fn check(&self) -> Result<(), RemoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match *self.failure.lock().unwrap() {
            Some(failure) => Err(failure.error()),
            None => Ok(()),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn shortcuts_of(&self, user: &str) -> Vec<SavedShortcut> {
        self.state.lock().unwrap().shortcuts.get(user).cloned().unwrap_or_default()
    }
}

#[async_trait]
impl RemoteService for FakeRemote {
    async fn fetch_profile(&self, session: &SessionData) -> Result<Option<UserProfile>, RemoteError> {
        self.check()?;
        Ok(self.state.lock().unwrap().profiles.get(&session.user_id).cloned())
    }

    async fn upsert_profile(&self, session: &SessionData, profile: &UserProfile) -> Result<(), RemoteError> {
        self.check()?;
        self.profile_upserts.fetch_add(1, Ordering::SeqCst);
        self.state
            .lock()
            .unwrap()
            .profiles
            .insert(session.user_id.clone(), profile.clone());
        Ok(())
    }

    async fn fetch_shortcuts(&self, session: &SessionData) -> Result<Vec<SavedShortcut>, RemoteError> {
        self.check()?;
        Ok(self.shortcuts_of(&session.user_id))
    }

    async fn upsert_shortcut(&self, session: &SessionData, shortcut: &SavedShortcut) -> Result<(), RemoteError> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        let list = state.shortcuts.entry(session.user_id.clone()).or_default();
        list.retain(|s| s.id != shortcut.id);
        list.push(shortcut.clone());
        Ok(())
    }

    async fn delete_shortcut(&self, session: &SessionData, id: &str) -> Result<(), RemoteError> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        if let Some(list) = state.shortcuts.get_mut(&session.user_id) {
            list.retain(|s| s.id != id);
        }
        Ok(())
    }

    async fn fetch_entries(&self, session: &SessionData, date: NaiveDate) -> Result<Vec<IntakeEntry>, RemoteError> {
        self.check()?;
        let state = self.state.lock().unwrap();
        Ok(state
            .entries
            .get(&session.user_id)
            .map(|list| list.iter().filter(|e| e.log_date() == date).cloned().collect())
            .unwrap_or_default())
    }

    async fn upsert_entry(&self, session: &SessionData, entry: &IntakeEntry) -> Result<(), RemoteError> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        let list = state.entries.entry(session.user_id.clone()).or_default();
        list.retain(|e| e.id != entry.id);
        list.push(entry.clone());
        Ok(())
    }

    async fn delete_entry(&self, session: &SessionData, id: &str) -> Result<(), RemoteError> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        if let Some(list) = state.entries.get_mut(&session.user_id) {
            list.retain(|e| e.id != id);
        }
        Ok(())
    }

    async fn fetch_daily_goal(&self, session: &SessionData, date: NaiveDate) -> Result<Option<DailyGoal>, RemoteError> {
        self.check()?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .goals
            .get(&(session.user_id.clone(), date))
            .cloned())
    }

    async fn upsert_daily_goal(&self, session: &SessionData, goal: &DailyGoal) -> Result<(), RemoteError> {
        self.check()?;
        self.state
            .lock()
            .unwrap()
            .goals
            .insert((session.user_id.clone(), goal.date), goal.clone());
        Ok(())
    }
}

// ============================================================================
// Helpers
// ============================================================================

const USER: &str = "user-1";

fn session_for(user_id: &str) -> SessionData {
    SessionData {
        access_token: format!("token-{}", user_id),
        refresh_token: None,
        user_id: user_id.to_string(),
        email: None,
        expires_at: Utc::now() + Duration::hours(1),
    }
}

struct Harness {
    _dir: TempDir,
    store: LocalStore,
    remote: Arc<FakeRemote>,
    session: Arc<RwLock<Session>>,
    repo: Repository,
}

impl Harness {
    fn remote_backed(signed_in: Option<&str>) -> Self {
        let dir = TempDir::new().unwrap();
        let store = LocalStore::new(dir.path().join("data")).unwrap();
        let mut session = Session::new(dir.path().to_path_buf());
        if let Some(user) = signed_in {
            session.update(session_for(user));
        }
        let session = Arc::new(RwLock::new(session));
        let remote = Arc::new(FakeRemote::default());

        let remote_dyn: Arc<dyn RemoteService> = remote.clone();
        let sessions: Arc<dyn SessionSource> = session.clone();
        let repo = Repository::new(store.clone(), Some(remote_dyn), sessions);

        Self {
            _dir: dir,
            store,
            remote,
            session,
            repo,
        }
    }

    fn sign_in(&self, user: &str) {
        self.session.write().unwrap().update(session_for(user));
    }

    fn sign_out(&self) {
        self.session.write().unwrap().data = None;
    }
}

fn local_only() -> (TempDir, LocalStore, Repository) {
    let dir = TempDir::new().unwrap();
    let store = LocalStore::new(dir.path().to_path_buf()).unwrap();
    let sessions: Arc<dyn SessionSource> = Arc::new(Session::new(dir.path().to_path_buf()));
    let repo = Repository::new(store.clone(), None, sessions);
    (dir, store, repo)
}

fn jan_first() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

fn at_local(hour: u32) -> DateTime<Utc> {
    Local
        .with_ymd_and_hms(2024, 1, 1, hour, 0, 0)
        .single()
        .unwrap()
        .with_timezone(&Utc)
}

fn assert_total_consistent(log: &proteinpulse_core::models::DailyLog) {
    let sum: f64 = log.entries().iter().map(|e| e.amount).sum();
    assert_eq!(log.total(), sum);
}

// ============================================================================
// Local-Only
// ============================================================================

#[tokio::test]
async fn test_local_only_is_selected_without_remote() {
    let (_dir, _store, repo) = local_only();
    assert!(!repo.is_remote_backed());
    assert_eq!(repo.namespace(), GUEST_NAMESPACE);
    assert_eq!(repo.pending_writes(), 0);
}

#[tokio::test]
async fn test_offline_shortcut_round_trip() {
    let (_dir, _store, repo) = local_only();
    let shortcut = SavedShortcut::new("Protein shake", 25.0).unwrap();

    assert_eq!(repo.add_saved_shortcut(&shortcut).await, Propagation::LocalOnly);
    assert_eq!(repo.get_saved_shortcuts().await, vec![shortcut]);
}

#[tokio::test]
async fn test_offline_chicken_scenario() {
    let (_dir, _store, repo) = local_only();
    let entry = IntakeEntry::new("Chicken", 30.0, at_local(12)).unwrap();

    repo.add_intake_entry(&entry).await;
    let log = repo.get_daily_log(jan_first()).await;

    assert_eq!(log.date(), jan_first());
    assert_eq!(log.entries(), &[entry]);
    assert_eq!(log.total(), 30.0);
}

#[tokio::test]
async fn test_local_only_profile_defaults_and_patch() {
    let (_dir, _store, repo) = local_only();
    assert_eq!(repo.get_user_profile().await, UserProfile::default());

    let patch = ProfilePatch::new().theme(ThemePreference::Dark);
    repo.update_user_profile(&patch).await;
    let profile = repo.get_user_profile().await;
    assert_eq!(profile.theme, ThemePreference::Dark);
    assert_eq!(profile.daily_target, 160.0);
}

#[tokio::test]
async fn test_target_for_prefers_daily_goal() {
    let (_dir, _store, repo) = local_only();
    assert_eq!(repo.target_for(jan_first()).await, 160.0);

    repo.set_daily_goal(&DailyGoal::new(jan_first(), 120.0).unwrap()).await;
    assert_eq!(repo.target_for(jan_first()).await, 120.0);
    assert_eq!(repo.target_for(jan_first().succ_opt().unwrap()).await, 160.0);
}

// ============================================================================
// Remote-Backed: reads
// ============================================================================

#[tokio::test]
async fn test_guest_mode_never_calls_remote() {
    let h = Harness::remote_backed(None);
    assert!(h.repo.is_remote_backed());

    let shortcut = SavedShortcut::new("Eggs", 12.0).unwrap();
    let entry = IntakeEntry::new("Eggs", 12.0, at_local(8)).unwrap();
    assert_eq!(h.repo.add_saved_shortcut(&shortcut).await, Propagation::LocalOnly);
    assert_eq!(h.repo.add_intake_entry(&entry).await, Propagation::LocalOnly);

    assert_eq!(h.repo.get_user_profile().await, UserProfile::default());
    assert_eq!(h.repo.get_saved_shortcuts().await, vec![shortcut]);
    assert_eq!(h.repo.get_daily_log(jan_first()).await.total(), 12.0);
    assert!(h.repo.get_daily_goal(jan_first()).await.is_none());

    assert_eq!(h.remote.calls(), 0);
    assert_eq!(h.repo.namespace(), GUEST_NAMESPACE);
}

#[tokio::test]
async fn test_profile_falls_back_to_cache_when_remote_fails() {
    let h = Harness::remote_backed(Some(USER));
    let mut cached = UserProfile::default();
    cached.daily_target = 120.0;
    h.store.user(USER).save_profile(&cached).unwrap();

    h.remote.fail_with(Some(Failure::Unreachable));
    assert_eq!(h.repo.get_user_profile().await, cached);

    h.remote.fail_with(Some(Failure::Rejected));
    assert_eq!(h.repo.get_user_profile().await, cached);
}

#[tokio::test]
async fn test_successful_remote_profile_is_mirrored() {
    let h = Harness::remote_backed(Some(USER));
    let mut remote_profile = UserProfile::default();
    remote_profile.daily_target = 180.0;
    remote_profile.synced = true;
    h.remote
        .state
        .lock()
        .unwrap()
        .profiles
        .insert(USER.to_string(), remote_profile.clone());

    assert_eq!(h.repo.get_user_profile().await, remote_profile);
    assert_eq!(h.store.user(USER).load_profile(), remote_profile);
}

#[tokio::test]
async fn test_first_profile_read_materializes_defaults_once() {
    let h = Harness::remote_backed(Some(USER));

    let first = h.repo.get_user_profile().await;
    let second = h.repo.get_user_profile().await;

    assert_eq!(first.daily_target, 160.0);
    assert_eq!(second.daily_target, 160.0);
    assert_eq!(first, UserProfile::default());
    assert_eq!(h.remote.profile_upserts.load(Ordering::SeqCst), 1);
    assert_eq!(h.remote.state.lock().unwrap().profiles.len(), 1);
    assert_eq!(h.store.user(USER).load_profile(), UserProfile::default());
}

#[tokio::test]
async fn test_mirror_makes_local_shortcuts_equal_remote() {
    let h = Harness::remote_backed(Some(USER));
    let a = SavedShortcut::new("A", 10.0).unwrap();
    let b = SavedShortcut::new("B", 20.0).unwrap();
    let c = SavedShortcut::new("C", 30.0).unwrap();
    h.store
        .user(USER)
        .save_shortcuts(&[a.clone(), c.clone()])
        .unwrap();
    h.remote
        .state
        .lock()
        .unwrap()
        .shortcuts
        .insert(USER.to_string(), vec![a.clone(), b.clone()]);

    assert_eq!(h.repo.get_saved_shortcuts().await, vec![a.clone(), b.clone()]);

    // Offline read now sees exactly the mirrored collection
    h.remote.fail_with(Some(Failure::Unreachable));
    let offline = h.repo.get_saved_shortcuts().await;
    assert_eq!(offline, vec![a, b]);
    assert!(!offline.contains(&c));
}

#[tokio::test]
async fn test_remote_daily_log_is_rebuilt_not_mirrored() {
    let h = Harness::remote_backed(Some(USER));
    let lunch = IntakeEntry::new("Chicken", 30.0, at_local(12)).unwrap();
    let dinner = IntakeEntry::new("Salmon", 35.5, at_local(19)).unwrap();
    h.remote
        .state
        .lock()
        .unwrap()
        .entries
        .insert(USER.to_string(), vec![lunch.clone(), dinner.clone()]);

    let online = h.repo.get_daily_log(jan_first()).await;
    assert_eq!(online.entries(), &[lunch, dinner]);
    assert_eq!(online.total(), 65.5);
    assert_total_consistent(&online);

    h.remote.fail_with(Some(Failure::Unreachable));
    let offline = h.repo.get_daily_log(jan_first()).await;
    assert!(offline.is_empty());
    assert_total_consistent(&offline);
}

#[tokio::test]
async fn test_daily_goal_is_mirrored() {
    let h = Harness::remote_backed(Some(USER));
    let goal = DailyGoal::new(jan_first(), 140.0).unwrap();
    h.remote
        .state
        .lock()
        .unwrap()
        .goals
        .insert((USER.to_string(), jan_first()), goal.clone());

    assert_eq!(h.repo.get_daily_goal(jan_first()).await, Some(goal.clone()));
    h.remote.fail_with(Some(Failure::Unreachable));
    assert_eq!(h.repo.get_daily_goal(jan_first()).await, Some(goal));
}

// ============================================================================
// Remote-Backed: writes and the outbox
// ============================================================================

#[tokio::test]
async fn test_write_lands_locally_and_remotely() {
    let h = Harness::remote_backed(Some(USER));
    let shortcut = SavedShortcut::new("Tuna", 26.0).unwrap();

    assert_eq!(h.repo.add_saved_shortcut(&shortcut).await, Propagation::Synced);
    assert_eq!(h.store.user(USER).load_shortcuts(), vec![shortcut.clone()]);
    assert_eq!(h.remote.shortcuts_of(USER), vec![shortcut.clone()]);

    assert_eq!(h.repo.delete_saved_shortcut(&shortcut.id).await, Propagation::Synced);
    assert!(h.store.user(USER).load_shortcuts().is_empty());
    assert!(h.remote.shortcuts_of(USER).is_empty());
}

#[tokio::test]
async fn test_unreachable_write_is_queued_and_replayed() {
    let h = Harness::remote_backed(Some(USER));
    h.remote.fail_with(Some(Failure::Unreachable));

    let shortcut = SavedShortcut::new("Cottage cheese", 14.0).unwrap();
    assert_eq!(h.repo.add_saved_shortcut(&shortcut).await, Propagation::Queued);
    assert_eq!(h.repo.pending_writes(), 1);

    // Local write is visible immediately regardless of connectivity
    assert_eq!(h.repo.get_saved_shortcuts().await, vec![shortcut.clone()]);

    h.remote.fail_with(None);
    let report = h.repo.sync_pending().await;
    assert_eq!(report.attempted, 1);
    assert_eq!(report.synced, 1);
    assert_eq!(report.remaining, 0);
    assert_eq!(h.repo.pending_writes(), 0);
    assert_eq!(h.remote.shortcuts_of(USER), vec![shortcut]);
}

#[tokio::test]
async fn test_queued_writes_keep_their_order() {
    let h = Harness::remote_backed(Some(USER));
    h.remote.fail_with(Some(Failure::Unreachable));

    let shortcut = SavedShortcut::new("Jerky", 9.0).unwrap();
    h.repo.add_saved_shortcut(&shortcut).await;
    h.repo.delete_saved_shortcut(&shortcut.id).await;
    assert_eq!(h.repo.pending_writes(), 2);

    h.remote.fail_with(None);
    let report = h.repo.sync_pending().await;
    assert_eq!(report.synced, 2);
    assert!(h.remote.shortcuts_of(USER).is_empty());
}

#[tokio::test]
async fn test_read_replays_outbox_before_fetching() {
    let h = Harness::remote_backed(Some(USER));
    h.remote.fail_with(Some(Failure::Unreachable));
    let entry = IntakeEntry::new("Lentils", 18.0, at_local(13)).unwrap();
    h.repo.add_intake_entry(&entry).await;

    h.remote.fail_with(None);
    let log = h.repo.get_daily_log(jan_first()).await;
    assert_eq!(log.entries(), &[entry]);
    assert_eq!(h.repo.pending_writes(), 0);
}

#[tokio::test]
async fn test_rejected_write_is_not_queued() {
    let h = Harness::remote_backed(Some(USER));
    h.remote.fail_with(Some(Failure::Rejected));

    let goal = DailyGoal::new(jan_first(), 150.0).unwrap();
    assert_eq!(h.repo.set_daily_goal(&goal).await, Propagation::Rejected);
    assert_eq!(h.repo.pending_writes(), 0);
    assert_eq!(h.store.user(USER).load_daily_goal(jan_first()), Some(goal));
}

#[tokio::test]
async fn test_rejected_queued_write_is_dropped_on_replay() {
    let h = Harness::remote_backed(Some(USER));
    h.remote.fail_with(Some(Failure::Unreachable));
    h.repo
        .add_intake_entry(&IntakeEntry::new("Bad row", 5.0, at_local(9)).unwrap())
        .await;

    h.remote.fail_with(Some(Failure::Rejected));
    let report = h.repo.sync_pending().await;
    assert_eq!(report.dropped, 1);
    assert_eq!(report.remaining, 0);
}

#[tokio::test]
async fn test_profile_update_sends_merged_profile() {
    let h = Harness::remote_backed(Some(USER));
    let patch = ProfilePatch::new().daily_target(175.0).unwrap();
    assert_eq!(h.repo.update_user_profile(&patch).await, Propagation::Synced);

    let remote_profile = h.remote.state.lock().unwrap().profiles.get(USER).cloned().unwrap();
    assert_eq!(remote_profile.daily_target, 175.0);
    assert_eq!(remote_profile.units, UserProfile::default().units);

    assert_eq!(h.repo.reset_user_profile().await, Propagation::Synced);
    assert_eq!(h.repo.get_user_profile().await, UserProfile::default());
}

#[tokio::test]
async fn test_delete_intake_entry_propagates() {
    let h = Harness::remote_backed(Some(USER));
    let entry = IntakeEntry::new("Chicken", 30.0, at_local(12)).unwrap();
    h.repo.add_intake_entry(&entry).await;
    assert_eq!(h.repo.get_daily_log(jan_first()).await.total(), 30.0);

    assert_eq!(
        h.repo.delete_intake_entry(jan_first(), &entry.id).await,
        Propagation::Synced
    );
    let log = h.repo.get_daily_log(jan_first()).await;
    assert!(log.is_empty());
    assert_eq!(log.total(), 0.0);
    assert!(h.store.user(USER).load_daily_log(jan_first()).is_empty());
}

// ============================================================================
// Session namespacing
// ============================================================================

#[tokio::test]
async fn test_cache_is_namespaced_by_session() {
    let h = Harness::remote_backed(Some("alice"));
    h.remote.fail_with(Some(Failure::Unreachable));
    let alice_food = SavedShortcut::new("Alice's shake", 30.0).unwrap();
    h.repo.add_saved_shortcut(&alice_food).await;
    assert_eq!(h.repo.namespace(), "u_alice");

    h.sign_in("bob");
    assert_eq!(h.repo.namespace(), "u_bob");
    assert!(h.repo.get_saved_shortcuts().await.is_empty());
    assert_eq!(h.repo.pending_writes(), 0);

    h.sign_out();
    assert!(h.repo.get_saved_shortcuts().await.is_empty());

    h.sign_in("alice");
    assert_eq!(h.repo.get_saved_shortcuts().await, vec![alice_food]);
    assert_eq!(h.repo.pending_writes(), 1);
}

#[tokio::test]
async fn test_sync_pending_without_session_reports_guest_queue() {
    let h = Harness::remote_backed(None);
    let report = h.repo.sync_pending().await;
    assert_eq!(report.attempted, 0);
    assert_eq!(report.remaining, 0);
    assert_eq!(h.remote.calls(), 0);
}

#[tokio::test]
async fn test_user_named_guest_does_not_see_guest_data() {
    let h = Harness::remote_backed(None);
    let guest_food = SavedShortcut::new("Guest shake", 20.0).unwrap();
    h.repo.add_saved_shortcut(&guest_food).await;

    h.sign_in("guest");
    h.remote.fail_with(Some(Failure::Unreachable));
    assert_ne!(h.repo.namespace(), GUEST_NAMESPACE);
    assert!(h.repo.get_saved_shortcuts().await.is_empty());
}

// ============================================================================
// Deletes that match nothing locally
// ============================================================================

#[tokio::test]
async fn test_guest_delete_on_wrong_date_reports_unchanged() {
    let h = Harness::remote_backed(None);
    let entry = IntakeEntry::new("Chicken", 30.0, at_local(12)).unwrap();
    h.repo.add_intake_entry(&entry).await;
    let wrong_day = jan_first().succ_opt().unwrap();

    assert_eq!(
        h.repo.delete_intake_entry(wrong_day, &entry.id).await,
        Propagation::Unchanged
    );
    assert_eq!(h.repo.get_daily_log(jan_first()).await.total(), 30.0);
    assert_eq!(h.remote.calls(), 0);
}

#[tokio::test]
async fn test_signed_in_delete_of_remote_only_entry_still_propagates() {
    let h = Harness::remote_backed(Some(USER));
    let elsewhere = IntakeEntry::new("Logged on phone", 22.0, at_local(9)).unwrap();
    h.remote
        .state
        .lock()
        .unwrap()
        .entries
        .insert(USER.to_string(), vec![elsewhere.clone()]);

    assert_eq!(
        h.repo.delete_intake_entry(jan_first(), &elsewhere.id).await,
        Propagation::Synced
    );
    assert!(h.repo.get_daily_log(jan_first()).await.is_empty());
}
