//! Delivery and replay of remote writes.

use std::collections::HashSet;

use tracing::{info, warn};

use crate::api::{RemoteError, RemoteService};
use crate::auth::SessionData;
use crate::cache::{NamespaceStore, RemoteOp};

/// Outcome of replaying the outbox.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub attempted: usize,
    pub synced: usize,
    /// Refused by the server and discarded
    pub dropped: usize,
    /// Still queued after this replay
    pub remaining: usize,
}

pub(super) async fn apply(
    remote: &dyn RemoteService,
    session: &SessionData,
    op: &RemoteOp,
) -> Result<(), RemoteError> {
    match op {
        RemoteOp::UpsertProfile { profile } => remote.upsert_profile(session, profile).await,
        RemoteOp::InsertShortcut { shortcut } => remote.upsert_shortcut(session, shortcut).await,
        RemoteOp::DeleteShortcut { id } => remote.delete_shortcut(session, id).await,
        RemoteOp::InsertEntry { entry } => remote.upsert_entry(session, entry).await,
        RemoteOp::DeleteEntry { id } => remote.delete_entry(session, id).await,
        RemoteOp::UpsertGoal { goal } => remote.upsert_daily_goal(session, goal).await,
    }
}

/// Replay queued writes in order, stopping at the first retryable failure.
/// Writes the server refuses are dropped.
pub(super) async fn replay(
    remote: &dyn RemoteService,
    session: &SessionData,
    ns: &NamespaceStore,
) -> SyncReport {
    let pending = ns.load_outbox();
    if pending.is_empty() {
        return SyncReport::default();
    }

    let mut report = SyncReport::default();
    let mut done: HashSet<String> = HashSet::new();
    let mut stalled: Option<String> = None;

    for write in &pending {
        report.attempted += 1;
        match apply(remote, session, &write.op).await {
            Ok(()) => {
                report.synced += 1;
                done.insert(write.id.clone());
            }
            Err(e) if e.is_retryable() => {
                warn!(op = write.op.label(), attempts = write.attempts, error = %e, "Outbox replay stalled");
                stalled = Some(write.id.clone());
                break;
            }
            Err(e) => {
                warn!(op = write.op.label(), error = %e, "Server rejected queued write, dropping it");
                report.dropped += 1;
                done.insert(write.id.clone());
            }
        }
    }

    // Re-read so writes queued while we were awaiting the remote are kept
    let mut remaining = ns.load_outbox();
    remaining.retain(|write| !done.contains(&write.id));
    if let Some(ref id) = stalled {
        if let Some(write) = remaining.iter_mut().find(|w| &w.id == id) {
            write.attempts += 1;
        }
    }
    if let Err(e) = ns.save_outbox(&remaining) {
        warn!(namespace = ns.name(), error = %e, "Failed to update outbox");
    }

    report.remaining = remaining.len();
    info!(
        namespace = ns.name(),
        synced = report.synced,
        dropped = report.dropped,
        remaining = report.remaining,
        "Outbox replayed"
    );
    report
}
