//! Background tasks wired up at startup.

use pocketnotes_cache::NotesCache;
use pocketnotes_core::session::Session;
use pocketnotes_events::{CacheEvent, CacheEventKind};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Log every cache event until cancelled or the bus closes.
pub fn spawn_event_logger(
    mut events: broadcast::Receiver<CacheEvent>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let event = tokio::select! {
                _ = cancel.cancelled() => break,
                event = events.recv() => event,
            };
            match event {
                Ok(event) => log_event(&event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Event logger lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        tracing::debug!("Event logger stopped");
    })
}

fn log_event(event: &CacheEvent) {
    let event_type = event.event_type();
    match &event.kind {
        CacheEventKind::SnapshotChanged { revision, len } => {
            tracing::debug!(event_type, revision, len, "Notes snapshot changed");
        }
        CacheEventKind::FetchStarted { generation } => {
            tracing::debug!(event_type, generation, "Fetching notes");
        }
        CacheEventKind::FetchFailed { message } => {
            tracing::warn!(event_type, %message, "Notes fetch failed");
        }
        CacheEventKind::MutationStarted { kind } => {
            tracing::info!(event_type, %kind, "Saving changes");
        }
        CacheEventKind::MutationSettled { kind, ok } => {
            tracing::info!(event_type, %kind, ok, "Changes settled");
        }
        CacheEventKind::Reset => tracing::info!(event_type, "Notes cleared"),
    }
}

/// Reset the cache whenever the session ends or changes hands outside the
/// app's own sign-in and sign-out screens, such as a revoked token.
pub fn spawn_session_watcher(
    mut sessions: watch::Receiver<Option<Session>>,
    cache: NotesCache,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    let mut current_user = user_id(&sessions.borrow_and_update());
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                changed = sessions.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }

            let next_user = user_id(&sessions.borrow_and_update());
            if next_user == current_user {
                continue;
            }
            match &next_user {
                Some(user_id) => tracing::info!(%user_id, "Session started"),
                None => tracing::info!("Session ended"),
            }
            if current_user.is_some() {
                cache.reset();
            }
            current_user = next_user;
        }
        tracing::debug!("Session watcher stopped");
    })
}

fn user_id(session: &Option<Session>) -> Option<String> {
    session.as_ref().map(|s| s.user.id.clone())
}
