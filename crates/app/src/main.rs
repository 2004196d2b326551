use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pocketnotes_app::config::AppConfig;
use pocketnotes_app::console::Console;
use pocketnotes_app::controller::App;
use pocketnotes_app::tasks::{spawn_event_logger, spawn_session_watcher};
use pocketnotes_cache::NotesCache;
use pocketnotes_data::{AuthRepo, NoteRepo};
use pocketnotes_events::EventBus;
use pocketnotes_remote::memory::MemoryBackend;
use pocketnotes_remote::rest::RestBackend;
use pocketnotes_remote::RemoteService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    // Logs go to stderr so they do not interleave with screen output.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "pocketnotes_app=info,pocketnotes_cache=debug,pocketnotes_data=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // --- Configuration ---
    let config = AppConfig::from_env().context("Invalid configuration")?;

    // --- Backend ---
    let remote = match config.rest() {
        Some(rest) => {
            tracing::info!(base_url = %rest.base_url, bucket = %rest.bucket, "Using REST backend");
            let backend = RestBackend::new(rest).context("Failed to build HTTP client")?;
            RemoteService::from_backend(Arc::new(backend))
        }
        None => {
            tracing::info!(
                bucket = %config.bucket,
                "POCKETNOTES_BACKEND_URL not set, using in-memory backend"
            );
            RemoteService::from_backend(Arc::new(MemoryBackend::new(config.bucket.clone())))
        }
    };

    // --- Data access and cache ---
    let notes = NoteRepo::new(remote.clone()).with_signed_url_ttl(config.signed_url_ttl_secs);
    let auth = AuthRepo::new(remote.auth.clone());
    let event_bus = Arc::new(EventBus::default());
    let cache = NotesCache::new(notes, Arc::clone(&event_bus));

    // --- Background tasks ---
    let shutdown = CancellationToken::new();
    let logger_handle = spawn_event_logger(event_bus.subscribe(), shutdown.clone());
    let watcher_handle = spawn_session_watcher(auth.subscribe(), cache.clone(), shutdown.clone());

    // --- Command loop ---
    let mut app = App::new(auth, cache);
    let mut console = Console::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout());
    console.run(&mut app).await.context("Terminal I/O failed")?;

    // --- Shutdown ---
    shutdown.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), watcher_handle).await;
    let _ = tokio::time::timeout(Duration::from_secs(5), logger_handle).await;
    tracing::info!("Goodbye");

    Ok(())
}
