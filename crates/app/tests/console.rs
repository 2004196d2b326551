//! Scripted sessions through the command loop against the in-memory
//! backend.

use std::sync::Arc;
use std::time::Duration;

use pocketnotes_app::console::Console;
use pocketnotes_app::controller::App;
use pocketnotes_app::screens;
use pocketnotes_app::tasks::spawn_session_watcher;
use pocketnotes_cache::NotesCache;
use pocketnotes_data::{AuthRepo, NoteRepo};
use pocketnotes_events::{CacheEventKind, EventBus};
use pocketnotes_remote::memory::{MemoryBackend, Operation};
use pocketnotes_remote::{RemoteService, SessionService};
use tokio_util::sync::CancellationToken;

struct Session {
    backend: Arc<MemoryBackend>,
    app: App,
}

fn session() -> Session {
    let backend = Arc::new(MemoryBackend::default());
    let remote = RemoteService::from_backend(backend.clone());
    let cache = NotesCache::new(NoteRepo::new(remote.clone()), Arc::new(EventBus::default()));
    Session {
        backend,
        app: App::new(AuthRepo::new(remote.auth.clone()), cache),
    }
}

async fn run(app: &mut App, script: &str) -> String {
    let mut console = Console::new(script.as_bytes(), Vec::new());
    console.run(app).await.unwrap();
    String::from_utf8(console.into_output()).unwrap()
}

#[tokio::test]
async fn notes_require_a_session() {
    let mut s = session();
    let out = run(&mut s.app, "list\nnew\n").await;
    assert_eq!(out.matches(screens::LOGIN_REQUIRED).count(), 2);
    assert_eq!(s.backend.calls(Operation::SelectAll), 0);
}

#[tokio::test]
async fn signup_validation_is_reported() {
    let mut s = session();
    let out = run(
        &mut s.app,
        "signup a@b.co secret1 secret2\nsignup a@b.co abc abc\n",
    )
    .await;
    assert!(out.contains("Error: Passwords do not match"));
    assert!(out.contains("Error: Password must be at least 6 characters"));
    assert_eq!(s.backend.calls(Operation::SignUp), 0);
}

#[tokio::test]
async fn create_list_show_edit_delete() {
    let mut s = session();
    let out = run(
        &mut s.app,
        "signup me@example.com secret1 secret1\n\
         new\nGroceries\nmilk, eggs\n\n\
         list\n\
         show #1\n\
         edit #1\nGroceries v2\n\n\
         show #1\n\
         delete #1\n\
         list\n\
         quit\n",
    )
    .await;

    assert!(out.contains("Welcome, me@example.com!"));
    assert!(out.contains(screens::EMPTY_NOTES));
    assert!(out.contains("Note saved: Groceries"));
    assert!(out.contains("  1. Groceries  "));
    assert!(out.contains("Id: "));
    assert!(out.contains("Note updated: Groceries v2"));
    assert!(out.contains("Groceries v2\n============"));
    assert!(out.contains("Deleted: Groceries v2"));
    assert!(s.backend.all_notes().is_empty());
}

#[tokio::test]
async fn blank_form_fields_are_rejected_locally() {
    let mut s = session();
    let out = run(
        &mut s.app,
        "signup me@example.com secret1 secret1\nnew\n  \nbody\n\n",
    )
    .await;
    assert!(out.contains("Please fill in both title and content"));
    assert_eq!(s.backend.calls(Operation::Insert), 0);
}

#[tokio::test]
async fn backend_failures_show_acknowledgments() {
    let mut s = session();
    s.backend.fail(Operation::Insert, "permission denied");
    let out = run(
        &mut s.app,
        "signup me@example.com secret1 secret1\nnew\nGroceries\nmilk\n\n",
    )
    .await;
    assert!(out.contains(screens::SAVE_FAILED));

    s.backend.recover(Operation::Insert);
    s.backend.fail(Operation::SelectAll, "offline");
    let out = run(&mut s.app, "refresh\nshow missing-id\n").await;
    assert!(out.contains(screens::LOAD_FAILED));
    assert!(out.contains(screens::NOTE_NOT_FOUND));
}

#[tokio::test]
async fn logout_clears_cached_notes() {
    let mut s = session();
    run(
        &mut s.app,
        "signup me@example.com secret1 secret1\nnew\nGroceries\nmilk\n\n",
    )
    .await;
    assert_eq!(s.app.cache().query().notes().len(), 1);

    let out = run(&mut s.app, "logout\n").await;
    assert!(out.contains("Signed out."));
    assert!(s.app.cache().query().data.is_none());

    let out = run(&mut s.app, "list\n").await;
    assert!(out.contains(screens::LOGIN_REQUIRED));
}

#[tokio::test]
async fn next_user_never_sees_previous_notes() {
    let mut s = session();
    let cancel = CancellationToken::new();
    let watcher = spawn_session_watcher(
        s.backend.subscribe(),
        s.app.cache().clone(),
        cancel.clone(),
    );

    let out = run(
        &mut s.app,
        "signup alice@example.com secret1 secret1\n\
         new\nAlice secret diary\ndear diary\n\n\
         list\n\
         logout\n\
         signup bob@example.com secret1 secret1\n\
         list\n",
    )
    .await;

    let (alice, bob) = out
        .split_once("Welcome, bob@example.com!")
        .expect("bob signed up");
    assert!(alice.contains("  1. Alice secret diary  "));
    assert!(!bob.contains("Alice secret diary"));
    assert!(bob.contains(screens::EMPTY_NOTES));

    cancel.cancel();
    watcher.await.unwrap();
}

#[tokio::test]
async fn session_ended_elsewhere_clears_cached_notes() {
    let mut s = session();
    run(
        &mut s.app,
        "signup me@example.com secret1 secret1\nnew\nGroceries\nmilk\n\n",
    )
    .await;
    assert_eq!(s.app.cache().query().notes().len(), 1);

    let cancel = CancellationToken::new();
    let watcher = spawn_session_watcher(
        s.backend.subscribe(),
        s.app.cache().clone(),
        cancel.clone(),
    );
    let mut events = s.app.cache().bus().subscribe();

    s.backend.sign_out().await.unwrap();

    tokio::time::timeout(Duration::from_secs(5), async {
        while events.recv().await.unwrap().kind != CacheEventKind::Reset {}
    })
    .await
    .expect("cache was not reset");
    assert!(s.app.cache().query().data.is_none());

    cancel.cancel();
    watcher.await.unwrap();
}
