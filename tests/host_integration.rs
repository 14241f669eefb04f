// ABOUTME: Integration tests for the host command surface.
// ABOUTME: Drives commands through a fake editor, checking notices, availability, and persisted revisions.

mod common;

use std::sync::Arc;

use tokio::sync::mpsc;

use common::{FakeVisual, GatedEngine, InstantEngine};
use rave::block::Document;
use rave::host::{
    Command, CommandOutcome, Editor, Host, HostEvent, NO_BLOCK_MESSAGE, NOT_RUNNING_MESSAGE,
    START_CANCELLED_MESSAGE, STILL_STARTING_MESSAGE,
};
use rave::identity::{DEFAULT_SHARE_PREFIX, Identity};
use rave::revision::{AppendOutcome, JsonFileBackend, MemoryBackend, RevisionBackend, RevisionStore};
use rave::session::{SessionController, SessionState};

struct FakeEditor {
    id: String,
    lines: Vec<String>,
    cursor: usize,
}

impl FakeEditor {
    fn new(text: &str, cursor: usize) -> Self {
        Self {
            id: "songs/night-drive.md".to_string(),
            lines: text.lines().map(str::to_string).collect(),
            cursor,
        }
    }
}

impl Editor for FakeEditor {
    fn document_id(&self) -> &str {
        &self.id
    }

    fn document(&self) -> &(dyn Document + Sync) {
        &self.lines
    }

    fn cursor_line(&self) -> usize {
        self.cursor
    }
}

const DOC: &str = "intro\n```js\ns(\"bd sd\")\n```\noutro";

fn host_with<B: RevisionBackend>(
    backend: B,
) -> (Host<B>, Arc<InstantEngine>, mpsc::Receiver<HostEvent>) {
    let engine = Arc::new(InstantEngine::default());
    let session = Arc::new(SessionController::new(
        engine.clone(),
        Arc::new(FakeVisual::default()),
    ));
    let (tx, rx) = mpsc::channel(32);
    let host = Host::new(session, RevisionStore::new(backend), DEFAULT_SHARE_PREFIX, tx);
    (host, engine, rx)
}

/// Host over an engine whose init blocks until the test releases it.
fn gated_host() -> (Arc<Host<MemoryBackend>>, Arc<GatedEngine>, mpsc::Receiver<HostEvent>) {
    let engine = Arc::new(GatedEngine::default());
    let session = Arc::new(SessionController::new(
        engine.clone(),
        Arc::new(FakeVisual::default()),
    ));
    let (tx, rx) = mpsc::channel(32);
    let host = Host::new(session, RevisionStore::new(MemoryBackend::new()), DEFAULT_SHARE_PREFIX, tx);
    (Arc::new(host), engine, rx)
}

fn notices(rx: &mut mpsc::Receiver<HostEvent>) -> Vec<String> {
    let mut out = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let HostEvent::Notice(message) = event {
            out.push(message);
        }
    }
    out
}

#[tokio::test]
async fn availability_follows_session_state() {
    let (host, _, _rx) = host_with(MemoryBackend::new());
    let editor = FakeEditor::new(DOC, 2);

    assert!(host.is_available(Command::Start));
    assert!(!host.is_available(Command::Stop));
    assert!(host.is_available(Command::SaveRevision));
    assert_eq!(host.execute(Command::Hush, &editor).await, CommandOutcome::Unavailable);

    assert_eq!(host.execute(Command::Start, &editor).await, CommandOutcome::Done);
    assert!(!host.is_available(Command::Start));
    assert!(host.is_available(Command::ToggleVisual));

    assert_eq!(host.execute(Command::Stop, &editor).await, CommandOutcome::Done);
    assert!(host.is_available(Command::Start));
}

#[tokio::test]
async fn evaluate_without_session_asks_to_start() {
    let (host, engine, mut rx) = host_with(MemoryBackend::new());
    let editor = FakeEditor::new(DOC, 2);

    assert_eq!(
        host.execute(Command::EvaluateBlock, &editor).await,
        CommandOutcome::NeedsSession
    );
    assert_eq!(notices(&mut rx), vec![NOT_RUNNING_MESSAGE]);

    assert_eq!(host.start_and_evaluate(&editor).await, CommandOutcome::Done);
    assert_eq!(engine.evaluated(), vec!["s(\"bd sd\")"]);
}

#[tokio::test]
async fn evaluate_flashes_block_and_reports_errors() {
    let (host, _, mut rx) = host_with(MemoryBackend::new());
    host.execute(Command::Start, &FakeEditor::new(DOC, 0)).await;
    let _ = notices(&mut rx);

    let editor = FakeEditor::new(DOC, 2);
    assert_eq!(host.execute(Command::EvaluateBlock, &editor).await, CommandOutcome::Done);
    assert_eq!(
        rx.try_recv().unwrap(),
        HostEvent::Flash {
            start_line: 1,
            end_line: 3
        }
    );

    let broken = FakeEditor::new("```js\noops()\n```", 1);
    let outcome = host.execute(Command::EvaluateBlock, &broken).await;
    assert!(matches!(outcome, CommandOutcome::Failed(ref m) if m.contains("oops is not defined")));
    assert!(host.session().is_running());
}

#[tokio::test]
async fn missing_or_empty_block_is_reported() {
    let (host, _, mut rx) = host_with(MemoryBackend::new());
    host.execute(Command::Start, &FakeEditor::new(DOC, 0)).await;
    let _ = notices(&mut rx);

    let outside = FakeEditor::new(DOC, 0);
    assert_eq!(host.execute(Command::EvaluateBlock, &outside).await, CommandOutcome::NoBlock);

    let empty = FakeEditor::new("```js\n\n```", 1);
    assert_eq!(host.execute(Command::SaveRevision, &empty).await, CommandOutcome::NoBlock);
    assert_eq!(notices(&mut rx), vec![NO_BLOCK_MESSAGE, NO_BLOCK_MESSAGE]);
}

#[tokio::test]
async fn save_revision_is_idempotent_and_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("revisions.json");
    let (host, _, mut rx) = host_with(JsonFileBackend::new(&path));
    let editor = FakeEditor::new(DOC, 2);

    assert_eq!(
        host.execute(Command::SaveRevision, &editor).await,
        CommandOutcome::Saved(AppendOutcome::Added)
    );
    assert_eq!(
        host.execute(Command::SaveRevision, &editor).await,
        CommandOutcome::Saved(AppendOutcome::AlreadyPresent)
    );
    assert_eq!(notices(&mut rx), vec!["Revision saved.", "Revision already saved."]);

    // A fresh store over the same file sees one entry.
    let reloaded = RevisionStore::new(JsonFileBackend::new(&path));
    assert_eq!(
        reloaded.list("songs/night-drive.md").await.unwrap(),
        vec![Identity::derive("s(\"bd sd\")")]
    );
}

#[tokio::test]
async fn share_link_and_import_roundtrip() {
    let (host, _, _rx) = host_with(MemoryBackend::new());
    let editor = FakeEditor::new(DOC, 2);

    let CommandOutcome::Link(link) = host.execute(Command::CopyShareLink, &editor).await else {
        panic!("expected a link");
    };
    assert!(link.starts_with("https://strudel.cc/#"));
    assert_eq!(
        host.import_share_link(&link).unwrap(),
        "```js\ns(\"bd sd\")\n```\n"
    );
    assert!(host.import_share_link("https://example.com/#abc").is_err());
}

#[tokio::test]
async fn toggle_visual_through_commands() {
    let (host, _, _rx) = host_with(MemoryBackend::new());
    let editor = FakeEditor::new(DOC, 2);
    host.execute(Command::Start, &editor).await;

    assert_eq!(host.execute(Command::ToggleVisual, &editor).await, CommandOutcome::Done);
    assert!(host.session().hydra_active());
    host.execute(Command::Stop, &editor).await;
    assert!(!host.session().hydra_active());
}

#[tokio::test]
async fn host_from_config_uses_configured_hush_and_paths() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = rave::config::Config::default();
    config.session.hush_code = "silence()".to_string();
    config.share.prefix = "rave://".to_string();
    config.revisions.path = Some(dir.path().join("revisions.json"));

    let engine = Arc::new(InstantEngine::default());
    let (tx, _rx) = mpsc::channel(32);
    let host = Host::from_config(&config, engine.clone(), Arc::new(FakeVisual::default()), tx);
    let editor = FakeEditor::new(DOC, 2);

    assert_eq!(host.execute(Command::Start, &editor).await, CommandOutcome::Done);
    assert_eq!(host.execute(Command::Hush, &editor).await, CommandOutcome::Done);
    assert_eq!(engine.evaluated(), vec!["silence()".to_string()]);

    match host.execute(Command::CopyShareLink, &editor).await {
        CommandOutcome::Link(link) => assert!(link.starts_with("rave://")),
        other => panic!("expected a link, got {:?}", other),
    }

    host.execute(Command::SaveRevision, &editor).await;
    assert_eq!(host.revisions().backend().path(), dir.path().join("revisions.json").as_path());
    assert!(dir.path().join("revisions.json").exists());

    host.session().shutdown().await;
}

#[tokio::test]
async fn stop_is_offered_while_starting_and_cancels_the_start() {
    let (host, engine, mut rx) = gated_host();

    let h = host.clone();
    let pending = tokio::spawn(async move {
        let editor = FakeEditor::new(DOC, 2);
        h.execute(Command::Start, &editor).await
    });
    engine.entered.notified().await;

    assert!(host.is_available(Command::Stop));
    assert!(!host.is_available(Command::Start));
    assert!(!host.is_available(Command::EvaluateBlock));

    let editor = FakeEditor::new(DOC, 2);
    assert_eq!(host.execute(Command::Stop, &editor).await, CommandOutcome::Done);
    assert_eq!(pending.await.unwrap(), CommandOutcome::Cancelled);
    assert_eq!(host.session().state(), SessionState::Stopped);
    assert_eq!(engine.stops(), 1);
    assert_eq!(notices(&mut rx), vec!["Starting RAVE...", START_CANCELLED_MESSAGE]);
    assert!(host.is_available(Command::Start));
}

#[tokio::test]
async fn start_and_evaluate_while_starting_reports_still_starting() {
    let (host, engine, mut rx) = gated_host();

    let h = host.clone();
    let pending = tokio::spawn(async move {
        let editor = FakeEditor::new(DOC, 2);
        h.execute(Command::Start, &editor).await
    });
    engine.entered.notified().await;

    let editor = FakeEditor::new(DOC, 2);
    assert_eq!(host.start_and_evaluate(&editor).await, CommandOutcome::NeedsSession);
    assert!(engine.evaluated().is_empty());
    assert_eq!(engine.inits(), 1);

    engine.release.notify_one();
    assert_eq!(pending.await.unwrap(), CommandOutcome::Done);
    assert_eq!(notices(&mut rx), vec!["Starting RAVE...", STILL_STARTING_MESSAGE]);

    assert_eq!(host.execute(Command::EvaluateBlock, &editor).await, CommandOutcome::Done);
    assert_eq!(engine.evaluated(), vec!["s(\"bd sd\")"]);
}

#[tokio::test]
async fn commands_run_on_spawned_tasks() {
    let (host, _, _rx) = host_with(MemoryBackend::new());
    let host = Arc::new(host);

    let saves: Vec<_> = ["```js\na()\n```", "```js\nb()\n```"]
        .into_iter()
        .map(|doc| {
            let host = host.clone();
            tokio::spawn(async move {
                let editor = FakeEditor::new(doc, 1);
                host.execute(Command::SaveRevision, &editor).await
            })
        })
        .collect();
    for save in saves {
        assert_eq!(save.await.unwrap(), CommandOutcome::Saved(AppendOutcome::Added));
    }
    assert_eq!(host.revisions().list("songs/night-drive.md").await.unwrap().len(), 2);
}
