// ABOUTME: Host command surface: the editor-facing commands wired to session, identity, and revisions.
// ABOUTME: Converts every failure into a short notice sent to the editor over an mpsc channel.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::block::{CodeBlock, Document, locate};
use crate::config::Config;
use crate::identity::{Identity, IdentityError, decode_share_link};
use crate::revision::{AppendOutcome, JsonFileBackend, RevisionBackend, RevisionStore};
use crate::session::{EvalEngine, SessionController, SessionState, StartOutcome, VisualEngine};

pub const NO_BLOCK_MESSAGE: &str = "No code block found at cursor position.";
pub const NOT_RUNNING_MESSAGE: &str = "RAVE is not running.";
pub const STILL_STARTING_MESSAGE: &str = "RAVE is still starting.";
pub const START_CANCELLED_MESSAGE: &str = "RAVE start was cancelled.";

/// The editor the commands act on.
///
/// Editors are shared with spawned command tasks, hence `Send + Sync`.
pub trait Editor: Send + Sync {
    /// Stable id of the open document, used to scope revision history.
    fn document_id(&self) -> &str;
    fn document(&self) -> &(dyn Document + Sync);
    fn cursor_line(&self) -> usize;
}

/// Events sent from the host to the editor UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// Short user-facing message.
    Notice(String),
    /// Highlight the block that was just evaluated.
    Flash { start_line: usize, end_line: usize },
}

/// Commands exposed to the editor's command palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Stop,
    ToggleVisual,
    Hush,
    EvaluateBlock,
    SaveRevision,
    CopyShareLink,
}

impl Command {
    pub const ALL: [Command; 7] = [
        Command::Start,
        Command::Stop,
        Command::ToggleVisual,
        Command::Hush,
        Command::EvaluateBlock,
        Command::SaveRevision,
        Command::CopyShareLink,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Self::Start => "rave-start",
            Self::Stop => "rave-stop",
            Self::ToggleVisual => "rave-toggle-hydra",
            Self::Hush => "rave-hush",
            Self::EvaluateBlock => "rave-evaluate-block",
            Self::SaveRevision => "rave-save-revision",
            Self::CopyShareLink => "rave-copy-share-link",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Start => "Enable RAVE",
            Self::Stop => "Stop",
            Self::ToggleVisual => "Toggle Hydra",
            Self::Hush => "HUSH",
            Self::EvaluateBlock => "Evaluate Block",
            Self::SaveRevision => "Save Revision",
            Self::CopyShareLink => "Copy Share Link",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.id() == id)
    }
}

/// What a command ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Done,
    /// The command is not available in the current session state.
    Unavailable,
    /// Evaluation was requested without a running session; the caller may
    /// confirm with the user and retry via `start_and_evaluate`.
    NeedsSession,
    NoBlock,
    /// A stop arrived while the session was still initializing.
    Cancelled,
    Saved(AppendOutcome),
    Link(String),
    /// The failure was reported to the user as a notice.
    Failed(String),
}

/// Owns the wiring between the editor and the core components.
pub struct Host<B> {
    session: Arc<SessionController>,
    revisions: RevisionStore<B>,
    share_prefix: String,
    events: mpsc::Sender<HostEvent>,
}

impl Host<JsonFileBackend> {
    /// Activate a host from config: a session using the configured hush
    /// snippet, a visual poller at the configured period, and revisions in
    /// the configured JSON file. Must be called inside a tokio runtime.
    pub fn from_config(
        config: &Config,
        engine: Arc<dyn EvalEngine>,
        visual: Arc<dyn VisualEngine>,
        events: mpsc::Sender<HostEvent>,
    ) -> Self {
        let session = Arc::new(
            SessionController::new(engine, visual).with_hush_code(config.session.hush_code.clone()),
        );
        session.spawn_visual_reconciler(config.session.visual_poll_interval());
        let revisions = RevisionStore::new(JsonFileBackend::new(config.revisions_path()));
        Self::new(session, revisions, config.share.prefix.clone(), events)
    }
}

impl<B: RevisionBackend> Host<B> {
    pub fn new(
        session: Arc<SessionController>,
        revisions: RevisionStore<B>,
        share_prefix: impl Into<String>,
        events: mpsc::Sender<HostEvent>,
    ) -> Self {
        Self {
            session,
            revisions,
            share_prefix: share_prefix.into(),
            events,
        }
    }

    pub fn session(&self) -> &Arc<SessionController> {
        &self.session
    }

    pub fn revisions(&self) -> &RevisionStore<B> {
        &self.revisions
    }

    /// Whether the command should be offered right now.
    pub fn is_available(&self, command: Command) -> bool {
        let state = self.session.state();
        match command {
            Command::Start => matches!(state, SessionState::Uninitialized | SessionState::Stopped),
            // A start still initializing can be stopped.
            Command::Stop => matches!(state, SessionState::Initializing | SessionState::Running),
            Command::ToggleVisual | Command::Hush | Command::EvaluateBlock => {
                state == SessionState::Running
            }
            Command::SaveRevision | Command::CopyShareLink => true,
        }
    }

    /// Run a command against the given editor.
    pub async fn execute(&self, command: Command, editor: &dyn Editor) -> CommandOutcome {
        // Evaluate has its own not-running path (offer to start).
        if command != Command::EvaluateBlock && !self.is_available(command) {
            return CommandOutcome::Unavailable;
        }

        match command {
            Command::Start => self.start().await,
            Command::Stop => {
                self.session.stop().await;
                CommandOutcome::Done
            }
            Command::ToggleVisual => match self.session.toggle_visual_overlay() {
                Ok(_) => CommandOutcome::Done,
                Err(e) => self.fail(e.to_string()).await,
            },
            Command::Hush => match self.session.hush().await {
                Ok(()) => CommandOutcome::Done,
                Err(e) => self.fail(e.to_string()).await,
            },
            Command::EvaluateBlock => {
                if !self.session.is_running() {
                    info!("evaluate requested without a running session");
                    self.notify(NOT_RUNNING_MESSAGE).await;
                    return CommandOutcome::NeedsSession;
                }
                self.evaluate_block(editor).await
            }
            Command::SaveRevision => self.save_revision(editor).await,
            Command::CopyShareLink => match self.current_block(editor).await {
                Some(block) => {
                    CommandOutcome::Link(Identity::derive(&block.content).share_link(&self.share_prefix))
                }
                None => CommandOutcome::NoBlock,
            },
        }
    }

    /// The confirmed path after `NeedsSession`: start, then evaluate.
    ///
    /// Evaluates only once this call has brought the session up; a start
    /// already in flight elsewhere yields `NeedsSession` with a notice.
    pub async fn start_and_evaluate(&self, editor: &dyn Editor) -> CommandOutcome {
        match self.start().await {
            CommandOutcome::Done => {}
            other => return other,
        }
        if !self.session.is_running() {
            // Stopped again between the start and here.
            self.notify(NOT_RUNNING_MESSAGE).await;
            return CommandOutcome::NeedsSession;
        }
        self.evaluate_block(editor).await
    }

    /// Render a share link as the body of a new note.
    pub fn import_share_link(&self, link: &str) -> Result<String, IdentityError> {
        let code = decode_share_link(&self.share_prefix, link)?;
        Ok(fenced_note(&code))
    }

    async fn start(&self) -> CommandOutcome {
        if self.session.state() != SessionState::Initializing {
            self.notify("Starting RAVE...").await;
        }
        match self.session.start().await {
            Ok(StartOutcome::Started) => CommandOutcome::Done,
            Ok(StartOutcome::AlreadyStarting) => {
                info!("start requested while another start is initializing");
                self.notify(STILL_STARTING_MESSAGE).await;
                CommandOutcome::NeedsSession
            }
            Ok(StartOutcome::Cancelled) => {
                info!("start cancelled by a stop");
                self.notify(START_CANCELLED_MESSAGE).await;
                CommandOutcome::Cancelled
            }
            Err(e) => self.fail(e.to_string()).await,
        }
    }

    async fn evaluate_block(&self, editor: &dyn Editor) -> CommandOutcome {
        let Some(block) = self.current_block(editor).await else {
            return CommandOutcome::NoBlock;
        };
        let _ = self
            .events
            .send(HostEvent::Flash {
                start_line: block.start_line,
                end_line: block.end_line,
            })
            .await;
        match self.session.evaluate(&block.content).await {
            Ok(()) => CommandOutcome::Done,
            Err(e) => self.fail(e.to_string()).await,
        }
    }

    async fn save_revision(&self, editor: &dyn Editor) -> CommandOutcome {
        let Some(block) = self.current_block(editor).await else {
            return CommandOutcome::NoBlock;
        };
        let identity = Identity::derive(&block.content);
        match self.revisions.append(editor.document_id(), &identity).await {
            Ok(outcome) => {
                let message = match outcome {
                    AppendOutcome::Added => "Revision saved.",
                    AppendOutcome::AlreadyPresent => "Revision already saved.",
                };
                self.notify(message).await;
                CommandOutcome::Saved(outcome)
            }
            Err(e) => self.fail(e.to_string()).await,
        }
    }

    /// The non-empty block under the cursor, or a "no block" notice.
    async fn current_block(&self, editor: &dyn Editor) -> Option<CodeBlock> {
        let block = locate(editor.document(), editor.cursor_line()).filter(|b| !b.content.is_empty());
        if block.is_none() {
            self.notify(NO_BLOCK_MESSAGE).await;
        }
        block
    }

    async fn fail(&self, message: String) -> CommandOutcome {
        warn!(error = %message, "command failed");
        self.notify(&message).await;
        CommandOutcome::Failed(message)
    }

    async fn notify(&self, message: &str) {
        // The editor may have gone away; notices are best-effort.
        let _ = self.events.send(HostEvent::Notice(message.to_string())).await;
    }
}

/// Body of a note holding `code` as a fenced `js` block.
pub fn fenced_note(code: &str) -> String {
    format!("```js\n{}\n```\n", code)
}
