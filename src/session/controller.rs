// ABOUTME: Session controller: owns the live session lifecycle and the visual overlay sub-state.
// ABOUTME: Guards init with an explicit state machine and serializes start/stop transitions.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::engine::{EvalEngine, VisualEngine};
use super::reconcile::PeriodicTask;
use super::types::{SessionError, SessionState, StartOutcome};

/// Snippet evaluated by `hush()` unless configured otherwise.
pub const DEFAULT_HUSH_CODE: &str = "hush()";

struct Inner {
    state: SessionState,
    hydra_active: bool,
    /// Cancels the in-flight initialization, present only while `Initializing`.
    init_token: Option<CancellationToken>,
}

/// The single live session of a host.
///
/// Construct once when the host activates, share it by `Arc`, and call
/// `shutdown` when the host deactivates.
pub struct SessionController {
    engine: Arc<dyn EvalEngine>,
    visual: Arc<dyn VisualEngine>,
    hush_code: String,
    inner: Mutex<Inner>,
    /// Held across the awaits of `start` and `stop` so transitions never interleave.
    transition: tokio::sync::Mutex<()>,
    reconciler: Mutex<Option<PeriodicTask>>,
}

impl SessionController {
    pub fn new(engine: Arc<dyn EvalEngine>, visual: Arc<dyn VisualEngine>) -> Self {
        Self {
            engine,
            visual,
            hush_code: DEFAULT_HUSH_CODE.to_string(),
            inner: Mutex::new(Inner {
                state: SessionState::Uninitialized,
                hydra_active: false,
                init_token: None,
            }),
            transition: tokio::sync::Mutex::new(()),
            reconciler: Mutex::new(None),
        }
    }

    /// Replace the snippet evaluated by `hush()`.
    pub fn with_hush_code(mut self, code: impl Into<String>) -> Self {
        self.hush_code = code.into();
        self
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> SessionState {
        self.lock().state
    }

    pub fn is_running(&self) -> bool {
        self.state() == SessionState::Running
    }

    pub fn hydra_active(&self) -> bool {
        self.lock().hydra_active
    }

    /// Start the session, restarting it if it is already running.
    ///
    /// A start issued while another start is still initializing returns
    /// `AlreadyStarting` without touching the engine. A `stop` issued during
    /// initialization makes the pending start return `Cancelled`.
    pub async fn start(&self) -> Result<StartOutcome, SessionError> {
        if self.state() == SessionState::Initializing {
            debug!("start ignored, initialization already in flight");
            return Ok(StartOutcome::AlreadyStarting);
        }

        let _transition = self.transition.lock().await;

        let (token, restart) = {
            let mut inner = self.lock();
            if inner.state == SessionState::Initializing {
                return Ok(StartOutcome::AlreadyStarting);
            }
            let restart = inner.state == SessionState::Running;
            if restart {
                self.release_visual(&mut inner);
            }
            let token = CancellationToken::new();
            inner.state = SessionState::Initializing;
            inner.init_token = Some(token.clone());
            (token, restart)
        };

        if restart {
            info!("restarting session");
            self.engine.stop().await;
        }

        info!("starting session");
        let result = tokio::select! {
            biased;
            _ = token.cancelled() => None,
            res = self.engine.init() => Some(res),
        };

        match result {
            Some(Ok(())) if !token.is_cancelled() => {
                let mut inner = self.lock();
                inner.init_token = None;
                inner.state = SessionState::Running;
                info!("session running");
                Ok(StartOutcome::Started)
            }
            Some(Err(msg)) if !token.is_cancelled() => {
                {
                    let mut inner = self.lock();
                    inner.init_token = None;
                    inner.state = SessionState::Stopped;
                }
                warn!(error = %msg, "session failed to start");
                // Release whatever the engine brought up before failing.
                self.engine.stop().await;
                Err(SessionError::Init(msg))
            }
            _ => {
                {
                    let mut inner = self.lock();
                    inner.init_token = None;
                    self.release_visual(&mut inner);
                    inner.state = SessionState::Stopped;
                }
                info!("session start cancelled");
                self.engine.stop().await;
                Ok(StartOutcome::Cancelled)
            }
        }
    }

    /// Tear the session down. Returns false when there was nothing to stop.
    ///
    /// Stopping during initialization cancels the pending start and waits for
    /// it to wind down before returning.
    pub async fn stop(&self) -> bool {
        {
            let inner = self.lock();
            match inner.state {
                SessionState::Uninitialized | SessionState::Stopped => return false,
                SessionState::Initializing => {
                    if let Some(token) = &inner.init_token {
                        token.cancel();
                    }
                }
                SessionState::Running => {}
            }
        }

        let _transition = self.transition.lock().await;

        let silence = {
            let mut inner = self.lock();
            self.release_visual(&mut inner);
            let was_running = inner.state == SessionState::Running;
            if inner.state != SessionState::Uninitialized {
                inner.state = SessionState::Stopped;
            }
            was_running
        };

        if silence {
            info!("stopping session");
            self.engine.stop().await;
        }
        true
    }

    /// Evaluate code on the running engine.
    pub async fn evaluate(&self, code: &str) -> Result<(), SessionError> {
        if !self.is_running() {
            return Err(SessionError::NotRunning);
        }
        debug!(bytes = code.len(), "evaluating code");
        self.engine.evaluate(code).await.map_err(|msg| {
            warn!(error = %msg, "evaluation failed");
            SessionError::Evaluation(msg)
        })
    }

    /// Silence all patterns by evaluating the hush snippet.
    pub async fn hush(&self) -> Result<(), SessionError> {
        self.evaluate(&self.hush_code).await
    }

    /// Flip the visual overlay and drive the visual engine to match.
    ///
    /// Returns the new overlay state.
    pub fn toggle_visual_overlay(&self) -> Result<bool, SessionError> {
        let mut inner = self.lock();
        if inner.state != SessionState::Running {
            return Err(SessionError::NotRunning);
        }
        inner.hydra_active = !inner.hydra_active;
        if inner.hydra_active {
            self.visual.start_visual();
        } else {
            self.visual.clear_visual();
        }
        debug!(active = inner.hydra_active, "visual overlay toggled");
        Ok(inner.hydra_active)
    }

    /// Align `hydra_active` with the observed presence of the visual surface.
    ///
    /// Returns true when the flag had drifted and was corrected.
    pub fn reconcile_visual(&self) -> bool {
        let mut inner = self.lock();
        let present = self.visual.is_present();
        if inner.hydra_active == present {
            return false;
        }
        debug!(was = inner.hydra_active, now = present, "visual overlay drift corrected");
        inner.hydra_active = present;
        true
    }

    /// Poll the visual engine every `period`, replacing any previous poller.
    pub fn spawn_visual_reconciler(self: &Arc<Self>, period: Duration) {
        let weak = Arc::downgrade(self);
        let task = PeriodicTask::spawn("visual-reconcile", period, move || {
            if let Some(controller) = weak.upgrade() {
                controller.reconcile_visual();
            }
        });
        let previous = self
            .reconciler
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(task);
        if let Some(previous) = previous {
            previous.cancel();
        }
    }

    /// Host deactivation: stop the poller, then the session.
    pub async fn shutdown(&self) {
        let task = self
            .reconciler
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            task.shutdown().await;
        }
        self.stop().await;
    }

    fn release_visual(&self, inner: &mut Inner) {
        if inner.hydra_active {
            self.visual.clear_visual();
            inner.hydra_active = false;
        }
    }
}
