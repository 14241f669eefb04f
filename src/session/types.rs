// ABOUTME: Core types for the live session: lifecycle state, outcomes, and errors.
// ABOUTME: SessionState replaces a boolean init latch so illegal transitions are visible.

use std::fmt;

use thiserror::Error;

/// Lifecycle state of the live evaluation session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Never started since the controller was created.
    Uninitialized,
    /// Engine initialization is in flight.
    Initializing,
    /// Engine is up and accepts code.
    Running,
    /// Torn down; may be started again.
    Stopped,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Uninitialized => "uninitialized",
            Self::Initializing => "initializing",
            Self::Running => "running",
            Self::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// What a call to `start()` ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// The engine initialized and the session is running.
    Started,
    /// Another start was already initializing; nothing was done.
    AlreadyStarting,
    /// A stop arrived while initializing; the session is stopped.
    Cancelled,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("RAVE is not running.")]
    NotRunning,
    #[error("failed to start engine: {0}")]
    Init(String),
    #[error("evaluation error: {0}")]
    Evaluation(String),
}
