// ABOUTME: Collaborator traits for the audio evaluation engine and the visual engine.
// ABOUTME: The session controller is the only caller of these traits.

use async_trait::async_trait;

/// The live-coding evaluation engine.
#[async_trait]
pub trait EvalEngine: Send + Sync {
    /// Bring the engine up. May be slow (loads sample banks).
    async fn init(&self) -> Result<(), String>;

    /// Execute a code payload. Errors carry the engine's message.
    async fn evaluate(&self, code: &str) -> Result<(), String>;

    /// Silence all output and release engine resources.
    async fn stop(&self);
}

/// The visual overlay engine. All calls must be idempotent.
pub trait VisualEngine: Send + Sync {
    fn start_visual(&self);
    fn clear_visual(&self);
    /// Whether the rendering surface currently exists.
    fn is_present(&self) -> bool;
}
