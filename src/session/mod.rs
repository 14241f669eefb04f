// ABOUTME: Session module: lifecycle of the single live evaluation session.
// ABOUTME: State machine, engine collaborator traits, and the visual reconciliation poller.

pub mod controller;
pub mod engine;
pub mod reconcile;
pub mod types;

pub use controller::*;
pub use engine::*;
pub use reconcile::PeriodicTask;
pub use types::*;
