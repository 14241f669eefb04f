// ABOUTME: Revision module: persisted, order-preserving history of block identities per document.
// ABOUTME: Store logic is independent of where the lists live; backends supply get/set.

pub mod backend;
pub mod store;

pub use backend::*;
pub use store::*;
