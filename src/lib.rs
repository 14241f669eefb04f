// ABOUTME: Library root for rave: re-exports all modules for integration testing.
// ABOUTME: The binary entry point is in main.rs, which uses this crate as a library.

pub mod app;
pub mod block;
pub mod catalog;
pub mod config;
pub mod host;
pub mod identity;
pub mod revision;
pub mod session;
