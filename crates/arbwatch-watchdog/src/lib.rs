//! # arbwatch-watchdog
//!
//! Polls a configured set of named processes for liveness and publishes a
//! status snapshot per process to the shared store, one full overwrite per
//! cycle. Only observes and persists; it never restarts anything.

pub mod status;
pub mod watcher;

pub use watcher::ProcessWatcher;
