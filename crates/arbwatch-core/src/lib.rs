//! # arbwatch-core
//!
//! Shared building blocks for the arbwatch process supervision tools.
//!
//! - [`config`] — JSON configuration with hot reload, shared across consumers
//! - [`procs`] — process table enumeration and substring identity matching
//! - [`snapshot`] — per-process status records and their store field mapping
//! - [`store`] — the Redis-backed snapshot store (plus an in-memory stand-in)

pub mod config;
pub mod procs;
pub mod snapshot;
pub mod store;

pub use config::{ConfigError, SharedConfig, WatchdogConfig};
pub use procs::{find_matching, first_match, ProcessDirectory, ProcessEntry, SystemDirectory};
pub use snapshot::{ProcessSnapshot, ProcessStatus};
pub use store::{MemoryStore, RedisStore, SnapshotStore, StoreError};
