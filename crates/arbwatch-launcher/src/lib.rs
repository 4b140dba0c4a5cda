//! # arbwatch-launcher
//!
//! Launch a program or an in-process routine as a daemon fully detached from
//! the calling terminal and process, killing any prior instance with the same
//! identity signature first.
//!
//! ```rust,no_run
//! use arbwatch_launcher::{launch_detached, LaunchOptions, LaunchTarget};
//!
//! let target = LaunchTarget::command("python3 metrics_worker.py", vec!["--port".into(), "9".into()]);
//! launch_detached(target, LaunchOptions::default()).unwrap();
//! // Returns as soon as the daemon is detached; its exit status is never
//! // observed here. The watchdog polls it independently.
//! ```

pub mod handler;
pub mod target;

pub use handler::{launch_detached, terminate_matching, LaunchError, LaunchOptions};
pub use target::LaunchTarget;
