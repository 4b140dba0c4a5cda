use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock, Weak};
use std::time::Duration;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use serde::Deserialize;

const DEFAULT_REDIS_HOST: &str = "localhost";
const DEFAULT_REDIS_PORT: u16 = 6379;
const DEFAULT_INTERVAL_SECS: u64 = 60;

/// Watchdog configuration as stored in the JSON config file.
///
/// Unknown fields are ignored so the same file can carry settings for
/// other arbwatch tools.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct WatchdogConfig {
	pub redis_host: Option<String>,
	pub redis_port: Option<u16>,
	pub interval: Option<u64>,
	#[serde(default)]
	pub processes: Vec<String>,
}

impl WatchdogConfig {
	pub fn redis_host(&self) -> &str {
		self.redis_host.as_deref().unwrap_or(DEFAULT_REDIS_HOST)
	}

	pub fn redis_port(&self) -> u16 {
		self.redis_port.unwrap_or(DEFAULT_REDIS_PORT)
	}

	pub fn interval(&self) -> Duration {
		Duration::from_secs(self.interval.unwrap_or(DEFAULT_INTERVAL_SECS))
	}
}

/// Errors from loading or watching the configuration file.
#[derive(Debug)]
pub enum ConfigError {
	/// Failed to read the config file.
	Io(io::Error),
	/// Config file content is not valid JSON for [`WatchdogConfig`].
	Parse(serde_json::Error),
	/// Failed to start the filesystem watcher.
	Watch(notify::Error),
}

impl fmt::Display for ConfigError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ConfigError::Io(e) => write!(f, "config io error: {}", e),
			ConfigError::Parse(e) => write!(f, "config parse error: {}", e),
			ConfigError::Watch(e) => write!(f, "config watch error: {}", e),
		}
	}
}

impl std::error::Error for ConfigError {}

impl From<io::Error> for ConfigError {
	fn from(e: io::Error) -> Self {
		ConfigError::Io(e)
	}
}

impl From<serde_json::Error> for ConfigError {
	fn from(e: serde_json::Error) -> Self {
		ConfigError::Parse(e)
	}
}

impl From<notify::Error> for ConfigError {
	fn from(e: notify::Error) -> Self {
		ConfigError::Watch(e)
	}
}

struct ConfigInner {
	path: PathBuf,
	current: RwLock<Arc<WatchdogConfig>>,
	watcher: Mutex<Option<RecommendedWatcher>>,
}

/// A live, process-wide view of the configuration file.
///
/// Clones are cheap and all share the same underlying configuration, so a
/// single reload is visible to every holder without explicit propagation.
/// Reloads replace the whole object atomically: readers always observe
/// either the fully-old or the fully-new configuration.
#[derive(Clone)]
pub struct SharedConfig {
	inner: Arc<ConfigInner>,
}

impl SharedConfig {
	/// Load the configuration from `path`. Malformed content is fatal here;
	/// during later hot reloads it is logged and the previous config kept.
	pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
		let path = path.into();
		tracing::info!("loading config from {}", path.display());
		let config = read_config(&path)?;
		tracing::info!("config loaded: {:?}", config);
		Ok(Self {
			inner: Arc::new(ConfigInner {
				path,
				current: RwLock::new(Arc::new(config)),
				watcher: Mutex::new(None),
			}),
		})
	}

	/// Current configuration. The returned `Arc` is a consistent point-in-time
	/// view; call again to observe a reload.
	pub fn get(&self) -> Arc<WatchdogConfig> {
		self.inner
			.current
			.read()
			.unwrap_or_else(|e| e.into_inner())
			.clone()
	}

	pub fn path(&self) -> &Path {
		&self.inner.path
	}

	/// Re-parse the backing file and swap the configuration in one step.
	/// On error the previous configuration stays fully in place.
	pub fn reload(&self) -> Result<(), ConfigError> {
		let config = read_config(&self.inner.path)?;
		tracing::info!("config reloaded: {:?}", config);
		*self
			.inner
			.current
			.write()
			.unwrap_or_else(|e| e.into_inner()) = Arc::new(config);
		Ok(())
	}

	/// Start watching the config file's parent directory for changes.
	///
	/// Any modify/create event targeting a non-directory entry triggers a
	/// synchronous [`reload`](Self::reload); reload failures are logged and
	/// watching continues. At most one watcher exists per `SharedConfig`
	/// regardless of how often this is called.
	pub fn watch(&self) -> Result<(), ConfigError> {
		let mut guard = self
			.inner
			.watcher
			.lock()
			.unwrap_or_else(|e| e.into_inner());
		if guard.is_some() {
			return Ok(());
		}

		let dir = match self.inner.path.parent() {
			Some(parent) if parent.as_os_str().is_empty() => PathBuf::from("."),
			Some(parent) => parent.to_path_buf(),
			None => PathBuf::from("."),
		};

		let weak: Weak<ConfigInner> = Arc::downgrade(&self.inner);
		let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
			let event = match res {
				Ok(event) => event,
				Err(e) => {
					tracing::warn!("config watch event error: {}", e);
					return;
				}
			};
			if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
				return;
			}
			if !event.paths.iter().any(|p| !p.is_dir()) {
				return;
			}
			let Some(inner) = weak.upgrade() else {
				return;
			};
			let shared = SharedConfig { inner };
			if let Err(e) = shared.reload() {
				tracing::error!("config reload failed, keeping previous config: {}", e);
			}
		})?;
		watcher.watch(&dir, RecursiveMode::NonRecursive)?;
		tracing::info!("watching {} for config changes", dir.display());

		*guard = Some(watcher);
		Ok(())
	}

	/// Stop the background watcher, if any. Reloads via [`reload`](Self::reload)
	/// still work afterwards. Lets tests shut the watcher down deterministically.
	pub fn stop_watching(&self) {
		*self
			.inner
			.watcher
			.lock()
			.unwrap_or_else(|e| e.into_inner()) = None;
	}
}

fn read_config(path: &Path) -> Result<WatchdogConfig, ConfigError> {
	let content = std::fs::read_to_string(path)?;
	Ok(serde_json::from_str(&content)?)
}
