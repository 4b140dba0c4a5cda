use arbwatch_core::config::SharedConfig;
use arbwatch_core::procs::{first_match, ProcessDirectory};
use arbwatch_core::snapshot::{ProcessSnapshot, ProcessStatus};
use arbwatch_core::store::SnapshotStore;

/// Liveness poller: one snapshot per tracked name per cycle, written
/// wholesale to the store. Single task, so a new cycle never starts before
/// the previous one's writes have completed.
pub struct ProcessWatcher<D, S> {
	pub config: SharedConfig,
	pub directory: D,
	pub store: S,
}

impl<D: ProcessDirectory, S: SnapshotStore> ProcessWatcher<D, S> {
	pub fn new(config: SharedConfig, directory: D, store: S) -> Self {
		Self {
			config,
			directory,
			store,
		}
	}

	/// Poll forever. The interval is re-read every cycle so a hot reload
	/// takes effect without restart.
	pub async fn run(&mut self) {
		tracing::info!("starting process watcher");
		loop {
			self.poll_once().await;
			let interval = self.config.get().interval();
			tokio::time::sleep(interval).await;
		}
	}

	/// One polling cycle over every tracked name in the current config.
	/// A store failure for one name is logged and the cycle moves on; the
	/// record stays stale until the next successful write.
	pub async fn poll_once(&mut self) {
		let config = self.config.get();
		if config.processes.is_empty() {
			tracing::error!("no processes found in config file");
		}

		// One table scan per cycle, shared across names. First match in
		// enumeration order wins.
		let entries = self.directory.list();

		for name in &config.processes {
			let snapshot = match first_match(&entries, name) {
				Some(entry) => ProcessSnapshot::up(name.clone(), entry.pid, entry.cmdline.clone()),
				None => ProcessSnapshot::down(name.clone()),
			};
			if snapshot.status == ProcessStatus::Down {
				tracing::error!("process {} is down", name);
			}
			let snapshot = self.carry_transition_stamp(snapshot).await;
			if let Err(e) = self.store.put(&snapshot).await {
				tracing::error!("error while updating process status for {}: {}", name, e);
			}
		}
	}

	// last_status_change has transition semantics: the timestamp only moves
	// when the status actually flips, so the previous snapshot is read
	// before the overwrite.
	async fn carry_transition_stamp(&mut self, mut snapshot: ProcessSnapshot) -> ProcessSnapshot {
		match self.store.fetch(&snapshot.name).await {
			Ok(Some(previous)) if previous.status == snapshot.status => {
				snapshot.last_status_change = previous.last_status_change;
			}
			Ok(_) => {}
			Err(e) => tracing::warn!(
				"could not read previous snapshot for {}: {}",
				snapshot.name,
				e
			),
		}
		snapshot
	}
}
