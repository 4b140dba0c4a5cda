use std::collections::HashMap;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Key prefix for snapshot records in the shared store.
pub const STORE_KEY_PREFIX: &str = "arb_watchdog";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessStatus {
	Up,
	Down,
}

impl ProcessStatus {
	pub fn as_str(&self) -> &'static str {
		match self {
			ProcessStatus::Up => "UP",
			ProcessStatus::Down => "DOWN",
		}
	}

	pub fn parse(s: &str) -> Option<Self> {
		match s {
			"UP" => Some(ProcessStatus::Up),
			"DOWN" => Some(ProcessStatus::Down),
			_ => None,
		}
	}
}

impl fmt::Display for ProcessStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Complete current-state record for one tracked process.
///
/// Constructed fresh every poll cycle and written wholesale to the store,
/// replacing the prior record. UP snapshots always carry pid and cmdline;
/// DOWN snapshots never do — the constructors enforce this.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessSnapshot {
	/// Tracked process name; stable store key.
	pub name: String,
	pub pid: Option<u32>,
	pub status: ProcessStatus,
	/// Full matched command line.
	pub cmdline: Option<String>,
	/// Epoch seconds of the last status transition.
	pub last_status_change: i64,
}

impl ProcessSnapshot {
	pub fn up(name: impl Into<String>, pid: u32, cmdline: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			pid: Some(pid),
			status: ProcessStatus::Up,
			cmdline: Some(cmdline.into()),
			last_status_change: now_epoch(),
		}
	}

	pub fn down(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			pid: None,
			status: ProcessStatus::Down,
			cmdline: None,
			last_status_change: now_epoch(),
		}
	}

	/// Store key for this snapshot: `arb_watchdog:<name>`.
	pub fn key(&self) -> String {
		store_key(&self.name)
	}

	/// Hash field mapping for the store. Fields with no value are omitted
	/// entirely; the store cannot represent null scalar values in a hash.
	pub fn to_fields(&self) -> Vec<(&'static str, String)> {
		let mut fields = vec![
			("name", self.name.clone()),
			("status", self.status.as_str().to_string()),
			("last_status_change", self.last_status_change.to_string()),
		];
		if let Some(pid) = self.pid {
			fields.push(("pid", pid.to_string()));
		}
		if let Some(ref cmdline) = self.cmdline {
			fields.push(("cmdline", cmdline.clone()));
		}
		fields
	}

	/// Rebuild a snapshot from stored hash fields.
	pub fn from_fields(fields: &HashMap<String, String>) -> Result<Self, String> {
		let name = fields
			.get("name")
			.ok_or_else(|| "missing field: name".to_string())?
			.clone();
		let status = fields
			.get("status")
			.and_then(|s| ProcessStatus::parse(s))
			.ok_or_else(|| "missing or invalid field: status".to_string())?;
		let pid = match fields.get("pid") {
			Some(raw) => Some(
				raw.parse::<u32>()
					.map_err(|e| format!("invalid pid field: {}", e))?,
			),
			None => None,
		};
		// Stored timestamps may be fractional (older writers used float
		// epoch seconds); truncate toward zero.
		let last_status_change = match fields.get("last_status_change") {
			Some(raw) => raw
				.parse::<f64>()
				.map_err(|e| format!("invalid last_status_change field: {}", e))?
				as i64,
			None => 0,
		};
		Ok(Self {
			name,
			pid,
			status,
			cmdline: fields.get("cmdline").cloned(),
			last_status_change,
		})
	}
}

/// Store key for a tracked process name.
pub fn store_key(name: &str) -> String {
	format!("{}:{}", STORE_KEY_PREFIX, name)
}

pub(crate) fn now_epoch() -> i64 {
	SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.map(|d| d.as_secs() as i64)
		.unwrap_or(0)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn up_snapshot_carries_pid_and_cmdline() {
		let snap = ProcessSnapshot::up("worker", 42, "/usr/bin/worker --x");
		assert_eq!(snap.status, ProcessStatus::Up);
		assert_eq!(snap.pid, Some(42));
		assert_eq!(snap.cmdline.as_deref(), Some("/usr/bin/worker --x"));
		assert!(snap.last_status_change > 0);
	}

	#[test]
	fn down_snapshot_omits_pid_and_cmdline() {
		let snap = ProcessSnapshot::down("worker");
		assert_eq!(snap.status, ProcessStatus::Down);
		assert_eq!(snap.pid, None);
		assert_eq!(snap.cmdline, None);

		let fields = snap.to_fields();
		assert!(fields.iter().all(|(k, _)| *k != "pid" && *k != "cmdline"));
	}

	#[test]
	fn key_uses_watchdog_prefix() {
		assert_eq!(ProcessSnapshot::down("api").key(), "arb_watchdog:api");
		assert_eq!(store_key("api"), "arb_watchdog:api");
	}

	#[test]
	fn fields_round_trip() {
		let snap = ProcessSnapshot::up("worker", 7, "worker --id 7");
		let map: HashMap<String, String> = snap
			.to_fields()
			.into_iter()
			.map(|(k, v)| (k.to_string(), v))
			.collect();
		assert_eq!(ProcessSnapshot::from_fields(&map).unwrap(), snap);
	}

	#[test]
	fn from_fields_accepts_float_timestamp() {
		let mut map = HashMap::new();
		map.insert("name".to_string(), "worker".to_string());
		map.insert("status".to_string(), "DOWN".to_string());
		map.insert("last_status_change".to_string(), "1700000000.25".to_string());
		let snap = ProcessSnapshot::from_fields(&map).unwrap();
		assert_eq!(snap.last_status_change, 1700000000);
	}

	#[test]
	fn from_fields_rejects_missing_status() {
		let mut map = HashMap::new();
		map.insert("name".to_string(), "worker".to_string());
		assert!(ProcessSnapshot::from_fields(&map).is_err());
	}
}
