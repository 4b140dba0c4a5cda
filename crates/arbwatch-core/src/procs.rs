use sysinfo::{ProcessesToUpdate, System};

/// One OS process as seen at enumeration time.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessEntry {
	pub pid: u32,
	pub name: String,
	/// Full command line, executable and arguments joined by single spaces.
	pub cmdline: String,
}

/// Enumerate all OS processes with pid, name and command line.
///
/// The launcher and the watcher both match against the joined command line,
/// so implementations only need to provide that view of the process table.
pub trait ProcessDirectory {
	fn list(&mut self) -> Vec<ProcessEntry>;
}

/// sysinfo-backed [`ProcessDirectory`]. One full process-table refresh per
/// [`list`](ProcessDirectory::list) call; processes that vanish or deny
/// access mid-scan are simply absent from the result.
pub struct SystemDirectory {
	sys: System,
}

impl SystemDirectory {
	pub fn new() -> Self {
		Self { sys: System::new() }
	}
}

impl Default for SystemDirectory {
	fn default() -> Self {
		Self::new()
	}
}

impl ProcessDirectory for SystemDirectory {
	fn list(&mut self) -> Vec<ProcessEntry> {
		self.sys.refresh_processes(ProcessesToUpdate::All, true);
		self.sys
			.processes()
			.iter()
			.map(|(pid, process)| ProcessEntry {
				pid: pid.as_u32(),
				name: process.name().to_string_lossy().into_owned(),
				cmdline: process
					.cmd()
					.iter()
					.map(|s| s.to_string_lossy())
					.collect::<Vec<_>>()
					.join(" "),
			})
			.collect()
	}
}

/// All entries whose command line contains `signature` as a substring,
/// excluding `exclude_pid` (normally the caller's own pid).
///
/// Matching is intentionally loose: a plain substring test tolerates
/// argument-order and quoting differences between the signature and the OS's
/// own rendering of the command line. Do not tighten it.
pub fn find_matching<'a>(
	entries: &'a [ProcessEntry],
	signature: &str,
	exclude_pid: u32,
) -> Vec<&'a ProcessEntry> {
	entries
		.iter()
		.filter(|e| e.pid != exclude_pid && e.cmdline.contains(signature))
		.collect()
}

/// First entry (in enumeration order) whose command line contains `needle`.
/// First match wins; no disambiguation among multiple matches.
pub fn first_match<'a>(entries: &'a [ProcessEntry], needle: &str) -> Option<&'a ProcessEntry> {
	entries.iter().find(|e| e.cmdline.contains(needle))
}

#[cfg(test)]
mod tests {
	use super::*;

	fn entry(pid: u32, cmdline: &str) -> ProcessEntry {
		ProcessEntry {
			pid,
			name: cmdline.split('/').last().unwrap_or(cmdline).to_string(),
			cmdline: cmdline.to_string(),
		}
	}

	#[test]
	fn find_matching_is_substring_based() {
		let entries = vec![
			entry(10, "/usr/bin/python3 metrics_worker.py --port 9"),
			entry(11, "/bin/sleep 30"),
			entry(12, "bash -c metrics_worker"),
		];
		let matched = find_matching(&entries, "metrics_worker", 0);
		assert_eq!(
			matched.iter().map(|e| e.pid).collect::<Vec<_>>(),
			vec![10, 12]
		);
	}

	#[test]
	fn find_matching_excludes_own_pid() {
		let entries = vec![entry(10, "worker --id 1"), entry(11, "worker --id 2")];
		let matched = find_matching(&entries, "worker", 10);
		assert_eq!(matched.len(), 1);
		assert_eq!(matched[0].pid, 11);
	}

	#[test]
	fn first_match_takes_enumeration_order() {
		let entries = vec![
			entry(5, "worker --id 1"),
			entry(3, "worker --id 2"),
			entry(9, "worker --id 3"),
		];
		assert_eq!(first_match(&entries, "worker").map(|e| e.pid), Some(5));
		assert!(first_match(&entries, "absent").is_none());
	}

	#[test]
	fn system_directory_sees_this_process() {
		let mut dir = SystemDirectory::new();
		let own = std::process::id();
		let entries = dir.list();
		assert!(entries.iter().any(|e| e.pid == own));
	}
}
