use owo_colors::OwoColorize;

use arbwatch_core::snapshot::ProcessStatus;
use arbwatch_core::store::SnapshotStore;

/// One line of the status table.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusRow {
	pub name: String,
	pub status: ProcessStatus,
	pub pid: Option<u32>,
	/// Seconds since the last status transition.
	pub age_secs: i64,
}

/// Fetch the stored snapshot for every tracked name, sorted
/// case-insensitively. Names that were never polled are skipped.
pub async fn collect_rows(names: &[String], store: &mut impl SnapshotStore) -> Vec<StatusRow> {
	let now = std::time::SystemTime::now()
		.duration_since(std::time::UNIX_EPOCH)
		.map(|d| d.as_secs() as i64)
		.unwrap_or(0);

	let mut rows = Vec::new();
	for name in names {
		match store.fetch(name).await {
			Ok(Some(snapshot)) => rows.push(StatusRow {
				name: snapshot.name,
				status: snapshot.status,
				pid: snapshot.pid,
				age_secs: (now - snapshot.last_status_change).max(0),
			}),
			Ok(None) => {}
			Err(e) => tracing::warn!("could not read snapshot for {}: {}", name, e),
		}
	}
	rows.sort_by_key(|r| r.name.to_lowercase());
	rows
}

pub fn print_rows(rows: &[StatusRow]) {
	let name_width = rows.iter().map(|r| r.name.len()).max().unwrap_or(0).max(4);

	println!(
		"{:<width$}  {:<6}  {:<8}  {}",
		"NAME",
		"STATUS",
		"PID",
		"LAST CHANGE",
		width = name_width
	);
	for row in rows {
		let status = format!("{:<6}", row.status.as_str());
		let status = match row.status {
			ProcessStatus::Up => status.green().to_string(),
			ProcessStatus::Down => status.red().to_string(),
		};
		let pid = row
			.pid
			.map(|p| p.to_string())
			.unwrap_or_else(|| "-".to_string());
		println!(
			"{:<width$}  {}  {:<8}  {} ago",
			row.name,
			status,
			pid,
			format_age(row.age_secs),
			width = name_width
		);
	}
}

/// Compact age rendering: `42s`, `3m`, `7h`, `2d`.
pub fn format_age(secs: i64) -> String {
	let secs = secs.max(0);
	if secs < 60 {
		format!("{}s", secs)
	} else if secs < 3600 {
		format!("{}m", secs / 60)
	} else if secs < 86400 {
		format!("{}h", secs / 3600)
	} else {
		format!("{}d", secs / 86400)
	}
}
