use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

use arbwatch_core::config::SharedConfig;

static TEST_COUNTER: AtomicU32 = AtomicU32::new(0);

fn temp_config(name: &str, content: &str) -> std::path::PathBuf {
	let n = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
	let dir = std::env::temp_dir().join(format!("arbwatch-test-{}-{}", n, name));
	let _ = std::fs::create_dir_all(&dir);
	let path = dir.join("arb_watchdog_config.json");
	std::fs::write(&path, content).unwrap();
	path
}

#[test]
fn load_reads_config_file() {
	let path = temp_config(
		"load",
		r#"{"redis_host": "localhost", "redis_port": 6379,
		    "interval": 60, "processes": ["fake_process", "another_fake_process"]}"#,
	);
	let config = SharedConfig::load(&path).unwrap();
	let view = config.get();
	assert_eq!(view.interval(), Duration::from_secs(60));
	assert_eq!(view.processes, vec!["fake_process", "another_fake_process"]);
}

#[test]
fn load_fails_on_malformed_content() {
	let path = temp_config("malformed", "{not json");
	assert!(SharedConfig::load(&path).is_err());
}

#[test]
fn load_fails_on_missing_file() {
	let path = std::env::temp_dir().join("arbwatch-test-does-not-exist.json");
	assert!(SharedConfig::load(&path).is_err());
}

#[test]
fn reload_replaces_whole_config() {
	let path = temp_config("reload", r#"{"interval": 60, "processes": ["a"]}"#);
	let config = SharedConfig::load(&path).unwrap();

	std::fs::write(&path, r#"{"interval": 30, "processes": ["a", "b"]}"#).unwrap();
	config.reload().unwrap();

	let view = config.get();
	assert_eq!(view.interval(), Duration::from_secs(30));
	assert_eq!(view.processes, vec!["a", "b"]);
}

#[test]
fn failed_reload_keeps_previous_config() {
	let path = temp_config("bad-reload", r#"{"interval": 60}"#);
	let config = SharedConfig::load(&path).unwrap();

	std::fs::write(&path, "{broken").unwrap();
	assert!(config.reload().is_err());
	assert_eq!(config.get().interval(), Duration::from_secs(60));
}

#[test]
fn clones_share_one_live_config() {
	let path = temp_config("shared", r#"{"interval": 60}"#);
	let config = SharedConfig::load(&path).unwrap();
	let other = config.clone();

	std::fs::write(&path, r#"{"interval": 30}"#).unwrap();
	config.reload().unwrap();

	// The second holder observes the update without reloading itself.
	assert_eq!(other.get().interval(), Duration::from_secs(30));
}

#[test]
fn watch_applies_file_changes() {
	let path = temp_config("watch", r#"{"interval": 60}"#);
	let config = SharedConfig::load(&path).unwrap();
	config.watch().unwrap();
	// Second call is a no-op, not a second watcher.
	config.watch().unwrap();

	std::fs::write(&path, r#"{"interval": 30}"#).unwrap();

	let reader = config.clone();
	let deadline = Instant::now() + Duration::from_secs(10);
	let updated = loop {
		if reader.get().interval() == Duration::from_secs(30) {
			break true;
		}
		if Instant::now() > deadline {
			break false;
		}
		std::thread::sleep(Duration::from_millis(50));
	};
	config.stop_watching();
	assert!(updated, "watcher never applied the config change");
}

#[test]
fn watch_survives_malformed_rewrite() {
	let path = temp_config("watch-bad", r#"{"interval": 60}"#);
	let config = SharedConfig::load(&path).unwrap();
	config.watch().unwrap();

	std::fs::write(&path, "{broken").unwrap();
	std::thread::sleep(Duration::from_millis(500));
	// Corrupt reload is skipped wholesale.
	assert_eq!(config.get().interval(), Duration::from_secs(60));

	std::fs::write(&path, r#"{"interval": 5}"#).unwrap();
	let deadline = Instant::now() + Duration::from_secs(10);
	let updated = loop {
		if config.get().interval() == Duration::from_secs(5) {
			break true;
		}
		if Instant::now() > deadline {
			break false;
		}
		std::thread::sleep(Duration::from_millis(50));
	};
	config.stop_watching();
	assert!(updated, "watcher did not recover after a malformed reload");
}
