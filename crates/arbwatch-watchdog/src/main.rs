use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use arbwatch_core::config::SharedConfig;
use arbwatch_core::procs::SystemDirectory;
use arbwatch_core::store::RedisStore;
use arbwatch_watchdog::{status, ProcessWatcher};

#[derive(Debug, Parser)]
#[command(name = "arb-watchdog", version, about = "Process watcher")]
struct Cli {
	/// Path to the configuration file
	/// (defaults to $ARB_CONFIGS_PATH/arb_watchdog_config.json)
	#[arg(short = 'f', long, value_name = "PATH")]
	config_file: Option<PathBuf>,
	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
	/// Print the stored status of every tracked process and exit
	Status,
}

fn default_config_path() -> PathBuf {
	match std::env::var("ARB_CONFIGS_PATH") {
		Ok(dir) => Path::new(&dir).join("arb_watchdog_config.json"),
		Err(_) => PathBuf::from("arb_watchdog_config.json"),
	}
}

#[tokio::main]
async fn main() {
	tracing_subscriber::fmt().init();
	let cli = Cli::parse();
	let config_file = cli.config_file.unwrap_or_else(default_config_path);

	match cli.command {
		Some(Command::Status) => cmd_status(&config_file).await,
		None => run_watcher(&config_file).await,
	}
}

async fn connect_store(config: &SharedConfig) -> RedisStore {
	let (host, port) = {
		let view = config.get();
		(view.redis_host().to_string(), view.redis_port())
	};
	match RedisStore::connect(&host, port).await {
		Ok(store) => store,
		Err(e) => {
			tracing::error!("error while connecting to redis: {}", e);
			std::process::exit(1);
		}
	}
}

fn load_config(config_file: &Path) -> SharedConfig {
	match SharedConfig::load(config_file) {
		Ok(config) => config,
		Err(e) => {
			tracing::error!("{}", e);
			std::process::exit(1);
		}
	}
}

async fn run_watcher(config_file: &Path) {
	tracing::info!("starting arb watchdog");
	let config = load_config(config_file);
	if let Err(e) = config.watch() {
		tracing::error!("failed to watch config file: {}", e);
		std::process::exit(1);
	}

	let store = connect_store(&config).await;
	let mut watcher = ProcessWatcher::new(config, SystemDirectory::new(), store);

	tokio::select! {
		_ = watcher.run() => {}
		_ = tokio::signal::ctrl_c() => {
			tracing::info!("shutting down");
		}
	}
}

async fn cmd_status(config_file: &Path) {
	let config = load_config(config_file);
	let mut store = connect_store(&config).await;
	let names = config.get().processes.clone();
	let rows = status::collect_rows(&names, &mut store).await;
	status::print_rows(&rows);
}
