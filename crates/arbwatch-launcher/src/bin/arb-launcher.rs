use std::path::PathBuf;

use clap::Parser;

use arbwatch_launcher::{launch_detached, LaunchOptions, LaunchTarget};

#[derive(Debug, Parser)]
#[command(name = "arb-launcher", version, about = "Launch a program and detach")]
struct Cli {
	/// File to redirect stdout
	#[arg(long)]
	stdout: Option<PathBuf>,
	/// File to redirect stderr
	#[arg(long)]
	stderr: Option<PathBuf>,
	/// Leave prior instances matching the same signature running
	#[arg(long)]
	no_kill_previous: bool,
	/// Program to launch and detach
	command: String,
	/// Arguments forwarded verbatim to the program
	#[arg(trailing_var_arg = true, allow_hyphen_values = true)]
	args: Vec<String>,
}

fn main() {
	tracing_subscriber::fmt().init();
	let cli = Cli::parse();

	let target = LaunchTarget::command(cli.command, cli.args);
	let options = LaunchOptions {
		stdout: cli.stdout,
		stderr: cli.stderr,
		kill_previous: !cli.no_kill_previous,
	};

	if let Err(e) = launch_detached(target, options) {
		tracing::error!("launch failed: {}", e);
		std::process::exit(1);
	}
}
