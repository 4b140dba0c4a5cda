use std::fmt;
use std::fs::OpenOptions;
use std::io;
use std::os::unix::io::IntoRawFd;
use std::path::{Path, PathBuf};

use nix::sys::signal::{kill, Signal};
use nix::sys::wait::waitpid;
use nix::unistd::{fork, setsid, ForkResult, Pid};

use arbwatch_core::procs::{find_matching, ProcessDirectory, SystemDirectory};

use crate::target::LaunchTarget;

const NULL_SINK: &str = "/dev/null";

/// Errors observable by the caller of [`launch_detached`]. Anything going
/// wrong inside the detached worker is logged there and never surfaces here.
#[derive(Debug)]
pub enum LaunchError {
	/// Failed to compute the signature or touch the redirection paths.
	Io(io::Error),
	/// The initial fork failed.
	Fork(nix::Error),
}

impl fmt::Display for LaunchError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			LaunchError::Io(e) => write!(f, "io error: {}", e),
			LaunchError::Fork(e) => write!(f, "fork failed: {}", e),
		}
	}
}

impl std::error::Error for LaunchError {}

impl From<io::Error> for LaunchError {
	fn from(e: io::Error) -> Self {
		LaunchError::Io(e)
	}
}

#[derive(Debug, Clone)]
pub struct LaunchOptions {
	/// Redirection target for the worker's stdout; `/dev/null` if unset.
	pub stdout: Option<PathBuf>,
	/// Redirection target for the worker's stderr; `/dev/null` if unset.
	pub stderr: Option<PathBuf>,
	/// Terminate prior instances matching the target's signature first.
	pub kill_previous: bool,
}

impl Default for LaunchOptions {
	fn default() -> Self {
		Self {
			stdout: None,
			stderr: None,
			kill_previous: true,
		}
	}
}

/// Launch `target` as a daemon detached from the calling process.
///
/// Returns once the daemon has been spawned and detached; the worker's exit
/// status is never reported back. The detach uses a double fork: the
/// intermediate child starts a new session and forks the worker, then exits
/// immediately, reparenting the worker to init. The caller blocks only on the
/// intermediate child's exit.
///
/// Must be called before the process spawns threads or an async runtime;
/// forking a multi-threaded process is not safe.
pub fn launch_detached(target: LaunchTarget, options: LaunchOptions) -> Result<(), LaunchError> {
	let signature = target.signature()?;

	if options.kill_previous {
		let mut directory = SystemDirectory::new();
		terminate_matching(&mut directory, &signature);
	}

	let stdout = options.stdout.unwrap_or_else(|| PathBuf::from(NULL_SINK));
	let stderr = options.stderr.unwrap_or_else(|| PathBuf::from(NULL_SINK));

	tracing::debug!("forking from pid {}", std::process::id());
	match unsafe { fork() }.map_err(LaunchError::Fork)? {
		ForkResult::Parent { child } => {
			// Near-instant: the intermediate child exits as soon as the
			// worker is forked.
			let _ = waitpid(child, None);
			Ok(())
		}
		ForkResult::Child => {
			// Intermediate child: new session, so terminal closure and
			// SIGHUP no longer propagate to the worker.
			if let Err(e) = setsid() {
				tracing::warn!("setsid failed: {}", e);
			}
			match unsafe { fork() } {
				Ok(ForkResult::Parent { .. }) => unsafe { libc::_exit(0) },
				Ok(ForkResult::Child) => {
					let code = run_worker(target, &signature, &stdout, &stderr);
					std::process::exit(code);
				}
				Err(_) => unsafe { libc::_exit(1) },
			}
		}
	}
}

/// SIGTERM every process whose command line contains `signature`, excluding
/// the calling process. Best effort, fire and continue: each attempt is
/// independent and a failure never aborts the rest. Returns the number of
/// termination requests that were delivered.
pub fn terminate_matching(directory: &mut impl ProcessDirectory, signature: &str) -> usize {
	let own_pid = std::process::id();
	tracing::info!("terminating processes matching: {}", signature);

	let entries = directory.list();
	let mut delivered = 0;
	for entry in find_matching(&entries, signature, own_pid) {
		tracing::info!(
			"terminating process {} with cmdline: {}",
			entry.pid,
			entry.cmdline
		);
		match kill(Pid::from_raw(entry.pid as i32), Signal::SIGTERM) {
			Ok(()) => delivered += 1,
			Err(e) => tracing::warn!("failed to terminate process {}: {}", entry.pid, e),
		}
	}
	delivered
}

/// Shell-style tokenization of a command string (quotes honored).
/// `None` for unbalanced quoting or an empty command.
pub fn split_command(command: &str) -> Option<Vec<String>> {
	match shlex::split(command) {
		Some(tokens) if !tokens.is_empty() => Some(tokens),
		_ => None,
	}
}

// From here on we are the detached worker: stdio is rebound, errors are
// logged (landing in the stderr redirection) and turned into exit codes.
fn run_worker(target: LaunchTarget, signature: &str, stdout: &Path, stderr: &Path) -> i32 {
	if let Err(e) = redirect_stdio(stdout, stderr) {
		tracing::error!("failed to redirect stdio: {}", e);
		return 1;
	}
	// Keeps signature-substring matching, including this worker's own future
	// termination, working against the process title.
	set_process_title(signature);

	match target {
		LaunchTarget::Callable { name, args, routine } => {
			tracing::info!(
				"running routine as process: {} (pid {})",
				name,
				std::process::id()
			);
			routine(&args);
			0
		}
		LaunchTarget::Command { command, args } => {
			let Some(tokens) = split_command(&command) else {
				tracing::error!("cannot tokenize command: {:?}", command);
				return 1;
			};
			tracing::info!(
				"running command as process: {} {}",
				tokens.join(" "),
				args.join(" ")
			);
			// The child inherits the rebound stdout/stderr.
			match std::process::Command::new(&tokens[0])
				.args(&tokens[1..])
				.args(&args)
				.status()
			{
				Ok(status) => status.code().unwrap_or(1),
				Err(e) => {
					tracing::error!("failed to spawn {}: {}", tokens[0], e);
					1
				}
			}
		}
	}
}

fn redirect_stdio(stdout: &Path, stderr: &Path) -> io::Result<()> {
	let out = OpenOptions::new()
		.write(true)
		.create(true)
		.truncate(true)
		.open(stdout)?;
	let err = OpenOptions::new()
		.write(true)
		.create(true)
		.truncate(true)
		.open(stderr)?;
	// into_raw_fd leaks the files on purpose; fds 1 and 2 own them now.
	unsafe {
		if libc::dup2(out.into_raw_fd(), 1) < 0 {
			return Err(io::Error::last_os_error());
		}
		if libc::dup2(err.into_raw_fd(), 2) < 0 {
			return Err(io::Error::last_os_error());
		}
	}
	Ok(())
}

#[cfg(target_os = "linux")]
fn set_process_title(title: &str) {
	// The kernel caps comm at 15 bytes, so long signatures are truncated.
	if let Ok(c) = std::ffi::CString::new(title) {
		unsafe {
			libc::prctl(libc::PR_SET_NAME, c.as_ptr());
		}
	}
}

#[cfg(not(target_os = "linux"))]
fn set_process_title(_title: &str) {}
