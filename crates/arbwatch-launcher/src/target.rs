use std::fmt;
use std::io;

/// What to run once detached: an external command line, or a routine invoked
/// in-process inside the detached worker. Immutable once constructed.
pub enum LaunchTarget {
	Command {
		/// Command string; tokenized with shell-style quoting before spawn.
		command: String,
		/// Extra arguments appended verbatim after the tokenized command.
		args: Vec<String>,
	},
	Callable {
		/// Stable identity for the routine; shows up in the signature and in
		/// the worker's process title.
		name: String,
		args: Vec<String>,
		routine: Box<dyn FnOnce(&[String]) + Send>,
	},
}

impl LaunchTarget {
	pub fn command(command: impl Into<String>, args: Vec<String>) -> Self {
		LaunchTarget::Command {
			command: command.into(),
			args,
		}
	}

	pub fn callable(
		name: impl Into<String>,
		args: Vec<String>,
		routine: impl FnOnce(&[String]) + Send + 'static,
	) -> Self {
		LaunchTarget::Callable {
			name: name.into(),
			args,
			routine: Box::new(routine),
		}
	}

	/// Identity signature: the string this target is expected to show as (a
	/// substring of) its command line once running. Used as a loose substring
	/// key for matching prior instances, not a strict identity — distinct
	/// targets with overlapping signatures can collide.
	pub fn signature(&self) -> io::Result<String> {
		match self {
			LaunchTarget::Command { command, args } => {
				Ok(format!("{} {}", command, args.join(" ")).trim().to_string())
			}
			LaunchTarget::Callable { name, args, .. } => {
				let exe = std::env::current_exe()?;
				Ok(format!("{} {}({})", exe.display(), name, args.join(","))
					.trim()
					.to_string())
			}
		}
	}
}

impl fmt::Debug for LaunchTarget {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			LaunchTarget::Command { command, args } => f
				.debug_struct("Command")
				.field("command", command)
				.field("args", args)
				.finish(),
			LaunchTarget::Callable { name, args, .. } => f
				.debug_struct("Callable")
				.field("name", name)
				.field("args", args)
				.finish_non_exhaustive(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn command_signature_joins_args_with_spaces() {
		let target = LaunchTarget::command(
			"python3 metrics_worker.py",
			vec!["--port".into(), "9".into()],
		);
		assert_eq!(
			target.signature().unwrap(),
			"python3 metrics_worker.py --port 9"
		);
	}

	#[test]
	fn command_signature_without_args_has_no_trailing_space() {
		let target = LaunchTarget::command("metrics_worker", vec![]);
		assert_eq!(target.signature().unwrap(), "metrics_worker");
	}

	#[test]
	fn callable_signature_names_exe_and_routine() {
		let target = LaunchTarget::callable(
			"metrics::collect",
			vec!["9".into(), "fast".into()],
			|_args| {},
		);
		let sig = target.signature().unwrap();
		let exe = std::env::current_exe().unwrap();
		assert!(sig.starts_with(&exe.display().to_string()));
		assert!(sig.ends_with("metrics::collect(9,fast)"));
	}
}
