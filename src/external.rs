//! Fallback execution of host executables for names no builtin claims.

use crate::command::{
    CommandFactory, CommandResult, ErrorKind, ExecutableCommand, Output, ShellError,
};
use crate::interpreter::Factory;
use crate::session::Session;
use std::ffi::{OsStr, OsString};
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Hard wall-clock budget for a fallback command.
pub const FALLBACK_TIMEOUT: Duration = Duration::from_secs(30);

const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Command that is not a builtin, resolved to a host executable.
pub struct ExternalCommand {
    program: OsString,
    args: Vec<OsString>,
    timeout: Duration,
}

impl ExternalCommand {
    pub fn new(program: OsString, args: Vec<OsString>) -> Self {
        Self {
            program,
            args,
            timeout: FALLBACK_TIMEOUT,
        }
    }

    /// Override the wall-clock budget.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl CommandFactory for Factory<ExternalCommand> {
    fn try_create(&self, name: &str, args: &[&str]) -> Option<Box<dyn ExecutableCommand>> {
        let search_paths = std::env::var_os("PATH")?;
        let executable = find_command_path(&search_paths, Path::new(name))?;
        Some(Box::new(ExternalCommand::new(
            executable.into_os_string(),
            args.iter().map(Into::into).collect(),
        )))
    }
}

impl ExecutableCommand for ExternalCommand {
    fn execute(self: Box<Self>, session: &mut Session) -> Result<CommandResult, ShellError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .current_dir(session.cwd())
            .stdin(Stdio::inherit())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                ShellError::new(
                    ErrorKind::UnknownCommand,
                    format!("{}: {}", self.program.to_string_lossy(), e),
                )
            })?;

        // Drain both pipes off-thread so a chatty child can't block on a full
        // pipe while we wait on it.
        let stdout_lines = child.stdout.take().map(drain_lines);
        let stderr_lines = child.stderr.take().map(drain_lines);

        match supervise(&mut child, self.timeout) {
            WaitOutcome::Exited(status) => {
                let mut lines = collect(stdout_lines);
                lines.extend(collect(stderr_lines));
                let exit_code = status.code().unwrap_or_else(|| terminated_by_signal(status));
                debug!(program = %self.program.to_string_lossy(), exit_code, "fallback finished");
                Ok(CommandResult {
                    exit_code,
                    output: Output::Lines(lines),
                    error_kind: None,
                    duration_ms: 0,
                })
            }
            WaitOutcome::TimedOut => {
                warn!(
                    program = %self.program.to_string_lossy(),
                    timeout_secs = self.timeout.as_secs(),
                    "fallback exceeded its budget, killing"
                );
                let _ = child.kill();
                // Reap so no zombie outlives the dispatch.
                let _ = child.wait();
                let mut lines = collect(stdout_lines);
                lines.extend(collect(stderr_lines));
                lines.push(format!(
                    "{}: command timed out after {}s",
                    self.program.to_string_lossy(),
                    self.timeout.as_secs()
                ));
                Ok(CommandResult {
                    exit_code: ErrorKind::Timeout.exit_code(),
                    output: Output::Lines(lines),
                    error_kind: Some(ErrorKind::Timeout),
                    duration_ms: 0,
                })
            }
        }
    }
}

enum WaitOutcome {
    Exited(ExitStatus),
    TimedOut,
}

/// Wait for the child against a deadline without blocking indefinitely.
fn supervise(child: &mut Child, timeout: Duration) -> WaitOutcome {
    let deadline = Instant::now() + timeout;
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return WaitOutcome::Exited(status),
            Ok(None) => {}
            // try_wait only fails on host-level oddities; treat the child as
            // hung and let the timeout path kill and reap it.
            Err(_) => {}
        }
        if Instant::now() >= deadline {
            return WaitOutcome::TimedOut;
        }
        thread::sleep(WAIT_POLL_INTERVAL.min(deadline.saturating_duration_since(Instant::now())));
    }
}

fn drain_lines<R: Read + Send + 'static>(reader: R) -> JoinHandle<Vec<String>> {
    thread::spawn(move || {
        BufReader::new(reader)
            .lines()
            .map_while(Result::ok)
            .collect()
    })
}

fn collect(handle: Option<JoinHandle<Vec<String>>>) -> Vec<String> {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}

#[cfg(unix)]
fn terminated_by_signal(exit_status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    if let Some(signal) = ExitStatusExt::signal(&exit_status) {
        128 + signal
    } else if ExitStatusExt::core_dumped(&exit_status) {
        255
    } else {
        -1
    }
}

#[cfg(not(unix))]
fn terminated_by_signal(_exit_status: ExitStatus) -> i32 {
    -1
}

/// Resolve a command path the way a typical shell would.
///
/// Absolute paths and multi-component relative paths are accepted if they
/// exist; a single bare component is searched for in each directory of
/// `search_paths` (PATH); an empty path resolves to nothing.
pub fn find_command_path(search_paths: &OsStr, path: &Path) -> Option<PathBuf> {
    if path.as_os_str().is_empty() {
        return None;
    }
    if path.is_absolute() {
        return path.exists().then(|| path.to_path_buf());
    }

    let search_in_current_dir = cfg!(not(unix)) || path.starts_with("./");
    if search_in_current_dir && path.exists() {
        return Some(path.to_path_buf());
    }

    if path.components().count() > 1 {
        return path.exists().then(|| path.to_path_buf());
    }

    for dir in std::env::split_paths(search_paths) {
        let candidate = dir.join(path);
        if candidate.exists() {
            return Some(candidate);
        }
    }
    None
}
