use std::collections::VecDeque;
use std::env as stdenv;
use std::path::{Path, PathBuf};

/// Upper bound on the in-memory command history; oldest entries are evicted.
pub const HISTORY_CAPACITY: usize = 100;

/// Mutable per-run state shared across all commands in one interactive run.
///
/// The session contains:
/// - `cwd`: the working directory commands resolve relative paths against.
/// - `previous_cwd`: the directory active before the last `cd`, for `cd -`.
/// - `history`: the raw input lines of well-formed commands, capped at
///   [`HISTORY_CAPACITY`].
/// - `should_exit`: a flag the REPL loop checks to know when to terminate.
///
/// The session is owned exclusively by the dispatcher; exactly one command is
/// ever in flight, so handlers receive `&mut Session` without any locking.
#[derive(Debug, Clone)]
pub struct Session {
    cwd: PathBuf,
    previous_cwd: Option<PathBuf>,
    history: VecDeque<String>,
    /// When set to true, indicates that the interactive loop should exit.
    pub should_exit: bool,
}

impl Session {
    /// Capture the current process state into a new `Session`.
    pub fn new() -> Self {
        let cwd = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::at(cwd)
    }

    /// Create a session rooted at an explicit working directory.
    pub fn at(cwd: PathBuf) -> Self {
        Self {
            cwd,
            previous_cwd: None,
            history: VecDeque::with_capacity(HISTORY_CAPACITY),
            should_exit: false,
        }
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn previous_cwd(&self) -> Option<&Path> {
        self.previous_cwd.as_deref()
    }

    /// Resolve `path` against the working directory unless it is absolute.
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cwd.join(path)
        }
    }

    /// Switch the working directory after a successful `cd`.
    ///
    /// `previous_cwd` is updated only when `target` differs from the current
    /// directory, so `cd -` toggles between exactly the last two distinct
    /// directories.
    pub fn change_dir(&mut self, target: PathBuf) {
        if target != self.cwd {
            self.previous_cwd = Some(std::mem::replace(&mut self.cwd, target));
        }
    }

    /// Append a raw input line to the history, evicting the oldest entry at
    /// capacity.
    pub fn record(&mut self, line: &str) {
        if self.history.len() == HISTORY_CAPACITY {
            self.history.pop_front();
        }
        self.history.push_back(line.to_string());
        // Internal invariant; a violation here is a bug, not a user fault.
        assert!(self.history.len() <= HISTORY_CAPACITY);
    }

    /// The recorded lines in insertion order, most recent last.
    pub fn history(&self) -> impl Iterator<Item = &str> {
        self.history.iter().map(String::as_str)
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// The home directory from the environment (`HOME`, or `USERPROFILE` on
    /// hosts that use it).
    pub fn home_dir() -> Option<PathBuf> {
        stdenv::var_os("HOME")
            .or_else(|| stdenv::var_os("USERPROFILE"))
            .map(PathBuf::from)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
