use crate::session::Session;
use std::io;
use std::path::Path;
use thiserror::Error;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
/// This mirrors the convention used by POSIX shells and many command-line tools.
pub type ExitCode = i32;

/// Classification of every failure a command can report.
///
/// Handlers and the fallback executor translate host-level faults into one of
/// these kinds before returning; nothing else escapes to the dispatch loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A named file, directory, or `cd` target does not exist.
    NotFound,
    /// A directory operation was pointed at a non-directory.
    NotADirectory,
    /// `rmdir` on a directory that still has entries.
    DirectoryNotEmpty,
    /// The host denied access to the path.
    PermissionDenied,
    /// Bad or missing operands, or a destination inside a missing directory.
    InvalidArgument,
    /// The input line could not be tokenized.
    ParseError,
    /// No builtin matched and no executable could be located or started.
    UnknownCommand,
    /// A fallback command exceeded its wall-clock budget and was killed.
    Timeout,
    /// The host does not expose the metrics a system command needs.
    Unavailable,
    /// Any filesystem fault not covered by a more specific kind.
    IoError,
}

impl ErrorKind {
    /// Exit code reported for results of this kind.
    ///
    /// Small distinct integers per kind; `Timeout` and `UnknownCommand` reuse
    /// the conventional 124/127 codes so fallback results read like a shell's.
    pub fn exit_code(self) -> ExitCode {
        match self {
            ErrorKind::NotFound => 1,
            ErrorKind::NotADirectory => 2,
            ErrorKind::DirectoryNotEmpty => 3,
            ErrorKind::PermissionDenied => 4,
            ErrorKind::InvalidArgument => 5,
            ErrorKind::ParseError => 6,
            ErrorKind::IoError => 7,
            ErrorKind::Unavailable => 8,
            ErrorKind::Timeout => 124,
            ErrorKind::UnknownCommand => 127,
        }
    }
}

/// A classified command failure with its user-facing message.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ShellError {
    kind: ErrorKind,
    message: String,
}

impl ShellError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Classify an [`io::Error`] raised while `command` operated on `path`.
    pub fn from_io(command: &str, path: &Path, err: io::Error) -> Self {
        let kind = match err.kind() {
            io::ErrorKind::NotFound => ErrorKind::NotFound,
            io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied,
            io::ErrorKind::NotADirectory => ErrorKind::NotADirectory,
            io::ErrorKind::DirectoryNotEmpty => ErrorKind::DirectoryNotEmpty,
            _ => ErrorKind::IoError,
        };
        Self::new(kind, format!("{}: {}: {}", command, path.display(), err))
    }
}

/// Structured output of a command, consumed by the formatter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    /// Plain lines, printed in order.
    Lines(Vec<String>),
    /// Tabular data rendered with column alignment (`ls -l`, `ps`).
    Table {
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
    },
}

/// The structured outcome of one dispatched command.
///
/// Failure is a normal result: it carries the taxonomy kind and the message as
/// output lines instead of raising. Produced once per dispatch, rendered, and
/// discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub exit_code: ExitCode,
    pub output: Output,
    pub error_kind: Option<ErrorKind>,
    /// Wall-clock execution time, stamped by the dispatcher.
    pub duration_ms: u64,
}

impl CommandResult {
    /// Successful result with no output.
    pub fn ok() -> Self {
        Self::lines(Vec::new())
    }

    /// Successful result with one output line.
    pub fn line(line: impl Into<String>) -> Self {
        Self::lines(vec![line.into()])
    }

    /// Successful result with the given output lines.
    pub fn lines(lines: Vec<String>) -> Self {
        Self {
            exit_code: 0,
            output: Output::Lines(lines),
            error_kind: None,
            duration_ms: 0,
        }
    }

    /// Successful tabular result.
    pub fn table(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            exit_code: 0,
            output: Output::Table { headers, rows },
            error_kind: None,
            duration_ms: 0,
        }
    }

    /// Failure result carrying the error's kind, message, and exit code.
    pub fn from_error(err: ShellError) -> Self {
        Self {
            exit_code: err.kind().exit_code(),
            output: Output::Lines(vec![err.to_string()]),
            error_kind: Some(err.kind()),
            duration_ms: 0,
        }
    }

    pub fn is_failure(&self) -> bool {
        self.error_kind.is_some()
    }
}

/// Object-safe trait for any command that can be executed by the shell.
///
/// Implemented by builtins via a blanket impl and by the external fallback.
pub trait ExecutableCommand {
    /// Executes the command against the session.
    ///
    /// An `Err` is converted into a failure [`CommandResult`] by the
    /// dispatcher; implementations never panic on user-triggered faults.
    fn execute(self: Box<Self>, session: &mut Session) -> Result<CommandResult, ShellError>;
}

/// Factory that tries to create a command from a name and its arguments.
///
/// Returns `None` when the factory doesn't recognize the `name`, letting the
/// dispatcher fall through to the next factory in the registry.
pub trait CommandFactory {
    /// Attempt to create a command instance for the provided name and arguments.
    fn try_create(&self, name: &str, args: &[&str]) -> Option<Box<dyn ExecutableCommand>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_exit_codes_are_distinct() {
        let kinds = [
            ErrorKind::NotFound,
            ErrorKind::NotADirectory,
            ErrorKind::DirectoryNotEmpty,
            ErrorKind::PermissionDenied,
            ErrorKind::InvalidArgument,
            ErrorKind::ParseError,
            ErrorKind::UnknownCommand,
            ErrorKind::Timeout,
            ErrorKind::Unavailable,
            ErrorKind::IoError,
        ];
        let codes: HashSet<ExitCode> = kinds.iter().map(|k| k.exit_code()).collect();
        assert_eq!(codes.len(), kinds.len());
        assert!(codes.iter().all(|&c| c != 0));
    }

    #[test]
    fn test_io_classification() {
        let err = io::Error::from(io::ErrorKind::NotFound);
        let shell_err = ShellError::from_io("cat", Path::new("missing.txt"), err);
        assert_eq!(shell_err.kind(), ErrorKind::NotFound);
        assert!(shell_err.to_string().starts_with("cat: missing.txt:"));

        let err = io::Error::from(io::ErrorKind::PermissionDenied);
        assert_eq!(
            ShellError::from_io("rm", Path::new("/etc/shadow"), err).kind(),
            ErrorKind::PermissionDenied
        );

        let err = io::Error::other("disk fell over");
        assert_eq!(
            ShellError::from_io("cp", Path::new("x"), err).kind(),
            ErrorKind::IoError
        );
    }

    #[test]
    fn test_failure_result_carries_kind_and_message() {
        let result = CommandResult::from_error(ShellError::new(
            ErrorKind::DirectoryNotEmpty,
            "rmdir: full: Directory not empty",
        ));
        assert_eq!(result.exit_code, ErrorKind::DirectoryNotEmpty.exit_code());
        assert_eq!(result.error_kind, Some(ErrorKind::DirectoryNotEmpty));
        assert!(result.is_failure());
        assert_eq!(
            result.output,
            Output::Lines(vec!["rmdir: full: Directory not empty".to_string()])
        );
    }
}
