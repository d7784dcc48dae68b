//! An interactive command terminal with POSIX-style builtins.
//!
//! This crate implements a small set of file, directory, process, and
//! system-info commands natively and delegates anything it does not recognize
//! to the host operating system under a bounded time budget. The main entry
//! point is [`Interpreter`], which owns the per-run [`Session`] and drives the
//! read-execute-print loop. The public modules [`command`], [`lexer`], and
//! [`format`] expose the structured result model, the tokenizer, and the
//! renderer for embedding or testing.

mod builtin;
pub mod command;
mod external;
pub mod format;
mod interpreter;
pub mod lexer;
pub mod session;

pub use command::{CommandResult, ErrorKind, ExitCode, Output, ShellError};
pub use external::FALLBACK_TIMEOUT;
pub use interpreter::Interpreter;
pub use session::Session;
