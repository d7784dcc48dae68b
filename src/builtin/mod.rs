//! Built-in commands known to the shell at compile time.
//!
//! Builtins are parsed using the [`argh`] crate (`FromArgs`) and executed
//! directly in-process; each returns a structured [`CommandResult`] instead of
//! writing to the terminal itself.

use crate::command::{CommandFactory, CommandResult, ErrorKind, ExecutableCommand, ShellError};
use crate::interpreter::Factory;
use crate::session::Session;
use argh::{EarlyExit, FromArgs};

mod dir;
mod file;
mod nav;
mod system;
mod util;

pub(crate) use dir::{Ls, Mkdir, Rmdir};
pub(crate) use file::{Cat, Cp, Mv, Rm, Touch};
pub(crate) use nav::{Cd, Pwd};
pub(crate) use system::{current_user, Ps, SysInfo, Top};
pub(crate) use util::{Clear, Demo, Echo, Exit, Help, History, Version};

/// Contract shared by every builtin handler.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "echo" or "cd".
    fn name() -> &'static str;

    /// Additional names the command answers to (e.g. `dir` for `ls`).
    fn aliases() -> &'static [&'static str] {
        &[]
    }

    /// Executes the command against the session.
    fn run(self, session: &mut Session) -> Result<CommandResult, ShellError>;
}

impl<T: BuiltinCommand> ExecutableCommand for T {
    fn execute(self: Box<Self>, session: &mut Session) -> Result<CommandResult, ShellError> {
        (*self).run(session)
    }
}

/// Pseudo-command carrying argh's usage text for `--help` and flag errors.
struct Usage {
    output: String,
    is_error: bool,
}

impl ExecutableCommand for Usage {
    fn execute(self: Box<Self>, _session: &mut Session) -> Result<CommandResult, ShellError> {
        if self.is_error {
            Err(ShellError::new(ErrorKind::InvalidArgument, self.output))
        } else {
            Ok(CommandResult::lines(
                self.output.lines().map(str::to_string).collect(),
            ))
        }
    }
}

impl<T: BuiltinCommand + 'static> CommandFactory for Factory<T> {
    fn try_create(&self, name: &str, args: &[&str]) -> Option<Box<dyn ExecutableCommand>> {
        if name != T::name() && !T::aliases().contains(&name) {
            return None;
        }
        Some(match T::from_args(&[name], args) {
            Ok(cmd) => Box::new(cmd),
            Err(EarlyExit { output, status }) => Box::new(Usage {
                output,
                is_error: status.is_err(),
            }),
        })
    }
}
