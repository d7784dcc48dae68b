use crate::builtin::BuiltinCommand;
use crate::command::{CommandResult, ErrorKind, ShellError};
use crate::session::Session;
use argh::{EarlyExit, FromArgs};
use std::fs;
use std::path::PathBuf;

#[derive(FromArgs)]
/// Print the current working directory.
pub struct Pwd {}

impl BuiltinCommand for Pwd {
    fn name() -> &'static str {
        "pwd"
    }

    fn run(self, session: &mut Session) -> Result<CommandResult, ShellError> {
        Ok(CommandResult::line(session.cwd().display().to_string()))
    }
}

/// Change the current working directory.
/// With no target (or `~`) changes to the home directory; `-` returns to the
/// previous directory.
pub struct Cd {
    /// directory to switch to; absolute or relative to the current directory.
    pub target: Option<String>,
}

// `-` and `~` are targets, not flags, so cd parses its argument by hand
// rather than through the derive.
impl FromArgs for Cd {
    fn from_args(command_name: &[&str], args: &[&str]) -> Result<Self, EarlyExit> {
        if args.contains(&"--help") {
            return Err(EarlyExit {
                output: format!(
                    "Usage: {} [path|~|-]\n\nChange the current working directory.\n\
                     With no target (or `~`) changes to the home directory; `-` returns\n\
                     to the previous directory.",
                    command_name.join(" ")
                ),
                status: Ok(()),
            });
        }
        match args {
            [] => Ok(Cd { target: None }),
            [target] => Ok(Cd {
                target: Some((*target).to_string()),
            }),
            _ => Err(EarlyExit {
                output: format!("{}: too many arguments", command_name.join(" ")),
                status: Err(()),
            }),
        }
    }
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn run(self, session: &mut Session) -> Result<CommandResult, ShellError> {
        let requested: PathBuf = match self.target.as_deref() {
            None | Some("~") => Session::home_dir().ok_or_else(|| {
                ShellError::new(ErrorKind::InvalidArgument, "cd: HOME not set")
            })?,
            Some("-") => session
                .previous_cwd()
                .ok_or_else(|| {
                    ShellError::new(ErrorKind::InvalidArgument, "cd: no previous directory")
                })?
                .to_path_buf(),
            Some(path) => session.resolve(path),
        };

        if !requested.exists() {
            return Err(ShellError::new(
                ErrorKind::NotFound,
                format!("cd: {}: No such file or directory", requested.display()),
            ));
        }
        if !requested.is_dir() {
            return Err(ShellError::new(
                ErrorKind::NotADirectory,
                format!("cd: {}: Not a directory", requested.display()),
            ));
        }

        let canonical =
            fs::canonicalize(&requested).map_err(|e| ShellError::from_io("cd", &requested, e))?;
        session.change_dir(canonical.clone());
        Ok(CommandResult::line(format!(
            "Changed to: {}",
            canonical.display()
        )))
    }
}
