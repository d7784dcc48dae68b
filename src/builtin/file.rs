use crate::builtin::BuiltinCommand;
use crate::command::{CommandResult, ErrorKind, ShellError};
use crate::session::Session;
use argh::FromArgs;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

#[derive(FromArgs)]
/// Create empty files or refresh their modification time.
pub struct Touch {
    #[argh(positional, greedy)]
    /// files to create or refresh.
    pub files: Vec<String>,
}

impl BuiltinCommand for Touch {
    fn name() -> &'static str {
        "touch"
    }

    fn run(self, session: &mut Session) -> Result<CommandResult, ShellError> {
        if self.files.is_empty() {
            return Err(ShellError::new(
                ErrorKind::InvalidArgument,
                "touch: missing operand",
            ));
        }
        let mut lines = Vec::with_capacity(self.files.len());
        for name in &self.files {
            let path = session.resolve(name);
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .map_err(|e| ShellError::from_io("touch", &path, e))?;
            file.set_modified(SystemTime::now())
                .map_err(|e| ShellError::from_io("touch", &path, e))?;
            lines.push(format!("File '{}' created/updated", name));
        }
        Ok(CommandResult::lines(lines))
    }
}

#[derive(FromArgs)]
/// Display file contents.
pub struct Cat {
    #[argh(positional, greedy)]
    /// files to print in order.
    pub files: Vec<String>,
}

impl BuiltinCommand for Cat {
    fn name() -> &'static str {
        "cat"
    }

    fn run(self, session: &mut Session) -> Result<CommandResult, ShellError> {
        if self.files.is_empty() {
            return Err(ShellError::new(
                ErrorKind::InvalidArgument,
                "cat: missing operand",
            ));
        }
        let mut lines = Vec::new();
        for name in &self.files {
            let path = session.resolve(name);
            let content =
                fs::read_to_string(&path).map_err(|e| ShellError::from_io("cat", &path, e))?;
            lines.push(format!("--- {} ---", name));
            lines.extend(content.lines().map(str::to_string));
            lines.push(format!("--- End of {} ---", name));
        }
        Ok(CommandResult::lines(lines))
    }
}

#[derive(FromArgs)]
/// Copy a file.
pub struct Cp {
    #[argh(positional)]
    /// file to copy.
    pub source: String,

    #[argh(positional)]
    /// destination file or directory.
    pub dest: String,
}

impl BuiltinCommand for Cp {
    fn name() -> &'static str {
        "cp"
    }

    fn run(self, session: &mut Session) -> Result<CommandResult, ShellError> {
        let source = session.resolve(&self.source);
        if !source.exists() {
            return Err(ShellError::new(
                ErrorKind::NotFound,
                format!("cp: {}: No such file or directory", self.source),
            ));
        }
        let target = destination_path(session, &source, &self.dest, "cp")?;
        fs::copy(&source, &target).map_err(|e| ShellError::from_io("cp", &target, e))?;
        Ok(CommandResult::line(format!(
            "'{}' copied to '{}'",
            self.source, self.dest
        )))
    }
}

#[derive(FromArgs)]
/// Move or rename a file.
pub struct Mv {
    #[argh(positional)]
    /// file to move.
    pub source: String,

    #[argh(positional)]
    /// destination file or directory.
    pub dest: String,
}

impl BuiltinCommand for Mv {
    fn name() -> &'static str {
        "mv"
    }

    fn run(self, session: &mut Session) -> Result<CommandResult, ShellError> {
        let source = session.resolve(&self.source);
        if !source.exists() {
            return Err(ShellError::new(
                ErrorKind::NotFound,
                format!("mv: {}: No such file or directory", self.source),
            ));
        }
        let target = destination_path(session, &source, &self.dest, "mv")?;
        fs::rename(&source, &target).map_err(|e| ShellError::from_io("mv", &target, e))?;
        Ok(CommandResult::line(format!(
            "'{}' moved to '{}'",
            self.source, self.dest
        )))
    }
}

#[derive(FromArgs)]
/// Remove files.
pub struct Rm {
    #[argh(positional, greedy)]
    /// files to remove.
    pub files: Vec<String>,
}

impl BuiltinCommand for Rm {
    fn name() -> &'static str {
        "rm"
    }

    fn run(self, session: &mut Session) -> Result<CommandResult, ShellError> {
        if self.files.is_empty() {
            return Err(ShellError::new(
                ErrorKind::InvalidArgument,
                "rm: missing operand",
            ));
        }
        let mut lines = Vec::with_capacity(self.files.len());
        for name in &self.files {
            let path = session.resolve(name);
            if !path.is_file() {
                return Err(ShellError::new(
                    ErrorKind::NotFound,
                    format!("rm: {}: No such file", name),
                ));
            }
            fs::remove_file(&path).map_err(|e| ShellError::from_io("rm", &path, e))?;
            lines.push(format!("File '{}' removed", name));
        }
        Ok(CommandResult::lines(lines))
    }
}

/// Resolve the destination of `cp`/`mv`.
///
/// A destination that is an existing directory receives the source's file
/// name; a destination inside a directory that does not exist is rejected as
/// `InvalidArgument` before the copy/rename is attempted.
fn destination_path(
    session: &Session,
    source: &Path,
    dest: &str,
    command: &str,
) -> Result<PathBuf, ShellError> {
    let resolved = session.resolve(dest);
    let target = if resolved.is_dir() {
        match source.file_name() {
            Some(file_name) => resolved.join(file_name),
            None => resolved,
        }
    } else {
        resolved
    };
    if let Some(parent) = target.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            return Err(ShellError::new(
                ErrorKind::InvalidArgument,
                format!("{}: {}: no such directory", command, parent.display()),
            ));
        }
    }
    Ok(target)
}
