use crate::builtin::BuiltinCommand;
use crate::command::{CommandResult, ErrorKind, ShellError};
use crate::session::Session;
use argh::FromArgs;
use chrono::{DateTime, Local};
use std::fs::{self, Metadata};

#[derive(FromArgs)]
/// List directory contents.
pub struct Ls {
    #[argh(positional)]
    /// directory to list; defaults to the current directory.
    pub path: Option<String>,

    #[argh(switch, short = 'l')]
    /// detailed listing: permissions, size, modification time, name.
    pub long: bool,

    #[argh(switch, short = 'a')]
    /// include hidden entries.
    pub all: bool,
}

impl BuiltinCommand for Ls {
    fn name() -> &'static str {
        "ls"
    }

    fn aliases() -> &'static [&'static str] {
        &["dir"]
    }

    fn run(self, session: &mut Session) -> Result<CommandResult, ShellError> {
        let display = self.path.as_deref().unwrap_or(".");
        let path = match &self.path {
            Some(p) => session.resolve(p),
            None => session.cwd().to_path_buf(),
        };
        if !path.exists() {
            return Err(ShellError::new(
                ErrorKind::NotFound,
                format!("ls: {}: No such file or directory", display),
            ));
        }

        let mut names: Vec<String> = Vec::new();
        for entry in fs::read_dir(&path).map_err(|e| ShellError::from_io("ls", &path, e))? {
            let entry = entry.map_err(|e| ShellError::from_io("ls", &path, e))?;
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        if !self.all {
            names.retain(|name| !name.starts_with('.'));
        }
        names.sort();

        if !self.long {
            return Ok(CommandResult::line(names.join("  ")));
        }

        let rows = names
            .iter()
            .map(|name| match fs::metadata(path.join(name)) {
                Ok(meta) => vec![
                    mode_string(&meta),
                    meta.len().to_string(),
                    modified_stamp(&meta),
                    name.clone(),
                ],
                // Entry vanished or is unreadable; keep the row, as ls does.
                Err(_) => vec!["?????????".into(), "?".into(), "?".into(), name.clone()],
            })
            .collect();
        Ok(CommandResult::table(
            vec![
                "Permissions".into(),
                "Size".into(),
                "Modified".into(),
                "Name".into(),
            ],
            rows,
        ))
    }
}

fn modified_stamp(meta: &Metadata) -> String {
    match meta.modified() {
        Ok(time) => DateTime::<Local>::from(time).format("%b %e %H:%M").to_string(),
        Err(_) => "?".to_string(),
    }
}

#[cfg(unix)]
fn mode_string(meta: &Metadata) -> String {
    use std::os::unix::fs::PermissionsExt;

    let mode = meta.permissions().mode();
    let mut out = String::with_capacity(10);
    out.push(if meta.is_dir() { 'd' } else { '-' });
    for shift in [6u32, 3, 0] {
        let bits = (mode >> shift) & 0o7;
        out.push(if bits & 0o4 != 0 { 'r' } else { '-' });
        out.push(if bits & 0o2 != 0 { 'w' } else { '-' });
        out.push(if bits & 0o1 != 0 { 'x' } else { '-' });
    }
    out
}

#[cfg(not(unix))]
fn mode_string(meta: &Metadata) -> String {
    let mut out = String::from(if meta.is_dir() { "d" } else { "-" });
    out.push_str(if meta.permissions().readonly() {
        "r-xr-xr-x"
    } else {
        "rwxrwxrwx"
    });
    out
}

#[derive(FromArgs)]
/// Create directories (including missing parents).
pub struct Mkdir {
    #[argh(positional, greedy)]
    /// directories to create.
    pub dirs: Vec<String>,
}

impl BuiltinCommand for Mkdir {
    fn name() -> &'static str {
        "mkdir"
    }

    fn run(self, session: &mut Session) -> Result<CommandResult, ShellError> {
        if self.dirs.is_empty() {
            return Err(ShellError::new(
                ErrorKind::InvalidArgument,
                "mkdir: missing operand",
            ));
        }
        let mut lines = Vec::with_capacity(self.dirs.len());
        for name in &self.dirs {
            let path = session.resolve(name);
            fs::create_dir_all(&path).map_err(|e| ShellError::from_io("mkdir", &path, e))?;
            lines.push(format!("Directory '{}' created", name));
        }
        Ok(CommandResult::lines(lines))
    }
}

#[derive(FromArgs)]
/// Remove empty directories.
pub struct Rmdir {
    #[argh(positional, greedy)]
    /// directories to remove.
    pub dirs: Vec<String>,
}

impl BuiltinCommand for Rmdir {
    fn name() -> &'static str {
        "rmdir"
    }

    fn run(self, session: &mut Session) -> Result<CommandResult, ShellError> {
        if self.dirs.is_empty() {
            return Err(ShellError::new(
                ErrorKind::InvalidArgument,
                "rmdir: missing operand",
            ));
        }
        let mut lines = Vec::with_capacity(self.dirs.len());
        for name in &self.dirs {
            let path = session.resolve(name);
            fs::remove_dir(&path).map_err(|e| ShellError::from_io("rmdir", &path, e))?;
            lines.push(format!("Directory '{}' removed", name));
        }
        Ok(CommandResult::lines(lines))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Output;
    use tempfile::tempdir;

    fn session_in(dir: &tempfile::TempDir) -> Session {
        Session::at(dir.path().to_path_buf())
    }

    fn plain_ls(path: Option<&str>) -> Ls {
        Ls {
            path: path.map(str::to_string),
            long: false,
            all: false,
        }
    }

    #[test]
    fn test_ls_sorts_and_hides_dotfiles() {
        let dir = tempdir().unwrap();
        let mut session = session_in(&dir);
        for name in ["zeta", "alpha", ".hidden"] {
            fs::write(dir.path().join(name), "").unwrap();
        }

        let result = plain_ls(None).run(&mut session).unwrap();
        assert_eq!(result.output, Output::Lines(vec!["alpha  zeta".to_string()]));
    }

    #[test]
    fn test_ls_all_includes_dotfiles() {
        let dir = tempdir().unwrap();
        let mut session = session_in(&dir);
        fs::write(dir.path().join(".hidden"), "").unwrap();

        let mut ls = plain_ls(None);
        ls.all = true;
        let result = ls.run(&mut session).unwrap();
        assert_eq!(
            result.output,
            Output::Lines(vec![".hidden".to_string()])
        );
    }

    #[test]
    fn test_ls_missing_path_is_not_found() {
        let dir = tempdir().unwrap();
        let mut session = session_in(&dir);
        let err = plain_ls(Some("ghost")).run(&mut session).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_ls_long_reports_zero_size_for_touched_file() {
        let dir = tempdir().unwrap();
        let mut session = session_in(&dir);
        fs::write(dir.path().join("f"), "").unwrap();

        let mut ls = plain_ls(None);
        ls.long = true;
        let result = ls.run(&mut session).unwrap();
        match result.output {
            Output::Table { headers, rows } => {
                assert_eq!(headers, vec!["Permissions", "Size", "Modified", "Name"]);
                assert_eq!(rows.len(), 1);
                assert_eq!(rows[0][1], "0");
                assert_eq!(rows[0][3], "f");
            }
            other => panic!("expected table, got {:?}", other),
        }
    }

    #[test]
    fn test_mkdir_creates_nested_dirs() {
        let dir = tempdir().unwrap();
        let mut session = session_in(&dir);

        Mkdir {
            dirs: vec!["a/b/c".to_string()],
        }
        .run(&mut session)
        .unwrap();

        assert!(dir.path().join("a/b/c").is_dir());
    }

    #[test]
    fn test_mkdir_existing_dir_succeeds() {
        let dir = tempdir().unwrap();
        let mut session = session_in(&dir);
        fs::create_dir(dir.path().join("sub")).unwrap();

        let result = Mkdir {
            dirs: vec!["sub".to_string()],
        }
        .run(&mut session);
        assert!(result.is_ok());
    }

    #[test]
    fn test_rmdir_removes_empty_dir() {
        let dir = tempdir().unwrap();
        let mut session = session_in(&dir);
        fs::create_dir(dir.path().join("empty")).unwrap();

        Rmdir {
            dirs: vec!["empty".to_string()],
        }
        .run(&mut session)
        .unwrap();

        assert!(!dir.path().join("empty").exists());
    }

    #[test]
    fn test_rmdir_non_empty_leaves_contents_untouched() {
        let dir = tempdir().unwrap();
        let mut session = session_in(&dir);
        fs::create_dir(dir.path().join("full")).unwrap();
        fs::write(dir.path().join("full/keep.txt"), "data").unwrap();

        let err = Rmdir {
            dirs: vec!["full".to_string()],
        }
        .run(&mut session)
        .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::DirectoryNotEmpty);
        assert!(dir.path().join("full/keep.txt").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_mode_string_shape() {
        let dir = tempdir().unwrap();
        let meta = fs::metadata(dir.path()).unwrap();
        let mode = mode_string(&meta);
        assert_eq!(mode.len(), 10);
        assert!(mode.starts_with('d'));
    }
}
