use crate::builtin::{
    Cat, Cd, Clear, Cp, Demo, Echo, Exit, Help, History, Ls, Mkdir, Mv, Ps, Pwd, Rm, Rmdir,
    SysInfo, Top, Touch, Version,
};
use crate::command::{
    CommandFactory, CommandResult, ErrorKind, ExecutableCommand, Output, ShellError,
};
use crate::external::ExternalCommand;
use crate::format;
use crate::lexer;
use crate::session::Session;
use owo_colors::OwoColorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::fs;
use std::path::Path;
use std::time::Instant;
use sysinfo::System;
use tracing::debug;

/// Factory allows creating instances of ExecutableCommand.
///
/// Only supports commands defined in this crate — builtins and
/// [`ExternalCommand`].
pub(crate) struct Factory<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

/// The command dispatcher and interactive read-execute-print loop.
///
/// For every input line the interpreter tokenizes, resolves the name against
/// its registry (falling through to the host executable lookup), executes the
/// command against the [`Session`], and returns a [`CommandResult`] for
/// rendering. Failures are normal results; nothing a command does can take
/// the loop down.
///
/// Example
/// ```
/// use rterm::Interpreter;
/// let mut sh = Interpreter::default();
/// let result = sh.dispatch("echo hello world").unwrap();
/// assert_eq!(result.exit_code, 0);
/// ```
pub struct Interpreter {
    session: Session,
    factories: Vec<Box<dyn CommandFactory>>,
}

impl Interpreter {
    /// Create a new interpreter with a custom set of command factories.
    pub fn new(factories: Vec<Box<dyn CommandFactory>>) -> Self {
        Self {
            session: Session::new(),
            factories,
        }
    }

    /// Replace the session, e.g. to root it at a known directory.
    pub fn with_session(mut self, session: Session) -> Self {
        self.session = session;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Dispatch one raw input line.
    ///
    /// Returns `None` for empty input (the no-op sentinel). Every well-formed
    /// line is recorded in the session history whether it succeeds or fails;
    /// parse errors are reported but not recorded.
    pub fn dispatch(&mut self, line: &str) -> Option<CommandResult> {
        let parsed = match lexer::parse_line(line) {
            Ok(Some(parsed)) => parsed,
            Ok(None) => return None,
            Err(e) => {
                return Some(CommandResult::from_error(ShellError::new(
                    ErrorKind::ParseError,
                    e.to_string(),
                )));
            }
        };

        let started = Instant::now();
        let args: Vec<&str> = parsed.args.iter().map(String::as_str).collect();
        let mut result = match self.resolve(&parsed.name, &args) {
            Some(command) => match command.execute(&mut self.session) {
                Ok(result) => result,
                Err(err) => CommandResult::from_error(err),
            },
            None => CommandResult::from_error(ShellError::new(
                ErrorKind::UnknownCommand,
                format!("Command not found: {}", parsed.name),
            )),
        };
        result.duration_ms = started.elapsed().as_millis() as u64;
        debug!(
            command = %parsed.name,
            exit_code = result.exit_code,
            duration_ms = result.duration_ms,
            "dispatched"
        );

        if let Some(target) = &parsed.redirect {
            result = self.apply_redirect(result, target);
        }

        self.session.record(line);
        Some(result)
    }

    fn resolve(&self, name: &str, args: &[&str]) -> Option<Box<dyn ExecutableCommand>> {
        self.factories
            .iter()
            .find_map(|factory| factory.try_create(name, args))
    }

    /// Overwrite `target` with the rendered output text instead of displaying
    /// it.
    fn apply_redirect(&self, result: CommandResult, target: &Path) -> CommandResult {
        let path = self.session.resolve(target);
        let mut text = format::render(&result);
        if !text.is_empty() {
            text.push('\n');
        }
        match fs::write(&path, text) {
            Ok(()) => CommandResult {
                output: Output::Lines(Vec::new()),
                ..result
            },
            Err(e) => CommandResult::from_error(ShellError::from_io("redirect", &path, e)),
        }
    }

    /// The interactive read-execute-print loop.
    pub fn repl(&mut self) -> rustyline::Result<()> {
        let mut rl = DefaultEditor::new()?;

        loop {
            let readline = rl.readline(&self.prompt());
            match readline {
                Ok(line) => {
                    let _ = rl.add_history_entry(line.as_str());
                    if let Some(result) = self.dispatch(&line) {
                        let text = format::render(&result);
                        if !text.is_empty() {
                            if result.is_failure() {
                                eprintln!("{}", text.red());
                            } else {
                                println!("{}", text);
                            }
                        }
                    }
                    if self.session.should_exit {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("Use 'exit' to quit");
                }
                Err(ReadlineError::Eof) => {
                    println!("Goodbye!");
                    break;
                }
                Err(err) => {
                    eprintln!("Error: {:?}", err);
                    break;
                }
            }
        }

        Ok(())
    }

    /// `user@host:<dirbasename>$ `, colorized like the banner.
    fn prompt(&self) -> String {
        let user = crate::builtin::current_user();
        let host = System::host_name().unwrap_or_else(|| "host".to_string());
        let cwd = self.session.cwd();
        let dir = cwd
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| cwd.display().to_string());
        format!(
            "{}:{}$ ",
            format!("{}@{}", user, host).green(),
            dir.blue()
        )
    }
}

impl Default for Interpreter {
    /// Create an interpreter with the full builtin registry, falling through
    /// to the host executable lookup for everything else.
    fn default() -> Self {
        Self::new(vec![
            Box::new(Factory::<Ls>::default()),
            Box::new(Factory::<Cat>::default()),
            Box::new(Factory::<Touch>::default()),
            Box::new(Factory::<Echo>::default()),
            Box::new(Factory::<Cp>::default()),
            Box::new(Factory::<Mv>::default()),
            Box::new(Factory::<Rm>::default()),
            Box::new(Factory::<Pwd>::default()),
            Box::new(Factory::<Cd>::default()),
            Box::new(Factory::<Mkdir>::default()),
            Box::new(Factory::<Rmdir>::default()),
            Box::new(Factory::<Ps>::default()),
            Box::new(Factory::<Top>::default()),
            Box::new(Factory::<SysInfo>::default()),
            Box::new(Factory::<History>::default()),
            Box::new(Factory::<Clear>::default()),
            Box::new(Factory::<Help>::default()),
            Box::new(Factory::<Version>::default()),
            Box::new(Factory::<Demo>::default()),
            Box::new(Factory::<Exit>::default()),
            Box::new(Factory::<ExternalCommand>::default()),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Output;
    use crate::session::HISTORY_CAPACITY;
    use tempfile::tempdir;

    fn interpreter_in(dir: &tempfile::TempDir) -> Interpreter {
        Interpreter::default().with_session(Session::at(dir.path().to_path_buf()))
    }

    #[test]
    fn test_empty_input_is_skipped_without_history() {
        let dir = tempdir().unwrap();
        let mut sh = interpreter_in(&dir);
        assert!(sh.dispatch("").is_none());
        assert!(sh.dispatch("   ").is_none());
        assert_eq!(sh.session().history_len(), 0);
    }

    #[test]
    fn test_parse_error_is_reported_and_not_recorded() {
        let dir = tempdir().unwrap();
        let mut sh = interpreter_in(&dir);
        let result = sh.dispatch("echo 'unterminated").unwrap();
        assert_eq!(result.error_kind, Some(ErrorKind::ParseError));
        assert_eq!(sh.session().history_len(), 0);
    }

    #[test]
    fn test_well_formed_failures_are_recorded() {
        let dir = tempdir().unwrap();
        let mut sh = interpreter_in(&dir);
        let result = sh.dispatch("cat ghost.txt").unwrap();
        assert_eq!(result.error_kind, Some(ErrorKind::NotFound));
        assert_eq!(sh.session().history_len(), 1);
    }

    #[test]
    fn test_unknown_command_keeps_loop_responsive() {
        let dir = tempdir().unwrap();
        let mut sh = interpreter_in(&dir);
        let result = sh.dispatch("definitely-not-a-real-binary-4242").unwrap();
        assert_eq!(result.error_kind, Some(ErrorKind::UnknownCommand));
        assert_eq!(result.exit_code, ErrorKind::UnknownCommand.exit_code());

        let next = sh.dispatch("echo still alive").unwrap();
        assert_eq!(next.exit_code, 0);
        assert_eq!(sh.session().history_len(), 2);
    }

    #[test]
    fn test_cd_then_pwd_round_trip() {
        let dir = tempdir().unwrap();
        let sub = dir.path().join("nested");
        std::fs::create_dir(&sub).unwrap();
        let mut sh = interpreter_in(&dir);

        let result = sh.dispatch("cd nested").unwrap();
        assert_eq!(result.exit_code, 0);

        let expected = std::fs::canonicalize(&sub).unwrap();
        let pwd = sh.dispatch("pwd").unwrap();
        assert_eq!(
            pwd.output,
            Output::Lines(vec![expected.display().to_string()])
        );
    }

    #[test]
    fn test_cd_dash_round_trip_through_dispatch() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("a")).unwrap();
        std::fs::create_dir(dir.path().join("b")).unwrap();
        let mut sh = interpreter_in(&dir);

        sh.dispatch("cd a").unwrap();
        sh.dispatch("cd ..").unwrap();
        sh.dispatch("cd b").unwrap();

        let result = sh.dispatch("cd -").unwrap();
        assert_eq!(result.exit_code, 0);
        let expected = std::fs::canonicalize(dir.path()).unwrap();
        assert_eq!(sh.session().cwd(), expected.as_path());
    }

    #[test]
    fn test_history_caps_at_last_hundred_inputs() {
        let dir = tempdir().unwrap();
        let mut sh = interpreter_in(&dir);
        for i in 0..HISTORY_CAPACITY + 5 {
            sh.dispatch(&format!("echo {}", i)).unwrap();
        }
        assert_eq!(sh.session().history_len(), HISTORY_CAPACITY);
        let first = sh.session().history().next().unwrap().to_string();
        assert_eq!(first, "echo 5");
    }

    #[test]
    fn test_history_command_excludes_itself() {
        let dir = tempdir().unwrap();
        let mut sh = interpreter_in(&dir);
        sh.dispatch("pwd").unwrap();
        let result = sh.dispatch("history").unwrap();
        assert_eq!(
            result.output,
            Output::Lines(vec!["   1  pwd".to_string()])
        );
        // It is recorded afterwards, though.
        assert_eq!(sh.session().history_len(), 2);
    }

    #[test]
    fn test_redirect_overwrites_file_and_silences_display() {
        let dir = tempdir().unwrap();
        let mut sh = interpreter_in(&dir);
        std::fs::write(dir.path().join("out.txt"), "old contents\n").unwrap();

        let result = sh.dispatch("echo fresh > out.txt").unwrap();
        assert_eq!(result.exit_code, 0);
        assert_eq!(result.output, Output::Lines(Vec::new()));
        assert_eq!(
            std::fs::read_to_string(dir.path().join("out.txt")).unwrap(),
            "fresh\n"
        );
    }

    #[test]
    fn test_quoted_arguments_survive_dispatch() {
        let dir = tempdir().unwrap();
        let mut sh = interpreter_in(&dir);
        let result = sh.dispatch("echo 'hello   world'").unwrap();
        assert_eq!(
            result.output,
            Output::Lines(vec!["hello   world".to_string()])
        );
    }

    #[test]
    fn test_exit_and_quit_raise_the_exit_flag() {
        let dir = tempdir().unwrap();
        let mut sh = interpreter_in(&dir);
        sh.dispatch("exit").unwrap();
        assert!(sh.session().should_exit);

        let mut sh = interpreter_in(&dir);
        sh.dispatch("quit").unwrap();
        assert!(sh.session().should_exit);
    }

    #[test]
    fn test_builtin_names_resolve_before_the_fallback() {
        let dir = tempdir().unwrap();
        let mut sh = interpreter_in(&dir);
        // `echo` exists on most hosts; the builtin must win and behave
        // identically everywhere.
        let result = sh.dispatch("echo builtin wins").unwrap();
        assert!(result.duration_ms < 10_000);
        assert_eq!(
            result.output,
            Output::Lines(vec!["builtin wins".to_string()])
        );
    }
}
