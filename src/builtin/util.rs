use crate::builtin::{BuiltinCommand, Ls, Ps, Pwd, SysInfo, Top};
use crate::command::{CommandResult, ShellError};
use crate::format;
use crate::session::Session;
use argh::FromArgs;

#[derive(FromArgs)]
/// Write the arguments to standard output, separated by spaces.
pub struct Echo {
    #[argh(positional, greedy)]
    /// values to print as-is, separated by spaces.
    pub args: Vec<String>,
}

impl BuiltinCommand for Echo {
    fn name() -> &'static str {
        "echo"
    }

    fn run(self, _session: &mut Session) -> Result<CommandResult, ShellError> {
        Ok(CommandResult::line(self.args.join(" ")))
    }
}

#[derive(FromArgs)]
/// Show the commands entered this session, oldest first.
pub struct History {}

impl BuiltinCommand for History {
    fn name() -> &'static str {
        "history"
    }

    fn run(self, session: &mut Session) -> Result<CommandResult, ShellError> {
        let lines = session
            .history()
            .enumerate()
            .map(|(i, line)| format!("{:4}  {}", i + 1, line))
            .collect();
        Ok(CommandResult::lines(lines))
    }
}

#[derive(FromArgs)]
/// Clear the terminal screen.
pub struct Clear {}

impl BuiltinCommand for Clear {
    fn name() -> &'static str {
        "clear"
    }

    fn aliases() -> &'static [&'static str] {
        &["cls"]
    }

    fn run(self, _session: &mut Session) -> Result<CommandResult, ShellError> {
        // ANSI: erase display, cursor to home.
        Ok(CommandResult::line("\x1b[2J\x1b[1;1H"))
    }
}

#[derive(FromArgs)]
/// Show available commands.
pub struct Help {}

impl BuiltinCommand for Help {
    fn name() -> &'static str {
        "help"
    }

    fn run(self, _session: &mut Session) -> Result<CommandResult, ShellError> {
        let catalogue: &[(&str, &[(&str, &str)])] = &[
            (
                "File Operations",
                &[
                    ("ls/dir [path] [-l] [-a]", "List directory contents"),
                    ("cat <file>", "Display file contents"),
                    ("touch <file>", "Create empty file"),
                    ("cp <src> <dest>", "Copy file"),
                    ("mv <src> <dest>", "Move/rename file"),
                    ("rm <file>", "Remove file"),
                ],
            ),
            (
                "Directory Operations",
                &[
                    ("pwd", "Print working directory"),
                    ("cd [path|~|-]", "Change directory (~ home, - previous)"),
                    ("mkdir <dir>", "Create directory"),
                    ("rmdir <dir>", "Remove empty directory"),
                ],
            ),
            (
                "System Monitoring",
                &[
                    ("ps", "List running processes"),
                    ("top", "Display system performance"),
                    ("sysinfo", "Show system information"),
                ],
            ),
            (
                "Utility Commands",
                &[
                    ("echo <text> [> file]", "Print text"),
                    ("history", "Show command history"),
                    ("clear/cls", "Clear screen"),
                    ("demo", "Run feature demonstration"),
                    ("version", "Show version information"),
                    ("help", "Show this help"),
                    ("exit/quit", "Exit terminal"),
                ],
            ),
        ];

        let mut lines = vec!["Available Commands".to_string()];
        for (category, commands) in catalogue {
            lines.push(String::new());
            lines.push(format!("{}:", category));
            for (usage, description) in *commands {
                lines.push(format!("  {:<25} - {}", usage, description));
            }
        }
        lines.push(String::new());
        lines.push("Anything else is passed to the host operating system.".to_string());
        Ok(CommandResult::lines(lines))
    }
}

#[derive(FromArgs)]
/// Show version information.
pub struct Version {}

impl BuiltinCommand for Version {
    fn name() -> &'static str {
        "version"
    }

    fn run(self, _session: &mut Session) -> Result<CommandResult, ShellError> {
        Ok(CommandResult::lines(vec![
            format!("rterm v{}", env!("CARGO_PKG_VERSION")),
            format!("Built with Rust for {}", std::env::consts::OS),
        ]))
    }
}

#[derive(FromArgs)]
/// Run a demonstration of terminal features.
pub struct Demo {}

impl BuiltinCommand for Demo {
    fn name() -> &'static str {
        "demo"
    }

    fn run(self, session: &mut Session) -> Result<CommandResult, ShellError> {
        let mut lines = vec!["Terminal Feature Demo".to_string()];
        let sections: Vec<(&str, Result<CommandResult, ShellError>)> = vec![
            ("System Information", SysInfo {}.run(session)),
            ("Current Directory", Pwd {}.run(session)),
            (
                "Directory Listing",
                Ls {
                    path: None,
                    long: false,
                    all: false,
                }
                .run(session),
            ),
            ("System Processes", Ps {}.run(session)),
            ("Performance Monitor", Top {}.run(session)),
        ];

        // Degraded sections report their error text; the demo itself succeeds.
        for (title, outcome) in sections {
            lines.push(String::new());
            lines.push(format!("--- {} ---", title));
            match outcome {
                Ok(result) => lines.extend(format::render(&result).lines().map(str::to_string)),
                Err(err) => lines.push(err.to_string()),
            }
        }
        Ok(CommandResult::lines(lines))
    }
}

#[derive(FromArgs)]
/// Exit the terminal.
pub struct Exit {
    #[argh(positional, greedy)]
    /// ignored; kept so stray arguments do not fail the exit.
    pub _args: Vec<String>,
}

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        "exit"
    }

    fn aliases() -> &'static [&'static str] {
        &["quit"]
    }

    fn run(self, session: &mut Session) -> Result<CommandResult, ShellError> {
        session.should_exit = true;
        Ok(CommandResult::line("Goodbye!"))
    }
}
