use crate::builtin::BuiltinCommand;
use crate::command::{CommandResult, ErrorKind, ShellError};
use crate::session::Session;
use argh::FromArgs;
use chrono::{Local, TimeZone};
use std::env;
use sysinfo::{Disks, ProcessesToUpdate, System};

/// Rows beyond this rank are dropped from `ps` output.
const PS_LIMIT: usize = 20;

const GIB: f64 = (1024u64 * 1024 * 1024) as f64;

#[derive(Debug, Clone, PartialEq)]
struct ProcessRow {
    pid: u32,
    name: String,
    cpu_percent: f32,
    mem_percent: f64,
    status: String,
}

/// Sort by CPU utilization descending, lower PID first on ties, keep the top
/// [`PS_LIMIT`] rows.
fn rank(mut rows: Vec<ProcessRow>) -> Vec<ProcessRow> {
    rows.sort_by(|a, b| {
        b.cpu_percent
            .partial_cmp(&a.cpu_percent)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.pid.cmp(&b.pid))
    });
    rows.truncate(PS_LIMIT);
    rows
}

fn unavailable(command: &str) -> ShellError {
    ShellError::new(
        ErrorKind::Unavailable,
        format!("{}: system metrics are not available on this host", command),
    )
}

#[derive(FromArgs)]
/// List running processes sorted by CPU usage.
pub struct Ps {}

impl BuiltinCommand for Ps {
    fn name() -> &'static str {
        "ps"
    }

    fn run(self, _session: &mut Session) -> Result<CommandResult, ShellError> {
        if !sysinfo::IS_SUPPORTED_SYSTEM {
            return Err(unavailable("ps"));
        }
        let mut sys = System::new_all();
        // CPU utilization needs two samples spaced by the minimum interval.
        sys.refresh_processes(ProcessesToUpdate::All, true);
        std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
        sys.refresh_processes(ProcessesToUpdate::All, true);

        let total_memory = sys.total_memory();
        let rows: Vec<ProcessRow> = sys
            .processes()
            .iter()
            .map(|(pid, process)| ProcessRow {
                pid: pid.as_u32(),
                name: process.name().to_string_lossy().chars().take(24).collect(),
                cpu_percent: process.cpu_usage(),
                mem_percent: if total_memory > 0 {
                    process.memory() as f64 * 100.0 / total_memory as f64
                } else {
                    0.0
                },
                status: process.status().to_string(),
            })
            .collect();
        if rows.is_empty() {
            return Err(unavailable("ps"));
        }

        let table_rows = rank(rows)
            .into_iter()
            .map(|row| {
                vec![
                    row.pid.to_string(),
                    row.name,
                    format!("{:.1}", row.cpu_percent),
                    format!("{:.1}", row.mem_percent),
                    row.status,
                ]
            })
            .collect();
        Ok(CommandResult::table(
            vec![
                "PID".into(),
                "NAME".into(),
                "CPU%".into(),
                "MEM%".into(),
                "STATUS".into(),
            ],
            table_rows,
        ))
    }
}

#[derive(FromArgs)]
/// Display system performance: CPU, memory, disk, and load.
pub struct Top {}

impl BuiltinCommand for Top {
    fn name() -> &'static str {
        "top"
    }

    fn run(self, _session: &mut Session) -> Result<CommandResult, ShellError> {
        if !sysinfo::IS_SUPPORTED_SYSTEM {
            return Err(unavailable("top"));
        }
        let mut sys = System::new_all();
        sys.refresh_cpu_usage();
        std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
        sys.refresh_cpu_usage();
        sys.refresh_memory();

        let mut lines = vec!["System Performance Monitor".to_string()];

        let boot = System::boot_time();
        if let Some(stamp) = Local.timestamp_opt(boot as i64, 0).single() {
            lines.push(format!(
                "System Boot Time: {}",
                stamp.format("%Y-%m-%d %H:%M:%S")
            ));
        }

        lines.push(format!(
            "CPU Usage: {:.1}% ({} cores)",
            sys.global_cpu_usage(),
            sys.cpus().len()
        ));

        let total = sys.total_memory();
        let used = sys.used_memory();
        if total > 0 {
            lines.push(format!(
                "Memory: {:.1}% used ({:.1}GB / {:.1}GB)",
                used as f64 * 100.0 / total as f64,
                used as f64 / GIB,
                total as f64 / GIB,
            ));
        }

        let disks = Disks::new_with_refreshed_list();
        let disk_total: u64 = disks.list().iter().map(|d| d.total_space()).sum();
        let disk_free: u64 = disks.list().iter().map(|d| d.available_space()).sum();
        if disk_total > 0 {
            let disk_used = disk_total - disk_free;
            lines.push(format!(
                "Disk: {:.1}% used ({:.1}GB / {:.1}GB)",
                disk_used as f64 * 100.0 / disk_total as f64,
                disk_used as f64 / GIB,
                disk_total as f64 / GIB,
            ));
        }

        let load = System::load_average();
        lines.push(format!(
            "Load Average: {:.2}, {:.2}, {:.2}",
            load.one, load.five, load.fifteen
        ));

        Ok(CommandResult::lines(lines))
    }
}

#[derive(FromArgs)]
/// Show host and session information.
pub struct SysInfo {}

impl BuiltinCommand for SysInfo {
    fn name() -> &'static str {
        "sysinfo"
    }

    fn run(self, session: &mut Session) -> Result<CommandResult, ShellError> {
        let unknown = || "unknown".to_string();
        let lines = vec![
            format!("System: {}", System::name().unwrap_or_else(unknown)),
            format!("Release: {}", System::kernel_version().unwrap_or_else(unknown)),
            format!("Version: {}", System::os_version().unwrap_or_else(unknown)),
            format!("Machine: {}", env::consts::ARCH),
            format!("Host: {}", System::host_name().unwrap_or_else(unknown)),
            format!("User: {}", current_user()),
            format!(
                "Home Directory: {}",
                Session::home_dir()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(unknown)
            ),
            format!("Current Directory: {}", session.cwd().display()),
            format!("Terminal Version: {}", env!("CARGO_PKG_VERSION")),
        ];
        Ok(CommandResult::lines(lines))
    }
}

/// The login name from the environment, `user` when unset.
pub(crate) fn current_user() -> String {
    env::var("USER")
        .or_else(|_| env::var("USERNAME"))
        .unwrap_or_else(|_| "user".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Output;
    use std::path::PathBuf;

    fn row(pid: u32, cpu: f32) -> ProcessRow {
        ProcessRow {
            pid,
            name: format!("proc{}", pid),
            cpu_percent: cpu,
            mem_percent: 0.0,
            status: "Run".to_string(),
        }
    }

    #[test]
    fn test_rank_sorts_by_cpu_descending() {
        let ranked = rank(vec![row(1, 0.5), row(2, 9.0), row(3, 3.0)]);
        let pids: Vec<u32> = ranked.iter().map(|r| r.pid).collect();
        assert_eq!(pids, vec![2, 3, 1]);
    }

    #[test]
    fn test_rank_breaks_ties_by_lower_pid() {
        let ranked = rank(vec![row(30, 2.0), row(10, 2.0), row(20, 2.0)]);
        let pids: Vec<u32> = ranked.iter().map(|r| r.pid).collect();
        assert_eq!(pids, vec![10, 20, 30]);
    }

    #[test]
    fn test_rank_truncates_to_limit() {
        let rows = (0..40u32).map(|pid| row(pid, pid as f32)).collect();
        let ranked = rank(rows);
        assert_eq!(ranked.len(), PS_LIMIT);
        assert_eq!(ranked[0].pid, 39);
    }

    #[test]
    fn test_sysinfo_reports_session_directory() {
        let mut session = Session::at(PathBuf::from("/some/where"));
        let result = SysInfo {}.run(&mut session).unwrap();
        match result.output {
            Output::Lines(lines) => {
                assert!(lines.iter().any(|l| l == "Current Directory: /some/where"));
                assert!(
                    lines
                        .iter()
                        .any(|l| l == concat!("Terminal Version: ", env!("CARGO_PKG_VERSION")))
                );
            }
            other => panic!("expected lines, got {:?}", other),
        }
    }

    #[test]
    fn test_ps_yields_table_or_unavailable() {
        let mut session = Session::at(PathBuf::from("/"));
        match (Ps {}).run(&mut session) {
            Ok(result) => match result.output {
                Output::Table { headers, rows } => {
                    assert_eq!(headers[0], "PID");
                    assert!(rows.len() <= PS_LIMIT);
                }
                other => panic!("expected table, got {:?}", other),
            },
            Err(err) => assert_eq!(err.kind(), ErrorKind::Unavailable),
        }
    }
}
