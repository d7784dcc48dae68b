//! Pure rendering of [`CommandResult`] values into display text.
//!
//! The formatter never touches the session; it turns structured output into
//! the exact text the REPL prints (or writes to a redirect target).

use crate::command::{CommandResult, Output};

/// Render a result into display text without a trailing newline.
pub fn render(result: &CommandResult) -> String {
    match &result.output {
        Output::Lines(lines) => lines.join("\n"),
        Output::Table { headers, rows } => render_table(headers, rows),
    }
}

fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(String::len).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.len());
            }
        }
    }

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(format_row(headers, &widths));
    let underline: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    lines.push(format_row(&underline, &widths));
    for row in rows {
        lines.push(format_row(row, &widths));
    }
    lines.join("\n")
}

fn format_row(cells: &[String], widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| format!("{:<width$}", cell))
        .collect();
    padded.join("  ").trim_end().to_string()
}
