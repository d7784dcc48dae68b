use anyhow::Result;
use owo_colors::OwoColorize;
use rterm::Interpreter;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    banner();
    Interpreter::default().repl()?;
    Ok(())
}

fn banner() {
    let rule = "=".repeat(60);
    println!("{}", rule.cyan());
    println!(
        "{}",
        format!("  rterm v{} - command terminal", env!("CARGO_PKG_VERSION")).green()
    );
    println!("{}", rule.cyan());
    println!();
    println!("Type 'help' for available commands or 'exit' to quit");
    if let Ok(cwd) = std::env::current_dir() {
        println!("{}", format!("Current directory: {}", cwd.display()).blue());
    }
    println!();
}
