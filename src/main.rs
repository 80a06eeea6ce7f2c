use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = taskbot::cli::Cli::parse();
    let config = taskbot::config::from_cli(&cli)?;
    taskbot::bot::run_blocking(config)
}
