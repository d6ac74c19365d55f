use anyhow::Result;
use clap::Parser;
use tracing::debug;

use fincalc_cli::cli::Cli;
use fincalc_cli::{commands, logging};

// ─── entry point ─────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    debug!(command = ?cli.command, format = ?cli.format, "running");
    let output = commands::run(&cli)?;
    println!("{}", output.trim_end());

    Ok(())
}
