// mediaprobe-cli/src/main.rs
//
// Entry point for the `mediaprobe` binary: parses arguments, installs the
// logger and dispatches to the command implementation. Exits with status 1
// when any probed path failed.

use clap::Parser;
use mediaprobe_cli::logging::init_logging;
use mediaprobe_cli::{Cli, Commands, run_info};
use std::process;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let failures = match &cli.command {
        Commands::Info(args) => run_info(args)?,
    };

    if failures > 0 {
        log::warn!("{} path(s) could not be probed", failures);
        process::exit(1);
    }
    Ok(())
}
