use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use vt_cli::commands::{archive, auth, collect, export, filter, summarize};
use vt_cli::{Cli, Commands, Config, log_directive};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing from the -v count, deferring to RUST_LOG without it
    let filter = log_directive(cli.verbose).map_or_else(
        || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        EnvFilter::new,
    );
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    let stdout = io::stdout();
    let mut writer = stdout.lock();

    match &cli.command {
        Some(Commands::Auth(args)) => {
            auth::run(&mut writer, args, &config)?;
        }
        Some(Commands::Collect(args)) => {
            let count = collect::run(&mut writer, args, &config)?;
            tracing::info!(count, "events collected");
        }
        Some(Commands::Filter(args)) => {
            filter::run(&mut writer, args, &config)?;
        }
        Some(Commands::Summarize(args)) => {
            summarize::run(&mut writer, args, &config)?;
        }
        Some(Commands::Export(args)) => {
            export::run(&mut writer, args, &config)?;
        }
        Some(Commands::Archive(args)) => {
            archive::run(&mut writer, args, &config)?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            writeln!(writer)?;
        }
    }

    Ok(())
}
