//! `sovereign-seal` entry point
//!
//! Owns the process lifecycle: install tracing, build the [`SealContext`],
//! dispatch the subcommand, drop the context.

mod cli;
mod commands;
mod console;

use anyhow::Context as _;
use clap::ArgMatches;
use seal_core::{SealConfig, SealContext};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let matches = cli::build().get_matches();

    let log_level = matches
        .get_one::<String>("log-level")
        .map_or("warn", String::as_str);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(&matches)?;
    let ctx = SealContext::open(config).context("failed to open seal context")?;
    let mut stdout = std::io::stdout().lock();

    let ok = match matches.subcommand() {
        Some(("seal", args)) => commands::seal(&ctx, args, &mut stdout)?,
        Some(("pulse", args)) => commands::pulse(&ctx, args, &mut stdout)?,
        Some(("audit", args)) => commands::audit(&ctx, args, &mut stdout)?,
        Some(("journal", args)) => commands::journal(&ctx, args, &mut stdout)?,
        Some(("tags", args)) => commands::tags(&ctx, args, &mut stdout)?,
        Some(("run", args)) => {
            drop(stdout);
            let reflex = ctx.config().reflex_enabled && !args.get_flag("no-reflex");
            console::run(&ctx, reflex).await?;
            true
        }
        _ => {
            cli::build().print_help()?;
            true
        }
    };

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// Configuration file (if any) with command-line overrides applied
fn load_config(matches: &ArgMatches) -> anyhow::Result<SealConfig> {
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => SealConfig::load(path)
            .with_context(|| format!("failed to load configuration from {path}"))?,
        None => SealConfig::new(),
    };
    if let Some(ledger) = matches.get_one::<String>("ledger") {
        config = config.with_ledger_path(ledger);
    }
    Ok(config)
}
