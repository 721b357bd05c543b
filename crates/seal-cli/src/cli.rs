//! Command-line definition

use clap::{value_parser, Arg, ArgAction, Command};
use seal_core::{TriggerSource, DEFAULT_REFLEX_SIGNAL};

pub(crate) fn build() -> Command {
    Command::new("sovereign-seal")
        .version(seal_core::VERSION)
        .about("Sovereign Seal: append-only event ledger with a self-triggering seal")
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_name("TOML")
                .help("Path to a TOML configuration file"),
        )
        .arg(
            Arg::new("ledger")
                .long("ledger")
                .global(true)
                .value_name("PATH")
                .help("Durable ledger file (overrides the configuration)"),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .global(true)
                .default_value("warn")
                .help("Tracing filter; RUST_LOG takes precedence"),
        )
        .subcommand(
            Command::new("seal")
                .about("Seal once and print the decision report")
                .arg(
                    Arg::new("signal")
                        .long("signal")
                        .default_value(DEFAULT_REFLEX_SIGNAL)
                        .help("Numeric signal to classify"),
                )
                .arg(
                    Arg::new("source")
                        .long("source")
                        .default_value("manual")
                        .value_parser(value_parser!(TriggerSource))
                        .help("Trigger source: manual or auto"),
                ),
        )
        .subcommand(
            Command::new("pulse")
                .about("Record a diagnostic pulse without sealing")
                .arg(
                    Arg::new("signal")
                        .long("signal")
                        .default_value(DEFAULT_REFLEX_SIGNAL)
                        .help("Numeric signal to classify"),
                ),
        )
        .subcommand(
            Command::new("audit")
                .about("Print the most recent durable events")
                .arg(
                    Arg::new("limit")
                        .long("limit")
                        .default_value("10")
                        .value_parser(value_parser!(usize))
                        .help("Maximum number of events"),
                )
                .arg(
                    Arg::new("oldest-first")
                        .long("oldest-first")
                        .action(ArgAction::SetTrue)
                        .help("Print in chronological order"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(
            Command::new("journal")
                .about("Print the motif-tagged journal")
                .arg(
                    Arg::new("limit")
                        .long("limit")
                        .value_parser(value_parser!(usize))
                        .help("Number of entries (default from configuration)"),
                ),
        )
        .subcommand(
            Command::new("tags")
                .about("Print the motif tags for an event type")
                .arg(Arg::new("event-type").required(true).help("Event type")),
        )
        .subcommand(
            Command::new("run")
                .about("Interactive console with the reflex loop in the background")
                .arg(
                    Arg::new("no-reflex")
                        .long("no-reflex")
                        .action(ArgAction::SetTrue)
                        .help("Do not start the reflex loop"),
                ),
        )
}
