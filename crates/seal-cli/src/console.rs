//! Interactive console
//!
//! Reads one command per line from stdin while the reflex loop runs in the
//! background. `quit`, end of input, or Ctrl-C sends the shutdown signal and
//! waits for the loop to stop.

use crate::commands;
use anyhow::Context as _;
use seal_core::{SealContext, TriggerSource};
use std::io::Write;
use std::str::FromStr;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tracing::info;

const AUDIT_LIMIT: usize = 10;

const HELP: &str = "\
Commands:
  seal [SIGNAL]     seal manually (default: configured reflex signal)
  pulse [SIGNAL]    record a diagnostic pulse
  status            seal state and most recent report
  snapshot          in-memory ledger, oldest first
  audit [N]         last N durable events, newest first
  journal [N]       motif-tagged journal
  tags EVENT_TYPE   motif tags for an event type
  help              this text
  quit              stop the reflex loop and exit";

/// One console line
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ConsoleCommand {
    Seal(Option<String>),
    Pulse(Option<String>),
    Status,
    Snapshot,
    Audit(Option<usize>),
    Journal(Option<usize>),
    Tags(String),
    Help,
    Quit,
}

impl FromStr for ConsoleCommand {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Err("empty command".to_string());
        };
        let arg = words.next();
        if let Some(extra) = words.next() {
            return Err(format!("unexpected argument {extra:?}; type `help`"));
        }

        let count = |arg: Option<&str>| -> Result<Option<usize>, String> {
            arg.map(|n| n.parse().map_err(|_| format!("{n:?} is not a count")))
                .transpose()
        };

        match (name.to_ascii_lowercase().as_str(), arg) {
            ("seal", arg) => Ok(Self::Seal(arg.map(str::to_string))),
            ("pulse", arg) => Ok(Self::Pulse(arg.map(str::to_string))),
            ("status", None) => Ok(Self::Status),
            ("snapshot", None) => Ok(Self::Snapshot),
            ("audit", arg) => count(arg).map(Self::Audit),
            ("journal", arg) => count(arg).map(Self::Journal),
            ("tags", Some(event_type)) => Ok(Self::Tags(event_type.to_string())),
            ("tags", None) => Err("usage: tags EVENT_TYPE".to_string()),
            ("help" | "?", None) => Ok(Self::Help),
            ("quit" | "exit", None) => Ok(Self::Quit),
            (name @ ("status" | "snapshot" | "help" | "?" | "quit" | "exit"), Some(_)) => {
                Err(format!("{name} takes no argument"))
            }
            (other, _) => Err(format!("unknown command {other:?}; type `help`")),
        }
    }
}

/// Run the console until quit, end of input, or Ctrl-C
///
/// # Errors
/// Stdin or stdout failures, or a reflex loop that did not exit cleanly
pub(crate) async fn run(ctx: &SealContext, reflex: bool) -> anyhow::Result<()> {
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let handle = reflex.then(|| ctx.spawn_reflex(shutdown_rx));

    let mut stdout = std::io::stdout();
    writeln!(
        stdout,
        "Sovereign Seal console (ledger: {}, reflex: {})",
        ctx.ledger().path().display(),
        if reflex { "on" } else { "off" }
    )?;
    writeln!(stdout, "Type `help` for commands.")?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        write!(stdout, "> ")?;
        stdout.flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line.context("failed to read stdin")?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            writeln!(stdout)?;
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        match line.parse::<ConsoleCommand>() {
            Ok(ConsoleCommand::Quit) => break,
            Ok(command) => execute(ctx, &command, &mut stdout)?,
            Err(message) => writeln!(stdout, "{message}")?,
        }
    }

    // No receivers when the reflex loop is off
    let _ = shutdown_tx.send(());
    if let Some(handle) = handle {
        handle.join().await.context("reflex loop did not stop cleanly")?;
    }
    info!("Console closed");
    Ok(())
}

/// Execute one command against the context
///
/// Seal and ledger failures are printed as reports; only output errors are
/// returned.
pub(crate) fn execute(
    ctx: &SealContext,
    command: &ConsoleCommand,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let default_signal = ctx.config().reflex_signal.as_str();

    match command {
        ConsoleCommand::Seal(signal) => {
            let signal = signal.as_deref().unwrap_or(default_signal);
            commands::report(
                ctx.seal(signal, TriggerSource::Manual).map(|o| o.report),
                out,
            )?;
        }
        ConsoleCommand::Pulse(signal) => {
            let signal = signal.as_deref().unwrap_or(default_signal);
            commands::report(ctx.pulse(signal).map(|o| o.report), out)?;
        }
        ConsoleCommand::Status => write_status(ctx, out)?,
        ConsoleCommand::Snapshot => commands::write_events(&ctx.snapshot(), out)?,
        ConsoleCommand::Audit(limit) => match ctx.audit(limit.unwrap_or(AUDIT_LIMIT)) {
            Ok(events) => commands::write_events(&events, out)?,
            Err(e) => writeln!(out, "{}", e.report())?,
        },
        ConsoleCommand::Journal(limit) => match ctx.journal(*limit) {
            Ok(journal) => writeln!(out, "{journal}")?,
            Err(e) => writeln!(out, "{}", e.report())?,
        },
        ConsoleCommand::Tags(event_type) => commands::write_tags(ctx, event_type, out)?,
        ConsoleCommand::Help => writeln!(out, "{HELP}")?,
        ConsoleCommand::Quit => {}
    }
    Ok(())
}

fn write_status(ctx: &SealContext, out: &mut impl Write) -> std::io::Result<()> {
    let state = ctx.state();
    write!(out, "Seal: {}", state.phase)?;
    if let (Some(by), Some(at)) = (state.sealed_by, state.sealed_at) {
        write!(out, " (by {by} at {})", at.format(seal_core::TIMESTAMP_FORMAT))?;
    }
    writeln!(out)?;
    writeln!(
        out,
        "Ledger: {} events in memory ({})",
        ctx.ledger().len(),
        ctx.ledger().path().display()
    )?;
    match state.last_report {
        Some(report) => writeln!(out, "Last report:\n{report}"),
        None => writeln!(out, "Last report: none"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use seal_core::SealConfig;

    fn context() -> (tempfile::TempDir, SealContext) {
        let dir = tempfile::tempdir().unwrap();
        let config = SealConfig::new().with_ledger_path(dir.path().join("vault.csv"));
        (dir, SealContext::open(config).unwrap())
    }

    fn exec(ctx: &SealContext, line: &str) -> String {
        let command: ConsoleCommand = line.parse().unwrap();
        let mut out = Vec::new();
        execute(ctx, &command, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn parses_commands() {
        assert_eq!("seal".parse(), Ok(ConsoleCommand::Seal(None)));
        assert_eq!(
            "SEAL 95.0".parse(),
            Ok(ConsoleCommand::Seal(Some("95.0".to_string())))
        );
        assert_eq!("audit 3".parse(), Ok(ConsoleCommand::Audit(Some(3))));
        assert_eq!("journal".parse(), Ok(ConsoleCommand::Journal(None)));
        assert_eq!(
            "tags Pulse".parse(),
            Ok(ConsoleCommand::Tags("Pulse".to_string()))
        );
        assert_eq!("exit".parse(), Ok(ConsoleCommand::Quit));
    }

    #[test]
    fn rejects_bad_lines() {
        assert!("audit many".parse::<ConsoleCommand>().is_err());
        assert!("tags".parse::<ConsoleCommand>().is_err());
        assert!("seal 1 2".parse::<ConsoleCommand>().is_err());
        assert!("status now".parse::<ConsoleCommand>().is_err());
        assert!("launch".parse::<ConsoleCommand>().is_err());
    }

    #[test]
    fn status_before_and_after_seal() {
        let (_dir, ctx) = context();
        let before = exec(&ctx, "status");
        assert!(before.starts_with("Seal: UNSEALED\n"));
        assert!(before.contains("Last report: none"));

        let sealed = exec(&ctx, "seal");
        assert!(sealed.contains("Signal: 92.6"));

        let after = exec(&ctx, "status");
        assert!(after.starts_with("Seal: SEALED (by Manual at "));
        assert!(after.contains("Last report:\n[SEALED]"));
    }

    #[test]
    fn invalid_signal_reports_error() {
        let (_dir, ctx) = context();
        assert!(exec(&ctx, "seal abc").starts_with("[ERROR] Invalid Signal"));
        assert_eq!(exec(&ctx, "snapshot"), "No events recorded.\n");
    }

    #[test]
    fn unreadable_ledger_is_reported_not_fatal() {
        let (dir, ctx) = context();
        std::fs::write(dir.path().join("vault.csv"), "when,what\n").unwrap();

        let audit = exec(&ctx, "audit");
        assert!(audit.starts_with("[ERROR]"));
        assert!(audit.contains("unexpected header"));
        assert!(exec(&ctx, "journal").starts_with("[ERROR]"));

        assert!(exec(&ctx, "status").starts_with("Seal: UNSEALED"));
        assert!(exec(&ctx, "tags Pulse").contains("#heartbeat"));
    }

    #[test]
    fn snapshot_and_journal_after_pulse() {
        let (_dir, ctx) = context();
        exec(&ctx, "pulse 50");
        assert!(exec(&ctx, "snapshot").contains("| Pulse | signal=50; status=Optimal"));
        assert!(exec(&ctx, "journal 1").contains("#heartbeat"));
        assert!(exec(&ctx, "help").contains("tags EVENT_TYPE"));
    }
}
