//! One-shot subcommands
//!
//! Each handler returns whether the command succeeded; rejected input is a
//! failed command, not an error.

use anyhow::Context as _;
use clap::ArgMatches;
use seal_core::{Event, SealContext, SealError, TriggerSource};
use std::io::Write;

pub(crate) fn seal(
    ctx: &SealContext,
    args: &ArgMatches,
    out: &mut impl Write,
) -> anyhow::Result<bool> {
    let signal = string_arg(args, "signal")?;
    let source = args
        .get_one::<TriggerSource>("source")
        .copied()
        .unwrap_or(TriggerSource::Manual);

    report(ctx.seal(signal, source).map(|o| o.report), out)
}

pub(crate) fn pulse(
    ctx: &SealContext,
    args: &ArgMatches,
    out: &mut impl Write,
) -> anyhow::Result<bool> {
    let signal = string_arg(args, "signal")?;
    report(ctx.pulse(signal).map(|o| o.report), out)
}

pub(crate) fn audit(
    ctx: &SealContext,
    args: &ArgMatches,
    out: &mut impl Write,
) -> anyhow::Result<bool> {
    let limit = args.get_one::<usize>("limit").copied().unwrap_or(10);
    let oldest_first = args.get_flag("oldest-first");

    let events = match ctx.ledger().tail(limit, !oldest_first) {
        Ok(events) => events,
        Err(e) => {
            writeln!(out, "{}", SealError::from(e).report())?;
            return Ok(false);
        }
    };

    if args.get_flag("json") {
        serde_json::to_writer_pretty(&mut *out, &events)?;
        writeln!(out)?;
    } else {
        write_events(&events, out)?;
    }
    Ok(true)
}

pub(crate) fn journal(
    ctx: &SealContext,
    args: &ArgMatches,
    out: &mut impl Write,
) -> anyhow::Result<bool> {
    let limit = args.get_one::<usize>("limit").copied();
    match ctx.journal(limit) {
        Ok(journal) => {
            writeln!(out, "{journal}")?;
            Ok(true)
        }
        Err(e) => {
            writeln!(out, "{}", e.report())?;
            Ok(false)
        }
    }
}

pub(crate) fn tags(
    ctx: &SealContext,
    args: &ArgMatches,
    out: &mut impl Write,
) -> anyhow::Result<bool> {
    let event_type = string_arg(args, "event-type")?;
    write_tags(ctx, event_type, out)?;
    Ok(true)
}

/// Print a seal or pulse report
pub(crate) fn report(
    result: Result<String, SealError>,
    out: &mut impl Write,
) -> anyhow::Result<bool> {
    match result {
        Ok(report) => {
            writeln!(out, "{report}")?;
            Ok(true)
        }
        Err(e) => {
            writeln!(out, "{}", e.report())?;
            Ok(false)
        }
    }
}

pub(crate) fn write_events(events: &[Event], out: &mut impl Write) -> std::io::Result<()> {
    if events.is_empty() {
        return writeln!(out, "No events recorded.");
    }
    for event in events {
        writeln!(out, "{event}")?;
    }
    Ok(())
}

pub(crate) fn write_tags(
    ctx: &SealContext,
    event_type: &str,
    out: &mut impl Write,
) -> std::io::Result<()> {
    let tags: Vec<String> = ctx.annotate(event_type).into_iter().collect();
    writeln!(out, "{event_type}: {}", tags.join(" "))
}

fn string_arg<'a>(args: &'a ArgMatches, name: &str) -> anyhow::Result<&'a str> {
    args.get_one::<String>(name)
        .map(String::as_str)
        .with_context(|| format!("missing argument --{name}"))
}
