//! Build-log replay through the store's live log stream.

use std::io::{BufRead, BufReader};
use std::sync::{Arc, Mutex, PoisonError};

use tabled::Tabled;
use tracing::debug;

use bldr_state_core::{LogSnapshot, LogStream};

use crate::cli::{LogArgs, OutputFormat};
use crate::config::Context;
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeliveryRow {
    #[tabled(rename = "#")]
    seq: usize,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Lines")]
    lines: usize,
    #[tabled(rename = "Last line")]
    last: String,
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: &LogArgs, ctx: &Context) -> Result<(), CliError> {
    let input: Box<dyn BufRead> = match args.file {
        Some(ref path) => Box::new(BufReader::new(std::fs::File::open(path)?)),
        None => Box::new(std::io::stdin().lock()),
    };
    let chunk = usize::try_from(args.chunk).unwrap_or(usize::MAX);

    let store = ctx.store()?;
    let deliveries = replay(&store.build_log()?, input.lines(), chunk)?;

    let out = match ctx.format {
        OutputFormat::Table => {
            let rows: Vec<DeliveryRow> = deliveries
                .iter()
                .enumerate()
                .map(|(i, snap)| row(i + 1, snap, ctx.color))
                .collect();
            output::render_table(&rows)
        }
        _ => output::render_single(ctx.format, &deliveries, |deliveries| {
            deliveries
                .last()
                .map(|snap| snap.lines.join("\n"))
                .unwrap_or_default()
        })?,
    };
    output::print_output(&out, ctx.quiet);
    Ok(())
}

/// Append `lines` as they arrive, `chunk` at a time, complete the stream,
/// and return every snapshot a subscriber saw (including the replay on
/// subscribe). A read error stops the replay and leaves the stream open.
fn replay<I>(log: &LogStream, lines: I, chunk: usize) -> Result<Vec<LogSnapshot>, CliError>
where
    I: IntoIterator<Item = std::io::Result<String>>,
{
    let seen: Arc<Mutex<Vec<LogSnapshot>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    log.subscribe(move |snap| {
        sink.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(snap.clone());
    });

    let chunk = chunk.max(1);
    let mut pending = Vec::with_capacity(chunk);
    let mut total = 0;
    for line in lines {
        pending.push(line?);
        total += 1;
        if pending.len() == chunk {
            log.append(pending.drain(..));
        }
    }
    if !pending.is_empty() {
        log.append(pending);
    }
    log.mark_complete();
    debug!(lines = total, chunk, "log replayed");

    Ok(std::mem::take(
        &mut *seen.lock().unwrap_or_else(PoisonError::into_inner),
    ))
}

fn row(seq: usize, snap: &LogSnapshot, color: bool) -> DeliveryRow {
    DeliveryRow {
        seq,
        state: output::status(&snap.state.to_string(), snap.is_complete(), color),
        lines: snap.lines.len(),
        last: snap
            .lines
            .last()
            .map(|line| output::dim(line, color))
            .unwrap_or_default(),
    }
}
