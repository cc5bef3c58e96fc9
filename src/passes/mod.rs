//! Rule passes over the fetched diagnostics
//!
//! Each pass reads only its own section and appends to the shared
//! [`Findings`]. Passes write their console section as they go.

pub mod cache;
pub mod hibernate;
pub mod history;
pub mod http;
pub mod jvm;
pub mod queries;

use std::io::{self, Write};
use tracing::warn;

use crate::client::Source;
use crate::findings::Findings;
use crate::models::{DiagnosticsSnapshot, HistorySnapshot, Measured, SlowestSnapshot, Unit};

/// Run the six passes in their fixed order
pub fn run_all(
    snapshot: &DiagnosticsSnapshot,
    history: &Source<HistorySnapshot>,
    slowest: &Source<SlowestSnapshot>,
    findings: &mut Findings,
    out: &mut impl Write,
) -> io::Result<()> {
    hibernate::analyze(&snapshot.hibernate, findings, out)?;
    queries::analyze(&snapshot.queries, findings, out)?;
    http::analyze(&snapshot.http, findings, out)?;
    history::analyze(history, slowest, findings, out)?;
    jvm::analyze(&snapshot.jvm, findings, out)?;
    cache::analyze(&snapshot.cache, findings, out)?;
    Ok(())
}

pub(crate) fn section_header(out: &mut impl Write, title: &str) -> io::Result<()> {
    writeln!(out, "\n📊 === {} ===\n", title)
}

/// Numeric value of a metric; malformed values are logged and skip the check
pub(crate) fn measured<U: Unit>(metric: &Measured<U>, field: &str) -> Option<f64> {
    match metric.value() {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(field = field, raw = %e.raw, "Malformed metric, check skipped");
            None
        }
    }
}

/// First `max` characters of `text`
pub(crate) fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
