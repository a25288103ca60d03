//! Drive the builder over a whole listing.
//!
//! Per-line failures are recorded and skipped; only I/O errors on the
//! listing source end the run.

use diagnostics::*;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::builder::HierarchyBuilder;
use crate::error::Result;

/// A listing line that could not be attached to the hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineError {
    /// The line as read, without its terminator.
    pub line: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Non-blank lines seen, failed ones included.
    pub lines: usize,
    pub errors: Vec<LineError>,
}

impl IngestReport {
    pub fn parsed(&self) -> usize {
        self.lines - self.errors.len()
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Feed one line to the builder, downgrading per-line failures into the
/// report. Errors that are not about the line itself propagate.
pub fn ingest_line(
    builder: &mut HierarchyBuilder<'_>,
    line: &str,
    report: &mut IngestReport,
) -> Result<()> {
    let line = line.trim_end_matches(['\n', '\r']);
    if line.trim().is_empty() {
        return Ok(());
    }
    report.lines += 1;

    match builder.process_line(line) {
        Ok(()) => Ok(()),
        Err(err) if err.is_line_error() => {
            let message = err.to_string();
            debug!("Skipping line: {message}", message: message.as_str());
            report.errors.push(LineError {
                line: line.to_string(),
                message,
            });
            Ok(())
        }
        Err(err) => Err(err),
    }
}

/// Ingest an in-memory listing.
pub fn ingest_str(builder: &mut HierarchyBuilder<'_>, listing: &str) -> Result<IngestReport> {
    let mut report = IngestReport::default();
    for line in listing.lines() {
        ingest_line(builder, line, &mut report)?;
    }
    Ok(report)
}

/// Ingest a listing from an async line source.
pub async fn ingest_reader<R>(builder: &mut HierarchyBuilder<'_>, reader: R) -> Result<IngestReport>
where
    R: AsyncBufRead + Unpin,
{
    let mut report = IngestReport::default();
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        ingest_line(builder, &line, &mut report)?;
    }

    let lines = report.lines;
    let failed = report.errors.len();
    info!(
        "Ingested {lines} listing lines, {failed} failed",
        lines: lines,
        failed: failed
    );
    Ok(report)
}
