use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

use crate::models::HistoryEntry;

const HEADER: [&str; 5] = ["type", "description", "amount", "category", "timestamp"];

pub(crate) fn default_export_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
    format!("{home}/fintrack-history.csv")
}

/// Write the history as CSV to `path`. Returns the number of rows written.
pub(crate) fn export_history(path: &Path, entries: &[HistoryEntry]) -> Result<usize> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    let count = write_history(file, entries)?;
    tracing::info!(path = %path.display(), rows = count, "history exported");
    Ok(count)
}

pub(crate) fn write_history<W: Write>(writer: W, entries: &[HistoryEntry]) -> Result<usize> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(HEADER)?;
    for entry in entries {
        let amount = entry.amount.to_string();
        wtr.write_record([
            entry.kind.as_str(),
            entry.description.as_str(),
            amount.as_str(),
            entry.category.as_deref().unwrap_or(""),
            entry.timestamp.as_str(),
        ])?;
    }
    wtr.flush().context("Failed to flush CSV output")?;
    Ok(entries.len())
}
