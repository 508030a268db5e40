//! CSV export for archiving the dose history journal.
//!
//! The journal is append-only and grows without bound; exporting rolls it
//! into a CSV archive atomically so history stays queryable without data
//! loss.

use crate::{DoseEvent, MedicationStore, Result};
use std::fs::OpenOptions;
use std::path::Path;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow {
    id: String,
    medication_id: String,
    timestamp: String,
    taken: bool,
}

impl From<&DoseEvent> for CsvRow {
    fn from(event: &DoseEvent) -> Self {
        CsvRow {
            id: event.id.to_string(),
            medication_id: event.medication_id.clone(),
            timestamp: event.timestamp.format("%Y-%m-%dT%H:%M:%S").to_string(),
            taken: event.taken,
        }
    }
}

/// Roll up the dose history journal into CSV and archive the journal
///
/// Steps:
/// 1. Read all events from the journal
/// 2. Append them to the CSV file (headers written on first create)
/// 3. Sync the CSV to disk
/// 4. Rename the journal to .processed
///
/// The CSV is fsynced before the journal is renamed, and the journal is
/// renamed rather than deleted so manual recovery stays possible.
pub fn journal_to_csv_and_archive(store: &MedicationStore, csv_path: &Path) -> Result<usize> {
    let events = store.list_dose_events(None)?;

    if events.is_empty() {
        tracing::info!("No dose events in journal to export");
        return Ok(0);
    }

    if let Some(parent) = csv_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(csv_path)?;

    let needs_headers = file.metadata()?.len() == 0;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_headers)
        .from_writer(file);

    for event in &events {
        writer.serialize(CsvRow::from(event))?;
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    file.sync_all()?;

    tracing::info!("Wrote {} dose events to CSV", events.len());

    let journal_path = store.dose_history_path();
    let processed_path = journal_path.with_extension("jsonl.processed");
    std::fs::rename(&journal_path, &processed_path)?;

    tracing::info!("Archived journal to {:?}", processed_path);

    Ok(events.len())
}

/// Remove all .processed journal files in the given directory
pub fn cleanup_processed_journals(dir: &Path) -> Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }

    let mut count = 0;
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();

        if let Some(extension) = path.extension() {
            if extension == "processed" {
                std::fs::remove_file(&path)?;
                tracing::debug!("Removed processed journal: {:?}", path);
                count += 1;
            }
        }
    }

    if count > 0 {
        tracing::info!("Cleaned up {} processed journal files", count);
    }

    Ok(count)
}
