//! File-backed medication store with file locking.
//!
//! Two collections under the data directory, matching the app's persisted
//! layout:
//! - `medications.json`: whole-document JSON array, written atomically
//! - `dose_history.jsonl`: append-only JSON-lines journal of dose events
//!
//! Read/write failures surface as `Error::Storage`; individual malformed
//! records are skipped with a warning so one bad record cannot take down
//! a whole read.

use crate::{DoseEvent, Error, MedicationDefinition, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

const MEDICATIONS_FILE: &str = "medications.json";
const DOSE_HISTORY_FILE: &str = "dose_history.jsonl";

/// Sink trait for appending dose events
pub trait DoseEventSink {
    fn append(&mut self, event: &DoseEvent) -> Result<()>;
}

/// Store rooted at a data directory
pub struct MedicationStore {
    dir: PathBuf,
}

impl MedicationStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn medications_path(&self) -> PathBuf {
        self.dir.join(MEDICATIONS_FILE)
    }

    pub fn dose_history_path(&self) -> PathBuf {
        self.dir.join(DOSE_HISTORY_FILE)
    }

    /// List all medication definitions
    ///
    /// Missing file means an empty store. Records that fail to parse or
    /// validate are skipped with a warning; the rest of the collection
    /// still loads.
    pub fn list_medications(&self) -> Result<Vec<MedicationDefinition>> {
        let path = self.medications_path();
        if !path.exists() {
            return Ok(Vec::new());
        }

        let contents = read_locked(&path)?;
        let raw: Vec<serde_json::Value> = serde_json::from_str(&contents)
            .map_err(|e| Error::Storage(format!("medications collection unreadable: {}", e)))?;

        let mut medications = Vec::with_capacity(raw.len());
        for value in raw {
            match serde_json::from_value::<MedicationDefinition>(value) {
                Ok(def) => match def.validate() {
                    Ok(()) => medications.push(def),
                    Err(e) => {
                        tracing::warn!("Skipping invalid medication record: {}", e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Skipping malformed medication record: {}", e);
                }
            }
        }

        tracing::debug!("Loaded {} medications from {:?}", medications.len(), path);
        Ok(medications)
    }

    /// Look up a single medication by id
    pub fn get_medication(&self, id: &str) -> Result<Option<MedicationDefinition>> {
        Ok(self
            .list_medications()?
            .into_iter()
            .find(|def| def.id == id))
    }

    /// Insert or replace a medication definition
    ///
    /// Validation happens here, at the boundary, so nothing malformed ever
    /// reaches schedule generation.
    pub fn save_medication(&self, def: &MedicationDefinition) -> Result<()> {
        def.validate()?;

        let mut medications = self.list_medications()?;
        match medications.iter_mut().find(|m| m.id == def.id) {
            Some(existing) => *existing = def.clone(),
            None => medications.push(def.clone()),
        }

        self.write_medications(&medications)?;
        tracing::debug!("Saved medication '{}'", def.id);
        Ok(())
    }

    /// Remove a medication by id; removing an absent id is not an error
    pub fn delete_medication(&self, id: &str) -> Result<()> {
        let mut medications = self.list_medications()?;
        let before = medications.len();
        medications.retain(|m| m.id != id);

        if medications.len() == before {
            tracing::warn!("Delete requested for unknown medication '{}'", id);
            return Ok(());
        }

        self.write_medications(&medications)?;
        tracing::info!("Deleted medication '{}'", id);
        Ok(())
    }

    /// List dose events, optionally filtered to one medication
    ///
    /// Partial or corrupt journal lines are skipped with a warning.
    pub fn list_dose_events(&self, medication_id: Option<&str>) -> Result<Vec<DoseEvent>> {
        let path = self.dose_history_path();
        if !path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&path)
            .map_err(|e| Error::Storage(format!("dose history unreadable: {}", e)))?;
        file.lock_shared()?;

        let reader = BufReader::new(&file);
        let mut events = Vec::new();

        for (line_num, line_result) in reader.lines().enumerate() {
            let line = line_result?;
            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str::<DoseEvent>(&line) {
                Ok(event) => {
                    if medication_id.map_or(true, |id| event.medication_id == id) {
                        events.push(event);
                    }
                }
                Err(e) => {
                    tracing::warn!("Skipping dose event at line {}: {}", line_num + 1, e);
                }
            }
        }

        file.unlock()?;
        tracing::debug!("Read {} dose events from {:?}", events.len(), path);
        Ok(events)
    }

    /// Append a dose event to the history journal
    pub fn append_dose_event(&self, event: &DoseEvent) -> Result<()> {
        let mut sink = JsonlEventSink::new(self.dose_history_path());
        sink.append(event)
    }

    /// Atomically replace the medications collection
    fn write_medications(&self, medications: &[MedicationDefinition]) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;

        let temp = NamedTempFile::new_in(&self.dir)?;
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string(medications)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(self.medications_path())
            .map_err(|e| Error::Io(e.error))?;
        Ok(())
    }
}

/// JSONL-based dose event sink with file locking
pub struct JsonlEventSink {
    path: PathBuf,
}

impl JsonlEventSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DoseEventSink for JsonlEventSink {
    fn append(&mut self, event: &DoseEvent) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        file.lock_exclusive()?;

        let mut writer = std::io::BufWriter::new(&file);
        let line = serde_json::to_string(event)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;

        file.unlock()?;

        tracing::debug!("Appended dose event {} to journal", event.id);
        Ok(())
    }
}

fn read_locked(path: &Path) -> Result<String> {
    let file =
        File::open(path).map_err(|e| Error::Storage(format!("cannot open {:?}: {}", path, e)))?;
    file.lock_shared()?;

    let mut contents = String::new();
    let mut reader = BufReader::new(&file);
    let read_result = reader.read_to_string(&mut contents);
    file.unlock()?;
    read_result.map_err(|e| Error::Storage(format!("cannot read {:?}: {}", path, e)))?;

    Ok(contents)
}
