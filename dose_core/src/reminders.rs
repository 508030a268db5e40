//! Reminder surface for the host's notification scheduler.
//!
//! The engine computes *when* reminders should fire; delivery belongs to
//! the host. Refill-due signals are deduplicated to one per medication per
//! calendar day, with the dedup state persisted via locked atomic writes.

use crate::{
    is_refill_due, AdherenceRecord, AdherenceStatus, Error, MedicationDefinition, Result,
};
use chrono::{NaiveDate, NaiveDateTime};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// A dose reminder the host should schedule a local notification for
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DoseReminder {
    pub medication_id: String,
    pub scheduled_at: NaiveDateTime,
}

/// Reminders for Pending occurrences of a reminder-enabled medication
pub fn dose_reminders(
    def: &MedicationDefinition,
    records: &[AdherenceRecord],
) -> Vec<DoseReminder> {
    if !def.reminder_enabled {
        return Vec::new();
    }

    records
        .iter()
        .filter(|r| r.occurrence.medication_id == def.id)
        .filter(|r| r.status == AdherenceStatus::Pending)
        .map(|r| DoseReminder {
            medication_id: r.occurrence.medication_id.clone(),
            scheduled_at: r.occurrence.scheduled_at,
        })
        .collect()
}

/// Per-medication refill-signal dedup state, persisted between runs
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct ReminderState {
    pub last_refill_signal: HashMap<String, NaiveDate>,
}

impl ReminderState {
    /// Whether a refill-due signal should fire for this medication today
    ///
    /// Returns true at most once per medication per calendar day; firing
    /// records today's date in the state, which the caller persists.
    pub fn refill_signal_due(&mut self, def: &MedicationDefinition, today: NaiveDate) -> bool {
        if !def.refill_reminder || !is_refill_due(def) {
            return false;
        }

        if self.last_refill_signal.get(&def.id) == Some(&today) {
            return false;
        }

        self.last_refill_signal.insert(def.id.clone(), today);
        tracing::info!("Refill signal raised for '{}' on {}", def.id, today);
        true
    }

    /// Load reminder state with shared locking
    ///
    /// Returns default state if the file doesn't exist or is corrupted
    /// (corruption is logged and the state rebuilt on the next save).
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No reminder state found, using default");
            return Ok(Self::default());
        }

        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!(
                    "Unable to open reminder state {:?}: {}. Using defaults.",
                    path,
                    e
                );
                return Ok(Self::default());
            }
        };

        if let Err(e) = file.lock_shared() {
            tracing::warn!(
                "Unable to lock reminder state {:?}: {}. Using defaults.",
                path,
                e
            );
            return Ok(Self::default());
        }

        let mut contents = String::new();
        let mut reader = std::io::BufReader::new(&file);
        if let Err(e) = reader.read_to_string(&mut contents) {
            let _ = file.unlock();
            tracing::warn!(
                "Failed to read reminder state {:?}: {}. Using defaults.",
                path,
                e
            );
            return Ok(Self::default());
        }

        file.unlock()?;

        match serde_json::from_str::<ReminderState>(&contents) {
            Ok(state) => Ok(state),
            Err(e) => {
                tracing::warn!(
                    "Failed to parse reminder state {:?}: {}. Using defaults.",
                    path,
                    e
                );
                Ok(Self::default())
            }
        }
    }

    /// Save reminder state atomically with exclusive locking
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let temp = NamedTempFile::new_in(path.parent().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::Other, "state path missing parent")
        })?)?;

        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string(self)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved reminder state to {:?}", path);
        Ok(())
    }
}
