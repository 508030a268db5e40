//! Core domain types for the Dosetrack system.
//!
//! This module defines the fundamental types used throughout the system:
//! - Medication definitions (frequency, duration, supply)
//! - Persisted dose events
//! - Derived dose occurrences and adherence records
//!
//! All dates and times are local wall-clock values. The engine performs no
//! UTC normalization; derived schedules must be recomputed if the local
//! zone changes.

use crate::{Error, Result};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Medication Definition Types
// ============================================================================

/// Dosing frequency, mapping to a fixed set of times-of-day per day
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    OnceDaily,
    TwiceDaily,
    ThreeTimesDaily,
    FourTimesDaily,
    /// No generated schedule; doses are logged ad hoc
    AsNeeded,
}

/// How long a medication course runs
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CourseDuration {
    /// Finite course length in days (must be >= 1)
    Days(u32),
    /// Unbounded; schedule generation requires a caller-supplied horizon
    Ongoing,
}

/// A medication definition owned by the store
///
/// The engine never mutates a definition in place; supply updates produce
/// new values for the caller to persist.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct MedicationDefinition {
    pub id: String,
    pub name: String,
    pub dosage: String,
    pub frequency: Frequency,
    pub duration: CourseDuration,
    pub start_date: NaiveDate,
    pub current_supply: u32,
    #[serde(default)]
    pub total_supply: u32,
    pub refill_at: u32,
    pub reminder_enabled: bool,
    pub refill_reminder: bool,
    #[serde(default)]
    pub last_refill_date: Option<NaiveDate>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl MedicationDefinition {
    /// Exclusive end date of the course, or None for Ongoing medications
    pub fn end_date(&self) -> Option<NaiveDate> {
        match self.duration {
            CourseDuration::Days(days) => Some(self.start_date + Duration::days(days as i64)),
            CourseDuration::Ongoing => None,
        }
    }

    /// Validate the definition before it reaches schedule generation
    ///
    /// Enforced at the store boundary so the engine's inputs are always
    /// well-formed.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(Error::Validation("medication id must not be empty".into()));
        }
        if self.name.trim().is_empty() {
            return Err(Error::Validation(format!(
                "medication '{}' has an empty name",
                self.id
            )));
        }
        if self.dosage.trim().is_empty() {
            return Err(Error::Validation(format!(
                "medication '{}' has an empty dosage",
                self.id
            )));
        }
        if self.duration == CourseDuration::Days(0) {
            return Err(Error::Validation(format!(
                "medication '{}' has a zero-day duration",
                self.id
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Dose Event (persisted fact)
// ============================================================================

/// A persisted record that the user acted on a dose at a point in time
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DoseEvent {
    pub id: Uuid,
    pub medication_id: String,
    /// When the user acted, local wall-clock
    pub timestamp: NaiveDateTime,
    pub taken: bool,
}

// ============================================================================
// Derived Types (recomputed per query, never persisted)
// ============================================================================

/// One expected dose instance derived from a medication's frequency
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct DoseOccurrence {
    pub scheduled_at: NaiveDateTime,
    pub medication_id: String,
}

/// Reconciled status of one occurrence
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdherenceStatus {
    Taken,
    Missed,
    Pending,
}

/// One occurrence paired with its reconciled status
#[derive(Clone, Debug, PartialEq)]
pub struct AdherenceRecord {
    pub occurrence: DoseOccurrence,
    pub status: AdherenceStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_definition() -> MedicationDefinition {
        MedicationDefinition {
            id: "med_1".into(),
            name: "Amoxicillin".into(),
            dosage: "500mg".into(),
            frequency: Frequency::TwiceDaily,
            duration: CourseDuration::Days(7),
            start_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            current_supply: 14,
            total_supply: 14,
            refill_at: 4,
            reminder_enabled: true,
            refill_reminder: false,
            last_refill_date: None,
            color: None,
            notes: None,
        }
    }

    #[test]
    fn test_valid_definition_passes() {
        assert!(base_definition().validate().is_ok());
    }

    #[test]
    fn test_empty_name_rejected() {
        let mut def = base_definition();
        def.name = "  ".into();
        assert!(matches!(def.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_empty_dosage_rejected() {
        let mut def = base_definition();
        def.dosage = "".into();
        assert!(matches!(def.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_zero_day_duration_rejected() {
        let mut def = base_definition();
        def.duration = CourseDuration::Days(0);
        assert!(matches!(def.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_end_date_is_exclusive_bound() {
        let def = base_definition();
        assert_eq!(
            def.end_date(),
            Some(NaiveDate::from_ymd_opt(2025, 3, 8).unwrap())
        );
    }

    #[test]
    fn test_ongoing_has_no_end_date() {
        let mut def = base_definition();
        def.duration = CourseDuration::Ongoing;
        assert_eq!(def.end_date(), None);
    }

    #[test]
    fn test_optional_fields_default_when_absent() {
        // Matches the persisted layout: lastRefillDate etc. may be missing
        let json = r#"{
            "id": "med_1",
            "name": "Amoxicillin",
            "dosage": "500mg",
            "frequency": "twice_daily",
            "duration": { "days": 7 },
            "start_date": "2025-03-01",
            "current_supply": 14,
            "refill_at": 4,
            "reminder_enabled": true,
            "refill_reminder": false
        }"#;

        let def: MedicationDefinition = serde_json::from_str(json).unwrap();
        assert_eq!(def.last_refill_date, None);
        assert_eq!(def.color, None);
        assert_eq!(def.notes, None);
        assert_eq!(def.total_supply, 0);
    }
}
