//! Daily schedule derivation across all medications.
//!
//! Ties the pipeline together: frequency catalog -> schedule generator ->
//! adherence reconciler, over a single calendar day. The result backs the
//! "today" view: per-dose statuses plus overall progress numbers.

use crate::adherence::{reconcile, ReconcileParams};
use crate::schedule::{generate, DateWindow};
use crate::{AdherenceRecord, AdherenceStatus, DoseEvent, MedicationDefinition};
use chrono::NaiveDateTime;

/// Reconciled schedule for one calendar day across all medications
#[derive(Clone, Debug)]
pub struct DailySummary {
    /// Records ordered by scheduled time, then medication id
    pub records: Vec<AdherenceRecord>,
}

impl DailySummary {
    pub fn total_doses(&self) -> usize {
        self.records.len()
    }

    pub fn completed_doses(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.status == AdherenceStatus::Taken)
            .count()
    }

    /// Fraction of today's doses taken, 0.0 when nothing is scheduled
    pub fn progress(&self) -> f64 {
        if self.records.is_empty() {
            0.0
        } else {
            self.completed_doses() as f64 / self.total_doses() as f64
        }
    }
}

/// Derive the reconciled dose schedule for the day containing `now`
pub fn daily_summary(
    definitions: &[MedicationDefinition],
    events: &[DoseEvent],
    now: NaiveDateTime,
    params: &ReconcileParams,
) -> DailySummary {
    let window = DateWindow::single_day(now.date());

    let mut records: Vec<AdherenceRecord> = definitions
        .iter()
        .flat_map(|def| {
            let occurrences = generate(def, window);
            reconcile(&occurrences, events, now, params)
        })
        .collect();

    records.sort_by(|a, b| a.occurrence.cmp(&b.occurrence));

    tracing::info!(
        "Daily summary for {}: {} doses, {} taken",
        now.date(),
        records.len(),
        records
            .iter()
            .filter(|r| r.status == AdherenceStatus::Taken)
            .count()
    );

    DailySummary { records }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CourseDuration, Frequency};
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn definition(id: &str, frequency: Frequency) -> MedicationDefinition {
        MedicationDefinition {
            id: id.into(),
            name: format!("Medication {}", id),
            dosage: "1 tablet".into(),
            frequency,
            duration: CourseDuration::Days(30),
            start_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            current_supply: 60,
            total_supply: 60,
            refill_at: 10,
            reminder_enabled: true,
            refill_reminder: false,
            last_refill_date: None,
            color: None,
            notes: None,
        }
    }

    fn noon(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, day)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_summary_spans_all_medications() {
        let defs = vec![
            definition("a", Frequency::TwiceDaily),
            definition("b", Frequency::ThreeTimesDaily),
        ];

        let summary = daily_summary(&defs, &[], noon(5), &ReconcileParams::default());
        assert_eq!(summary.total_doses(), 5);
        assert_eq!(summary.completed_doses(), 0);
    }

    #[test]
    fn test_records_ordered_by_time() {
        let defs = vec![
            definition("b", Frequency::TwiceDaily),
            definition("a", Frequency::FourTimesDaily),
        ];

        let summary = daily_summary(&defs, &[], noon(5), &ReconcileParams::default());
        assert!(summary
            .records
            .windows(2)
            .all(|w| w[0].occurrence <= w[1].occurrence));
    }

    #[test]
    fn test_progress_counts_taken_doses() {
        let defs = vec![definition("a", Frequency::TwiceDaily)];
        let events = vec![DoseEvent {
            id: Uuid::new_v4(),
            medication_id: "a".into(),
            timestamp: NaiveDate::from_ymd_opt(2025, 3, 5)
                .unwrap()
                .and_hms_opt(9, 10, 0)
                .unwrap(),
            taken: true,
        }];

        let summary = daily_summary(&defs, &events, noon(5), &ReconcileParams::default());
        assert_eq!(summary.total_doses(), 2);
        assert_eq!(summary.completed_doses(), 1);
        assert!((summary.progress() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_schedule_has_zero_progress() {
        let defs = vec![definition("a", Frequency::AsNeeded)];
        let summary = daily_summary(&defs, &[], noon(5), &ReconcileParams::default());
        assert_eq!(summary.total_doses(), 0);
        assert_eq!(summary.progress(), 0.0);
    }

    #[test]
    fn test_day_outside_course_is_empty() {
        let defs = vec![definition("a", Frequency::TwiceDaily)];
        // Course of 30 days starting March 1 has ended by April 15
        let now = NaiveDate::from_ymd_opt(2025, 4, 15)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let summary = daily_summary(&defs, &[], now, &ReconcileParams::default());
        assert_eq!(summary.total_doses(), 0);
    }
}
