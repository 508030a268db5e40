//! Schedule generation: medication definition + date window -> occurrences.
//!
//! Occurrences are derived values, recomputed per query and never stored.
//! Generation is deterministic over its inputs and always finite: Ongoing
//! medications are bounded by the caller-supplied window.

use crate::catalog::times_for_frequency;
use crate::{CourseDuration, DoseOccurrence, Error, MedicationDefinition, Result};
use chrono::{Duration, NaiveDate};

/// Half-open date window: `start` inclusive, `end` exclusive
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Window covering a single calendar day
    pub fn single_day(day: NaiveDate) -> Self {
        Self {
            start: day,
            end: day + Duration::days(1),
        }
    }
}

/// Generate the ordered sequence of expected dose occurrences in a window
///
/// The window is clamped to `[max(start, start_date), min(end, course end))`;
/// a finite course ends exclusively at `start_date + days`. An empty clamped
/// window or an AsNeeded frequency yields an empty sequence - nothing to
/// schedule, not an error.
pub fn generate(def: &MedicationDefinition, window: DateWindow) -> Vec<DoseOccurrence> {
    let times = times_for_frequency(def.frequency);
    if times.is_empty() {
        return Vec::new();
    }

    let start = window.start.max(def.start_date);
    let end = match def.end_date() {
        Some(course_end) => window.end.min(course_end),
        None => window.end,
    };

    if start >= end {
        return Vec::new();
    }

    let mut occurrences = Vec::with_capacity((end - start).num_days() as usize * times.len());
    let mut day = start;
    while day < end {
        for time in times {
            occurrences.push(DoseOccurrence {
                scheduled_at: day.and_time(*time),
                medication_id: def.id.clone(),
            });
        }
        day = day + Duration::days(1);
    }

    tracing::debug!(
        "Generated {} occurrences for '{}' in {} .. {}",
        occurrences.len(),
        def.id,
        start,
        end
    );

    occurrences
}

/// Generate occurrences over a medication's entire finite course
///
/// Fails with a contract violation for Ongoing medications: generating
/// without an explicit horizon is a programming error, never valid at
/// runtime.
pub fn generate_full_course(def: &MedicationDefinition) -> Result<Vec<DoseOccurrence>> {
    match def.duration {
        CourseDuration::Days(_) => {
            let end = def
                .end_date()
                .ok_or_else(|| Error::Contract("finite course missing end date".into()))?;
            Ok(generate(def, DateWindow::new(def.start_date, end)))
        }
        CourseDuration::Ongoing => Err(Error::Contract(format!(
            "medication '{}' is ongoing; generation requires an explicit horizon",
            def.id
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Frequency;
    use chrono::NaiveTime;

    fn definition(frequency: Frequency, duration: CourseDuration) -> MedicationDefinition {
        MedicationDefinition {
            id: "med_1".into(),
            name: "Amoxicillin".into(),
            dosage: "500mg".into(),
            frequency,
            duration,
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

    fn day(offset: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap() + Duration::days(offset)
    }

    #[test]
    fn test_twice_daily_seven_day_course() {
        let def = definition(Frequency::TwiceDaily, CourseDuration::Days(7));
        let occurrences = generate(&def, DateWindow::new(day(0), day(7)));

        assert_eq!(occurrences.len(), 14);
        assert_eq!(
            occurrences.first().unwrap().scheduled_at,
            day(0).and_time(NaiveTime::from_hms_opt(9, 0, 0).unwrap())
        );
        assert_eq!(
            occurrences.last().unwrap().scheduled_at,
            day(6).and_time(NaiveTime::from_hms_opt(21, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_full_course_count_matches_days_times_frequency() {
        for (freq, per_day) in [
            (Frequency::OnceDaily, 1),
            (Frequency::TwiceDaily, 2),
            (Frequency::ThreeTimesDaily, 3),
            (Frequency::FourTimesDaily, 4),
        ] {
            let def = definition(freq, CourseDuration::Days(30));
            let occurrences = generate_full_course(&def).unwrap();
            assert_eq!(occurrences.len(), 30 * per_day, "{:?}", freq);
        }
    }

    #[test]
    fn test_occurrences_strictly_ordered() {
        let def = definition(Frequency::FourTimesDaily, CourseDuration::Days(14));
        let occurrences = generate_full_course(&def).unwrap();
        assert!(occurrences
            .windows(2)
            .all(|w| w[0].scheduled_at < w[1].scheduled_at));
    }

    #[test]
    fn test_window_clamped_to_start_date() {
        let def = definition(Frequency::OnceDaily, CourseDuration::Days(7));
        // Window begins before the course starts
        let occurrences = generate(&def, DateWindow::new(day(-5), day(3)));
        assert_eq!(occurrences.len(), 3);
        assert!(occurrences
            .iter()
            .all(|o| o.scheduled_at.date() >= def.start_date));
    }

    #[test]
    fn test_window_clamped_to_end_date() {
        let def = definition(Frequency::OnceDaily, CourseDuration::Days(7));
        // Window extends past the exclusive end date
        let occurrences = generate(&def, DateWindow::new(day(5), day(30)));
        assert_eq!(occurrences.len(), 2);
        assert!(occurrences
            .iter()
            .all(|o| o.scheduled_at.date() < def.end_date().unwrap()));
    }

    #[test]
    fn test_empty_window_yields_nothing() {
        let def = definition(Frequency::TwiceDaily, CourseDuration::Days(7));
        assert!(generate(&def, DateWindow::new(day(3), day(3))).is_empty());
        assert!(generate(&def, DateWindow::new(day(5), day(2))).is_empty());
        // Entirely before the course
        assert!(generate(&def, DateWindow::new(day(-10), day(-1))).is_empty());
        // Entirely after the course
        assert!(generate(&def, DateWindow::new(day(8), day(12))).is_empty());
    }

    #[test]
    fn test_as_needed_always_empty() {
        let def = definition(Frequency::AsNeeded, CourseDuration::Ongoing);
        assert!(generate(&def, DateWindow::new(day(0), day(365))).is_empty());
    }

    #[test]
    fn test_ongoing_bounded_by_window() {
        let def = definition(Frequency::OnceDaily, CourseDuration::Ongoing);
        let occurrences = generate(&def, DateWindow::new(day(0), day(31)));
        assert_eq!(occurrences.len(), 31);
    }

    #[test]
    fn test_ongoing_full_course_is_contract_violation() {
        let def = definition(Frequency::OnceDaily, CourseDuration::Ongoing);
        assert!(matches!(
            generate_full_course(&def),
            Err(Error::Contract(_))
        ));
    }

    #[test]
    fn test_generation_is_idempotent() {
        let def = definition(Frequency::ThreeTimesDaily, CourseDuration::Days(10));
        let window = DateWindow::new(day(2), day(9));
        assert_eq!(generate(&def, window), generate(&def, window));
    }
}
