//! Adherence reconciliation: occurrences + recorded events -> status.
//!
//! Reconciliation is a pure function; "now" is supplied by the caller so
//! the logic stays deterministic under test. Matching tolerances are
//! configurable rather than fixed constants.

use crate::{AdherenceRecord, AdherenceStatus, DoseEvent, DoseOccurrence};
use chrono::{Duration, NaiveDateTime};

/// Tunable windows for matching events to occurrences
#[derive(Clone, Copy, Debug)]
pub struct ReconcileParams {
    /// Maximum distance between an event timestamp and the scheduled time
    /// for the event to count toward that occurrence
    pub match_tolerance: Duration,
    /// How long past the scheduled time an occurrence stays Pending before
    /// it is classified Missed
    pub missed_grace: Duration,
}

impl Default for ReconcileParams {
    fn default() -> Self {
        Self {
            // Wide enough to absorb same-day late logging
            match_tolerance: Duration::minutes(720),
            missed_grace: Duration::minutes(60),
        }
    }
}

impl ReconcileParams {
    pub fn from_minutes(match_tolerance_minutes: i64, missed_grace_minutes: i64) -> Self {
        Self {
            match_tolerance: Duration::minutes(match_tolerance_minutes),
            missed_grace: Duration::minutes(missed_grace_minutes),
        }
    }
}

/// Reconcile generated occurrences against recorded dose events
///
/// Returns one record per occurrence, preserving occurrence order. Each
/// event counts toward at most one occurrence: the nearest one for its
/// medication (ties go to the earlier occurrence), and only within the
/// match tolerance. When several events land on one occurrence, the event
/// with the latest timestamp wins. Events matching no occurrence are
/// ignored here; they may be ad-hoc AsNeeded logs.
pub fn reconcile(
    occurrences: &[DoseOccurrence],
    events: &[DoseEvent],
    now: NaiveDateTime,
    params: &ReconcileParams,
) -> Vec<AdherenceRecord> {
    // One slot per occurrence holding its latest matched event
    let mut matched: Vec<Option<&DoseEvent>> = vec![None; occurrences.len()];

    for event in events {
        let nearest = occurrences
            .iter()
            .enumerate()
            .filter(|(_, o)| o.medication_id == event.medication_id)
            .min_by_key(|(_, o)| (event.timestamp - o.scheduled_at).abs());

        if let Some((idx, occurrence)) = nearest {
            let delta = (event.timestamp - occurrence.scheduled_at).abs();
            if delta > params.match_tolerance {
                continue;
            }
            let newer = matched[idx].map_or(true, |cur| event.timestamp > cur.timestamp);
            if newer {
                matched[idx] = Some(event);
            }
        }
    }

    occurrences
        .iter()
        .zip(&matched)
        .map(|(occurrence, event)| {
            let status = if event.map(|e| e.taken) == Some(true) {
                AdherenceStatus::Taken
            } else if occurrence.scheduled_at < now - params.missed_grace {
                AdherenceStatus::Missed
            } else {
                AdherenceStatus::Pending
            };
            AdherenceRecord {
                occurrence: occurrence.clone(),
                status,
            }
        })
        .collect()
}
