#![forbid(unsafe_code)]

//! Core schedule and adherence derivation engine for Dosetrack.
//!
//! This crate provides:
//! - Domain types (medications, dose events, occurrences, adherence)
//! - Frequency catalog (times-of-day per dosing frequency)
//! - Schedule generation over date windows
//! - Adherence reconciliation (taken/missed/pending)
//! - Supply tracking and refill signals
//! - File-backed persistence (medication store, dose journal, CSV export)
//!
//! The engine itself is purely functional: every derivation takes its
//! inputs, including "now", as parameters and returns new values. I/O
//! lives in the store and state modules only.

pub mod types;
pub mod error;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod schedule;
pub mod adherence;
pub mod supply;
pub mod engine;
pub mod reminders;
pub mod store;
pub mod export;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use catalog::{doses_per_day, times_for_frequency};
pub use config::Config;
pub use schedule::{generate, generate_full_course, DateWindow};
pub use adherence::{reconcile, ReconcileParams};
pub use supply::{apply_refill, apply_taken_event, is_refill_due};
pub use engine::{daily_summary, DailySummary};
pub use reminders::{dose_reminders, DoseReminder, ReminderState};
pub use store::{DoseEventSink, JsonlEventSink, MedicationStore};
pub use export::{cleanup_processed_journals, journal_to_csv_and_archive};
