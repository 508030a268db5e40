//! Supply tracking: decrement on taken doses, refill threshold signals.
//!
//! All operations return new definition values; persistence is the
//! caller's job, keeping this layer free of I/O.

use crate::{DoseEvent, Error, MedicationDefinition, Result};
use chrono::NaiveDate;

/// Apply a confirmed dose event to the medication's supply
///
/// Decrements `current_supply` by one for a `taken == true` event, floored
/// at zero. Events with `taken == false` leave the supply unchanged.
pub fn apply_taken_event(def: &MedicationDefinition, event: &DoseEvent) -> MedicationDefinition {
    let mut updated = def.clone();
    if event.taken {
        updated.current_supply = updated.current_supply.saturating_sub(1);
        if updated.current_supply == 0 {
            tracing::warn!("Medication '{}' supply exhausted", def.id);
        }
    }
    updated
}

/// Whether the remaining supply has crossed the refill threshold
pub fn is_refill_due(def: &MedicationDefinition) -> bool {
    def.current_supply <= def.refill_at
}

/// Add refilled doses to the supply and record the refill date
///
/// Rejects a zero addition: a refill must add at least one dose.
pub fn apply_refill(
    def: &MedicationDefinition,
    added_supply: u32,
    on: NaiveDate,
) -> Result<MedicationDefinition> {
    if added_supply == 0 {
        return Err(Error::Validation(format!(
            "refill for '{}' must add at least one dose",
            def.id
        )));
    }

    let mut updated = def.clone();
    updated.current_supply += added_supply;
    updated.total_supply = updated.total_supply.max(updated.current_supply);
    updated.last_refill_date = Some(on);

    tracing::info!(
        "Refilled '{}' by {} doses (now {})",
        def.id,
        added_supply,
        updated.current_supply
    );

    Ok(updated)
}
