//! Admission commands: auto-assignment and explicit booking.

use chrono::{FixedOffset, Utc};
use tracing::info;

use tidebook_core::{
    AdmissionOutcome, AdmissionRequest, DayKey, Operator, admit_with_loads, book_with_operator,
    normalize_group_size,
};
use tidebook_state::StateStore;

/// Admit a group, auto-assigning the least-loaded operator. Reads the
/// day's loads from the store's counters rather than rescanning history.
pub fn admit(
    store: &StateStore,
    offset: FixedOffset,
    people: f64,
    token: Option<&str>,
    kind: Option<String>,
    departure: Option<String>,
) -> anyhow::Result<()> {
    let now = Utc::now();
    let group_size = match normalize_group_size(people) {
        Ok(n) => n,
        Err(reason) => {
            println!("invalid request: {reason}");
            return Ok(());
        }
    };

    let created_by = tidebook_auth::resolve_token(store, token, now)?;
    let operators = store.list_operators()?;
    let day_key = DayKey::from_instant(now, offset);
    let loads = store.loads_for_day(&operators, day_key)?;

    let request = AdmissionRequest {
        group_size,
        now,
        kind,
        departure,
        created_by,
    };
    let outcome = admit_with_loads(&operators, &loads, day_key, &request);
    finish(store, &operators, outcome)
}

/// Book a group with a named operator. Unknown ids are invalid; capacity
/// is enforced the same way as auto-assignment.
pub fn book(
    store: &StateStore,
    offset: FixedOffset,
    operator_id: &str,
    people: f64,
    token: Option<&str>,
    kind: Option<String>,
    departure: Option<String>,
) -> anyhow::Result<()> {
    let now = Utc::now();
    let group_size = match normalize_group_size(people) {
        Ok(n) => n,
        Err(reason) => {
            println!("invalid request: {reason}");
            return Ok(());
        }
    };

    let created_by = tidebook_auth::resolve_token(store, token, now)?;
    let operators = store.list_operators()?;
    let day_key = DayKey::from_instant(now, offset);
    let snapshot: Vec<_> = store
        .reservations_for_day(day_key)?
        .into_iter()
        .map(|(_, r)| r)
        .collect();

    let request = AdmissionRequest {
        group_size,
        now,
        kind,
        departure,
        created_by,
    };
    let outcome = book_with_operator(&operators, &snapshot, offset, operator_id, &request);
    finish(store, &operators, outcome)
}

/// Persist a recorded outcome and print the result. A failed write
/// surfaces as an error, never as a recorded booking.
fn finish(
    store: &StateStore,
    operators: &[Operator],
    outcome: AdmissionOutcome,
) -> anyhow::Result<()> {
    match outcome {
        AdmissionOutcome::Recorded(reservation) => {
            let id = store.record_reservation(&reservation)?;
            let name = operators
                .iter()
                .find(|op| op.id == reservation.operator_id)
                .map(|op| op.name.as_str())
                .unwrap_or(reservation.operator_id.as_str());
            info!(
                %id,
                operator = %reservation.operator_id,
                group_size = reservation.group_size,
                "reservation recorded"
            );
            println!(
                "recorded {id}: {} people with {name} ({})",
                reservation.group_size, reservation.kind
            );
            if let Some(seller) = &reservation.created_by {
                println!("  recorded by {seller}");
            }
        }
        AdmissionOutcome::Rejected {
            requested_group_size,
            max_available_slack,
        } => {
            info!(
                requested_group_size,
                max_available_slack, "admission rejected"
            );
            println!(
                "rejected: no operator can take {requested_group_size} people today \
                 (best remaining capacity: {max_available_slack})"
            );
        }
        AdmissionOutcome::Invalid { reason } => {
            info!(%reason, "admission request invalid");
            println!("invalid request: {reason}");
        }
    }
    Ok(())
}
