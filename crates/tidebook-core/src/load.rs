//! Daily load aggregation.

use std::collections::HashMap;

use crate::daykey::DayKey;
use crate::types::{Operator, OperatorId, Reservation};

/// Sum booked headcount per operator for one calendar day.
///
/// Every operator appears in the result, zero-seeded, so callers can tell
/// "no bookings today" apart from "operator not in the snapshot".
/// Reservations against operators missing from `operators` are ignored.
/// Pure and independent of reservation order.
pub fn daily_load(
    operators: &[Operator],
    reservations: &[Reservation],
    day_key: DayKey,
) -> HashMap<OperatorId, u32> {
    let mut loads: HashMap<OperatorId, u32> =
        operators.iter().map(|op| (op.id.clone(), 0)).collect();

    for reservation in reservations {
        if reservation.day_key != day_key {
            continue;
        }
        if let Some(total) = loads.get_mut(&reservation.operator_id) {
            *total = total.saturating_add(reservation.group_size);
        }
    }

    loads
}
