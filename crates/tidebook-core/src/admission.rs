//! The admission flow: validate, aggregate, filter, select, shape the
//! reservation record.
//!
//! Every admission attempt reaches exactly one terminal outcome:
//! [`AdmissionOutcome::Recorded`], [`AdmissionOutcome::Rejected`], or
//! [`AdmissionOutcome::Invalid`]. All three are ordinary values — nothing
//! here panics or retries, and persisting the recorded reservation is the
//! caller's job (a failed write must not be reported as recorded).

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::daykey::DayKey;
use crate::eligibility::eligible;
use crate::load::daily_load;
use crate::select::{OperatorStanding, select_operator, standings};
use crate::types::{DEFAULT_RESERVATION_KIND, Operator, OperatorId, Reservation, UserId};

/// Why a request was malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum InvalidReason {
    #[error("a reservation must include at least one person")]
    GroupSizeTooSmall,

    #[error("unknown operator: {0}")]
    UnknownOperator(OperatorId),
}

/// A group-booking request. `now` is supplied by the caller so the flow
/// stays a pure function of its inputs.
#[derive(Debug, Clone)]
pub struct AdmissionRequest {
    /// People in the group, already normalized to a whole number >= 1.
    pub group_size: u32,
    pub now: DateTime<Utc>,
    /// Sales channel; defaults to [`DEFAULT_RESERVATION_KIND`] when blank.
    pub kind: Option<String>,
    /// Departure time "HH:MM", if the seller picked one.
    pub departure: Option<String>,
    /// Acting identity, already resolved from the session token.
    pub created_by: Option<UserId>,
}

/// Terminal outcome of one admission attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AdmissionOutcome {
    /// The shaped reservation, ready to persist.
    Recorded(Reservation),
    /// No operator has enough remaining capacity. Not a system fault;
    /// `max_available_slack` spans all operators, eligible or not, for
    /// diagnostic messaging.
    Rejected {
        requested_group_size: u32,
        max_available_slack: i64,
    },
    /// Malformed request.
    Invalid { reason: InvalidReason },
}

/// Round a raw headcount to the nearest whole person, floor 1.
///
/// Values below one person (or non-finite) are malformed rather than
/// rounded up.
pub fn normalize_group_size(raw: f64) -> Result<u32, InvalidReason> {
    if !raw.is_finite() || raw < 1.0 {
        return Err(InvalidReason::GroupSizeTooSmall);
    }
    Ok(raw.round().max(1.0) as u32)
}

/// Auto-assignment over full snapshots: aggregates the day's loads, then
/// delegates to [`admit_with_loads`].
pub fn admit(
    operators: &[Operator],
    reservations: &[Reservation],
    offset: FixedOffset,
    request: &AdmissionRequest,
) -> AdmissionOutcome {
    let day_key = DayKey::from_instant(request.now, offset);
    let loads = daily_load(operators, reservations, day_key);
    admit_with_loads(operators, &loads, day_key, request)
}

/// Auto-assignment over a precomputed load map, e.g. the state store's
/// incrementally maintained daily counters.
pub fn admit_with_loads(
    operators: &[Operator],
    loads: &HashMap<OperatorId, u32>,
    day_key: DayKey,
    request: &AdmissionRequest,
) -> AdmissionOutcome {
    if request.group_size < 1 {
        return AdmissionOutcome::Invalid {
            reason: InvalidReason::GroupSizeTooSmall,
        };
    }

    let all = standings(operators, loads);
    let candidates = eligible(&all, request.group_size);

    match select_operator(&candidates) {
        Some(winner) => {
            AdmissionOutcome::Recorded(shape_reservation(winner.id.clone(), day_key, request))
        }
        None => {
            let max_available_slack =
                all.iter().map(OperatorStanding::slack).max().unwrap_or(0);
            debug!(
                group_size = request.group_size,
                max_available_slack, "no operator can take the group"
            );
            AdmissionOutcome::Rejected {
                requested_group_size: request.group_size,
                max_available_slack,
            }
        }
    }
}

/// Explicit operator targeting: no auto-selection, but the same capacity
/// rules. An unknown operator id is malformed; a known operator without
/// enough slack is a rejection carrying that operator's slack.
pub fn book_with_operator(
    operators: &[Operator],
    reservations: &[Reservation],
    offset: FixedOffset,
    operator_id: &str,
    request: &AdmissionRequest,
) -> AdmissionOutcome {
    if request.group_size < 1 {
        return AdmissionOutcome::Invalid {
            reason: InvalidReason::GroupSizeTooSmall,
        };
    }

    let Some(operator) = operators.iter().find(|op| op.id == operator_id) else {
        return AdmissionOutcome::Invalid {
            reason: InvalidReason::UnknownOperator(operator_id.to_string()),
        };
    };

    let day_key = DayKey::from_instant(request.now, offset);
    let loads = daily_load(std::slice::from_ref(operator), reservations, day_key);
    let all = standings(std::slice::from_ref(operator), &loads);
    let candidates = eligible(&all, request.group_size);

    if candidates.is_empty() {
        return AdmissionOutcome::Rejected {
            requested_group_size: request.group_size,
            max_available_slack: all[0].slack(),
        };
    }

    AdmissionOutcome::Recorded(shape_reservation(operator.id.clone(), day_key, request))
}

fn shape_reservation(
    operator_id: OperatorId,
    day_key: DayKey,
    request: &AdmissionRequest,
) -> Reservation {
    let kind = request
        .kind
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .unwrap_or(DEFAULT_RESERVATION_KIND)
        .to_string();

    Reservation {
        operator_id,
        group_size: request.group_size,
        kind,
        departure: request.departure.clone(),
        timestamp: request.now,
        day_key,
        created_by: request.created_by.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(group_size: u32) -> AdmissionRequest {
        AdmissionRequest {
            group_size,
            now: "2024-03-10T15:00:00Z".parse().unwrap(),
            kind: None,
            departure: None,
            created_by: None,
        }
    }

    #[test]
    fn normalize_rounds_to_nearest_person() {
        assert_eq!(normalize_group_size(1.0), Ok(1));
        assert_eq!(normalize_group_size(1.4), Ok(1));
        assert_eq!(normalize_group_size(2.5), Ok(3));
        assert_eq!(normalize_group_size(24.6), Ok(25));
    }

    #[test]
    fn normalize_rejects_below_one() {
        assert_eq!(
            normalize_group_size(0.9),
            Err(InvalidReason::GroupSizeTooSmall)
        );
        assert_eq!(
            normalize_group_size(0.0),
            Err(InvalidReason::GroupSizeTooSmall)
        );
        assert_eq!(
            normalize_group_size(-3.0),
            Err(InvalidReason::GroupSizeTooSmall)
        );
        assert_eq!(
            normalize_group_size(f64::NAN),
            Err(InvalidReason::GroupSizeTooSmall)
        );
    }

    #[test]
    fn zero_group_size_is_invalid() {
        let outcome = admit_with_loads(
            &[],
            &HashMap::new(),
            DayKey::from_epoch_millis(0),
            &request(0),
        );

        assert_eq!(
            outcome,
            AdmissionOutcome::Invalid {
                reason: InvalidReason::GroupSizeTooSmall
            }
        );
    }

    #[test]
    fn blank_kind_defaults() {
        let mut req = request(2);
        req.kind = Some("   ".to_string());
        let shaped = shape_reservation("op-1".to_string(), DayKey::from_epoch_millis(0), &req);

        assert_eq!(shaped.kind, DEFAULT_RESERVATION_KIND);
    }

    #[test]
    fn explicit_kind_is_trimmed() {
        let mut req = request(2);
        req.kind = Some("  hotel ".to_string());
        let shaped = shape_reservation("op-1".to_string(), DayKey::from_epoch_millis(0), &req);

        assert_eq!(shaped.kind, "hotel");
    }
}
