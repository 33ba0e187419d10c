//! Least-loaded operator selection.
//!
//! Ranks operators under a deterministic total order evaluated
//! lexicographically:
//!
//! 1. Load ratio ascending (`load / capacity`, infinite when capacity is 0)
//! 2. Slack descending (more free seats wins ties)
//! 3. Name ascending (case-folded, raw byte order as the final word)
//!
//! The order is expressed as a standalone comparator plus a generic
//! arg-min utility, so the tie-break chain is testable without any
//! snapshot fetching around it.

use std::cmp::Ordering;
use std::collections::HashMap;

use tracing::debug;

use crate::types::{Operator, OperatorId};

/// One operator's capacity position for a single day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorStanding {
    pub id: OperatorId,
    pub name: String,
    pub capacity_total: u32,
    pub load: u32,
}

impl OperatorStanding {
    /// Remaining admissible headcount. Negative when overbooked.
    pub fn slack(&self) -> i64 {
        i64::from(self.capacity_total) - i64::from(self.load)
    }

    /// Load ratio for display. The comparator uses exact integer
    /// arithmetic; this value is informational only.
    pub fn ratio(&self) -> f64 {
        if self.capacity_total == 0 {
            f64::INFINITY
        } else {
            f64::from(self.load) / f64::from(self.capacity_total)
        }
    }
}

/// Build standings for all operators from a load map.
/// Operators absent from the map count as unloaded.
pub fn standings(
    operators: &[Operator],
    loads: &HashMap<OperatorId, u32>,
) -> Vec<OperatorStanding> {
    operators
        .iter()
        .map(|op| OperatorStanding {
            id: op.id.clone(),
            name: op.name.clone(),
            capacity_total: op.capacity_total,
            load: loads.get(&op.id).copied().unwrap_or(0),
        })
        .collect()
}

/// Compare load ratios without floats: `a.load / a.cap < b.load / b.cap`
/// iff `a.load * b.cap < b.load * a.cap` when both capacities are
/// positive. Zero capacity ranks as an infinite ratio, keeping the order
/// total even though such operators never pass eligibility.
fn cmp_ratio(a: &OperatorStanding, b: &OperatorStanding) -> Ordering {
    match (a.capacity_total, b.capacity_total) {
        (0, 0) => Ordering::Equal,
        (0, _) => Ordering::Greater,
        (_, 0) => Ordering::Less,
        (ca, cb) => {
            (u64::from(a.load) * u64::from(cb)).cmp(&(u64::from(b.load) * u64::from(ca)))
        }
    }
}

/// Case-folded name order, with raw byte order deciding between strings
/// that fold to the same text.
pub fn cmp_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// The canonical ranking: ratio ascending, slack descending, name ascending.
pub fn rank(a: &OperatorStanding, b: &OperatorStanding) -> Ordering {
    cmp_ratio(a, b)
        .then_with(|| b.slack().cmp(&a.slack()))
        .then_with(|| cmp_names(&a.name, &b.name))
}

/// First minimum under a comparator expressing a tie-break chain.
///
/// Keeps the earliest item on `Ordering::Equal`, so the result is stable;
/// with a total order like [`rank`] it is the same for any input order.
pub fn arg_min_by<'a, T>(
    items: &[&'a T],
    mut compare: impl FnMut(&T, &T) -> Ordering,
) -> Option<&'a T> {
    items.iter().copied().reduce(|best, candidate| {
        if compare(candidate, best) == Ordering::Less {
            candidate
        } else {
            best
        }
    })
}

/// Pick the least-loaded operator from an eligible set.
pub fn select_operator<'a>(eligible: &[&'a OperatorStanding]) -> Option<&'a OperatorStanding> {
    let winner = arg_min_by(eligible, rank)?;
    debug!(
        operator = %winner.id,
        load = winner.load,
        capacity = winner.capacity_total,
        "selected least-loaded operator"
    );
    Some(winner)
}
