//! Remaining-capacity eligibility filter.

use crate::select::OperatorStanding;

/// Operators whose remaining capacity fits the requested group:
/// `capacity_total - load >= group_size`.
///
/// An operator with zero total capacity can never qualify, since its
/// slack is below any valid group size. An empty result is a normal
/// outcome, not an error; the admission flow turns it into a rejection.
pub fn eligible<'a>(
    standings: &'a [OperatorStanding],
    group_size: u32,
) -> Vec<&'a OperatorStanding> {
    standings
        .iter()
        .filter(|s| s.slack() >= i64::from(group_size))
        .collect()
}
