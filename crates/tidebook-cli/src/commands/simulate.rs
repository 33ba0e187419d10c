//! Random booking generator for demos and load sanity checks.
//!
//! Every generated booking goes through the real admission path, so the
//! counters, tie-breaks, and capacity checks are the ones production uses.

use chrono::{FixedOffset, Utc};
use rand::Rng;

use tidebook_core::{AdmissionOutcome, AdmissionRequest, DayKey, admit_with_loads};
use tidebook_state::StateStore;

const KINDS: &[&str] = &["direct", "online", "hotel", "agency"];

pub fn simulate(store: &StateStore, offset: FixedOffset, count: u32) -> anyhow::Result<()> {
    let operators = store.list_operators()?;
    if operators.is_empty() {
        println!("no operators registered; run `tidebook operator seed` first");
        return Ok(());
    }

    let mut rng = rand::rng();
    let mut recorded = 0u32;
    let mut rejected = 0u32;

    for _ in 0..count {
        let now = Utc::now();
        let day_key = DayKey::from_instant(now, offset);
        let loads = store.loads_for_day(&operators, day_key)?;

        let request = AdmissionRequest {
            group_size: random_group_size(&mut rng),
            now,
            kind: Some(KINDS[rng.random_range(0..KINDS.len())].to_string()),
            departure: Some(random_departure(&mut rng)),
            created_by: None,
        };

        match admit_with_loads(&operators, &loads, day_key, &request) {
            AdmissionOutcome::Recorded(reservation) => {
                store.record_reservation(&reservation)?;
                recorded += 1;
            }
            AdmissionOutcome::Rejected { .. } => rejected += 1,
            AdmissionOutcome::Invalid { reason } => {
                println!("unexpected invalid request: {reason}");
            }
        }
    }

    println!("simulated {count} bookings: {recorded} recorded, {rejected} rejected");
    Ok(())
}

/// Mostly couples and small families, the occasional single or large group.
fn random_group_size(rng: &mut impl Rng) -> u32 {
    let r: f64 = rng.random();
    if r < 0.15 {
        1
    } else if r < 0.75 {
        rng.random_range(2..=4)
    } else {
        rng.random_range(5..=6)
    }
}

/// Departures skew toward the morning slots.
fn random_departure(rng: &mut impl Rng) -> String {
    let hour = if rng.random_bool(0.6) {
        rng.random_range(8..=11)
    } else {
        rng.random_range(12..=16)
    };
    let minute = if rng.random_bool(0.5) { "00" } else { "30" };
    format!("{hour:02}:{minute}")
}
