//! Read-only views: a day's reservation log and the load summary.

use anyhow::Context;
use chrono::{FixedOffset, NaiveDate, Utc};

use tidebook_core::{DayKey, rank, standings};
use tidebook_state::StateStore;

/// List a day's reservations, newest first. Defaults to today.
pub fn reservations(
    store: &StateStore,
    offset: FixedOffset,
    date: Option<&str>,
) -> anyhow::Result<()> {
    let day_key = match date {
        Some(raw) => {
            let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .with_context(|| format!("bad date {raw:?}, expected YYYY-MM-DD"))?;
            DayKey::from_date(date, offset)
        }
        None => DayKey::from_instant(Utc::now(), offset),
    };

    let operators = store.list_operators()?;
    let mut entries = store.reservations_for_day(day_key)?;
    entries.sort_by(|(_, a), (_, b)| b.timestamp.cmp(&a.timestamp));

    if entries.is_empty() {
        println!("no reservations for that day");
        return Ok(());
    }

    for (id, reservation) in &entries {
        let name = operators
            .iter()
            .find(|op| op.id == reservation.operator_id)
            .map(|op| op.name.as_str())
            .unwrap_or(reservation.operator_id.as_str());
        let local = reservation.timestamp.with_timezone(&offset);
        println!(
            "{:<16} {}  {:<24} {:>3} people  {:<8} {}",
            id,
            local.format("%H:%M"),
            name,
            reservation.group_size,
            reservation.kind,
            reservation
                .departure
                .as_deref()
                .map(|d| format!("dep {d}"))
                .unwrap_or_default()
        );
        if let Some(seller) = &reservation.created_by {
            println!("{:>24} by {seller}", "");
        }
    }
    println!("{} reservations", entries.len());
    Ok(())
}

/// Per-operator load, slack, and utilization for today, best-placed first.
pub fn summary(store: &StateStore, offset: FixedOffset) -> anyhow::Result<()> {
    let day_key = DayKey::from_instant(Utc::now(), offset);
    let operators = store.list_operators()?;
    if operators.is_empty() {
        println!("no operators registered");
        return Ok(());
    }

    let loads = store.loads_for_day(&operators, day_key)?;
    let mut table = standings(&operators, &loads);
    table.sort_by(rank);

    println!(
        "{:<8} {:<24} {:>6} {:>9} {:>6} {:>6}",
        "id", "operator", "booked", "capacity", "slack", "util"
    );
    for standing in &table {
        let util = if standing.capacity_total == 0 {
            "-".to_string()
        } else {
            format!("{:.0}%", standing.ratio() * 100.0)
        };
        println!(
            "{:<8} {:<24} {:>6} {:>9} {:>6} {:>6}",
            standing.id,
            standing.name,
            standing.load,
            standing.capacity_total,
            standing.slack(),
            util
        );
    }
    Ok(())
}
