//! Operator management commands.

use std::path::Path;

use anyhow::Context;
use chrono::Utc;
use serde::Deserialize;

use tidebook_core::{Boat, Contact};
use tidebook_state::{OperatorDraft, StateStore};

/// Demo fleet installed by `operator seed` when no file is given.
const DEFAULT_SEED: &str = include_str!("../../seed/operators.toml");

#[derive(Debug, Deserialize)]
struct SeedFile {
    operators: Vec<OperatorDraft>,
}

#[allow(clippy::too_many_arguments)]
pub fn add(
    store: &StateStore,
    name: &str,
    capacity: u32,
    boats: &[String],
    staff: u32,
    schedules: Vec<String>,
    phone: String,
    email: String,
    address: String,
    specialty: String,
) -> anyhow::Result<()> {
    let boats = boats
        .iter()
        .map(|spec| parse_boat(spec))
        .collect::<anyhow::Result<Vec<Boat>>>()?;

    let draft = OperatorDraft {
        id: None,
        name: name.to_string(),
        contact: Contact {
            phone,
            email,
            address,
        },
        boats,
        staff_count: staff,
        capacity_total: capacity,
        schedules,
        specialty,
    };

    let id = store.save_operator(draft, Utc::now())?;
    println!("added operator {id}: {name} (capacity {capacity})");
    Ok(())
}

pub fn list(store: &StateStore) -> anyhow::Result<()> {
    let operators = store.list_operators()?;
    if operators.is_empty() {
        println!("no operators registered");
        return Ok(());
    }
    for op in operators {
        println!(
            "{:<8} {:<24} capacity {:<4} boats {:<2} staff {:<3} {}",
            op.id,
            op.name,
            op.capacity_total,
            op.boats.len(),
            op.staff_count,
            op.specialty
        );
    }
    Ok(())
}

pub fn remove(store: &StateStore, id: &str) -> anyhow::Result<()> {
    if store.delete_operator(id)? {
        println!("removed operator {id} and its reservations");
    } else {
        println!("no operator with id {id}");
    }
    Ok(())
}

/// Load operators from a TOML seed file. Operators whose name is already
/// registered are skipped, so seeding is idempotent.
pub fn seed(store: &StateStore, file: Option<&Path>) -> anyhow::Result<()> {
    let raw = match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading seed file {}", path.display()))?,
        None => DEFAULT_SEED.to_string(),
    };
    let seed: SeedFile = toml::from_str(&raw).context("parsing seed file")?;

    let existing: Vec<String> = store
        .list_operators()?
        .into_iter()
        .map(|op| op.name)
        .collect();

    let now = Utc::now();
    let mut created = 0;
    for draft in seed.operators {
        if existing.iter().any(|name| name == draft.name.trim()) {
            continue;
        }
        store.save_operator(draft, now)?;
        created += 1;
    }
    println!("seeded {created} operators");
    Ok(())
}

/// Parse a boat spec of the form "Name:capacity".
fn parse_boat(spec: &str) -> anyhow::Result<Boat> {
    let (name, capacity) = spec
        .rsplit_once(':')
        .with_context(|| format!("boat spec {spec:?} is not Name:capacity"))?;
    let capacity: u32 = capacity
        .trim()
        .parse()
        .with_context(|| format!("boat spec {spec:?} has a bad capacity"))?;
    Ok(Boat {
        name: name.to_string(),
        capacity,
        status: String::new(),
        kind: String::new(),
    })
}
