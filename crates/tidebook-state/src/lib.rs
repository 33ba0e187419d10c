//! tidebook-state — embedded state store for Tidebook.
//!
//! Backed by [redb](https://docs.rs/redb), holds operators, reservations,
//! users, sessions, and the per-(operator, day) load counters the
//! admission flow reads instead of rescanning reservation history.
//!
//! # Architecture
//!
//! Domain types are JSON-serialized into redb's `&[u8]` value columns.
//! Composite keys (`{day_key}:{seq}`, `{operator_id}:{day_key}`) enable
//! prefix scans for a day's reservations and an operator's counters.
//!
//! Reservation appends and their counter bumps happen in one write
//! transaction, and the counter is re-checked against the operator's
//! capacity inside that transaction. redb is single-writer, which gives
//! the admission flow the per-operator write serialization it relies on:
//! two racing admissions cannot both commit past capacity.
//!
//! The `StateStore` is `Clone` + `Send` + `Sync` (backed by `Arc<Database>`).

pub mod error;
pub mod store;
pub mod tables;
pub mod types;

pub use error::{StateError, StateResult};
pub use store::StateStore;
pub use types::*;
