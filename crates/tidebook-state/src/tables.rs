//! redb table definitions for the Tidebook state store.
//!
//! Tables use `&str` keys; values are JSON-serialized domain types except
//! `daily_loads`, whose values are raw headcount counters.

use redb::TableDefinition;

/// Operators keyed by `{operator_id}`.
pub const OPERATORS: TableDefinition<&str, &[u8]> = TableDefinition::new("operators");

/// Reservations keyed by `{day_key}:{seq}` — the key doubles as the
/// reservation id and sorts a day's reservations in admission order.
pub const RESERVATIONS: TableDefinition<&str, &[u8]> = TableDefinition::new("reservations");

/// Users keyed by normalized email.
pub const USERS: TableDefinition<&str, &[u8]> = TableDefinition::new("users");

/// Sessions keyed by token.
pub const SESSIONS: TableDefinition<&str, &[u8]> = TableDefinition::new("sessions");

/// Booked headcount counters keyed by `{operator_id}:{day_key}`, kept in
/// step with `reservations` inside the same write transaction.
pub const DAILY_LOADS: TableDefinition<&str, u32> = TableDefinition::new("daily_loads");
