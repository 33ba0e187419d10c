//! Domain types for the admission core.
//!
//! `Operator` is owned by operator management (`tidebook-state`); the core
//! reads it. `Reservation` is immutable once shaped — no updates, no
//! deletes. Identifiers are plain strings; the state store's table keys
//! serve as reservation identifiers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::daykey::DayKey;

/// Unique identifier for a tour operator.
pub type OperatorId = String;

/// Identifier of an acting user (normalized email).
pub type UserId = String;

/// Reservation kind recorded when the caller does not supply one.
pub const DEFAULT_RESERVATION_KIND: &str = "direct";

/// Boat status recorded when a seed or form leaves it blank.
pub const DEFAULT_BOAT_STATUS: &str = "active";

/// Boat kind recorded when a seed or form leaves it blank.
pub const DEFAULT_BOAT_KIND: &str = "launch";

/// Contact details for an operator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Contact {
    pub phone: String,
    pub email: String,
    pub address: String,
}

/// A single boat in an operator's fleet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Boat {
    pub name: String,
    /// Seats on this boat. Informational — admission works against the
    /// operator's `capacity_total`, not per boat.
    pub capacity: u32,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub kind: String,
}

/// A capacity-limited tour operator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Operator {
    pub id: OperatorId,
    pub name: String,
    pub contact: Contact,
    pub boats: Vec<Boat>,
    pub staff_count: u32,
    /// Total headcount this operator can serve per day.
    pub capacity_total: u32,
    /// Departure schedules, "HH:MM", sorted and deduplicated.
    pub schedules: Vec<String>,
    pub specialty: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An admitted group booking. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Reservation {
    pub operator_id: OperatorId,
    /// People in the group, always >= 1.
    pub group_size: u32,
    /// Sales channel: "direct", "online", "hotel", "agency", ...
    pub kind: String,
    /// Departure time "HH:MM", when the seller picked one.
    pub departure: Option<String>,
    /// Instant the reservation was admitted.
    pub timestamp: DateTime<Utc>,
    /// Calendar-day bucket derived from `timestamp` at admission time.
    pub day_key: DayKey,
    /// Acting user, when the session token resolved to one.
    pub created_by: Option<UserId>,
}
