//! Persisted identity types and the operator intake form.
//!
//! `Operator` and `Reservation` themselves live in `tidebook-core`; this
//! module adds the types only the store and the auth layer care about.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tidebook_core::{
    Boat, Contact, DEFAULT_BOAT_KIND, DEFAULT_BOAT_STATUS, OperatorId,
};

use crate::error::{StateError, StateResult};

// ── Users & sessions ──────────────────────────────────────────────

/// Application role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Seller,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => f.write_str("admin"),
            Role::Seller => f.write_str("seller"),
        }
    }
}

impl FromStr for Role {
    type Err = StateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "seller" => Ok(Role::Seller),
            other => Err(StateError::Invalid(format!("unknown role: {other}"))),
        }
    }
}

/// A user account, keyed by normalized email.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub email: String,
    /// `{salt_hex}:{digest_hex}`, produced by `tidebook-auth`.
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A login session, keyed by token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub token: String,
    pub user_email: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

// ── Operator intake ───────────────────────────────────────────────

/// Operator form data as entered: id present means update, absent means
/// create. Sanitized before it touches the operators table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OperatorDraft {
    #[serde(default)]
    pub id: Option<OperatorId>,
    pub name: String,
    #[serde(default)]
    pub contact: Contact,
    pub boats: Vec<Boat>,
    #[serde(default)]
    pub staff_count: u32,
    pub capacity_total: u32,
    #[serde(default)]
    pub schedules: Vec<String>,
    #[serde(default)]
    pub specialty: String,
}

impl OperatorDraft {
    /// Trim and validate the form: a named operator with at least one
    /// named boat; blank boat status/kind get defaults; schedules are
    /// deduplicated and sorted.
    pub fn sanitized(mut self) -> StateResult<Self> {
        self.name = self.name.trim().to_string();
        if self.name.is_empty() {
            return Err(StateError::Invalid(
                "an operator must have a name".to_string(),
            ));
        }

        self.boats = self
            .boats
            .into_iter()
            .map(sanitize_boat)
            .filter(|boat| !boat.name.is_empty())
            .collect();
        if self.boats.is_empty() {
            return Err(StateError::Invalid(
                "register at least one boat".to_string(),
            ));
        }

        self.schedules = self
            .schedules
            .iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        self.schedules.sort();
        self.schedules.dedup();

        self.contact = Contact {
            phone: self.contact.phone.trim().to_string(),
            email: self.contact.email.trim().to_string(),
            address: self.contact.address.trim().to_string(),
        };
        self.specialty = self.specialty.trim().to_string();

        Ok(self)
    }
}

fn sanitize_boat(boat: Boat) -> Boat {
    let status = boat.status.trim();
    let kind = boat.kind.trim();
    Boat {
        name: boat.name.trim().to_string(),
        capacity: boat.capacity,
        status: if status.is_empty() {
            DEFAULT_BOAT_STATUS.to_string()
        } else {
            status.to_string()
        },
        kind: if kind.is_empty() {
            DEFAULT_BOAT_KIND.to_string()
        } else {
            kind.to_string()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> OperatorDraft {
        OperatorDraft {
            id: None,
            name: "  Toto Tours  ".to_string(),
            contact: Contact {
                phone: " +52 999 101 2020 ".to_string(),
                email: "hola@tototours.mx".to_string(),
                address: "Marina Tortugas".to_string(),
            },
            boats: vec![Boat {
                name: " Toto Explorer ".to_string(),
                capacity: 18,
                status: String::new(),
                kind: String::new(),
            }],
            staff_count: 18,
            capacity_total: 54,
            schedules: vec![
                "09:30".to_string(),
                "07:00 ".to_string(),
                "09:30".to_string(),
                " ".to_string(),
            ],
            specialty: "reef snorkeling".to_string(),
        }
    }

    #[test]
    fn sanitize_trims_and_defaults() {
        let clean = draft().sanitized().unwrap();

        assert_eq!(clean.name, "Toto Tours");
        assert_eq!(clean.boats[0].name, "Toto Explorer");
        assert_eq!(clean.boats[0].status, DEFAULT_BOAT_STATUS);
        assert_eq!(clean.boats[0].kind, DEFAULT_BOAT_KIND);
        assert_eq!(clean.contact.phone, "+52 999 101 2020");
        assert_eq!(clean.schedules, vec!["07:00", "09:30"]);
    }

    #[test]
    fn sanitize_rejects_blank_name() {
        let mut d = draft();
        d.name = "   ".to_string();
        assert!(matches!(d.sanitized(), Err(StateError::Invalid(_))));
    }

    #[test]
    fn sanitize_rejects_fleet_of_unnamed_boats() {
        let mut d = draft();
        d.boats = vec![Boat {
            name: "  ".to_string(),
            capacity: 10,
            status: String::new(),
            kind: String::new(),
        }];
        assert!(matches!(d.sanitized(), Err(StateError::Invalid(_))));
    }

    #[test]
    fn role_round_trips_through_str() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!(Role::Seller.to_string(), "seller");
        assert!("captain".parse::<Role>().is_err());
    }
}
