//! StateStore — redb-backed persistence for Tidebook.
//!
//! Typed operations over operators, reservations, users, sessions, and
//! daily load counters. Values are JSON-serialized into redb's `&[u8]`
//! columns; counters are plain `u32` values. The store supports both
//! on-disk and in-memory backends (the latter for testing).
//!
//! Reservation appends bump the matching `{operator_id}:{day_key}`
//! counter in the same write transaction and re-check it against the
//! operator's capacity, so concurrent admissions serialize on redb's
//! single writer and cannot jointly overbook an operator.

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable};
use tracing::debug;

use tidebook_core::{DayKey, Operator, OperatorId, Reservation, cmp_names};

use crate::error::{StateError, StateResult};
use crate::tables::*;
use crate::types::*;

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

/// Thread-safe state store backed by redb.
#[derive(Clone)]
pub struct StateStore {
    db: Arc<Database>,
}

impl StateStore {
    /// Open (or create) a persistent state store at the given path.
    pub fn open(path: &Path) -> StateResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "state store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory state store (for testing).
    pub fn open_in_memory() -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory state store opened");
        Ok(store)
    }

    /// Create all tables if they don't exist yet.
    fn ensure_tables(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(OPERATORS).map_err(map_err!(Table))?;
        txn.open_table(RESERVATIONS).map_err(map_err!(Table))?;
        txn.open_table(USERS).map_err(map_err!(Table))?;
        txn.open_table(SESSIONS).map_err(map_err!(Table))?;
        txn.open_table(DAILY_LOADS).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    // ── Operators ──────────────────────────────────────────────────

    /// Create or update an operator from sanitized form data.
    ///
    /// Drafts with an id update the existing operator (its `created_at`
    /// is preserved); drafts without one are assigned the next free
    /// `op-{n}` id.
    pub fn save_operator(
        &self,
        draft: OperatorDraft,
        now: chrono::DateTime<chrono::Utc>,
    ) -> StateResult<OperatorId> {
        let draft = draft.sanitized()?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let id;
        {
            let mut table = txn.open_table(OPERATORS).map_err(map_err!(Table))?;

            let (operator_id, created_at) = match &draft.id {
                Some(existing_id) => {
                    let guard = table
                        .get(existing_id.as_str())
                        .map_err(map_err!(Read))?
                        .ok_or_else(|| {
                            StateError::NotFound(format!("operator {existing_id}"))
                        })?;
                    let existing: Operator =
                        serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                    (existing_id.clone(), existing.created_at)
                }
                None => (next_operator_id(&table)?, now),
            };

            let operator = Operator {
                id: operator_id.clone(),
                name: draft.name,
                contact: draft.contact,
                boats: draft.boats,
                staff_count: draft.staff_count,
                capacity_total: draft.capacity_total,
                schedules: draft.schedules,
                specialty: draft.specialty,
                created_at,
                updated_at: now,
            };

            let value = serde_json::to_vec(&operator).map_err(map_err!(Serialize))?;
            table
                .insert(operator_id.as_str(), value.as_slice())
                .map_err(map_err!(Write))?;
            id = operator_id;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%id, "operator stored");
        Ok(id)
    }

    /// Get an operator by id.
    pub fn get_operator(&self, id: &str) -> StateResult<Option<Operator>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(OPERATORS).map_err(map_err!(Table))?;
        match table.get(id).map_err(map_err!(Read))? {
            Some(guard) => {
                let operator: Operator =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(operator))
            }
            None => Ok(None),
        }
    }

    /// List all operators, sorted by name.
    pub fn list_operators(&self) -> StateResult<Vec<Operator>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(OPERATORS).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (_, value) = entry.map_err(map_err!(Read))?;
            let operator: Operator =
                serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            results.push(operator);
        }
        results.sort_by(|a, b| cmp_names(&a.name, &b.name));
        Ok(results)
    }

    /// Delete an operator along with its reservations and load counters.
    /// Returns true if the operator existed.
    pub fn delete_operator(&self, id: &str) -> StateResult<bool> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let existed;
        {
            let mut operators = txn.open_table(OPERATORS).map_err(map_err!(Table))?;
            existed = operators.remove(id).map_err(map_err!(Write))?.is_some();

            let mut reservations = txn.open_table(RESERVATIONS).map_err(map_err!(Table))?;
            let doomed: Vec<String> = {
                let mut keys = Vec::new();
                for entry in reservations.iter().map_err(map_err!(Read))? {
                    let (key, value) = entry.map_err(map_err!(Read))?;
                    let reservation: Reservation =
                        serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
                    if reservation.operator_id == id {
                        keys.push(key.value().to_string());
                    }
                }
                keys
            };
            for key in &doomed {
                reservations.remove(key.as_str()).map_err(map_err!(Write))?;
            }

            let mut loads = txn.open_table(DAILY_LOADS).map_err(map_err!(Table))?;
            let prefix = format!("{id}:");
            let stale: Vec<String> = {
                let mut keys = Vec::new();
                for entry in loads.iter().map_err(map_err!(Read))? {
                    let (key, _) = entry.map_err(map_err!(Read))?;
                    if key.value().starts_with(&prefix) {
                        keys.push(key.value().to_string());
                    }
                }
                keys
            };
            for key in &stale {
                loads.remove(key.as_str()).map_err(map_err!(Write))?;
            }

            debug!(%id, reservations_removed = doomed.len(), "operator deleted");
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(existed)
    }

    // ── Reservations & load counters ───────────────────────────────

    /// Append a reservation and bump its day counter atomically.
    ///
    /// The counter is re-checked against the operator's capacity inside
    /// the transaction; a request that raced past the admission decision
    /// fails with [`StateError::CapacityExceeded`] instead of overbooking.
    /// Returns the generated reservation id (`{day_key}:{seq}`).
    pub fn record_reservation(&self, reservation: &Reservation) -> StateResult<String> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let id;
        {
            let operators = txn.open_table(OPERATORS).map_err(map_err!(Table))?;
            let operator: Operator = match operators
                .get(reservation.operator_id.as_str())
                .map_err(map_err!(Read))?
            {
                Some(guard) => {
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?
                }
                None => {
                    return Err(StateError::NotFound(format!(
                        "operator {}",
                        reservation.operator_id
                    )));
                }
            };

            let mut loads = txn.open_table(DAILY_LOADS).map_err(map_err!(Table))?;
            let counter_key = load_key(&reservation.operator_id, reservation.day_key);
            let booked = loads
                .get(counter_key.as_str())
                .map_err(map_err!(Read))?
                .map(|guard| guard.value())
                .unwrap_or(0);

            let after = booked.saturating_add(reservation.group_size);
            if after > operator.capacity_total {
                return Err(StateError::CapacityExceeded(format!(
                    "operator {} has {} of {} seats booked, cannot take {} more",
                    operator.id, booked, operator.capacity_total, reservation.group_size
                )));
            }

            let mut reservations = txn.open_table(RESERVATIONS).map_err(map_err!(Table))?;
            let seq = next_reservation_seq(&reservations, reservation.day_key)?;
            let key = format!("{}:{seq:06}", reservation.day_key.epoch_millis());
            let value = serde_json::to_vec(reservation).map_err(map_err!(Serialize))?;
            reservations
                .insert(key.as_str(), value.as_slice())
                .map_err(map_err!(Write))?;

            loads
                .insert(counter_key.as_str(), after)
                .map_err(map_err!(Write))?;

            debug!(
                %key,
                operator = %reservation.operator_id,
                group_size = reservation.group_size,
                booked = after,
                "reservation recorded"
            );
            id = key;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(id)
    }

    /// List a day's reservations in admission order, with their ids.
    pub fn reservations_for_day(
        &self,
        day_key: DayKey,
    ) -> StateResult<Vec<(String, Reservation)>> {
        let prefix = format!("{}:", day_key.epoch_millis());
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(RESERVATIONS).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (key, value) = entry.map_err(map_err!(Read))?;
            if key.value().starts_with(&prefix) {
                let reservation: Reservation =
                    serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
                results.push((key.value().to_string(), reservation));
            }
        }
        Ok(results)
    }

    /// One operator's booked headcount for a day, from the counter table.
    pub fn load_for_day(&self, operator_id: &str, day_key: DayKey) -> StateResult<u32> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(DAILY_LOADS).map_err(map_err!(Table))?;
        let key = load_key(operator_id, day_key);
        Ok(table
            .get(key.as_str())
            .map_err(map_err!(Read))?
            .map(|guard| guard.value())
            .unwrap_or(0))
    }

    /// Load map for a set of operators on one day, zero-seeded like the
    /// core aggregator.
    pub fn loads_for_day(
        &self,
        operators: &[Operator],
        day_key: DayKey,
    ) -> StateResult<std::collections::HashMap<OperatorId, u32>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(DAILY_LOADS).map_err(map_err!(Table))?;
        let mut loads = std::collections::HashMap::new();
        for operator in operators {
            let key = load_key(&operator.id, day_key);
            let booked = table
                .get(key.as_str())
                .map_err(map_err!(Read))?
                .map(|guard| guard.value())
                .unwrap_or(0);
            loads.insert(operator.id.clone(), booked);
        }
        Ok(loads)
    }

    /// Recompute a day's counters from the reservation table, replacing
    /// whatever is there. Returns the number of counters written.
    pub fn rebuild_loads_for_day(&self, day_key: DayKey) -> StateResult<u32> {
        let reservations = self.reservations_for_day(day_key)?;
        let mut sums: std::collections::HashMap<OperatorId, u32> =
            std::collections::HashMap::new();
        for (_, reservation) in &reservations {
            let total = sums.entry(reservation.operator_id.clone()).or_insert(0);
            *total = total.saturating_add(reservation.group_size);
        }

        let suffix = format!(":{}", day_key.epoch_millis());
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let written;
        {
            let mut loads = txn.open_table(DAILY_LOADS).map_err(map_err!(Table))?;
            let stale: Vec<String> = {
                let mut keys = Vec::new();
                for entry in loads.iter().map_err(map_err!(Read))? {
                    let (key, _) = entry.map_err(map_err!(Read))?;
                    if key.value().ends_with(&suffix) {
                        keys.push(key.value().to_string());
                    }
                }
                keys
            };
            for key in &stale {
                loads.remove(key.as_str()).map_err(map_err!(Write))?;
            }
            for (operator_id, total) in &sums {
                let key = load_key(operator_id, day_key);
                loads
                    .insert(key.as_str(), *total)
                    .map_err(map_err!(Write))?;
            }
            written = sums.len() as u32;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(day_key = day_key.epoch_millis(), written, "load counters rebuilt");
        Ok(written)
    }

    // ── Users ──────────────────────────────────────────────────────

    /// Insert or update a user, keyed by its normalized email.
    pub fn put_user(&self, user: &User) -> StateResult<()> {
        let value = serde_json::to_vec(user).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(USERS).map_err(map_err!(Table))?;
            table
                .insert(user.email.as_str(), value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    /// Get a user by normalized email.
    pub fn get_user(&self, email: &str) -> StateResult<Option<User>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(USERS).map_err(map_err!(Table))?;
        match table.get(email).map_err(map_err!(Read))? {
            Some(guard) => {
                let user: User =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(user))
            }
            None => Ok(None),
        }
    }

    /// Change a user's role.
    pub fn set_role(
        &self,
        email: &str,
        role: Role,
        now: chrono::DateTime<chrono::Utc>,
    ) -> StateResult<()> {
        let mut user = self
            .get_user(email)?
            .ok_or_else(|| StateError::NotFound(format!("user {email}")))?;
        user.role = role;
        user.updated_at = now;
        self.put_user(&user)?;
        debug!(%email, %role, "role updated");
        Ok(())
    }

    // ── Sessions ───────────────────────────────────────────────────

    /// Insert a session, keyed by its token.
    pub fn put_session(&self, session: &Session) -> StateResult<()> {
        let value = serde_json::to_vec(session).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(SESSIONS).map_err(map_err!(Table))?;
            table
                .insert(session.token.as_str(), value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    /// Get a session by token.
    pub fn get_session(&self, token: &str) -> StateResult<Option<Session>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(SESSIONS).map_err(map_err!(Table))?;
        match table.get(token).map_err(map_err!(Read))? {
            Some(guard) => {
                let session: Session =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(session))
            }
            None => Ok(None),
        }
    }

    /// Delete a session by token. Returns true if it existed.
    pub fn delete_session(&self, token: &str) -> StateResult<bool> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let existed;
        {
            let mut table = txn.open_table(SESSIONS).map_err(map_err!(Table))?;
            existed = table.remove(token).map_err(map_err!(Write))?.is_some();
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(existed)
    }

    /// Drop a user's expired sessions. Returns the number removed.
    pub fn delete_expired_sessions_for_user(
        &self,
        email: &str,
        now: chrono::DateTime<chrono::Utc>,
    ) -> StateResult<u32> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let removed;
        {
            let mut table = txn.open_table(SESSIONS).map_err(map_err!(Table))?;
            let doomed: Vec<String> = {
                let mut keys = Vec::new();
                for entry in table.iter().map_err(map_err!(Read))? {
                    let (key, value) = entry.map_err(map_err!(Read))?;
                    let session: Session =
                        serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
                    if session.user_email == email && session.expires_at <= now {
                        keys.push(key.value().to_string());
                    }
                }
                keys
            };
            for key in &doomed {
                table.remove(key.as_str()).map_err(map_err!(Write))?;
            }
            removed = doomed.len() as u32;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(removed)
    }
}

/// Counter key for one operator's booked headcount on one day.
fn load_key(operator_id: &str, day_key: DayKey) -> String {
    format!("{operator_id}:{}", day_key.epoch_millis())
}

/// Next free `op-{n}` id. Deleted ids are never reused.
fn next_operator_id(table: &impl ReadableTable<&'static str, &'static [u8]>) -> StateResult<OperatorId> {
    let mut max_seq = 0u64;
    for entry in table.iter().map_err(map_err!(Read))? {
        let (key, _) = entry.map_err(map_err!(Read))?;
        if let Some(seq) = key
            .value()
            .strip_prefix("op-")
            .and_then(|s| s.parse::<u64>().ok())
        {
            max_seq = max_seq.max(seq);
        }
    }
    Ok(format!("op-{}", max_seq + 1))
}

/// Next sequence number within a day's reservation keys. Uses max + 1 so
/// cascade deletes never cause key reuse.
fn next_reservation_seq(
    table: &impl ReadableTable<&'static str, &'static [u8]>,
    day_key: DayKey,
) -> StateResult<u64> {
    let prefix = format!("{}:", day_key.epoch_millis());
    let mut max_seq = 0u64;
    for entry in table.iter().map_err(map_err!(Read))? {
        let (key, _) = entry.map_err(map_err!(Read))?;
        if let Some(seq) = key
            .value()
            .strip_prefix(&prefix)
            .and_then(|s| s.parse::<u64>().ok())
        {
            max_seq = max_seq.max(seq);
        }
    }
    Ok(max_seq + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, FixedOffset, Utc};
    use tidebook_core::{Boat, Contact, daily_load};

    fn store() -> StateStore {
        StateStore::open_in_memory().unwrap()
    }

    fn now() -> DateTime<Utc> {
        "2024-03-10T15:00:00Z".parse().unwrap()
    }

    fn offset() -> FixedOffset {
        FixedOffset::west_opt(5 * 3600).unwrap()
    }

    fn draft(name: &str, capacity: u32) -> OperatorDraft {
        OperatorDraft {
            id: None,
            name: name.to_string(),
            contact: Contact::default(),
            boats: vec![Boat {
                name: format!("{name} One"),
                capacity,
                status: String::new(),
                kind: String::new(),
            }],
            staff_count: 6,
            capacity_total: capacity,
            schedules: vec!["09:00".to_string()],
            specialty: "reef".to_string(),
        }
    }

    fn reservation(operator_id: &str, group_size: u32) -> Reservation {
        Reservation {
            operator_id: operator_id.to_string(),
            group_size,
            kind: "direct".to_string(),
            departure: None,
            timestamp: now(),
            day_key: DayKey::from_instant(now(), offset()),
            created_by: None,
        }
    }

    #[test]
    fn operator_crud_round_trip() {
        let store = store();
        let id = store.save_operator(draft("Toto Tours", 54), now()).unwrap();

        let operator = store.get_operator(&id).unwrap().unwrap();
        assert_eq!(operator.name, "Toto Tours");
        assert_eq!(operator.capacity_total, 54);

        assert!(store.delete_operator(&id).unwrap());
        assert!(store.get_operator(&id).unwrap().is_none());
        assert!(!store.delete_operator(&id).unwrap());
    }

    #[test]
    fn update_preserves_created_at() {
        let store = store();
        let id = store.save_operator(draft("Paco Tours", 60), now()).unwrap();
        let created = store.get_operator(&id).unwrap().unwrap().created_at;

        let later: DateTime<Utc> = "2024-03-11T09:00:00Z".parse().unwrap();
        let mut update = draft("Paco Tours", 66);
        update.id = Some(id.clone());
        store.save_operator(update, later).unwrap();

        let operator = store.get_operator(&id).unwrap().unwrap();
        assert_eq!(operator.capacity_total, 66);
        assert_eq!(operator.created_at, created);
        assert_eq!(operator.updated_at, later);
    }

    #[test]
    fn update_of_missing_operator_fails() {
        let store = store();
        let mut update = draft("Ghost", 10);
        update.id = Some("op-99".to_string());

        assert!(matches!(
            store.save_operator(update, now()),
            Err(StateError::NotFound(_))
        ));
    }

    #[test]
    fn list_is_sorted_by_name() {
        let store = store();
        store.save_operator(draft("Paco Tours", 60), now()).unwrap();
        store.save_operator(draft("atlantis", 30), now()).unwrap();
        store.save_operator(draft("Toto Tours", 54), now()).unwrap();

        let names: Vec<String> = store
            .list_operators()
            .unwrap()
            .into_iter()
            .map(|op| op.name)
            .collect();
        assert_eq!(names, vec!["atlantis", "Paco Tours", "Toto Tours"]);
    }

    #[test]
    fn deleted_operator_ids_are_not_reused() {
        let store = store();
        let first = store.save_operator(draft("A", 10), now()).unwrap();
        let second = store.save_operator(draft("B", 10), now()).unwrap();
        store.delete_operator(&second).unwrap();

        let third = store.save_operator(draft("C", 10), now()).unwrap();
        assert_ne!(third, second);
        assert_ne!(third, first);
    }

    #[test]
    fn record_updates_counter_and_lists() {
        let store = store();
        let id = store.save_operator(draft("Toto Tours", 54), now()).unwrap();
        let day = DayKey::from_instant(now(), offset());

        let rid = store.record_reservation(&reservation(&id, 4)).unwrap();
        store.record_reservation(&reservation(&id, 3)).unwrap();

        assert_eq!(store.load_for_day(&id, day).unwrap(), 7);
        let listed = store.reservations_for_day(day).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].0, rid);
        assert_eq!(listed[0].1.group_size, 4);
    }

    #[test]
    fn record_rejects_unknown_operator() {
        let store = store();
        assert!(matches!(
            store.record_reservation(&reservation("op-404", 4)),
            Err(StateError::NotFound(_))
        ));
    }

    #[test]
    fn counter_recheck_blocks_overbooking() {
        let store = store();
        let id = store.save_operator(draft("Tiny", 10), now()).unwrap();

        store.record_reservation(&reservation(&id, 8)).unwrap();
        let result = store.record_reservation(&reservation(&id, 3));

        assert!(matches!(result, Err(StateError::CapacityExceeded(_))));
        // The failed write left nothing behind.
        let day = DayKey::from_instant(now(), offset());
        assert_eq!(store.load_for_day(&id, day).unwrap(), 8);
        assert_eq!(store.reservations_for_day(day).unwrap().len(), 1);

        // An exact fit still goes through.
        store.record_reservation(&reservation(&id, 2)).unwrap();
        assert_eq!(store.load_for_day(&id, day).unwrap(), 10);
    }

    #[test]
    fn counters_agree_with_core_aggregation() {
        let store = store();
        let a = store.save_operator(draft("A", 40), now()).unwrap();
        let b = store.save_operator(draft("B", 40), now()).unwrap();
        let day = DayKey::from_instant(now(), offset());

        store.record_reservation(&reservation(&a, 4)).unwrap();
        store.record_reservation(&reservation(&b, 6)).unwrap();
        store.record_reservation(&reservation(&a, 2)).unwrap();

        let operators = store.list_operators().unwrap();
        let from_counters = store.loads_for_day(&operators, day).unwrap();
        let snapshot: Vec<Reservation> = store
            .reservations_for_day(day)
            .unwrap()
            .into_iter()
            .map(|(_, r)| r)
            .collect();
        let from_scan = daily_load(&operators, &snapshot, day);

        assert_eq!(from_counters, from_scan);
    }

    #[test]
    fn rebuild_restores_counters() {
        let store = store();
        let id = store.save_operator(draft("A", 40), now()).unwrap();
        let day = DayKey::from_instant(now(), offset());

        store.record_reservation(&reservation(&id, 4)).unwrap();
        store.record_reservation(&reservation(&id, 5)).unwrap();

        let written = store.rebuild_loads_for_day(day).unwrap();
        assert_eq!(written, 1);
        assert_eq!(store.load_for_day(&id, day).unwrap(), 9);
    }

    #[test]
    fn delete_operator_cascades() {
        let store = store();
        let a = store.save_operator(draft("A", 40), now()).unwrap();
        let b = store.save_operator(draft("B", 40), now()).unwrap();
        let day = DayKey::from_instant(now(), offset());

        store.record_reservation(&reservation(&a, 4)).unwrap();
        store.record_reservation(&reservation(&b, 6)).unwrap();

        store.delete_operator(&a).unwrap();

        assert_eq!(store.load_for_day(&a, day).unwrap(), 0);
        let remaining = store.reservations_for_day(day).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].1.operator_id, b);
    }

    #[test]
    fn day_buckets_are_isolated() {
        let store = store();
        let id = store.save_operator(draft("A", 40), now()).unwrap();

        let mut late = reservation(&id, 5);
        late.timestamp = "2024-03-11T04:59:00Z".parse().unwrap(); // 23:59 local, day D
        late.day_key = DayKey::from_instant(late.timestamp, offset());
        let mut early = reservation(&id, 9);
        early.timestamp = "2024-03-11T05:01:00Z".parse().unwrap(); // 00:01 local, day D+1
        early.day_key = DayKey::from_instant(early.timestamp, offset());

        store.record_reservation(&late).unwrap();
        store.record_reservation(&early).unwrap();

        assert_eq!(store.load_for_day(&id, late.day_key).unwrap(), 5);
        assert_eq!(store.load_for_day(&id, early.day_key).unwrap(), 9);
    }

    #[test]
    fn user_and_session_round_trip() {
        let store = store();
        let user = User {
            email: "sales@tidebook.example".to_string(),
            password_hash: "salt:digest".to_string(),
            role: Role::Seller,
            created_at: now(),
            updated_at: now(),
        };
        store.put_user(&user).unwrap();
        assert_eq!(store.get_user(&user.email).unwrap(), Some(user.clone()));

        store.set_role(&user.email, Role::Admin, now()).unwrap();
        assert_eq!(store.get_user(&user.email).unwrap().unwrap().role, Role::Admin);

        let session = Session {
            token: "tok-1".to_string(),
            user_email: user.email.clone(),
            created_at: now(),
            expires_at: now() + chrono::Duration::days(7),
        };
        store.put_session(&session).unwrap();
        assert!(store.get_session("tok-1").unwrap().is_some());
        assert!(store.delete_session("tok-1").unwrap());
        assert!(store.get_session("tok-1").unwrap().is_none());
    }

    #[test]
    fn expired_session_cleanup_is_per_user() {
        let store = store();
        let expired = Session {
            token: "tok-old".to_string(),
            user_email: "a@tidebook.example".to_string(),
            created_at: now() - chrono::Duration::days(10),
            expires_at: now() - chrono::Duration::days(3),
        };
        let live = Session {
            token: "tok-live".to_string(),
            user_email: "a@tidebook.example".to_string(),
            created_at: now(),
            expires_at: now() + chrono::Duration::days(7),
        };
        let other = Session {
            token: "tok-other".to_string(),
            user_email: "b@tidebook.example".to_string(),
            created_at: now() - chrono::Duration::days(10),
            expires_at: now() - chrono::Duration::days(3),
        };
        store.put_session(&expired).unwrap();
        store.put_session(&live).unwrap();
        store.put_session(&other).unwrap();

        let removed = store
            .delete_expired_sessions_for_user("a@tidebook.example", now())
            .unwrap();

        assert_eq!(removed, 1);
        assert!(store.get_session("tok-old").unwrap().is_none());
        assert!(store.get_session("tok-live").unwrap().is_some());
        assert!(store.get_session("tok-other").unwrap().is_some());
    }

    #[test]
    fn persistent_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tidebook.redb");

        let id = {
            let store = StateStore::open(&path).unwrap();
            store.save_operator(draft("Toto Tours", 54), now()).unwrap()
        };

        let store = StateStore::open(&path).unwrap();
        let operator = store.get_operator(&id).unwrap().unwrap();
        assert_eq!(operator.name, "Toto Tours");
    }
}
