//! Calendar-day bucketing.
//!
//! A [`DayKey`] is the start-of-local-day instant containing a given
//! timestamp, under a fixed UTC offset (the service's reference zone,
//! captured once at startup). Two reservations share a `DayKey` iff they
//! fall in the same calendar day: an instant belongs to day D exactly when
//! `start(D) <= t < start(D + 1)`.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Milliseconds in one calendar day (fixed offsets have no DST).
pub const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Start-of-local-day instant, stored as epoch milliseconds.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct DayKey(i64);

impl DayKey {
    /// Bucket an instant into the calendar day containing it.
    pub fn from_instant(instant: DateTime<Utc>, offset: FixedOffset) -> Self {
        let local_date = instant.with_timezone(&offset).date_naive();
        Self::from_date(local_date, offset)
    }

    /// The key for a calendar date in the reference zone.
    pub fn from_date(date: NaiveDate, offset: FixedOffset) -> Self {
        let midnight = date.and_time(NaiveTime::MIN);
        let millis =
            midnight.and_utc().timestamp_millis() - i64::from(offset.local_minus_utc()) * 1000;
        Self(millis)
    }

    /// Rehydrate a key persisted as epoch milliseconds.
    pub fn from_epoch_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Epoch milliseconds of the local midnight this key represents.
    pub fn epoch_millis(self) -> i64 {
        self.0
    }

    /// Whether the instant falls inside this day bucket.
    pub fn contains(self, instant: DateTime<Utc>) -> bool {
        let t = instant.timestamp_millis();
        t >= self.0 && t < self.0 + DAY_MS
    }

    /// The calendar date this key represents in the reference zone.
    /// `None` only for keys outside chrono's representable range.
    pub fn date(self, offset: FixedOffset) -> Option<NaiveDate> {
        DateTime::<Utc>::from_timestamp_millis(self.0)
            .map(|dt| dt.with_timezone(&offset).date_naive())
    }
}
