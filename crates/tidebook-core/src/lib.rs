//! tidebook-core — the booking admission algorithm.
//!
//! Assigns a group-booking request to one of several capacity-limited tour
//! operators for the current calendar day:
//!
//! - Aggregate each operator's booked headcount for the day
//! - Filter operators with enough remaining capacity
//! - Pick the least-loaded operator under a deterministic total order
//! - Shape the immutable reservation record, attributed to the acting user
//!
//! Everything in this crate is a pure function over in-memory snapshots.
//! Reading those snapshots and persisting the resulting reservation belongs
//! to `tidebook-state`; `now` is always passed in explicitly so the whole
//! flow can be tested against fixed instants.

pub mod admission;
pub mod daykey;
pub mod eligibility;
pub mod load;
pub mod select;
pub mod types;

pub use admission::{
    AdmissionOutcome, AdmissionRequest, InvalidReason, admit, admit_with_loads,
    book_with_operator, normalize_group_size,
};
pub use daykey::DayKey;
pub use eligibility::eligible;
pub use load::daily_load;
pub use select::{OperatorStanding, arg_min_by, cmp_names, rank, select_operator, standings};
pub use types::*;
