pub mod admit;
pub mod operators;
pub mod report;
pub mod simulate;
pub mod users;
