//! Attendance domain model.
//!
//! # Responsibility
//! - Define the canonical sign-in record and its uniqueness key.
//! - Define the fixed member roster used for input checks and statistics.
//!
//! # Invariants
//! - Records are immutable once accepted; the log only grows.
//! - Key comparison is exact on canonical text (case-sensitive).

pub mod record;
pub mod roster;
