//! Read-only projections over the record log.
//!
//! # Responsibility
//! - Aggregate records into per-member statistics for display and charts.
//! - Render the full log as a downloadable delimited text table.
//!
//! # Invariants
//! - Projections never mutate or reorder the stored log.

pub mod export;
pub mod stats;
