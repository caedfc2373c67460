//! Record store abstraction and backend implementations.
//!
//! # Responsibility
//! - Define the append-only record log contract shared by all backends.
//! - Hide JSON file, SQLite and remote spreadsheet details from services.
//!
//! # Invariants
//! - `read_all` returns records in insertion order and never fails on an
//!   empty or uninitialized log.
//! - `append` is a single atomic row write; failures are returned, never
//!   swallowed.
//! - The column header is written at most once per log.

use crate::db::DbError;
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub mod json_store;
pub mod record_store;
pub mod row;
pub mod sheet_store;
pub mod sqlite_store;

pub use record_store::{open_store, RecordStore};

/// Persisted column order for every tabular backend.
pub const RECORD_COLUMNS: [&str; 5] = ["member_name", "date", "meal_slot", "prayer_mode", "notes"];

pub type RepoResult<T> = Result<T, RepoError>;

/// Store-boundary error for record log reads and writes.
#[derive(Debug)]
pub enum RepoError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Db(DbError),
    Http(reqwest::Error),
    /// Backend reachable but rejected the operation (status, auth, quota).
    Persistence(String),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "record log io failed: {err}"),
            Self::Json(err) => write!(f, "record log json is malformed: {err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Http(err) => write!(f, "record backend unreachable: {err}"),
            Self::Persistence(message) => write!(f, "record backend rejected request: {message}"),
            Self::InvalidData(message) => write!(f, "invalid persisted record data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Json(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Http(err) => Some(err),
            Self::Persistence(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<std::io::Error> for RepoError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for RepoError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<reqwest::Error> for RepoError {
    fn from(value: reqwest::Error) -> Self {
        Self::Http(value)
    }
}

/// Emits one `store_*` event with duration and outcome.
pub(crate) fn log_store_event<T>(
    event: &str,
    backend: &str,
    started_at: Instant,
    result: &RepoResult<T>,
) {
    let duration_ms = started_at.elapsed().as_millis();
    match result {
        Ok(_) => info!(
            "event={event} module=repo status=ok backend={backend} duration_ms={duration_ms}"
        ),
        Err(err) => error!(
            "event={event} module=repo status=error backend={backend} duration_ms={duration_ms} error={err}"
        ),
    }
}
