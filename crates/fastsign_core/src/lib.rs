//! Core domain logic for fastsign, a fasting and prayer group sign-in log.
//! This crate owns the duplicate-check rule and the record store contract.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod report;
pub mod service;

pub use config::{Config, ConfigError, LoggingConfig, SheetConfig, StoreBackend, StoreConfig};
pub use logging::{default_log_level, init_from_config, init_logging, logging_status, LoggingError};
pub use model::record::{AttendanceRecord, MealSlot, PrayerMode, RecordDate, RecordKey};
pub use model::roster::{MemberRoster, RosterError};
pub use repo::json_store::JsonFileRecordStore;
pub use repo::sheet_store::SheetRecordStore;
pub use repo::sqlite_store::SqliteRecordStore;
pub use repo::{open_store, RecordStore, RepoError, RepoResult, RECORD_COLUMNS};
pub use report::export::{render_csv, write_csv, EXPORT_FILE_NAME, UTF8_BOM};
pub use report::stats::{
    member_breakdown, member_totals, records_for_member, DailySlotCounts, MemberTotal,
};
pub use service::sign_in::{
    Decision, RejectReason, RosterStrictness, SignInCandidate, SignInOutcome, SignInPolicy,
    SignInService,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
