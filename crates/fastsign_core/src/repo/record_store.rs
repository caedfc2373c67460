//! Record store capability trait and startup backend selection.

use super::json_store::JsonFileRecordStore;
use super::sheet_store::SheetRecordStore;
use super::sqlite_store::SqliteRecordStore;
use super::{RepoError, RepoResult};
use crate::config::{StoreBackend, StoreConfig};
use crate::model::record::AttendanceRecord;

/// Append-only attendance log.
pub trait RecordStore {
    /// Short backend label used in diagnostics.
    fn backend_name(&self) -> &'static str;

    /// Returns every record in insertion order.
    fn read_all(&self) -> RepoResult<Vec<AttendanceRecord>>;

    /// Durably writes one record at the end of the log.
    fn append(&self, record: &AttendanceRecord) -> RepoResult<()>;

    /// Writes the column header when the log has none. Idempotent.
    fn ensure_header(&self) -> RepoResult<()>;
}

impl<S: RecordStore + ?Sized> RecordStore for Box<S> {
    fn backend_name(&self) -> &'static str {
        (**self).backend_name()
    }

    fn read_all(&self) -> RepoResult<Vec<AttendanceRecord>> {
        (**self).read_all()
    }

    fn append(&self, record: &AttendanceRecord) -> RepoResult<()> {
        (**self).append(record)
    }

    fn ensure_header(&self) -> RepoResult<()> {
        (**self).ensure_header()
    }
}

impl<S: RecordStore + ?Sized> RecordStore for &S {
    fn backend_name(&self) -> &'static str {
        (**self).backend_name()
    }

    fn read_all(&self) -> RepoResult<Vec<AttendanceRecord>> {
        (**self).read_all()
    }

    fn append(&self, record: &AttendanceRecord) -> RepoResult<()> {
        (**self).append(record)
    }

    fn ensure_header(&self) -> RepoResult<()> {
        (**self).ensure_header()
    }
}

/// Opens the backend selected by configuration.
///
/// # Errors
/// - Returns backend open failures (file, database, missing access token).
pub fn open_store(config: &StoreConfig) -> RepoResult<Box<dyn RecordStore>> {
    match config.backend {
        StoreBackend::Json => Ok(Box::new(JsonFileRecordStore::new(&config.path))),
        StoreBackend::Sqlite => Ok(Box::new(SqliteRecordStore::open(&config.path)?)),
        StoreBackend::Sheet => {
            let sheet = config.sheet.as_ref().ok_or_else(|| {
                RepoError::Persistence("sheet backend selected without [store.sheet]".to_string())
            })?;
            let token = std::env::var(&sheet.token_env).map_err(|_| {
                RepoError::Persistence(format!(
                    "missing access token: env `{}` is not set",
                    sheet.token_env
                ))
            })?;
            Ok(Box::new(SheetRecordStore::new(sheet, token)?))
        }
    }
}
