//! Local JSON file record store.
//!
//! # Responsibility
//! - Persist the record log as one JSON document on local disk.
//! - Upgrade header-less legacy files (a bare record array) on first write.
//!
//! # Invariants
//! - A missing or blank file reads as an empty log.
//! - Writes go through a sibling temp file and an atomic rename, so a failed
//!   append leaves the previous log untouched.
//! - Stored `columns` must equal `RECORD_COLUMNS`.
//! - Read-modify-write cycles hold an exclusive lock on a sidecar
//!   `<file>.lock`, so concurrent appends from threads or processes never
//!   drop each other's rows.

use super::row::check_required_fields;
use super::{log_store_event, RecordStore, RepoError, RepoResult, RECORD_COLUMNS};
use crate::model::record::AttendanceRecord;
use fd_lock::RwLock;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tempfile::NamedTempFile;

const BACKEND: &str = "json";

#[derive(Debug, Serialize, Deserialize)]
struct JsonLog {
    columns: Vec<String>,
    rows: Vec<AttendanceRecord>,
}

impl JsonLog {
    fn empty() -> Self {
        Self {
            columns: RECORD_COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JsonLogFile {
    Document(JsonLog),
    Bare(Vec<AttendanceRecord>),
}

/// Loaded file state.
enum Loaded {
    Missing,
    Headerless(Vec<AttendanceRecord>),
    Ready(JsonLog),
}

impl Loaded {
    /// The log to write back, upgrading header-less files.
    fn into_log(self) -> JsonLog {
        match self {
            Loaded::Missing => JsonLog::empty(),
            Loaded::Headerless(rows) => JsonLog {
                rows,
                ..JsonLog::empty()
            },
            Loaded::Ready(log) => log,
        }
    }
}

/// Record store backed by a local JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileRecordStore {
    path: PathBuf,
}

impl JsonFileRecordStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> RepoResult<Loaded> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Loaded::Missing),
            Err(err) => return Err(err.into()),
        };
        if text.trim().is_empty() {
            return Ok(Loaded::Missing);
        }

        let loaded = match serde_json::from_str::<JsonLogFile>(&text)? {
            JsonLogFile::Document(log) => {
                if log.columns != RECORD_COLUMNS {
                    return Err(RepoError::InvalidData(format!(
                        "unexpected columns {:?} in `{}`",
                        log.columns,
                        self.path.display()
                    )));
                }
                Loaded::Ready(log)
            }
            JsonLogFile::Bare(rows) => Loaded::Headerless(rows),
        };

        let rows: &[AttendanceRecord] = match &loaded {
            Loaded::Ready(log) => &log.rows,
            Loaded::Headerless(rows) => rows,
            Loaded::Missing => &[],
        };
        for record in rows {
            check_required_fields(record)?;
        }
        Ok(loaded)
    }

    fn parent_dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    /// Opens the sidecar lock file guarding read-modify-write cycles.
    fn write_lock(&self) -> RepoResult<RwLock<File>> {
        std::fs::create_dir_all(self.parent_dir())?;
        let mut lock_path = OsString::from(self.path.as_os_str());
        lock_path.push(".lock");
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(PathBuf::from(lock_path))?;
        Ok(RwLock::new(file))
    }

    /// Loads the file and writes back whatever `update` returns, holding the
    /// exclusive sidecar lock for the whole cycle.
    fn locked_update(&self, update: impl FnOnce(Loaded) -> Option<JsonLog>) -> RepoResult<()> {
        let mut lock = self.write_lock()?;
        let _guard = lock.write()?;
        match update(self.load()?) {
            Some(log) => self.write(&log),
            None => Ok(()),
        }
    }

    fn write(&self, log: &JsonLog) -> RepoResult<()> {
        let parent = self.parent_dir();
        std::fs::create_dir_all(&parent)?;

        let mut temp = NamedTempFile::new_in(&parent)?;
        serde_json::to_writer_pretty(&mut temp, log)?;
        temp.write_all(b"\n")?;
        temp.as_file().sync_all()?;
        temp.persist(&self.path).map_err(|err| RepoError::Io(err.error))?;
        Ok(())
    }
}

impl RecordStore for JsonFileRecordStore {
    fn backend_name(&self) -> &'static str {
        BACKEND
    }

    fn read_all(&self) -> RepoResult<Vec<AttendanceRecord>> {
        let started_at = Instant::now();
        let result = self.load().map(|loaded| match loaded {
            Loaded::Missing => Vec::new(),
            Loaded::Headerless(rows) => rows,
            Loaded::Ready(log) => log.rows,
        });
        log_store_event("store_read", BACKEND, started_at, &result);
        result
    }

    fn append(&self, record: &AttendanceRecord) -> RepoResult<()> {
        let started_at = Instant::now();
        let result = check_required_fields(record).and_then(|()| {
            self.locked_update(|loaded| {
                let mut log = loaded.into_log();
                log.rows.push(record.clone());
                Some(log)
            })
        });
        log_store_event("store_append", BACKEND, started_at, &result);
        result
    }

    fn ensure_header(&self) -> RepoResult<()> {
        if let Loaded::Ready(_) = self.load()? {
            return Ok(());
        }
        self.locked_update(|loaded| match loaded {
            Loaded::Ready(_) => None,
            other => Some(other.into_log()),
        })
    }
}
