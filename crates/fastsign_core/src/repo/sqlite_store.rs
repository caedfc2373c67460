//! SQLite-backed record store.
//!
//! # Responsibility
//! - Keep the record log in the `attendance_records` table.
//! - Treat the migrated schema as the log "header".
//!
//! # Invariants
//! - Reads are ordered by the autoincrement `seq` column (insertion order).
//! - Read paths reject rows that violate the record shape.

use super::row::check_required_fields;
use super::{log_store_event, RecordStore, RepoError, RepoResult};
use crate::db::migrations::apply_migrations;
use crate::db::{open_db, open_db_in_memory};
use crate::model::record::{AttendanceRecord, MealSlot, PrayerMode, RecordDate};
use rusqlite::{params, Connection, Row};
use std::path::Path;
use std::time::Instant;

const BACKEND: &str = "sqlite";

const RECORD_SELECT_SQL: &str = "SELECT
    member_name,
    date,
    meal_slot,
    prayer_mode,
    notes
FROM attendance_records
ORDER BY seq ASC;";

/// Record store over a migrated SQLite connection.
pub struct SqliteRecordStore {
    conn: Connection,
}

impl SqliteRecordStore {
    /// Opens the database file at `path`, creating and migrating it.
    pub fn open(path: impl AsRef<Path>) -> RepoResult<Self> {
        Ok(Self {
            conn: open_db(path)?,
        })
    }

    pub fn open_in_memory() -> RepoResult<Self> {
        Ok(Self {
            conn: open_db_in_memory()?,
        })
    }

    /// Wraps an already opened connection, applying pending migrations.
    pub fn try_new(conn: Connection) -> RepoResult<Self> {
        apply_migrations(&conn)?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn select_all(&self) -> RepoResult<Vec<AttendanceRecord>> {
        let mut stmt = self.conn.prepare(RECORD_SELECT_SQL)?;
        let mut rows = stmt.query([])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_record_row(row)?);
        }
        Ok(records)
    }

    fn insert(&self, record: &AttendanceRecord) -> RepoResult<()> {
        check_required_fields(record)?;
        self.conn.execute(
            "INSERT INTO attendance_records (
                member_name,
                date,
                meal_slot,
                prayer_mode,
                notes
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                record.member_name.as_str(),
                record.date.canonical(),
                record.meal_slot.as_str(),
                record.prayer_mode.map(PrayerMode::as_str),
                record.notes.as_deref(),
            ],
        )?;
        Ok(())
    }
}

impl RecordStore for SqliteRecordStore {
    fn backend_name(&self) -> &'static str {
        BACKEND
    }

    fn read_all(&self) -> RepoResult<Vec<AttendanceRecord>> {
        let started_at = Instant::now();
        let result = self.select_all();
        log_store_event("store_read", BACKEND, started_at, &result);
        result
    }

    fn append(&self, record: &AttendanceRecord) -> RepoResult<()> {
        let started_at = Instant::now();
        let result = self.ensure_header().and_then(|()| self.insert(record));
        log_store_event("store_append", BACKEND, started_at, &result);
        result
    }

    fn ensure_header(&self) -> RepoResult<()> {
        apply_migrations(&self.conn)?;
        Ok(())
    }
}

fn parse_record_row(row: &Row<'_>) -> RepoResult<AttendanceRecord> {
    let date_text: String = row.get("date")?;
    let meal_text: String = row.get("meal_slot")?;

    let prayer_mode = match row.get::<_, Option<String>>("prayer_mode")? {
        Some(value) => Some(PrayerMode::parse(&value).ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid prayer mode `{value}` in attendance_records.prayer_mode"
            ))
        })?),
        None => None,
    };

    let record = AttendanceRecord {
        member_name: row.get("member_name")?,
        date: RecordDate::parse(&date_text),
        meal_slot: MealSlot::parse(&meal_text),
        prayer_mode,
        notes: row.get("notes")?,
    };
    check_required_fields(&record)?;
    Ok(record)
}
