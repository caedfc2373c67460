//! Remote spreadsheet record store.
//!
//! # Responsibility
//! - Read and append rows through a spreadsheet values REST API
//!   (`/v4/spreadsheets/{id}/values/{range}`).
//! - Treat the first sheet row as the header, whatever its labels are.
//!
//! # Invariants
//! - Every append is one `values:append` call with `INSERT_ROWS`.
//! - Non-success responses become `RepoError::Persistence`; nothing retries.
//! - Hand-edited rows that do not decode are skipped with a warning, never
//!   surfaced as read failures.

use super::row::{check_required_fields, header_row, record_to_row, row_to_record};
use super::{log_store_event, RecordStore, RepoError, RepoResult, RECORD_COLUMNS};
use crate::config::SheetConfig;
use crate::model::record::AttendanceRecord;
use log::warn;
use reqwest::blocking::{Client, Response};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::time::Instant;

const BACKEND: &str = "sheet";

#[derive(Debug, Default, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

#[derive(Debug, Serialize)]
struct AppendBody<'a> {
    values: [&'a [String]; 1],
}

/// Record store backed by one worksheet of a remote spreadsheet.
pub struct SheetRecordStore {
    client: Client,
    values_url: Url,
    append_url: Url,
    token: String,
}

impl SheetRecordStore {
    /// Builds a client for the configured worksheet.
    ///
    /// # Errors
    /// - `Persistence` when `base_url` is not a valid absolute URL.
    /// - `Http` when the HTTP client cannot be constructed.
    pub fn new(config: &SheetConfig, token: impl Into<String>) -> RepoResult<Self> {
        let range = sheet_range(&config.sheet_name);
        let read_url = values_url(&config.base_url, &config.spreadsheet_id, &range, None)?;
        let append_url = values_url(
            &config.base_url,
            &config.spreadsheet_id,
            &range,
            Some("append"),
        )?;
        let client = Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            client,
            values_url: read_url,
            append_url,
            token: token.into(),
        })
    }

    fn fetch_rows(&self) -> RepoResult<Vec<Vec<String>>> {
        let response = self
            .client
            .get(self.values_url.clone())
            .bearer_auth(&self.token)
            .send()?;
        let body: ValueRange = check_status(response)?.json()?;
        Ok(body.values.iter().map(|row| cells_to_text(row)).collect())
    }

    fn append_row(&self, cells: &[String]) -> RepoResult<()> {
        let response = self
            .client
            .post(self.append_url.clone())
            .query(&[
                ("valueInputOption", "RAW"),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .bearer_auth(&self.token)
            .json(&AppendBody { values: [cells] })
            .send()?;
        check_status(response)?;
        Ok(())
    }
}

impl RecordStore for SheetRecordStore {
    fn backend_name(&self) -> &'static str {
        BACKEND
    }

    fn read_all(&self) -> RepoResult<Vec<AttendanceRecord>> {
        let started_at = Instant::now();
        let result = self.fetch_rows().map(|rows| decode_rows(&rows));
        log_store_event("store_read", BACKEND, started_at, &result);
        result
    }

    fn append(&self, record: &AttendanceRecord) -> RepoResult<()> {
        let started_at = Instant::now();
        let result = check_required_fields(record)
            .and_then(|()| self.ensure_header())
            .and_then(|()| self.append_row(&record_to_row(record)));
        log_store_event("store_append", BACKEND, started_at, &result);
        result
    }

    fn ensure_header(&self) -> RepoResult<()> {
        if self.fetch_rows()?.is_empty() {
            self.append_row(&header_row())?;
        }
        Ok(())
    }
}

/// Decodes sheet rows after the header row, skipping rows that do not decode.
fn decode_rows(rows: &[Vec<String>]) -> Vec<AttendanceRecord> {
    let mut records = Vec::with_capacity(rows.len().saturating_sub(1));
    for (index, cells) in rows.iter().enumerate().skip(1) {
        if cells.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        match row_to_record(cells) {
            Ok(record) => records.push(record),
            Err(err) => warn!(
                "event=store_read module=repo status=skip backend={BACKEND} row={} error={err}",
                index + 1
            ),
        }
    }
    records
}

fn cells_to_text(row: &[serde_json::Value]) -> Vec<String> {
    row.iter()
        .map(|cell| match cell {
            serde_json::Value::String(text) => text.clone(),
            serde_json::Value::Null => String::new(),
            other => other.to_string(),
        })
        .collect()
}

/// A1 range covering every persisted column of the worksheet.
fn sheet_range(sheet_name: &str) -> String {
    let last_column = char::from(b'A' + (RECORD_COLUMNS.len() as u8) - 1);
    format!("'{}'!A:{last_column}", sheet_name.replace('\'', "''"))
}

fn values_url(
    base_url: &str,
    spreadsheet_id: &str,
    range: &str,
    action: Option<&str>,
) -> RepoResult<Url> {
    let mut url = Url::parse(base_url)
        .map_err(|err| RepoError::Persistence(format!("invalid base_url `{base_url}`: {err}")))?;
    let last_segment = match action {
        Some(action) => format!("{range}:{action}"),
        None => range.to_string(),
    };
    url.path_segments_mut()
        .map_err(|()| RepoError::Persistence(format!("base_url `{base_url}` cannot be a base")))?
        .pop_if_empty()
        .extend(["v4", "spreadsheets", spreadsheet_id, "values", &last_segment]);
    Ok(url)
}

fn check_status(response: Response) -> RepoResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    let detail: String = body.chars().take(200).collect();
    Err(RepoError::Persistence(format!("HTTP {status}: {detail}")))
}
