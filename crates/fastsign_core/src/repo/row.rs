//! Positional row codec shared by tabular backends.
//!
//! Cells follow `RECORD_COLUMNS`. Trailing optional cells may be missing
//! entirely; empty optional cells decode to `None`.

use super::{RepoError, RepoResult, RECORD_COLUMNS};
use crate::model::record::{AttendanceRecord, MealSlot, PrayerMode, RecordDate};

/// Header row as owned cells.
pub fn header_row() -> Vec<String> {
    RECORD_COLUMNS.iter().map(|column| column.to_string()).collect()
}

/// Encodes a record into positional cells.
pub fn record_to_row(record: &AttendanceRecord) -> Vec<String> {
    vec![
        record.member_name.clone(),
        record.date.canonical(),
        record.meal_slot.as_str().to_string(),
        record
            .prayer_mode
            .map(|mode| mode.as_str().to_string())
            .unwrap_or_default(),
        record.notes.clone().unwrap_or_default(),
    ]
}

/// Decodes positional cells into a record.
///
/// # Errors
/// - `InvalidData` when a required cell is missing or blank.
/// - `InvalidData` when the prayer mode cell holds an unknown value.
pub fn row_to_record(cells: &[String]) -> RepoResult<AttendanceRecord> {
    let member_name = required_cell(cells, 0)?;
    let date = required_cell(cells, 1)?;
    let meal_slot = required_cell(cells, 2)?;

    let prayer_mode = match optional_cell(cells, 3) {
        Some(value) => Some(PrayerMode::parse(value).ok_or_else(|| {
            RepoError::InvalidData(format!("invalid prayer_mode value `{value}`"))
        })?),
        None => None,
    };

    Ok(AttendanceRecord {
        member_name: member_name.to_string(),
        date: RecordDate::parse(date),
        meal_slot: MealSlot::parse(meal_slot),
        prayer_mode,
        notes: optional_cell(cells, 4).map(str::to_string),
    })
}

/// Rejects records whose required fields are blank.
pub fn check_required_fields(record: &AttendanceRecord) -> RepoResult<()> {
    if record.member_name.trim().is_empty() {
        return Err(RepoError::InvalidData("member_name is blank".to_string()));
    }
    if record.date.is_empty() {
        return Err(RepoError::InvalidData("date is blank".to_string()));
    }
    if record.meal_slot.is_empty() {
        return Err(RepoError::InvalidData("meal_slot is blank".to_string()));
    }
    Ok(())
}

fn required_cell(cells: &[String], index: usize) -> RepoResult<&str> {
    match cells.get(index).map(|cell| cell.trim()) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(RepoError::InvalidData(format!(
            "missing required column `{}`",
            RECORD_COLUMNS[index]
        ))),
    }
}

fn optional_cell(cells: &[String], index: usize) -> Option<&str> {
    cells
        .get(index)
        .map(|cell| cell.trim())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::{header_row, record_to_row, row_to_record};
    use crate::model::record::{AttendanceRecord, MealSlot, PrayerMode, RecordDate};
    use crate::repo::RepoError;
    use chrono::NaiveDate;

    fn cells(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn short_rows_decode_with_absent_optional_columns() {
        let record = row_to_record(&cells(&["Alice", "2025/6/9", "breakfast"])).unwrap();
        assert_eq!(record.member_name, "Alice");
        assert_eq!(record.date.canonical(), "2025-06-09");
        assert_eq!(record.meal_slot, MealSlot::Breakfast);
        assert!(record.prayer_mode.is_none());
        assert!(record.notes.is_none());
    }

    #[test]
    fn encoded_row_keeps_column_order_and_blank_optionals() {
        let record = AttendanceRecord::new(
            "Bob",
            NaiveDate::from_ymd_opt(2025, 6, 9).unwrap(),
            MealSlot::Other("snack".to_string()),
        )
        .with_prayer_mode(PrayerMode::SelfLed);

        assert_eq!(
            record_to_row(&record),
            cells(&["Bob", "2025-06-09", "snack", "self", ""])
        );
        assert_eq!(header_row().len(), record_to_row(&record).len());
    }

    #[test]
    fn unparsable_dates_survive_as_raw_text() {
        let record = row_to_record(&cells(&["Alice", "June 9th", "lunch", "", "note"])).unwrap();
        assert_eq!(record.date, RecordDate::Raw("June 9th".to_string()));
        assert_eq!(record.notes.as_deref(), Some("note"));
    }

    #[test]
    fn blank_required_cells_and_unknown_modes_are_invalid() {
        let err = row_to_record(&cells(&["Alice", " ", "lunch"])).unwrap_err();
        assert!(matches!(err, RepoError::InvalidData(message) if message.contains("date")));

        let err = row_to_record(&cells(&["Alice", "2025-06-09", "lunch", "radio"])).unwrap_err();
        assert!(matches!(err, RepoError::InvalidData(message) if message.contains("prayer_mode")));
    }
}
