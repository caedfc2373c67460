//! Attendance record model.
//!
//! # Responsibility
//! - Define the record persisted for one accepted sign-in.
//! - Provide canonical text forms used by storage and key comparison.
//!
//! # Invariants
//! - `RecordDate::Calendar` always renders as `YYYY-MM-DD`.
//! - `RecordDate::Raw` keeps unparsable stored text instead of failing reads.
//! - `MealSlot` text round-trips through `parse` and `as_str`.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Canonical date format for persistence and key comparison.
pub const CANONICAL_DATE_FORMAT: &str = "%Y-%m-%d";

// Spreadsheet front ends tend to re-render `2025-06-09` as `2025/6/9`.
static DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4})[-/](\d{1,2})[-/](\d{1,2})$").expect("valid date regex")
});

/// Date column value as read from storage.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecordDate {
    /// Parsed calendar date (no time component).
    Calendar(NaiveDate),
    /// Stored text that could not be parsed as a date.
    Raw(String),
}

impl RecordDate {
    /// Parses stored date text, falling back to `Raw` on failure.
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();
        match parse_calendar_date(trimmed) {
            Some(date) => Self::Calendar(date),
            None => Self::Raw(trimmed.to_string()),
        }
    }

    /// Returns `YYYY-MM-DD` for calendar dates, raw text otherwise.
    pub fn canonical(&self) -> String {
        match self {
            Self::Calendar(date) => date.format(CANONICAL_DATE_FORMAT).to_string(),
            Self::Raw(text) => text.clone(),
        }
    }

    pub fn as_calendar(&self) -> Option<NaiveDate> {
        match self {
            Self::Calendar(date) => Some(*date),
            Self::Raw(_) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Raw(text) if text.trim().is_empty())
    }
}

impl From<NaiveDate> for RecordDate {
    fn from(value: NaiveDate) -> Self {
        Self::Calendar(value)
    }
}

impl Display for RecordDate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.canonical())
    }
}

impl Serialize for RecordDate {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.canonical())
    }
}

impl<'de> Deserialize<'de> for RecordDate {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Ok(Self::parse(&text))
    }
}

/// Parses `YYYY-MM-DD` or `YYYY/M/D` into a calendar date.
pub fn parse_calendar_date(value: &str) -> Option<NaiveDate> {
    let captures = DATE_RE.captures(value.trim())?;
    let year = captures[1].parse::<i32>().ok()?;
    let month = captures[2].parse::<u32>().ok()?;
    let day = captures[3].parse::<u32>().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Meal slot the member ate during a fasting day.
///
/// Unknown labels are preserved verbatim as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MealSlot {
    Breakfast,
    Lunch,
    Dinner,
    Other(String),
}

impl MealSlot {
    /// Parses a slot label. Matching is exact and case-sensitive.
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "breakfast" => Self::Breakfast,
            "lunch" => Self::Lunch,
            "dinner" => Self::Dinner,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Breakfast => "breakfast",
            Self::Lunch => "lunch",
            Self::Dinner => "dinner",
            Self::Other(label) => label.as_str(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Other(label) if label.trim().is_empty())
    }
}

impl Display for MealSlot {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for MealSlot {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for MealSlot {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Ok(Self::parse(&text))
    }
}

/// How the member joined the prayer session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrayerMode {
    /// Prayed on their own. Serialized as `self`.
    #[serde(rename = "self")]
    SelfLed,
    /// Joined the online group session.
    Online,
}

impl PrayerMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SelfLed => "self",
            Self::Online => "online",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "self" => Some(Self::SelfLed),
            "online" => Some(Self::Online),
            _ => None,
        }
    }
}

impl Display for PrayerMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One accepted sign-in event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub member_name: String,
    pub date: RecordDate,
    pub meal_slot: MealSlot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prayer_mode: Option<PrayerMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl AttendanceRecord {
    /// Creates a record without prayer mode or notes.
    pub fn new(
        member_name: impl Into<String>,
        date: impl Into<RecordDate>,
        meal_slot: MealSlot,
    ) -> Self {
        Self {
            member_name: member_name.into(),
            date: date.into(),
            meal_slot,
            prayer_mode: None,
            notes: None,
        }
    }

    pub fn with_prayer_mode(mut self, prayer_mode: PrayerMode) -> Self {
        self.prayer_mode = Some(prayer_mode);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Builds the uniqueness key for this record.
    ///
    /// `include_prayer_mode` selects whether prayer mode is part of the key.
    pub fn key(&self, include_prayer_mode: bool) -> RecordKey {
        RecordKey {
            member_name: self.member_name.clone(),
            date: self.date.canonical(),
            meal_slot: self.meal_slot.as_str().to_string(),
            prayer_mode: if include_prayer_mode {
                self.prayer_mode.map(|mode| mode.as_str().to_string())
            } else {
                None
            },
        }
    }
}

/// Uniqueness key of the record log, compared on canonical text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordKey {
    pub member_name: String,
    pub date: String,
    pub meal_slot: String,
    pub prayer_mode: Option<String>,
}

impl Display for RecordKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.member_name, self.date, self.meal_slot)?;
        if let Some(mode) = &self.prayer_mode {
            write!(f, "/{mode}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_calendar_date, AttendanceRecord, MealSlot, PrayerMode, RecordDate};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid test date")
    }

    #[test]
    fn record_date_parses_canonical_and_slash_forms() {
        assert_eq!(
            RecordDate::parse("2025-06-09"),
            RecordDate::Calendar(date(2025, 6, 9))
        );
        assert_eq!(
            RecordDate::parse(" 2025/6/9 "),
            RecordDate::Calendar(date(2025, 6, 9))
        );
        assert_eq!(RecordDate::parse("2025/6/9").canonical(), "2025-06-09");
    }

    #[test]
    fn record_date_keeps_unparsable_text_raw() {
        let parsed = RecordDate::parse("next tuesday");
        assert_eq!(parsed, RecordDate::Raw("next tuesday".to_string()));
        assert_eq!(parsed.canonical(), "next tuesday");
        assert!(parsed.as_calendar().is_none());
    }

    #[test]
    fn out_of_range_dates_are_not_calendar_dates() {
        assert!(parse_calendar_date("2025-02-30").is_none());
        assert!(matches!(RecordDate::parse("2025-13-01"), RecordDate::Raw(_)));
    }

    #[test]
    fn meal_slot_is_case_sensitive_and_keeps_free_text() {
        assert_eq!(MealSlot::parse("lunch"), MealSlot::Lunch);
        assert_eq!(MealSlot::parse("Lunch"), MealSlot::Other("Lunch".to_string()));
        assert_eq!(MealSlot::parse("brunch").as_str(), "brunch");
        assert!(MealSlot::parse("   ").is_empty());
    }

    #[test]
    fn prayer_mode_serializes_as_self_and_online() {
        assert_eq!(
            serde_json::to_string(&PrayerMode::SelfLed).expect("serialize"),
            "\"self\""
        );
        assert_eq!(PrayerMode::parse("online"), Some(PrayerMode::Online));
        assert_eq!(PrayerMode::parse("offline"), None);
    }

    #[test]
    fn key_includes_prayer_mode_only_when_requested() {
        let record = AttendanceRecord::new("Alice", date(2025, 6, 9), MealSlot::Breakfast)
            .with_prayer_mode(PrayerMode::Online);

        let plain = record.key(false);
        assert_eq!(plain.date, "2025-06-09");
        assert_eq!(plain.meal_slot, "breakfast");
        assert!(plain.prayer_mode.is_none());

        let with_mode = record.key(true);
        assert_eq!(with_mode.prayer_mode.as_deref(), Some("online"));
        assert_eq!(with_mode.to_string(), "Alice/2025-06-09/breakfast/online");
    }

    #[test]
    fn record_json_omits_absent_optional_fields() {
        let record = AttendanceRecord::new("Bob", date(2025, 6, 10), MealSlot::Dinner);
        let json = serde_json::to_value(&record).expect("serialize record");
        assert_eq!(json["date"], "2025-06-10");
        assert_eq!(json["meal_slot"], "dinner");
        assert!(json.get("prayer_mode").is_none());
        assert!(json.get("notes").is_none());
    }
}
