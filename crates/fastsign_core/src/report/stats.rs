//! Per-member statistics.
//!
//! # Invariants
//! - Every roster member appears in totals, with count zero when absent.
//! - Roster members come first in roster order; other names follow sorted.

use crate::model::record::AttendanceRecord;
use crate::model::roster::MemberRoster;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Sign-in count for one member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberTotal {
    pub member_name: String,
    pub count: usize,
    /// `false` for names found in the log but not on the roster.
    pub on_roster: bool,
}

/// Meal slot counts for one member on one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailySlotCounts {
    /// Canonical date text.
    pub date: String,
    /// Slot label to count, sorted by label.
    pub slots: BTreeMap<String, usize>,
}

impl DailySlotCounts {
    pub fn total(&self) -> usize {
        self.slots.values().sum()
    }
}

/// Counts records per member with roster zero-fill.
pub fn member_totals(records: &[AttendanceRecord], roster: &MemberRoster) -> Vec<MemberTotal> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for record in records {
        *counts.entry(record.member_name.as_str()).or_default() += 1;
    }

    let mut totals: Vec<MemberTotal> = roster
        .members()
        .iter()
        .map(|member| MemberTotal {
            member_name: member.clone(),
            count: counts.remove(member.as_str()).unwrap_or(0),
            on_roster: true,
        })
        .collect();

    let mut extras: Vec<(&str, usize)> = counts.into_iter().collect();
    extras.sort_unstable_by(|a, b| a.0.cmp(b.0));
    totals.extend(extras.into_iter().map(|(member, count)| MemberTotal {
        member_name: member.to_string(),
        count,
        on_roster: false,
    }));
    totals
}

/// Records of one member, insertion order kept.
pub fn records_for_member<'a>(
    records: &'a [AttendanceRecord],
    member_name: &str,
) -> Vec<&'a AttendanceRecord> {
    records
        .iter()
        .filter(|record| record.member_name == member_name)
        .collect()
}

/// Groups one member's records by date, then by meal slot.
///
/// Dates are ordered by canonical text, which is chronological for parsed
/// dates.
pub fn member_breakdown(records: &[AttendanceRecord], member_name: &str) -> Vec<DailySlotCounts> {
    let mut by_date: BTreeMap<String, BTreeMap<String, usize>> = BTreeMap::new();
    for record in records_for_member(records, member_name) {
        *by_date
            .entry(record.date.canonical())
            .or_default()
            .entry(record.meal_slot.as_str().to_string())
            .or_default() += 1;
    }

    by_date
        .into_iter()
        .map(|(date, slots)| DailySlotCounts { date, slots })
        .collect()
}
