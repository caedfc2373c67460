//! Sign-in policy and use-case service.
//!
//! # Responsibility
//! - Decide whether a candidate sign-in is accepted or rejected.
//! - Build the canonical record that gets persisted.
//! - Run the read → evaluate → append sequence against an explicit store.
//!
//! # Invariants
//! - Incomplete candidates never reach the store.
//! - No two accepted records share a `RecordKey`.
//! - Policy rejections are values, not errors; only store failures are `Err`.
//!
//! Evaluate-then-append is not atomic: two concurrent submissions of the same
//! key can both pass the duplicate check before either appends.

use crate::model::record::{AttendanceRecord, MealSlot, PrayerMode, RecordDate, RecordKey};
use crate::model::roster::MemberRoster;
use crate::repo::{RecordStore, RepoResult};
use crate::report::export::render_csv;
use crate::report::stats::{
    self, member_breakdown, member_totals, DailySlotCounts, MemberTotal,
};
use chrono::NaiveDate;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// How strictly member names are checked against the roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RosterStrictness {
    /// Names must be on the roster.
    #[default]
    Strict,
    /// Any non-empty name is accepted.
    Lenient,
}

/// Raw sign-in input collected from a form or command line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SignInCandidate {
    pub member_name: String,
    pub date: Option<NaiveDate>,
    pub meal_slot: String,
    pub prayer_mode: Option<PrayerMode>,
    pub notes: Option<String>,
}

impl SignInCandidate {
    pub fn new(
        member_name: impl Into<String>,
        date: NaiveDate,
        meal_slot: impl Into<String>,
    ) -> Self {
        Self {
            member_name: member_name.into(),
            date: Some(date),
            meal_slot: meal_slot.into(),
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

    /// Required fields that are absent or blank, in column order.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.member_name.trim().is_empty() {
            missing.push("member_name");
        }
        if self.date.is_none() {
            missing.push("date");
        }
        if self.meal_slot.trim().is_empty() {
            missing.push("meal_slot");
        }
        missing
    }

    /// Canonical record for this candidate. Callers check completeness first.
    fn to_record(&self, date: NaiveDate) -> AttendanceRecord {
        AttendanceRecord {
            member_name: self.member_name.trim().to_string(),
            date: RecordDate::Calendar(date),
            meal_slot: MealSlot::parse(&self.meal_slot),
            prayer_mode: self.prayer_mode,
            notes: self
                .notes
                .as_deref()
                .map(str::trim)
                .filter(|notes| !notes.is_empty())
                .map(str::to_string),
        }
    }
}

/// Why a candidate was not recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// Required fields are missing; nothing was read or written.
    IncompleteInput { missing: Vec<&'static str> },
    /// Name is not on the roster under strict checking.
    UnknownMember(String),
    /// A record with the same key already exists.
    DuplicateKey(RecordKey),
}

impl RejectReason {
    pub fn code(&self) -> &'static str {
        match self {
            Self::IncompleteInput { .. } => "incomplete_input",
            Self::UnknownMember(_) => "unknown_member",
            Self::DuplicateKey(_) => "duplicate_key",
        }
    }
}

impl Display for RejectReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IncompleteInput { missing } => {
                write!(f, "please fill in: {}", missing.join(", "))
            }
            Self::UnknownMember(name) => write!(f, "`{name}` is not on the roster"),
            Self::DuplicateKey(key) => write!(f, "already signed in: {key}"),
        }
    }
}

/// Pure policy verdict for one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Accepted(AttendanceRecord),
    Rejected(RejectReason),
}

/// Result of a full sign-in interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignInOutcome {
    /// Record accepted and appended to the log.
    Recorded(AttendanceRecord),
    Rejected(RejectReason),
}

/// Acceptance rules for new sign-ins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInPolicy {
    roster: MemberRoster,
    strictness: RosterStrictness,
    prayer_mode_in_key: bool,
}

impl SignInPolicy {
    /// Strict roster checking, prayer mode excluded from the key.
    pub fn new(roster: MemberRoster) -> Self {
        Self {
            roster,
            strictness: RosterStrictness::Strict,
            prayer_mode_in_key: false,
        }
    }

    pub fn with_strictness(mut self, strictness: RosterStrictness) -> Self {
        self.strictness = strictness;
        self
    }

    pub fn with_prayer_mode_in_key(mut self, enabled: bool) -> Self {
        self.prayer_mode_in_key = enabled;
        self
    }

    pub fn roster(&self) -> &MemberRoster {
        &self.roster
    }

    pub fn prayer_mode_in_key(&self) -> bool {
        self.prayer_mode_in_key
    }

    /// Store-free checks: completeness, then roster membership.
    ///
    /// Returns the canonical record when both pass.
    pub fn precheck(&self, candidate: &SignInCandidate) -> Result<AttendanceRecord, RejectReason> {
        let missing = candidate.missing_fields();
        let date = match candidate.date {
            Some(date) if missing.is_empty() => date,
            _ => return Err(RejectReason::IncompleteInput { missing }),
        };

        let record = candidate.to_record(date);
        let strict = self.strictness == RosterStrictness::Strict;
        if strict && !self.roster.contains(&record.member_name) {
            return Err(RejectReason::UnknownMember(record.member_name));
        }
        Ok(record)
    }

    /// Evaluates a candidate against the existing log.
    pub fn evaluate(&self, candidate: &SignInCandidate, existing: &[AttendanceRecord]) -> Decision {
        let record = match self.precheck(candidate) {
            Ok(record) => record,
            Err(reason) => return Decision::Rejected(reason),
        };

        let key = record.key(self.prayer_mode_in_key);
        if existing
            .iter()
            .any(|stored| stored.key(self.prayer_mode_in_key) == key)
        {
            return Decision::Rejected(RejectReason::DuplicateKey(key));
        }
        Decision::Accepted(record)
    }
}

/// Sign-in use cases over one record store.
pub struct SignInService<S: RecordStore> {
    store: S,
    policy: SignInPolicy,
}

impl<S: RecordStore> SignInService<S> {
    pub fn new(store: S, policy: SignInPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> &SignInPolicy {
        &self.policy
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Validates, de-duplicates and appends one sign-in.
    ///
    /// # Errors
    /// - Store read or append failures. A failed append writes nothing.
    pub fn sign_in(&self, candidate: &SignInCandidate) -> RepoResult<SignInOutcome> {
        let started_at = Instant::now();
        if let Err(reason) = self.policy.precheck(candidate) {
            self.log_rejection(&reason, started_at);
            return Ok(SignInOutcome::Rejected(reason));
        }

        let existing = self.store.read_all()?;
        match self.policy.evaluate(candidate, &existing) {
            Decision::Accepted(record) => {
                self.store.append(&record)?;
                info!(
                    "event=sign_in module=service status=accepted backend={} log_size={} duration_ms={}",
                    self.store.backend_name(),
                    existing.len() + 1,
                    started_at.elapsed().as_millis()
                );
                Ok(SignInOutcome::Recorded(record))
            }
            Decision::Rejected(reason) => {
                self.log_rejection(&reason, started_at);
                Ok(SignInOutcome::Rejected(reason))
            }
        }
    }

    /// Writes the column header if the backend has none yet.
    pub fn initialize(&self) -> RepoResult<()> {
        self.store.ensure_header()
    }

    /// Full log in insertion order.
    pub fn records(&self) -> RepoResult<Vec<AttendanceRecord>> {
        self.store.read_all()
    }

    /// Records of one member in insertion order.
    pub fn records_for_member(&self, member_name: &str) -> RepoResult<Vec<AttendanceRecord>> {
        let records = self.store.read_all()?;
        Ok(stats::records_for_member(&records, member_name)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Per-member totals, zero-filled over the roster.
    pub fn member_totals(&self) -> RepoResult<Vec<MemberTotal>> {
        Ok(member_totals(&self.store.read_all()?, self.policy.roster()))
    }

    /// Per-date meal slot counts for one member.
    pub fn member_breakdown(&self, member_name: &str) -> RepoResult<Vec<DailySlotCounts>> {
        Ok(member_breakdown(&self.store.read_all()?, member_name))
    }

    /// Whole log as BOM-prefixed CSV text.
    pub fn export_csv(&self) -> RepoResult<String> {
        Ok(render_csv(&self.store.read_all()?))
    }

    fn log_rejection(&self, reason: &RejectReason, started_at: Instant) {
        warn!(
            "event=sign_in module=service status=rejected reason={} backend={} duration_ms={}",
            reason.code(),
            self.store.backend_name(),
            started_at.elapsed().as_millis()
        );
    }
}
