use chrono::NaiveDate;
use fastsign_core::{
    records_for_member, AttendanceRecord, JsonFileRecordStore, MealSlot, MemberRoster, PrayerMode, RecordStore,
    RejectReason, RepoError, RepoResult, SignInCandidate, SignInOutcome, SignInPolicy,
    SignInService, SqliteRecordStore,
};
use std::cell::{Cell, RefCell};

/// In-memory store that counts calls and can be told to fail appends.
#[derive(Default)]
struct SpyStore {
    rows: RefCell<Vec<AttendanceRecord>>,
    reads: Cell<usize>,
    appends: Cell<usize>,
    reject_appends: bool,
}

impl RecordStore for SpyStore {
    fn backend_name(&self) -> &'static str {
        "spy"
    }

    fn read_all(&self) -> RepoResult<Vec<AttendanceRecord>> {
        self.reads.set(self.reads.get() + 1);
        Ok(self.rows.borrow().clone())
    }

    fn append(&self, record: &AttendanceRecord) -> RepoResult<()> {
        self.appends.set(self.appends.get() + 1);
        if self.reject_appends {
            return Err(RepoError::Persistence("HTTP 403 Forbidden".to_string()));
        }
        self.rows.borrow_mut().push(record.clone());
        Ok(())
    }

    fn ensure_header(&self) -> RepoResult<()> {
        Ok(())
    }
}

fn june(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, day).unwrap()
}

fn alice_bob_policy() -> SignInPolicy {
    SignInPolicy::new(MemberRoster::new(["Alice", "Bob"]).unwrap())
}

fn run_worked_example<S: RecordStore>(service: &SignInService<S>) {
    let breakfast = SignInCandidate::new("Alice", june(9), "breakfast");
    assert!(matches!(
        service.sign_in(&breakfast).unwrap(),
        SignInOutcome::Recorded(_)
    ));
    assert_eq!(service.records().unwrap().len(), 1);

    assert!(matches!(
        service.sign_in(&breakfast).unwrap(),
        SignInOutcome::Rejected(RejectReason::DuplicateKey(_))
    ));
    assert_eq!(service.records().unwrap().len(), 1);

    let lunch = SignInCandidate::new("Alice", june(9), "lunch");
    assert!(matches!(
        service.sign_in(&lunch).unwrap(),
        SignInOutcome::Recorded(_)
    ));
    assert_eq!(service.records().unwrap().len(), 2);

    let totals: Vec<(String, usize)> = service
        .member_totals()
        .unwrap()
        .into_iter()
        .map(|total| (total.member_name, total.count))
        .collect();
    assert_eq!(
        totals,
        vec![("Alice".to_string(), 2), ("Bob".to_string(), 0)]
    );
}

#[test]
fn worked_example_holds_for_json_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileRecordStore::new(dir.path().join("attendance.json"));
    run_worked_example(&SignInService::new(store, alice_bob_policy()));
}

#[test]
fn worked_example_holds_for_sqlite_store() {
    let store = SqliteRecordStore::open_in_memory().unwrap();
    run_worked_example(&SignInService::new(store, alice_bob_policy()));
}

#[test]
fn worked_example_holds_for_boxed_store() {
    let store: Box<dyn RecordStore> = Box::new(SpyStore::default());
    run_worked_example(&SignInService::new(store, alice_bob_policy()));
}

#[test]
fn incomplete_input_never_touches_store() {
    let service = SignInService::new(SpyStore::default(), alice_bob_policy());
    let candidates = [
        SignInCandidate {
            date: Some(june(9)),
            meal_slot: "lunch".to_string(),
            ..SignInCandidate::default()
        },
        SignInCandidate {
            member_name: "Alice".to_string(),
            meal_slot: "lunch".to_string(),
            ..SignInCandidate::default()
        },
        SignInCandidate::new("Alice", june(9), "  "),
    ];

    for candidate in &candidates {
        let outcome = service.sign_in(candidate).unwrap();
        assert!(matches!(
            outcome,
            SignInOutcome::Rejected(RejectReason::IncompleteInput { .. })
        ));
    }
    assert_eq!(service.store().reads.get(), 0);
    assert_eq!(service.store().appends.get(), 0);
}

#[test]
fn unknown_member_is_rejected_before_store_access() {
    let service = SignInService::new(SpyStore::default(), alice_bob_policy());
    let outcome = service
        .sign_in(&SignInCandidate::new("Mallory", june(9), "dinner"))
        .unwrap();
    assert_eq!(
        outcome,
        SignInOutcome::Rejected(RejectReason::UnknownMember("Mallory".to_string()))
    );
    assert_eq!(service.store().reads.get(), 0);
}

#[test]
fn repeated_duplicates_add_nothing() {
    let service = SignInService::new(SpyStore::default(), alice_bob_policy());
    let candidate = SignInCandidate::new("Bob", june(12), "dinner");

    for _ in 0..4 {
        service.sign_in(&candidate).unwrap();
    }
    assert_eq!(service.records().unwrap().len(), 1);
    assert_eq!(service.store().appends.get(), 1);
}

#[test]
fn accepted_record_reads_back_exactly_once() {
    let dir = tempfile::tempdir().unwrap();
    let service = SignInService::new(
        JsonFileRecordStore::new(dir.path().join("log.json")),
        alice_bob_policy(),
    );
    let candidate = SignInCandidate::new("Bob", june(11), "lunch")
        .with_prayer_mode(PrayerMode::Online)
        .with_notes("joined late");

    let SignInOutcome::Recorded(record) = service.sign_in(&candidate).unwrap() else {
        panic!("candidate should be recorded");
    };
    let stored = service.records().unwrap();
    assert_eq!(stored.iter().filter(|r| **r == record).count(), 1);
    assert_eq!(record.prayer_mode, Some(PrayerMode::Online));
    assert_eq!(record.notes.as_deref(), Some("joined late"));
}

#[test]
fn rejected_append_surfaces_error_and_keeps_log() {
    let store = SpyStore {
        reject_appends: true,
        ..SpyStore::default()
    };
    let service = SignInService::new(store, alice_bob_policy());

    let err = service
        .sign_in(&SignInCandidate::new("Alice", june(9), "breakfast"))
        .unwrap_err();
    assert!(matches!(err, RepoError::Persistence(message) if message.contains("403")));
    assert!(service.records().unwrap().is_empty());
}

#[test]
fn round_trip_of_distinct_records_preserves_fields_and_order() {
    let dir = tempfile::tempdir().unwrap();
    let stores: Vec<Box<dyn RecordStore>> = vec![
        Box::new(JsonFileRecordStore::new(dir.path().join("rt.json"))),
        Box::new(SqliteRecordStore::open(dir.path().join("rt.db")).unwrap()),
    ];

    let written: Vec<AttendanceRecord> = (1..=6)
        .map(|day| {
            let slot = match day % 3 {
                0 => MealSlot::Breakfast,
                1 => MealSlot::Lunch,
                _ => MealSlot::Other("snack".to_string()),
            };
            let record = AttendanceRecord::new(if day % 2 == 0 { "Alice" } else { "Bob" }, june(day), slot);
            if day % 2 == 0 {
                record.with_prayer_mode(PrayerMode::SelfLed)
            } else {
                record.with_notes(format!("day {day}"))
            }
        })
        .collect();

    for store in &stores {
        for record in &written {
            store.append(record).unwrap();
        }
        let read_back = store.read_all().unwrap();
        assert_eq!(read_back, written, "backend {}", store.backend_name());
    }
}

#[test]
fn member_projections_filter_and_group() {
    let service = SignInService::new(SqliteRecordStore::open_in_memory().unwrap(), alice_bob_policy());
    for (name, day, slot) in [
        ("Alice", 9, "breakfast"),
        ("Bob", 9, "breakfast"),
        ("Alice", 9, "dinner"),
        ("Alice", 10, "lunch"),
    ] {
        service
            .sign_in(&SignInCandidate::new(name, june(day), slot))
            .unwrap();
    }

    assert_eq!(service.records_for_member("Alice").unwrap().len(), 3);
    let breakdown = service.member_breakdown("Alice").unwrap();
    assert_eq!(breakdown.len(), 2);
    assert_eq!(breakdown[0].total(), 2);

    let csv = service.export_csv().unwrap();
    assert!(csv.starts_with('\u{feff}'));
    assert_eq!(csv.lines().count(), 5);
}

#[test]
fn member_records_follow_log_order_and_exact_name() {
    let policy = alice_bob_policy().with_strictness(fastsign_core::RosterStrictness::Lenient);
    let service = SignInService::new(SpyStore::default(), policy);
    for (name, day, slot) in [
        ("Alice", 10, "dinner"),
        ("alice", 10, "dinner"),
        ("Bob", 9, "lunch"),
        ("Alice", 9, "breakfast"),
    ] {
        service
            .sign_in(&SignInCandidate::new(name, june(day), slot))
            .unwrap();
    }

    let alice = service.records_for_member("Alice").unwrap();
    let days: Vec<String> = alice.iter().map(|record| record.date.canonical()).collect();
    assert_eq!(days, ["2025-06-10", "2025-06-09"]);

    let all = service.records().unwrap();
    let expected: Vec<AttendanceRecord> = records_for_member(&all, "Alice")
        .into_iter()
        .cloned()
        .collect();
    assert_eq!(alice, expected);
    assert!(service.records_for_member("Carol").unwrap().is_empty());
}
