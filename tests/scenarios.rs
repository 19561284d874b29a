//! End-to-end timetable generation scenarios and schedule properties.

use u_timetable::catalog::Catalog;
use u_timetable::config::{SchedulerConfig, Strategy};
use u_timetable::dispatching::PriorityRanker;
use u_timetable::models::*;
use u_timetable::scheduler::{detect_conflicts, TimetableEngine};
use u_timetable::store::{InMemoryStore, ScheduleStore, ScopeGuard};
use u_timetable::validation::validate_schedule;
use u_timetable::SchedulingError;

fn tier(credit: u32) -> i32 {
    if credit <= 10 {
        120
    } else if credit >= 15 {
        180
    } else {
        150
    }
}

fn single_request(scope: SchedulingScope) -> SchedulingInput {
    SchedulingInput::new(scope)
        .with_module(Module::new("CS101").with_credit(10))
        .with_program(Program::new("BSc", "6"))
        .with_class(ClassGroup::new("C1", "BIT1", "A", 30, "BSc"))
        .with_room(Room::new("R1", "Lecture", 40))
        .with_request(SchedulingRequest::new("Q1", "C1", "CS101", "S1", "BSc"))
}

fn day_scope() -> SchedulingScope {
    SchedulingScope::new("2024/2025", 1, TimeWindow::hours((8, 0), (18, 0)))
}

// ======================== Scenarios ========================

#[test]
fn test_preference_honoured() {
    let input = single_request(day_scope()).with_preference(TeacherPreference::new(
        "S1",
        Day::Mon,
        TimeWindow::hours((9, 0), (11, 0)),
        5,
    ));
    let outcome = TimetableEngine::default().generate(&input).unwrap();

    assert_eq!(outcome.entries.len(), 1);
    let e = &outcome.entries[0];
    assert_eq!(e.day, Day::Mon);
    assert_eq!((e.start_min, e.end_min), (hm(9, 0), hm(11, 0)));
    assert_eq!(e.duration_min(), 120);
    assert_eq!(e.room_id, "R1");
}

#[test]
fn test_contended_room_never_double_booked() {
    let pref = |staff: &str| TeacherPreference::new(staff, Day::Mon, TimeWindow::hours((9, 0), (11, 0)), 5);
    let input = single_request(day_scope())
        .with_class(ClassGroup::new("C2", "BIT2", "A", 30, "BSc"))
        .with_request(SchedulingRequest::new("Q2", "C2", "CS101", "S2", "BSc"))
        .with_preference(pref("S1"))
        .with_preference(pref("S2"));
    let outcome = TimetableEngine::default().generate(&input).unwrap();

    assert!(detect_conflicts(&outcome.entries).is_empty());
    let q1: Vec<&ScheduleEntry> = entries_for_request(&outcome.entries, "Q1");
    assert_eq!(q1.len(), 1);
    assert_eq!((q1[0].day, q1[0].start_min), (Day::Mon, hm(9, 0)));
    for q2 in entries_for_request(&outcome.entries, "Q2") {
        assert!(!q2.slot().overlaps(&q1[0].slot()));
    }
    assert_eq!(
        outcome.entries.len() + outcome.unplaced.len(),
        2,
        "Q2 is either placed elsewhere or reported unplaced"
    );
}

#[test]
fn test_priority_of_advanced_lab() {
    let input = SchedulingInput::new(day_scope())
        .with_module(Module::new("CHEM").with_credit(16).with_kind("Laboratory"))
        .with_module(Module::new("INTRO"))
        .with_program(Program::new("MSc", "8"))
        .with_program(Program::new("BSc", "6"))
        .with_class(ClassGroup::new("C1", "MCH1", "A", 20, "MSc"))
        .with_class(ClassGroup::new("C2", "BIT1", "A", 30, "BSc"))
        .with_request(SchedulingRequest::new("Q1", "C1", "CHEM", "S1", "MSc"))
        .with_request(SchedulingRequest::new("Q2", "C2", "INTRO", "S2", "BSc"));
    let catalog = Catalog::build(&input).unwrap();
    let ranker = PriorityRanker::from_policy(&SchedulerConfig::default().priority);
    assert_eq!(ranker.rank(&catalog), vec![5, 2]);
}

#[test]
fn test_parallel_streams_chained() {
    let input = SchedulingInput::new(day_scope())
        .with_module(Module::new("CS101"))
        .with_program(Program::new("BSc", "6"))
        .with_class(ClassGroup::new("C1", "BIT1", "A", 30, "BSc"))
        .with_class(ClassGroup::new("C2", "BIT1", "B", 30, "BSc"))
        .with_class(ClassGroup::new("C3", "BIT1", "C", 30, "BSc"))
        .with_room(Room::new("R1", "Lecture", 40))
        .with_room(Room::new("R2", "Lecture", 40))
        .with_room(Room::new("R3", "Lecture", 40))
        .with_request(SchedulingRequest::new("Q1", "C1", "CS101", "S1", "BSc"))
        .with_request(SchedulingRequest::new("Q2", "C2", "CS101", "S2", "BSc"))
        .with_request(SchedulingRequest::new("Q3", "C3", "CS101", "S3", "BSc"));
    let outcome = TimetableEngine::default().generate(&input).unwrap();
    assert_eq!(outcome.optimizer.streams_aligned, 2);

    let slot = |id: &str| entries_for_request(&outcome.entries, id)[0].slot();
    assert_eq!(slot("Q1"), TimeSlot::new(Day::Mon, hm(8, 0), hm(10, 0)));
    assert_eq!(slot("Q2"), TimeSlot::new(Day::Mon, hm(10, 15), hm(12, 15)));
    assert_eq!(slot("Q3"), TimeSlot::new(Day::Mon, hm(12, 30), hm(14, 30)));
}

// ======================== Properties ========================

/// Six class groups across two programs, four rooms, 24 requests.
fn campus() -> SchedulingInput {
    let scope = SchedulingScope::new("2024/2025", 2, TimeWindow::hours((8, 0), (17, 0)))
        .with_break(TimeWindow::hours((12, 0), (13, 0)));
    let mut input = SchedulingInput::new(scope)
        .with_program(Program::new("P1", "6").with_department("CS"))
        .with_program(
            Program::new("P2", "8")
                .with_department("EE")
                .with_window(TimeWindow::hours((8, 0), (15, 0))),
        )
        .with_class(ClassGroup::new("C1", "BIT1", "A", 30, "P1"))
        .with_class(ClassGroup::new("C2", "BIT1", "B", 30, "P1"))
        .with_class(ClassGroup::new("C3", "BIT2", "A", 40, "P1"))
        .with_class(ClassGroup::new("C4", "MEE1", "A", 25, "P2"))
        .with_class(ClassGroup::new("C5", "MEE1", "B", 25, "P2"))
        .with_class(ClassGroup::new("C6", "MEE2", "A", 20, "P2"))
        .with_room(Room::new("R1", "Lecture", 40))
        .with_room(Room::new("R2", "Lecture", 50))
        .with_room(Room::new("R3", "Lecture", 30))
        .with_room(Room::new("L1", "Laboratory", 40))
        .with_preference(TeacherPreference::new("S0", Day::Mon, TimeWindow::hours((8, 0), (12, 0)), 3))
        .with_preference(TeacherPreference::new("S3", Day::Wed, TimeWindow::hours((13, 0), (17, 0)), 2))
        .with_preference(TeacherPreference::new("S5", Day::Tue, TimeWindow::hours((9, 0), (11, 0)), 4));

    let credits = [10, 12, 16, 8, 6, 15, 10, 12];
    for (m, &credit) in credits.iter().enumerate() {
        let kind = if m == 2 || m == 5 { "Laboratory" } else { "Lecture" };
        let department = if m < 4 { "CS" } else { "EE" };
        input = input.with_module(
            Module::new(format!("M{m}"))
                .with_credit(credit)
                .with_kind(kind)
                .with_department(department),
        );
    }
    for c in 0..6 {
        let program = if c < 3 { "P1" } else { "P2" };
        for k in 0..4 {
            let m = (c + 2 * k) % 8;
            input = input.with_request(SchedulingRequest::new(
                format!("Q{c}{k}"),
                format!("C{}", c + 1),
                format!("M{m}"),
                format!("S{}", (c + m) % 7),
                program,
            ));
        }
    }
    input
}

fn assert_schedule_properties(input: &SchedulingInput, config: &SchedulerConfig) {
    let outcome = TimetableEngine::new(config.clone()).generate(input).unwrap();
    let entries = &outcome.entries;

    // No double-booking.
    for (i, a) in entries.iter().enumerate() {
        for b in &entries[i + 1..] {
            if a.slot().overlaps(&b.slot()) {
                assert_ne!(a.staff_id, b.staff_id, "staff double-booked: {a:?} {b:?}");
                assert_ne!(a.room_id, b.room_id, "room double-booked: {a:?} {b:?}");
                assert_ne!(a.class_id, b.class_id, "class double-booked: {a:?} {b:?}");
            }
        }
    }
    assert!(detect_conflicts(entries).is_empty());

    // Grid exclusion and room capacity.
    let scope = &input.scope;
    for e in entries {
        assert!(scope.days.contains(&e.day));
        assert!(scope.operating_window.covers(&e.slot().window()));
        assert!(scope.break_windows.iter().all(|b| !b.overlaps(&e.slot().window())));
        let room = input.rooms.iter().find(|r| r.id == e.room_id).unwrap();
        let class = input.classes.iter().find(|c| c.id == e.class_id).unwrap();
        assert!(room.capacity >= class.capacity);
    }

    // Durations: one whole session, or two halves adding up to the tier.
    for request in &input.requests {
        let sessions = entries_for_request(entries, &request.id);
        let credit = input.modules.iter().find(|m| m.id == request.module_id).unwrap().credit;
        let expected = tier(credit);
        match sessions.len() {
            0 => assert!(outcome.unplaced.iter().any(|u| u.request_id == request.id)),
            1 => assert_eq!(sessions[0].duration_min(), expected),
            2 => {
                let total: i32 = sessions.iter().map(|s| s.duration_min()).sum();
                assert_eq!(total, expected);
                assert!((sessions[0].duration_min() - sessions[1].duration_min()).abs() <= 1);
            }
            n => panic!("request {} has {n} sessions", request.id),
        }
    }
    assert_eq!(outcome.kpi.placed_requests + outcome.unplaced.len(), input.requests.len());

    // Ordered by (day, start, room).
    let keys: Vec<(Day, i32, &str)> = entries.iter().map(|e| (e.day, e.start_min, e.room_id.as_str())).collect();
    let mut sorted = keys.clone();
    sorted.sort();
    assert_eq!(keys, sorted);

    // Idempotent re-validation.
    let first = validate_schedule(input, entries, config);
    let second = validate_schedule(input, entries, config);
    assert!(first.is_ok());
    assert_eq!(first, second);
}

#[test]
fn test_properties_greedy() {
    let config = SchedulerConfig::default().with_strategy(Strategy::Greedy);
    assert_schedule_properties(&campus(), &config);
}

#[test]
fn test_properties_seeded() {
    for seed in [1, 7, 42] {
        let config = SchedulerConfig::default().with_random_seed(seed);
        assert_schedule_properties(&campus(), &config);
    }
}

#[test]
fn test_properties_without_optimizer() {
    let config = SchedulerConfig::default().without_optimizer().with_slot_step(15);
    assert_schedule_properties(&campus(), &config);
}

#[test]
fn test_seeded_runs_repeat() {
    let config = SchedulerConfig::default().with_random_seed(99);
    let a = TimetableEngine::new(config.clone()).generate(&campus()).unwrap();
    let b = TimetableEngine::new(config).generate(&campus()).unwrap();
    assert_eq!(a.entries, b.entries);
}

#[test]
fn test_tampered_schedule_rejected() {
    let input = campus();
    let config = SchedulerConfig::default();
    let outcome = TimetableEngine::new(config.clone()).generate(&input).unwrap();
    let mut entries = outcome.entries.clone();
    assert!(entries.len() >= 2);
    let (day, start, end) = (entries[0].day, entries[0].start_min, entries[0].end_min);
    entries[1].staff_id = entries[0].staff_id.clone();
    entries[1].day = day;
    entries[1].start_min = start;
    entries[1].end_min = end;
    assert!(validate_schedule(&input, &entries, &config).is_err());
}

#[test]
fn test_backtracking_strategy() {
    let config = SchedulerConfig::default().with_strategy(Strategy::Backtracking);
    let outcome = TimetableEngine::new(config).generate(&single_request(day_scope())).unwrap();
    assert_eq!(outcome.strategy, Strategy::Backtracking);
    assert_eq!(outcome.entries.len(), 1);
}

// ======================== Input and configuration ========================

#[test]
fn test_input_from_json() {
    let json = r#"{
        "scope": {
            "academic_year": "2024/2025",
            "semester": 1,
            "operating_window": {"start_min": 480, "end_min": 1020}
        },
        "requests": [
            {"id": "Q1", "class_id": "C1", "module_id": "M1", "staff_id": "S1", "program_id": "P1"}
        ],
        "modules": [
            {"id": "M1", "code": "CS101", "credit": 10, "kind": "Lecture", "department": "CS"}
        ],
        "programs": [
            {"id": "P1", "name": "BSc", "level": "6", "department": "CS"}
        ],
        "classes": [
            {"id": "C1", "name": "BIT1", "stream": "A", "capacity": 30, "program_id": "P1"}
        ],
        "rooms": [
            {"id": "R1", "kind": "Lecture", "capacity": 40}
        ]
    }"#;
    let input: SchedulingInput = serde_json::from_str(json).unwrap();
    assert_eq!(input.scope.days, Day::ALL.to_vec());
    assert!(input.preferences.is_empty());

    let outcome = TimetableEngine::default().generate(&input).unwrap();
    assert_eq!(outcome.entries[0].slot(), TimeSlot::new(Day::Mon, hm(8, 0), hm(10, 0)));

    let round_trip: SchedulingInput = serde_json::from_str(&serde_json::to_string(&input).unwrap()).unwrap();
    let again = TimetableEngine::default().generate(&round_trip).unwrap();
    assert_eq!(outcome.entries, again.entries);
}

#[test]
fn test_config_from_toml_drives_run() {
    let config = SchedulerConfig::from_toml_str(
        r#"
        strategy = "greedy"

        [durations]
        min_min = 90
        "#,
    )
    .unwrap();
    let outcome = TimetableEngine::new(config).generate(&single_request(day_scope())).unwrap();
    assert_eq!(outcome.entries[0].duration_min(), 90);
}

#[test]
fn test_inconsistent_input() {
    let input = single_request(day_scope())
        .with_request(SchedulingRequest::new("Q1", "C1", "CS101", "S2", "BSc"));
    match TimetableEngine::default().generate(&input) {
        Err(SchedulingError::InputInconsistency { errors }) => assert!(!errors.is_empty()),
        other => panic!("expected InputInconsistency, got {other:?}"),
    }
}

// ======================== Commit ========================

#[test]
fn test_commit_and_recommit() {
    let store = InMemoryStore::new();
    let engine = TimetableEngine::default();
    let input = single_request(day_scope());
    engine.generate_and_commit(&input, &store).unwrap();

    let bigger = input
        .clone()
        .with_class(ClassGroup::new("C2", "BIT2", "A", 30, "BSc"))
        .with_request(SchedulingRequest::new("Q2", "C2", "CS101", "S2", "BSc"));
    let outcome = engine.generate_and_commit(&bigger, &store).unwrap();

    let stored = store.load(&input.scope.key()).unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored, outcome.entries);
}

#[test]
fn test_concurrent_commit_busy() {
    let store = InMemoryStore::new();
    let input = single_request(day_scope());
    let guard = ScopeGuard::acquire(&store, input.scope.key()).unwrap();

    let err = TimetableEngine::default()
        .generate_and_commit(&input, &store)
        .unwrap_err();
    assert!(matches!(err, SchedulingError::ScopeBusy(_)));

    drop(guard);
    assert!(TimetableEngine::default().generate_and_commit(&input, &store).is_ok());
}
