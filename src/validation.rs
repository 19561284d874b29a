//! Input validation and final schedule validation.
//!
//! [`validate_input`] checks the structural integrity of a
//! [`SchedulingInput`] before a run starts:
//! - Duplicate IDs
//! - Duplicate (class, module, staff) teaching obligations
//! - References to unknown modules, programs or classes
//! - Empty or inverted time windows
//!
//! [`validate_schedule`] re-verifies a produced timetable against every
//! committed-schedule invariant. It has no side effects, so running it twice
//! on the same entries gives the same verdict.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::config::SchedulerConfig;
use crate::grid::TimeGrid;
use crate::models::{ConflictKind, ScheduleEntry, SchedulingInput};
use crate::scheduler::detect_conflicts;

/// Input validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// An input validation error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of input validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationErrorKind {
    /// Two records of the same type share an ID.
    DuplicateId,
    /// The same (class, module, staff) obligation appears twice.
    DuplicateRequest,
    /// A reference points at a record that doesn't exist.
    UnknownReference,
    /// A request and its class disagree on the program.
    ContradictoryReference,
    /// A window is empty, inverted, or outside the operating hours.
    InvalidWindow,
    /// The scope has no teaching days.
    EmptyScope,
}

impl ValidationError {
    pub(crate) fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// A broken invariant in a produced timetable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub kind: ViolationKind,
    /// Request the violation was found on.
    pub request_id: String,
    pub message: String,
}

/// Categories of schedule violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViolationKind {
    StaffOverlap,
    RoomOverlap,
    ClassOverlap,
    /// Session length doesn't match the credit tier.
    Duration,
    /// Session outside the operating window, off a scope day, or across a break.
    OutsideGrid,
    /// A placed request has the wrong number of sessions.
    SessionCount,
    /// Entry references a request or resource outside the input.
    Orphaned,
}

impl Violation {
    fn new(kind: ViolationKind, request_id: &str, message: impl Into<String>) -> Self {
        Self {
            kind,
            request_id: request_id.to_string(),
            message: message.into(),
        }
    }
}

/// Validates the input of a run.
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with every detected issue.
pub fn validate_input(input: &SchedulingInput) -> ValidationResult {
    let mut errors = Vec::new();
    let scope = &input.scope;

    if !scope.operating_window.is_within_day() {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidWindow,
            format!("Operating window {} is empty or outside the day", scope.operating_window),
        ));
    }
    if scope.days.is_empty() {
        errors.push(ValidationError::new(
            ValidationErrorKind::EmptyScope,
            "Scope has no teaching days",
        ));
    }
    for b in &scope.break_windows {
        if !b.is_within_day() {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidWindow,
                format!("Break window {b} is empty or outside the day"),
            ));
        }
    }

    let modules = collect_ids(&mut errors, "module", input.modules.iter().map(|m| &m.id));
    let programs = collect_ids(&mut errors, "program", input.programs.iter().map(|p| &p.id));
    let classes = collect_ids(&mut errors, "class", input.classes.iter().map(|c| &c.id));
    collect_ids(&mut errors, "room", input.rooms.iter().map(|r| &r.id));
    collect_ids(&mut errors, "request", input.requests.iter().map(|r| &r.id));

    for p in &input.programs {
        if let Some(w) = p.window {
            if !w.is_within_day() || scope.operating_window.intersect(&w).is_none() {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidWindow,
                    format!("Program '{}' window {w} is empty or outside operating hours", p.id),
                ));
            }
        }
        if p.breaks.iter().any(|b| !b.is_within_day()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidWindow,
                format!("Program '{}' has an empty or out-of-day break window", p.id),
            ));
        }
    }

    let class_program: HashMap<&str, &str> = input
        .classes
        .iter()
        .map(|c| (c.id.as_str(), c.program_id.as_str()))
        .collect();

    for c in &input.classes {
        if !programs.contains(c.program_id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::UnknownReference,
                format!("Class '{}' references unknown program '{}'", c.id, c.program_id),
            ));
        }
    }

    let mut triples = HashSet::new();
    for r in &input.requests {
        let refs = [
            ("module", modules.contains(r.module_id.as_str()), &r.module_id),
            ("program", programs.contains(r.program_id.as_str()), &r.program_id),
            ("class", classes.contains(r.class_id.as_str()), &r.class_id),
        ];
        for (what, known, id) in refs {
            if !known {
                errors.push(ValidationError::new(
                    ValidationErrorKind::UnknownReference,
                    format!("Request '{}' references unknown {what} '{id}'", r.id),
                ));
            }
        }

        if let Some(&program) = class_program.get(r.class_id.as_str()) {
            if program != r.program_id {
                errors.push(ValidationError::new(
                    ValidationErrorKind::ContradictoryReference,
                    format!(
                        "Request '{}' names program '{}' but class '{}' belongs to '{program}'",
                        r.id, r.program_id, r.class_id
                    ),
                ));
            }
        }

        if !triples.insert((r.class_id.as_str(), r.module_id.as_str(), r.staff_id.as_str())) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateRequest,
                format!(
                    "Duplicate obligation (class '{}', module '{}', staff '{}')",
                    r.class_id, r.module_id, r.staff_id
                ),
            ));
        }
    }

    for pref in &input.preferences {
        if !pref.window.is_within_day() {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidWindow,
                format!(
                    "Preference of staff '{}' has an empty or out-of-day window",
                    pref.staff_id
                ),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn collect_ids<'a>(
    errors: &mut Vec<ValidationError>,
    what: &str,
    ids: impl Iterator<Item = &'a String>,
) -> HashSet<&'a str> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate {what} ID: {id}"),
            ));
        }
    }
    seen
}

/// Verifies a produced timetable.
///
/// Checks:
/// 1. No staff, room or class-stream overlaps
/// 2. Each session lasts the credit-tier duration, or each half of it for a
///    split request (exactly two halves)
/// 3. Each session lies on a scope day, inside operating hours, clear of breaks
/// 4. Each entry references a request of the input and that request's
///    module, staff and class, and a known room
pub fn validate_schedule(
    input: &SchedulingInput,
    entries: &[ScheduleEntry],
    config: &SchedulerConfig,
) -> Result<(), Vec<Violation>> {
    let grid = TimeGrid::new(&input.scope, config);
    let mut violations = Vec::new();

    let requests: HashMap<&str, _> = input.requests.iter().map(|r| (r.id.as_str(), r)).collect();
    let credits: HashMap<&str, u32> = input.modules.iter().map(|m| (m.id.as_str(), m.credit)).collect();
    let rooms: HashSet<&str> = input.rooms.iter().map(|r| r.id.as_str()).collect();
    let streams: HashMap<&str, &str> = input
        .classes
        .iter()
        .map(|c| (c.id.as_str(), c.stream.as_str()))
        .collect();

    let mut per_request: HashMap<&str, Vec<&ScheduleEntry>> = HashMap::new();
    for e in entries {
        let Some(req) = requests.get(e.request_id.as_str()) else {
            violations.push(Violation::new(
                ViolationKind::Orphaned,
                &e.request_id,
                format!("Entry at {} references an unknown request", e.slot()),
            ));
            continue;
        };
        if req.module_id != e.module_id
            || req.staff_id != e.staff_id
            || req.class_id != e.class_id
            || streams.get(e.class_id.as_str()) != Some(&e.stream.as_str())
            || !rooms.contains(e.room_id.as_str())
        {
            violations.push(Violation::new(
                ViolationKind::Orphaned,
                &e.request_id,
                format!("Entry at {} does not match its request's resources", e.slot()),
            ));
        }
        if !grid.admits(&e.slot()) {
            violations.push(Violation::new(
                ViolationKind::OutsideGrid,
                &e.request_id,
                format!("Session {} is outside the teaching grid", e.slot()),
            ));
        }
        per_request.entry(e.request_id.as_str()).or_default().push(e);
    }

    let mut request_ids: Vec<&str> = per_request.keys().copied().collect();
    request_ids.sort_unstable();
    for id in request_ids {
        let sessions = &per_request[id];
        let Some(credit) = requests
            .get(id)
            .and_then(|r| credits.get(r.module_id.as_str()))
            .copied()
        else {
            continue;
        };
        let expected = grid.duration_for(credit);
        let mut lengths: Vec<i32> = sessions.iter().map(|e| e.duration_min()).collect();
        lengths.sort_unstable();
        let ok = match lengths.as_slice() {
            [whole] => *whole == expected,
            [a, b] => {
                let (h1, h2) = split_durations(expected);
                (*a, *b) == (h1.min(h2), h1.max(h2))
            }
            _ => {
                violations.push(Violation::new(
                    ViolationKind::SessionCount,
                    id,
                    format!("Request has {} sessions", sessions.len()),
                ));
                continue;
            }
        };
        if !ok {
            violations.push(Violation::new(
                ViolationKind::Duration,
                id,
                format!("Session lengths {lengths:?} do not match the {expected}-minute tier"),
            ));
        }
    }

    for c in detect_conflicts(entries) {
        let kind = match c.kind {
            ConflictKind::Staff => ViolationKind::StaffOverlap,
            ConflictKind::Room => ViolationKind::RoomOverlap,
            ConflictKind::Class => ViolationKind::ClassOverlap,
        };
        violations.push(Violation::new(kind, &entries[c.entry_a].request_id, c.description));
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}

/// Lengths of the two halves of a split session.
pub fn split_durations(duration_min: i32) -> (i32, i32) {
    let first = duration_min / 2;
    (first, duration_min - first)
}
