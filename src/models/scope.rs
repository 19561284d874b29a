//! Run scope and the complete input of one generation run.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{
    ClassGroup, Day, Module, Program, Room, SchedulingRequest, TeacherPreference, TimeWindow,
};

/// Identity of a scope: one academic year and semester.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScopeKey {
    pub academic_year: String,
    pub semester: u32,
}

impl ScopeKey {
    /// Creates a scope key.
    pub fn new(academic_year: impl Into<String>, semester: u32) -> Self {
        Self {
            academic_year: academic_year.into(),
            semester,
        }
    }
}

impl fmt::Display for ScopeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/S{}", self.academic_year, self.semester)
    }
}

/// Grid boundaries for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulingScope {
    pub academic_year: String,
    pub semester: u32,
    /// Daily operating hours.
    pub operating_window: TimeWindow,
    /// Break and lunch windows, applied every day.
    #[serde(default)]
    pub break_windows: Vec<TimeWindow>,
    /// Teaching days.
    #[serde(default = "all_days")]
    pub days: Vec<Day>,
}

fn all_days() -> Vec<Day> {
    Day::ALL.to_vec()
}

impl SchedulingScope {
    /// Creates a Monday–Friday scope with no breaks.
    pub fn new(academic_year: impl Into<String>, semester: u32, operating_window: TimeWindow) -> Self {
        Self {
            academic_year: academic_year.into(),
            semester,
            operating_window,
            break_windows: Vec::new(),
            days: all_days(),
        }
    }

    /// Adds a break window.
    pub fn with_break(mut self, window: TimeWindow) -> Self {
        self.break_windows.push(window);
        self
    }

    /// Restricts teaching days.
    pub fn with_days(mut self, days: Vec<Day>) -> Self {
        self.days = days;
        self
    }

    /// Scope identity.
    pub fn key(&self) -> ScopeKey {
        ScopeKey::new(self.academic_year.clone(), self.semester)
    }
}

/// Everything a run consumes, as loaded by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulingInput {
    pub scope: SchedulingScope,
    pub requests: Vec<SchedulingRequest>,
    pub modules: Vec<Module>,
    pub programs: Vec<Program>,
    pub classes: Vec<ClassGroup>,
    pub rooms: Vec<Room>,
    #[serde(default)]
    pub preferences: Vec<TeacherPreference>,
}

impl SchedulingInput {
    /// Creates an input with no records.
    pub fn new(scope: SchedulingScope) -> Self {
        Self {
            scope,
            requests: Vec::new(),
            modules: Vec::new(),
            programs: Vec::new(),
            classes: Vec::new(),
            rooms: Vec::new(),
            preferences: Vec::new(),
        }
    }

    pub fn with_request(mut self, request: SchedulingRequest) -> Self {
        self.requests.push(request);
        self
    }

    pub fn with_module(mut self, module: Module) -> Self {
        self.modules.push(module);
        self
    }

    pub fn with_program(mut self, program: Program) -> Self {
        self.programs.push(program);
        self
    }

    pub fn with_class(mut self, class: ClassGroup) -> Self {
        self.classes.push(class);
        self
    }

    pub fn with_room(mut self, room: Room) -> Self {
        self.rooms.push(room);
        self
    }

    pub fn with_preference(mut self, preference: TeacherPreference) -> Self {
        self.preferences.push(preference);
        self
    }
}
