//! Teaching obligations and the academic records they reference.
//!
//! A [`SchedulingRequest`] says "staff S teaches module M to class group C".
//! Modules, programs and class groups carry the attributes that drive
//! duration, priority and room suitability.

use serde::{Deserialize, Serialize};

use super::{Day, TimeWindow};

/// A teaching obligation to place in the timetable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulingRequest {
    /// Unique request identifier.
    pub id: String,
    /// Class group (class + stream) being taught.
    pub class_id: String,
    pub module_id: String,
    pub staff_id: String,
    pub program_id: String,
}

impl SchedulingRequest {
    /// Creates a request.
    pub fn new(
        id: impl Into<String>,
        class_id: impl Into<String>,
        module_id: impl Into<String>,
        staff_id: impl Into<String>,
        program_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            class_id: class_id.into(),
            module_id: module_id.into(),
            staff_id: staff_id.into(),
            program_id: program_id.into(),
        }
    }
}

/// A module (course unit).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub id: String,
    pub code: String,
    /// Credit value; drives session duration and priority.
    pub credit: u32,
    /// Module type (e.g., "Lecture", "Laboratory"). Also the required room kind.
    pub kind: String,
    /// Owning department.
    pub department: String,
}

impl Module {
    /// Creates a lecture module worth 10 credits.
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            code: id.clone(),
            id,
            credit: 10,
            kind: "Lecture".into(),
            department: String::new(),
        }
    }

    /// Sets the module code.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }

    /// Sets the credit value.
    pub fn with_credit(mut self, credit: u32) -> Self {
        self.credit = credit;
        self
    }

    /// Sets the module kind.
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    /// Sets the owning department.
    pub fn with_department(mut self, department: impl Into<String>) -> Self {
        self.department = department.into();
        self
    }
}

/// An academic program.
///
/// Programs may narrow the scope's grid with their own daily window,
/// extra break windows and teaching days. Recovery strategies relax these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub id: String,
    pub name: String,
    /// Capability level (e.g., "6", "8").
    pub level: String,
    pub department: String,
    /// Daily teaching window. `None` = the scope's operating window.
    #[serde(default)]
    pub window: Option<TimeWindow>,
    /// Program-specific breaks on top of the scope's.
    #[serde(default)]
    pub breaks: Vec<TimeWindow>,
    /// Teaching days. Empty = every scope day.
    #[serde(default)]
    pub days: Vec<Day>,
}

impl Program {
    /// Creates a program with no extra constraints.
    pub fn new(id: impl Into<String>, level: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            level: level.into(),
            department: String::new(),
            window: None,
            breaks: Vec::new(),
            days: Vec::new(),
        }
    }

    /// Sets the department.
    pub fn with_department(mut self, department: impl Into<String>) -> Self {
        self.department = department.into();
        self
    }

    /// Sets the daily teaching window.
    pub fn with_window(mut self, window: TimeWindow) -> Self {
        self.window = Some(window);
        self
    }

    /// Adds a program-specific break.
    pub fn with_break(mut self, window: TimeWindow) -> Self {
        self.breaks.push(window);
        self
    }

    /// Restricts teaching days.
    pub fn with_days(mut self, days: Vec<Day>) -> Self {
        self.days = days;
        self
    }
}

/// One stream of a class.
///
/// Parallel streams of the same class share `name` and differ in `stream`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassGroup {
    pub id: String,
    pub name: String,
    pub stream: String,
    /// Headcount; rooms must seat at least this many.
    pub capacity: u32,
    pub program_id: String,
}

impl ClassGroup {
    /// Creates a class group.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        stream: impl Into<String>,
        capacity: u32,
        program_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            stream: stream.into(),
            capacity,
            program_id: program_id.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_builder() {
        let m = Module::new("M1")
            .with_code("CS101")
            .with_credit(16)
            .with_kind("Laboratory")
            .with_department("CS");
        assert_eq!(m.id, "M1");
        assert_eq!(m.code, "CS101");
        assert_eq!(m.credit, 16);
        assert_eq!(m.kind, "Laboratory");
        assert_eq!(m.department, "CS");
    }

    #[test]
    fn test_module_defaults() {
        let m = Module::new("M2");
        assert_eq!(m.code, "M2");
        assert_eq!(m.credit, 10);
        assert_eq!(m.kind, "Lecture");
    }

    #[test]
    fn test_program_builder() {
        let p = Program::new("P1", "8")
            .with_department("CS")
            .with_window(TimeWindow::hours((8, 0), (16, 0)))
            .with_break(TimeWindow::hours((12, 0), (13, 0)))
            .with_days(vec![Day::Mon, Day::Wed]);
        assert_eq!(p.level, "8");
        assert_eq!(p.window, Some(TimeWindow::hours((8, 0), (16, 0))));
        assert_eq!(p.breaks.len(), 1);
        assert_eq!(p.days, vec![Day::Mon, Day::Wed]);
    }

    #[test]
    fn test_program_deserialize_defaults() {
        let p: Program = serde_json::from_str(
            r#"{"id":"P1","name":"BSc","level":"7","department":"CS"}"#,
        )
        .unwrap();
        assert!(p.window.is_none());
        assert!(p.breaks.is_empty());
        assert!(p.days.is_empty());
    }
}
