//! Read-only snapshot of one run's input.
//!
//! Built once at run start. Every record is stored by position and the
//! algorithm refers to it through `usize` handles, so nothing is looked up
//! by string id after this point.

use std::collections::HashMap;

use crate::error::SchedulingError;
use crate::models::{
    ClassGroup, Module, Program, Room, SchedulingInput, SchedulingRequest, TeacherPreference,
    TimeSlot,
};
use crate::validation::{ValidationError, ValidationErrorKind};

/// A request with its references resolved to handles.
#[derive(Debug, Clone)]
pub struct Job {
    pub request: SchedulingRequest,
    pub module: usize,
    pub program: usize,
    pub class: usize,
    pub staff: usize,
}

/// Resolved, indexed input.
#[derive(Debug, Clone)]
pub struct Catalog {
    pub modules: Vec<Module>,
    pub programs: Vec<Program>,
    pub classes: Vec<ClassGroup>,
    pub rooms: Vec<Room>,
    /// Interned staff ids.
    pub staff: Vec<String>,
    /// Requests in input order.
    pub jobs: Vec<Job>,
    preferences: Vec<Vec<TeacherPreference>>,
}

impl Catalog {
    /// Resolves every request reference.
    ///
    /// # Errors
    /// `InputInconsistency` when a request names an unknown module, program
    /// or class.
    pub fn build(input: &SchedulingInput) -> Result<Self, SchedulingError> {
        let module_ix = index_by(&input.modules, |m| &m.id);
        let program_ix = index_by(&input.programs, |p| &p.id);
        let class_ix = index_by(&input.classes, |c| &c.id);

        let mut staff: Vec<String> = Vec::new();
        let mut staff_ix: HashMap<String, usize> = HashMap::new();
        let mut jobs = Vec::with_capacity(input.requests.len());
        let mut errors = Vec::new();

        for req in &input.requests {
            let module = module_ix.get(req.module_id.as_str()).copied();
            let program = program_ix.get(req.program_id.as_str()).copied();
            let class = class_ix.get(req.class_id.as_str()).copied();
            let (Some(module), Some(program), Some(class)) = (module, program, class) else {
                errors.push(ValidationError::new(
                    ValidationErrorKind::UnknownReference,
                    format!("Request '{}' has unresolved references", req.id),
                ));
                continue;
            };
            let staff_handle = *staff_ix.entry(req.staff_id.clone()).or_insert_with(|| {
                staff.push(req.staff_id.clone());
                staff.len() - 1
            });
            jobs.push(Job {
                request: req.clone(),
                module,
                program,
                class,
                staff: staff_handle,
            });
        }

        if !errors.is_empty() {
            return Err(SchedulingError::InputInconsistency { errors });
        }

        let mut preferences = vec![Vec::new(); staff.len()];
        for pref in &input.preferences {
            if let Some(&s) = staff_ix.get(&pref.staff_id) {
                preferences[s].push(pref.clone());
            }
        }

        Ok(Self {
            modules: input.modules.clone(),
            programs: input.programs.clone(),
            classes: input.classes.clone(),
            rooms: input.rooms.clone(),
            staff,
            jobs,
            preferences,
        })
    }

    #[inline]
    pub fn job(&self, job: usize) -> &Job {
        &self.jobs[job]
    }

    #[inline]
    pub fn module_of(&self, job: usize) -> &Module {
        &self.modules[self.jobs[job].module]
    }

    #[inline]
    pub fn program_of(&self, job: usize) -> &Program {
        &self.programs[self.jobs[job].program]
    }

    #[inline]
    pub fn class_of(&self, job: usize) -> &ClassGroup {
        &self.classes[self.jobs[job].class]
    }

    /// Highest weight among the staff member's preferences that match the
    /// slot; 0 when none match.
    pub fn preference_weight(&self, staff: usize, slot: &TimeSlot) -> i32 {
        self.preferences
            .get(staff)
            .into_iter()
            .flatten()
            .filter(|p| p.matches(slot))
            .map(|p| p.weight)
            .max()
            .unwrap_or(0)
    }

    /// Whether a room can host the job's sessions.
    pub fn room_suits(&self, job: usize, room: usize, any_kind: bool) -> bool {
        let module = self.module_of(job);
        let class = self.class_of(job);
        self.rooms[room].suits(&module.kind, class.capacity, any_kind)
    }

    /// Rooms that can host the job, in input order.
    pub fn suitable_rooms(&self, job: usize, any_kind: bool) -> Vec<usize> {
        (0..self.rooms.len())
            .filter(|&r| self.room_suits(job, r, any_kind))
            .collect()
    }
}

fn index_by<T>(items: &[T], key: impl Fn(&T) -> &String) -> HashMap<&str, usize> {
    let mut map = HashMap::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        // First occurrence wins; duplicates are reported by input validation.
        map.entry(key(item).as_str()).or_insert(i);
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{hm, Day, SchedulingScope, TimeWindow};

    fn input() -> SchedulingInput {
        SchedulingInput::new(SchedulingScope::new(
            "2024/2025",
            1,
            TimeWindow::hours((8, 0), (18, 0)),
        ))
        .with_module(Module::new("M1").with_kind("Lecture"))
        .with_module(Module::new("M2").with_kind("Laboratory"))
        .with_program(Program::new("P1", "6"))
        .with_class(ClassGroup::new("C1", "BIT1", "A", 40, "P1"))
        .with_room(Room::new("R-small", "Lecture", 20))
        .with_room(Room::new("R-big", "Lecture", 80))
        .with_room(Room::new("Lab", "Laboratory", 50))
        .with_request(SchedulingRequest::new("Q1", "C1", "M1", "S1", "P1"))
        .with_request(SchedulingRequest::new("Q2", "C1", "M2", "S2", "P1"))
        .with_request(SchedulingRequest::new("Q3", "C1", "M2", "S1", "P1"))
        .with_preference(TeacherPreference::new(
            "S1",
            Day::Mon,
            TimeWindow::hours((9, 0), (11, 0)),
            5,
        ))
        .with_preference(TeacherPreference::new(
            "S1",
            Day::Mon,
            TimeWindow::hours((8, 0), (12, 0)),
            2,
        ))
    }

    #[test]
    fn test_build_resolves_handles() {
        let cat = Catalog::build(&input()).unwrap();
        assert_eq!(cat.jobs.len(), 3);
        assert_eq!(cat.staff, vec!["S1", "S2"]);
        assert_eq!(cat.jobs[0].staff, 0);
        assert_eq!(cat.jobs[1].staff, 1);
        assert_eq!(cat.jobs[2].staff, 0);
        assert_eq!(cat.module_of(1).id, "M2");
        assert_eq!(cat.class_of(0).id, "C1");
        assert_eq!(cat.program_of(0).id, "P1");
    }

    #[test]
    fn test_unknown_reference() {
        let bad = input().with_request(SchedulingRequest::new("Q9", "C1", "NOPE", "S1", "P1"));
        let err = Catalog::build(&bad).unwrap_err();
        assert!(matches!(err, SchedulingError::InputInconsistency { .. }));
    }

    #[test]
    fn test_preference_weight_takes_max() {
        let cat = Catalog::build(&input()).unwrap();
        let at_nine = TimeSlot::new(Day::Mon, hm(9, 0), hm(11, 0));
        let at_eight = TimeSlot::new(Day::Mon, hm(8, 0), hm(10, 0));
        let tuesday = TimeSlot::new(Day::Tue, hm(9, 0), hm(11, 0));
        assert_eq!(cat.preference_weight(0, &at_nine), 5);
        assert_eq!(cat.preference_weight(0, &at_eight), 2);
        assert_eq!(cat.preference_weight(0, &tuesday), 0);
        assert_eq!(cat.preference_weight(1, &at_nine), 0);
    }

    #[test]
    fn test_suitable_rooms() {
        let cat = Catalog::build(&input()).unwrap();
        assert_eq!(cat.suitable_rooms(0, false), vec![1]); // only big lecture room seats 40
        assert_eq!(cat.suitable_rooms(1, false), vec![2]);
        assert_eq!(cat.suitable_rooms(0, true), vec![1, 2]);
    }
}
