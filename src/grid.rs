//! Weekly slot grid.
//!
//! Enumerates candidate teaching slots for a scope. A cursor walks each day
//! from the window start in steps of `slot_step_min`; when the cursor lands
//! in a break, or a candidate would cross one, the cursor jumps to the end of
//! that break instead of stepping through it.
//!
//! The grid depends only on the scope and configuration, so enumerating the
//! same query twice yields the same sequence.
//!
//! # Example
//!
//! ```
//! use u_timetable::config::SchedulerConfig;
//! use u_timetable::grid::TimeGrid;
//! use u_timetable::models::{hm, Day, SchedulingScope, TimeWindow};
//!
//! let scope = SchedulingScope::new("2024/2025", 1, TimeWindow::hours((8, 0), (12, 0)))
//!     .with_break(TimeWindow::hours((10, 0), (10, 30)))
//!     .with_days(vec![Day::Mon]);
//! let grid = TimeGrid::new(&scope, &SchedulerConfig::default());
//!
//! let query = grid.full_query(60);
//! let starts: Vec<i32> = grid.slots(&query).map(|s| s.start_min).collect();
//! assert_eq!(starts, vec![hm(8, 0), hm(8, 30), hm(9, 0), hm(10, 30), hm(11, 0)]);
//! ```

use crate::config::{DurationPolicy, SchedulerConfig};
use crate::models::{Day, SchedulingScope, TimeSlot, TimeWindow};

/// Slot grid for one scope.
#[derive(Debug, Clone)]
pub struct TimeGrid {
    operating: TimeWindow,
    breaks: Vec<TimeWindow>,
    days: Vec<Day>,
    step_min: i32,
    durations: DurationPolicy,
}

/// What to enumerate: which days, which daily window, which extra breaks,
/// and how long each slot is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotQuery {
    pub days: Vec<Day>,
    pub window: TimeWindow,
    pub extra_breaks: Vec<TimeWindow>,
    pub duration_min: i32,
}

impl TimeGrid {
    /// Builds the grid for a scope.
    pub fn new(scope: &SchedulingScope, config: &SchedulerConfig) -> Self {
        let mut breaks = scope.break_windows.clone();
        breaks.sort_by_key(|w| w.start_min);
        let mut days = scope.days.clone();
        days.sort();
        days.dedup();
        Self {
            operating: scope.operating_window,
            breaks,
            days,
            step_min: config.slot_step_min.max(1),
            durations: config.durations.clone(),
        }
    }

    /// Session duration (minutes) for a module credit.
    pub fn duration_for(&self, credit: u32) -> i32 {
        self.durations.duration_for(credit)
    }

    pub fn operating_window(&self) -> TimeWindow {
        self.operating
    }

    pub fn days(&self) -> &[Day] {
        &self.days
    }

    pub fn breaks(&self) -> &[TimeWindow] {
        &self.breaks
    }

    /// Whether a slot satisfies the scope bounds: a scope day, inside the
    /// operating window, clear of every break.
    pub fn admits(&self, slot: &TimeSlot) -> bool {
        let window = slot.window();
        window.is_valid()
            && self.days.contains(&slot.day)
            && self.operating.covers(&window)
            && !self.breaks.iter().any(|b| b.overlaps(&window))
    }

    /// Every scope day, the full operating window, no extra breaks.
    pub fn full_query(&self, duration_min: i32) -> SlotQuery {
        SlotQuery {
            days: self.days.clone(),
            window: self.operating,
            extra_breaks: Vec::new(),
            duration_min,
        }
    }

    /// Lazily enumerates the slots matching `query`.
    ///
    /// Days outside the scope are skipped and the window is clipped to the
    /// operating window.
    pub fn slots<'a>(&'a self, query: &'a SlotQuery) -> Slots<'a> {
        let window = self.operating.intersect(&query.window);
        Slots {
            grid: self,
            query,
            window,
            day_pos: 0,
            cursor: window.map(|w| w.start_min).unwrap_or(0),
        }
    }

    fn blocking_break(&self, extra: &[TimeWindow], candidate: &TimeWindow) -> Option<TimeWindow> {
        self.breaks
            .iter()
            .chain(extra.iter())
            .filter(|b| b.overlaps(candidate))
            .max_by_key(|b| b.end_min)
            .copied()
    }
}

/// Lazy slot sequence produced by [`TimeGrid::slots`].
#[derive(Debug, Clone)]
pub struct Slots<'a> {
    grid: &'a TimeGrid,
    query: &'a SlotQuery,
    window: Option<TimeWindow>,
    day_pos: usize,
    cursor: i32,
}

impl Iterator for Slots<'_> {
    type Item = TimeSlot;

    fn next(&mut self) -> Option<TimeSlot> {
        let window = self.window?;
        let duration = self.query.duration_min;
        if duration <= 0 {
            return None;
        }

        loop {
            let day = *self.query.days.get(self.day_pos)?;
            let end = match self.cursor.checked_add(duration) {
                Some(end) if end <= window.end_min && self.grid.days.contains(&day) => end,
                _ => {
                    self.day_pos += 1;
                    self.cursor = window.start_min;
                    continue;
                }
            };

            let candidate = TimeWindow::new(self.cursor, end);
            if let Some(b) = self.grid.blocking_break(&self.query.extra_breaks, &candidate) {
                // Jump past the break; never move backwards.
                self.cursor = b.end_min.max(self.cursor.saturating_add(1));
                continue;
            }

            self.cursor = self.cursor.saturating_add(self.grid.step_min);
            return Some(TimeSlot::new(day, candidate.start_min, candidate.end_min));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::hm;

    fn scope() -> SchedulingScope {
        SchedulingScope::new("2024/2025", 1, TimeWindow::hours((8, 0), (18, 0)))
            .with_break(TimeWindow::hours((10, 0), (10, 30)))
            .with_break(TimeWindow::hours((13, 0), (14, 0)))
    }

    fn grid() -> TimeGrid {
        TimeGrid::new(&scope(), &SchedulerConfig::default())
    }

    #[test]
    fn test_slots_skip_breaks() {
        let g = grid();
        let q = g.full_query(120);
        for s in g.slots(&q) {
            assert!(g.admits(&s), "slot {s} not admitted");
            assert_eq!(s.duration_min(), 120);
        }
    }

    #[test]
    fn test_slot_sequence_monday() {
        let g = grid();
        let mut q = g.full_query(120);
        q.days = vec![Day::Mon];
        let starts: Vec<i32> = g.slots(&q).map(|s| s.start_min).collect();
        // 08:00 fits before the 10:00 break; 08:30.. would cross it.
        // After the break: 10:30, 11:00 end before 13:00; lunch; 14:00..16:00.
        assert_eq!(
            starts,
            vec![
                hm(8, 0),
                hm(10, 30),
                hm(11, 0),
                hm(14, 0),
                hm(14, 30),
                hm(15, 0),
                hm(15, 30),
                hm(16, 0)
            ]
        );
    }

    #[test]
    fn test_restartable() {
        let g = grid();
        let q = g.full_query(150);
        let first: Vec<TimeSlot> = g.slots(&q).collect();
        let second: Vec<TimeSlot> = g.slots(&q).collect();
        assert!(!first.is_empty());
        assert_eq!(first, second);
    }

    #[test]
    fn test_days_in_order() {
        let g = grid();
        let q = g.full_query(60);
        let days: Vec<Day> = g.slots(&q).map(|s| s.day).collect();
        let mut sorted = days.clone();
        sorted.sort();
        assert_eq!(days, sorted);
        assert_eq!(*days.first().unwrap(), Day::Mon);
        assert_eq!(*days.last().unwrap(), Day::Fri);
    }

    #[test]
    fn test_query_window_clipped_and_extra_breaks() {
        let g = grid();
        let q = SlotQuery {
            days: vec![Day::Tue],
            window: TimeWindow::hours((7, 0), (10, 0)),
            extra_breaks: vec![TimeWindow::hours((8, 30), (9, 0))],
            duration_min: 30,
        };
        let starts: Vec<i32> = g.slots(&q).map(|s| s.start_min).collect();
        assert_eq!(starts, vec![hm(8, 0), hm(9, 0), hm(9, 30)]);
    }

    #[test]
    fn test_day_outside_scope_skipped() {
        let s = scope().with_days(vec![Day::Mon, Day::Tue]);
        let g = TimeGrid::new(&s, &SchedulerConfig::default());
        let q = SlotQuery {
            days: vec![Day::Fri, Day::Tue],
            window: g.operating_window(),
            extra_breaks: Vec::new(),
            duration_min: 180,
        };
        assert!(g.slots(&q).all(|slot| slot.day == Day::Tue));
        assert!(g.slots(&q).count() > 0);
    }

    #[test]
    fn test_duration_longer_than_window() {
        let g = grid();
        let q = g.full_query(11 * 60);
        assert_eq!(g.slots(&q).count(), 0);
    }

    #[test]
    fn test_window_at_integer_limit_terminates() {
        let s = SchedulingScope::new("2024/2025", 1, TimeWindow::new(i32::MAX - 100, i32::MAX))
            .with_days(vec![Day::Mon, Day::Tue]);
        let g = TimeGrid::new(&s, &SchedulerConfig::default());
        let q = g.full_query(60);
        let starts: Vec<i32> = g.slots(&q).map(|s| s.start_min).collect();
        assert_eq!(
            starts,
            vec![i32::MAX - 100, i32::MAX - 70, i32::MAX - 100, i32::MAX - 70]
        );
    }

    #[test]
    fn test_admits() {
        let g = grid();
        assert!(g.admits(&TimeSlot::new(Day::Mon, hm(8, 0), hm(10, 0))));
        assert!(!g.admits(&TimeSlot::new(Day::Mon, hm(9, 0), hm(11, 0)))); // crosses break
        assert!(!g.admits(&TimeSlot::new(Day::Mon, hm(17, 0), hm(19, 0)))); // past close
        assert!(!g.admits(&TimeSlot::new(Day::Mon, hm(7, 0), hm(9, 0)))); // before open
        assert!(g.admits(&TimeSlot::new(Day::Fri, hm(14, 0), hm(18, 0))));
    }

    #[test]
    fn test_duration_for() {
        let g = grid();
        assert_eq!(g.duration_for(10), 120);
        assert_eq!(g.duration_for(12), 150);
        assert_eq!(g.duration_for(15), 180);
    }
}
