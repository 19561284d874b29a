//! Timetable quality metrics (KPIs).
//!
//! Computes quality indicators from a produced timetable and its input.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Placement rate | Placed requests / requests |
//! | Staff idle time | Sum of gaps between a staff member's sessions on a day |
//! | Longest run | Longest back-to-back teaching stretch of any staff member |
//! | Room changes | Times a class moves room between consecutive sessions |
//! | Room utilization | Booked minutes / available teaching minutes |

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::Serialize;

use crate::models::{
    entries_for_class, entries_for_room, entries_for_staff, ScheduleEntry, SchedulingInput,
};

/// Timetable performance indicators.
///
/// All durations are in minutes.
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleKpi {
    pub requests: usize,
    pub placed_requests: usize,
    pub sessions: usize,
    /// placed / requests (1.0 for an empty input).
    pub placement_rate: f64,
    /// Sum of idle gaps between consecutive sessions of each staff member on a day.
    pub staff_idle_min: i32,
    /// Longest stretch a staff member teaches with gaps ≤ the tolerance.
    pub max_consecutive_min: i32,
    /// Room changes between consecutive sessions of one class on one day.
    pub class_room_changes: usize,
    /// Average room utilization (0.0..1.0).
    pub avg_room_utilization: f64,
    /// Per-room utilization.
    pub utilization_by_room: HashMap<String, f64>,
}

impl ScheduleKpi {
    /// Computes KPIs.
    ///
    /// # Arguments
    /// * `input` - The run input (requests, rooms and grid bounds).
    /// * `entries` - The produced sessions.
    /// * `tolerance_min` - Largest gap still counted as back-to-back.
    pub fn calculate(input: &SchedulingInput, entries: &[ScheduleEntry], tolerance_min: i32) -> Self {
        let requests = input.requests.len();
        let placed_requests = entries
            .iter()
            .map(|e| e.request_id.as_str())
            .collect::<HashSet<_>>()
            .len();
        let placement_rate = if requests == 0 {
            1.0
        } else {
            placed_requests as f64 / requests as f64
        };

        let mut staff_idle_min = 0;
        let mut max_consecutive_min = 0;
        for staff in distinct(entries, |e| e.staff_id.as_str()) {
            let sessions = entries_for_staff(entries, staff);
            let mut run = 0;
            for (k, e) in sessions.iter().enumerate() {
                run += e.duration_min();
                if let Some(next) = sessions.get(k + 1).filter(|n| n.day == e.day) {
                    let gap = (next.start_min - e.end_min).max(0);
                    staff_idle_min += gap;
                    if gap > tolerance_min {
                        max_consecutive_min = max_consecutive_min.max(run);
                        run = 0;
                    }
                } else {
                    max_consecutive_min = max_consecutive_min.max(run);
                    run = 0;
                }
            }
        }

        let class_room_changes = distinct(entries, |e| e.class_id.as_str())
            .into_iter()
            .map(|class| {
                entries_for_class(entries, class)
                    .windows(2)
                    .filter(|w| w[0].day == w[1].day && w[0].room_id != w[1].room_id)
                    .count()
            })
            .sum();

        let scope = &input.scope;
        let daily = scope.operating_window.duration_min()
            - scope
                .break_windows
                .iter()
                .filter_map(|b| b.intersect(&scope.operating_window))
                .map(|b| b.duration_min())
                .sum::<i32>();
        let available = f64::from(daily.max(0)) * scope.days.len() as f64;

        let utilization_by_room: HashMap<String, f64> = input
            .rooms
            .iter()
            .map(|r| {
                let minutes: i32 = entries_for_room(entries, &r.id)
                    .iter()
                    .map(|e| e.duration_min())
                    .sum();
                let u = if available > 0.0 {
                    f64::from(minutes) / available
                } else {
                    0.0
                };
                (r.id.clone(), u)
            })
            .collect();
        let avg_room_utilization = if utilization_by_room.is_empty() {
            0.0
        } else {
            utilization_by_room.values().sum::<f64>() / utilization_by_room.len() as f64
        };

        Self {
            requests,
            placed_requests,
            sessions: entries.len(),
            placement_rate,
            staff_idle_min,
            max_consecutive_min,
            class_room_changes,
            avg_room_utilization,
            utilization_by_room,
        }
    }

    /// Whether the timetable meets the given quality thresholds.
    pub fn meets_thresholds(&self, min_placement_rate: f64, max_consecutive_min: i32) -> bool {
        self.placement_rate >= min_placement_rate && self.max_consecutive_min <= max_consecutive_min
    }
}

/// Distinct keys in id order.
fn distinct<'a>(entries: &'a [ScheduleEntry], key: impl Fn(&'a ScheduleEntry) -> &'a str) -> BTreeSet<&'a str> {
    entries.iter().map(key).collect()
}

impl Default for ScheduleKpi {
    fn default() -> Self {
        Self {
            requests: 0,
            placed_requests: 0,
            sessions: 0,
            placement_rate: 1.0,
            staff_idle_min: 0,
            max_consecutive_min: 0,
            class_room_changes: 0,
            avg_room_utilization: 0.0,
            utilization_by_room: HashMap::new(),
        }
    }
}
