//! Resource availability index.
//!
//! Tracks, per staff member, room and class group, the slots already
//! committed in the current run. It is the single source of truth for the
//! mutual-exclusion rules while a run is in progress: the placers, the
//! optimizer and the resolver all check and book through it.
//!
//! # Complexity
//! `is_available`, `book` and `release` are O(b) where b is the number of
//! bookings held by that one resource.

use std::collections::HashMap;

use crate::models::TimeSlot;

/// Handle of a session inside a run.
pub type EntryId = usize;

/// A bookable resource, by catalog handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKey {
    Staff(usize),
    Room(usize),
    Class(usize),
}

/// The three resources every session occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionResources {
    pub staff: usize,
    pub room: usize,
    pub class: usize,
}

impl SessionResources {
    pub fn keys(&self) -> [ResourceKey; 3] {
        [
            ResourceKey::Staff(self.staff),
            ResourceKey::Room(self.room),
            ResourceKey::Class(self.class),
        ]
    }
}

/// A committed slot for one resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Booking {
    pub slot: TimeSlot,
    pub entry: EntryId,
}

/// Per-resource committed slots.
#[derive(Debug, Clone, Default)]
pub struct AvailabilityIndex {
    bookings: HashMap<ResourceKey, Vec<Booking>>,
}

impl AvailabilityIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// True iff no booking of `key` on the slot's day overlaps the slot.
    pub fn is_available(&self, key: ResourceKey, slot: &TimeSlot) -> bool {
        self.is_available_except(key, slot, None)
    }

    /// Like [`is_available`](Self::is_available), disregarding the bookings
    /// of `ignore` (the session being moved).
    pub fn is_available_except(&self, key: ResourceKey, slot: &TimeSlot, ignore: Option<EntryId>) -> bool {
        self.bookings.get(&key).map_or(true, |list| {
            !list
                .iter()
                .any(|b| Some(b.entry) != ignore && b.slot.overlaps(slot))
        })
    }

    /// Whether all three resources of a session are free.
    pub fn is_free(&self, resources: &SessionResources, slot: &TimeSlot, ignore: Option<EntryId>) -> bool {
        resources
            .keys()
            .iter()
            .all(|&k| self.is_available_except(k, slot, ignore))
    }

    /// Records a booking. Does not check availability.
    pub fn book(&mut self, key: ResourceKey, slot: TimeSlot, entry: EntryId) {
        self.bookings.entry(key).or_default().push(Booking { slot, entry });
    }

    /// Books all three resources of a session.
    pub fn book_session(&mut self, resources: &SessionResources, slot: TimeSlot, entry: EntryId) {
        for key in resources.keys() {
            self.book(key, slot, entry);
        }
    }

    /// Removes every booking of `entry` on `key`. Returns whether any existed.
    pub fn release(&mut self, key: ResourceKey, entry: EntryId) -> bool {
        let Some(list) = self.bookings.get_mut(&key) else {
            return false;
        };
        let before = list.len();
        list.retain(|b| b.entry != entry);
        before != list.len()
    }

    /// Releases all three resources of a session.
    pub fn release_session(&mut self, resources: &SessionResources, entry: EntryId) {
        for key in resources.keys() {
            self.release(key, entry);
        }
    }

    /// Bookings held by one resource, in insertion order.
    pub fn bookings(&self, key: ResourceKey) -> &[Booking] {
        self.bookings.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total bookings across all resources.
    pub fn booking_count(&self) -> usize {
        self.bookings.values().map(Vec::len).sum()
    }
}
