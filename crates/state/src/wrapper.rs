// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! State wrappers and the in-memory state store.

use crate::records::PartState;
use chrono::{DateTime, Utc};
use partcraft_core::Step;
use std::collections::HashMap;

/// Ordering metadata for a state wrapper.
///
/// Persisted states carry the state file's timestamp; states created
/// during this run carry a per-process serial instead. A wrapper has
/// exactly one of the two, never both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateOrdering {
    /// Read from disk; ordered by file modification time.
    Timestamp(DateTime<Utc>),
    /// Created this run; ordered by creation sequence.
    Serial(u64),
}

impl StateOrdering {
    /// Whether this state is newer than `other`.
    ///
    /// Serials always win over timestamps: an ephemeral state represents
    /// work done (or planned) this run and therefore postdates anything
    /// read from disk, regardless of wall clock.
    pub fn is_newer_than(self, other: StateOrdering) -> bool {
        match (self, other) {
            (StateOrdering::Timestamp(a), StateOrdering::Timestamp(b)) => a > b,
            (StateOrdering::Timestamp(_), StateOrdering::Serial(_)) => false,
            (StateOrdering::Serial(_), StateOrdering::Timestamp(_)) => true,
            (StateOrdering::Serial(a), StateOrdering::Serial(b)) => a > b,
        }
    }
}

/// A [`PartState`] plus the metadata needed to order it against other
/// states and to remember whether an outdated step was already scheduled
/// for refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct StateWrapper {
    state: PartState,
    ordering: StateOrdering,
    updated: bool,
}

impl StateWrapper {
    /// Wrap a state loaded from disk.
    pub fn persisted(state: PartState, timestamp: DateTime<Utc>) -> Self {
        Self {
            state,
            ordering: StateOrdering::Timestamp(timestamp),
            updated: false,
        }
    }

    fn ephemeral(state: PartState, serial: u64, updated: bool) -> Self {
        Self {
            state,
            ordering: StateOrdering::Serial(serial),
            updated,
        }
    }

    pub fn state(&self) -> &PartState {
        &self.state
    }

    pub fn ordering(&self) -> StateOrdering {
        self.ordering
    }

    /// Whether this step was refreshed after being reported outdated.
    pub fn updated(&self) -> bool {
        self.updated
    }

    pub fn is_newer_than(&self, other: &StateWrapper) -> bool {
        self.ordering.is_newer_than(other.ordering)
    }
}

/// In-memory store of the newest wrapper per `(part, step)`.
///
/// Persisted wrappers are loaded in at startup; ephemeral wrappers
/// replace them as the planner and executor progress. Serials advance
/// monotonically for the lifetime of the store.
#[derive(Debug, Default)]
pub struct StateStore {
    states: HashMap<(String, Step), StateWrapper>,
    next_serial: u64,
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a pure in-memory state with the next serial.
    pub fn new_ephemeral(&mut self, state: PartState, updated: bool) -> StateWrapper {
        self.next_serial += 1;
        StateWrapper::ephemeral(state, self.next_serial, updated)
    }

    pub fn set(&mut self, part_name: &str, step: Step, wrapper: StateWrapper) {
        self.states.insert((part_name.to_string(), step), wrapper);
    }

    pub fn remove(&mut self, part_name: &str, step: Step) {
        self.states.remove(&(part_name.to_string(), step));
    }

    pub fn contains(&self, part_name: &str, step: Step) -> bool {
        self.states.contains_key(&(part_name.to_string(), step))
    }

    pub fn get(&self, part_name: &str, step: Step) -> Option<&StateWrapper> {
        self.states.get(&(part_name.to_string(), step))
    }

    /// Rewrap the stored state with a fresh serial.
    ///
    /// A persisted wrapper becomes ephemeral; nothing is written to disk.
    pub fn update_serial(&mut self, part_name: &str, step: Step) {
        let key = (part_name.to_string(), step);
        if let Some(wrapper) = self.states.remove(&key) {
            let rewrapped = self.new_ephemeral(wrapper.state, false);
            self.states.insert(key, rewrapped);
        }
    }

    /// Mark the stored state as updated, rewrapping with a fresh serial.
    pub fn set_updated(&mut self, part_name: &str, step: Step) {
        let key = (part_name.to_string(), step);
        if let Some(wrapper) = self.states.remove(&key) {
            let rewrapped = self.new_ephemeral(wrapper.state, true);
            self.states.insert(key, rewrapped);
        }
    }

    pub fn was_updated(&self, part_name: &str, step: Step) -> bool {
        self.get(part_name, step).is_some_and(StateWrapper::updated)
    }
}

#[cfg(test)]
#[path = "wrapper_tests.rs"]
mod tests;
