//! Bounded memory of recently seen event ids.
//!
//! Used by the bus to drop the remote echo of an event this session already
//! delivered locally. Insertion order is kept in a ring; the oldest id is
//! forgotten once the window is full.

use std::collections::{HashSet, VecDeque};

use legalops_core::EventId;

/// Fixed-capacity set of the most recent event ids.
#[derive(Debug)]
pub struct RecentEventIds {
    order: VecDeque<EventId>,
    seen: HashSet<EventId>,
    capacity: usize,
}

impl RecentEventIds {
    /// Remember at most `capacity` ids (minimum 1).
    ///
    /// Storage grows as ids arrive; nothing is reserved up front.
    pub fn new(capacity: usize) -> Self {
        Self {
            order: VecDeque::new(),
            seen: HashSet::new(),
            capacity: capacity.max(1),
        }
    }

    /// Record `id`. Returns `false` if it was already in the window.
    pub fn insert(&mut self, id: &EventId) -> bool {
        if self.seen.contains(id) {
            return false;
        }
        if self.order.len() == self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                let _ = self.seen.remove(&oldest);
            }
        }
        self.order.push_back(id.clone());
        let _ = self.seen.insert(id.clone());
        true
    }

    /// Whether `id` is in the window.
    pub fn contains(&self, id: &EventId) -> bool {
        self.seen.contains(id)
    }

    /// Ids currently remembered.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Maximum number of ids remembered.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
