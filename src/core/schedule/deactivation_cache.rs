use std::collections::{HashSet, VecDeque};
use uuid::Uuid;

/// Bounded memo of schedules the poller task has already deactivated, so a
/// schedule is not deactivated twice within one session. Purely an
/// optimization with a memory cap; the persisted `active` flag remains the
/// source of truth.
#[derive(Debug)]
pub struct DeactivationCache {
    capacity: usize,
    order: VecDeque<Uuid>,
    members: HashSet<Uuid>,
}

impl DeactivationCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            order: VecDeque::new(),
            members: HashSet::new(),
        }
    }

    pub fn insert(&mut self, uuid: Uuid) {
        if !self.members.insert(uuid) {
            return;
        }
        self.order.push_back(uuid);
        while self.order.len() > self.capacity {
            if let Some(evicted) = self.order.pop_front() {
                self.members.remove(&evicted);
            }
        }
    }

    pub fn contains(&self, uuid: &Uuid) -> bool {
        self.members.contains(uuid)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
