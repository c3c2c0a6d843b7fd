use crate::signs::sign::SignId;
use std::collections::VecDeque;

/// Ring of the last `K` raw classifications.
///
/// A sign is only accepted once the ring is full and every entry agrees,
/// which filters out single-frame classifier flicker.
#[derive(Debug, Clone)]
pub struct ChatteringWindow {
    capacity: usize,
    entries: VecDeque<SignId>,
}

impl ChatteringWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    /// Push a raw classification and return the sign if the window now agrees.
    pub fn push(&mut self, sign: SignId) -> Option<SignId> {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(sign);
        self.stable()
    }

    pub fn stable(&self) -> Option<SignId> {
        if self.entries.len() < self.capacity {
            return None;
        }
        let first = *self.entries.front()?;
        self.entries
            .iter()
            .all(|entry| *entry == first)
            .then_some(first)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
