use crate::signs::sign::SignId;
use std::collections::VecDeque;

/// Bounded run of confirmed signs.
///
/// Adjacent duplicates are never stored and the oldest entry is evicted once
/// `capacity` is reached.
#[derive(Debug, Clone)]
pub struct SignSequence {
    capacity: usize,
    signs: VecDeque<SignId>,
}

impl SignSequence {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            signs: VecDeque::with_capacity(capacity),
        }
    }

    /// Append `sign` unless it repeats the last entry. Returns `true` when the
    /// sequence changed.
    pub fn push(&mut self, sign: SignId) -> bool {
        if self.capacity == 0 || self.last() == Some(sign) {
            return false;
        }
        if self.signs.len() == self.capacity {
            self.signs.pop_front();
        }
        self.signs.push_back(sign);
        true
    }

    pub fn last(&self) -> Option<SignId> {
        self.signs.back().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SignId> {
        self.signs.iter()
    }

    pub fn to_vec(&self) -> Vec<SignId> {
        self.signs.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.signs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signs.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.signs.clear();
    }
}
