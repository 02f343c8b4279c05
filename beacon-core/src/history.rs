//! Bounded FIFO of recent motor commands.

use std::collections::VecDeque;

use crate::constants::ACTION_HISTORY_CAPACITY;
use crate::world::Action;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionRecord {
    pub action: Action,
    pub timestamp: u64,
}

/// Recent actions, oldest first. Pushing past capacity evicts the oldest.
#[derive(Debug, Clone)]
pub struct ActionHistory {
    records: VecDeque<ActionRecord>,
    capacity: usize,
}

impl Default for ActionHistory {
    fn default() -> Self {
        Self::new(ACTION_HISTORY_CAPACITY)
    }
}

impl ActionHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, action: Action, timestamp: u64) {
        if self.records.len() == self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(ActionRecord { action, timestamp });
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn last(&self) -> Option<&ActionRecord> {
        self.records.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActionRecord> {
        self.records.iter()
    }

    /// The newest `n` records, oldest first.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &ActionRecord> {
        self.records.iter().skip(self.records.len().saturating_sub(n))
    }

    /// Occurrences of `action` among the newest `n` records.
    pub fn count_recent(&self, n: usize, action: Action) -> usize {
        self.recent(n).filter(|r| r.action == action).count()
    }

    /// The most frequent action among the newest `n` records and its share of them.
    /// Ties go to the action listed first in `Action::ALL`.
    pub fn dominant(&self, n: usize) -> Option<(Action, f64)> {
        let window = self.records.len().min(n);
        if window == 0 {
            return None;
        }
        let mut best: Option<(Action, usize)> = None;
        for action in Action::ALL {
            let count = self.count_recent(n, action);
            if best.map_or(true, |(_, c)| count > c) {
                best = Some((action, count));
            }
        }
        best.map(|(action, count)| (action, count as f64 / window as f64))
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}
