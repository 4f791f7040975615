//! Scrollback: bounded FIFO of lines that scrolled off the top.

use std::collections::VecDeque;

use crate::cell::Cell;

/// A line stored in scrollback.
///
/// Lines are stored verbatim at the width they had when evicted; resize
/// never rewrites scrollback content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollbackLine {
    pub cells: Vec<Cell>,
    /// True if this line soft-wrapped into the one below it.
    pub wrapped: bool,
}

/// Bounded FIFO scrollback buffer.
///
/// Index 0 is the oldest line. When full, pushing a new line silently
/// evicts the oldest. A capacity of 0 disables scrollback entirely.
#[derive(Debug, Clone)]
pub struct Scrollback {
    lines: VecDeque<ScrollbackLine>,
    capacity: usize,
}

impl Scrollback {
    /// Create a scrollback buffer holding at most `capacity` lines.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::new(),
            capacity,
        }
    }

    /// Maximum number of lines retained.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of lines currently stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Append a line, evicting the oldest if the buffer is full.
    pub fn push_row(&mut self, cells: &[Cell], wrapped: bool) {
        if self.capacity == 0 {
            return;
        }
        if self.lines.len() >= self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(ScrollbackLine {
            cells: cells.to_vec(),
            wrapped,
        });
    }

    /// Remove and return the newest line.
    pub fn pop_newest(&mut self) -> Option<ScrollbackLine> {
        self.lines.pop_back()
    }

    /// The line at `index` (0 = oldest).
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&ScrollbackLine> {
        self.lines.get(index)
    }

    /// Iterate oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &ScrollbackLine> {
        self.lines.iter()
    }

    /// Drop every stored line. Capacity is unchanged.
    pub fn clear(&mut self) {
        self.lines.clear();
    }
}
