//! Turn-by-turn cursor over a navigation plan

use serde::Serialize;

/// Index into a plan's steps, clamped to `0..len`
///
/// `next` and `previous` never wrap and never fail; at a boundary they
/// leave the index where it is and report `false`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct DirectionCursor {
    index: usize,
    len: usize,
}

impl DirectionCursor {
    /// Cursor at the first step of a plan with `len` steps
    pub fn new(len: usize) -> Self {
        Self { index: 0, len }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn can_advance(&self) -> bool {
        self.index + 1 < self.len
    }

    pub fn can_retreat(&self) -> bool {
        self.index > 0
    }

    /// Advance one step; returns whether the index moved
    pub fn next(&mut self) -> bool {
        if self.can_advance() {
            self.index += 1;
            true
        } else {
            false
        }
    }

    /// Go back one step; returns whether the index moved
    pub fn previous(&mut self) -> bool {
        if self.can_retreat() {
            self.index -= 1;
            true
        } else {
            false
        }
    }
}
