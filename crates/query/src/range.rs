//! Positional range descriptors.

use alloc::vec::Vec;
use stowage_core::{Error, Result};

/// A half-open positional window `[start, end)`; `end: None` is unbounded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Range {
    pub start: usize,
    pub end: Option<usize>,
}

impl Range {
    /// Creates a range, rejecting `end < start`.
    pub fn new(start: usize, end: Option<usize>) -> Result<Self> {
        match end {
            Some(end) if end < start => Err(Error::invalid_range(start, end)),
            _ => Ok(Self { start, end }),
        }
    }

    /// Open-ended range starting at `start`.
    pub fn starting_at(start: usize) -> Self {
        Self { start, end: None }
    }

    /// Returns true if the full-result position falls inside the window.
    #[inline]
    pub fn contains(&self, index: usize) -> bool {
        index >= self.start && self.end.map_or(true, |end| index < end)
    }

    /// Translates a full-result position into a window-relative one.
    #[inline]
    pub fn window_index(&self, index: usize) -> Option<usize> {
        if self.contains(index) {
            Some(index - self.start)
        } else {
            None
        }
    }

    /// Clamps the window to a sequence of `len` items.
    pub fn bounds(&self, len: usize) -> (usize, usize) {
        let start = self.start.min(len);
        let end = self.end.map_or(len, |end| end.min(len));
        (start, end.max(start))
    }

    /// Keeps only the items inside the window.
    pub fn apply<T>(&self, mut items: Vec<T>) -> Vec<T> {
        let (start, end) = self.bounds(items.len());
        items.truncate(end);
        items.drain(..start);
        items
    }
}
