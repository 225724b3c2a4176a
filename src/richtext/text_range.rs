// Tracked ranges
// Flat-offset intervals registered with a document that follow its edits

use crate::richtext::structured_document::BlockId;
use std::collections::BTreeMap;
use std::fmt;

/// Handle of a tracked range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RangeId(u64);

impl fmt::Display for RangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A half-open `[start, end)` interval of flat offsets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextRange {
    pub start: usize,
    pub end: usize,
}

impl TextRange {
    pub fn new(start: usize, end: usize) -> Self {
        TextRange { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Position after an edit at `at` that changed the length by `delta`.
    /// Returns `None` when a deletion swallowed the whole range.
    pub fn shifted(self, at: usize, delta: isize) -> Option<TextRange> {
        if delta >= 0 {
            return Some(self.grown(at, delta.unsigned_abs()));
        }
        let removed = delta.unsigned_abs();
        let deleted_end = at + removed;
        if !self.is_empty() && at <= self.start && self.end <= deleted_end {
            return None;
        }
        let clamp = |p: usize| {
            if p <= at {
                p
            } else if p < deleted_end {
                at
            } else {
                p - removed
            }
        };
        let start = clamp(self.start);
        Some(TextRange::new(start, clamp(self.end).max(start)))
    }

    /// Inverse of `shifted` for a range that never saw the forward shift
    pub fn unshifted(self, at: usize, delta: isize) -> TextRange {
        if delta < 0 {
            return self.grown(at, delta.unsigned_abs());
        }
        let inserted = delta.unsigned_abs();
        let inserted_end = at + inserted;
        let map = |p: usize| {
            if p >= inserted_end {
                p - inserted
            } else if p > at {
                at
            } else {
                p
            }
        };
        let start = map(self.start);
        TextRange::new(start, map(self.end).max(start))
    }

    // Insertion of `len` units at `at`. A start sitting on `at` moves with
    // the inserted text; an end sitting on `at` stays put.
    fn grown(self, at: usize, len: usize) -> TextRange {
        let start = if self.start >= at { self.start + len } else { self.start };
        let end = if self.end > at { self.end + len } else { self.end };
        TextRange::new(start, end.max(start))
    }
}

/// The document selection. Bias flags record whether a caret sitting on an
/// inline boundary attaches to the following inline (`true`) or the
/// preceding one.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selection {
    pub start: usize,
    pub end: usize,
    pub start_paragraph: Option<BlockId>,
    pub end_paragraph: Option<BlockId>,
    pub start_bias_forward: bool,
    pub end_bias_forward: bool,
}

impl Selection {
    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.is_collapsed()
    }

    pub fn range(&self) -> TextRange {
        TextRange::new(self.start, self.end)
    }
}

/// Registry of live ranges. The selection is not registered here, so
/// shifting never moves or disposes it.
#[derive(Debug, Clone, Default)]
pub struct RangeTracker {
    ranges: BTreeMap<RangeId, TextRange>,
    next_id: u64,
}

impl RangeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a range and return its handle
    pub fn create(&mut self, start: usize, end: usize) -> RangeId {
        let id = RangeId(self.next_id);
        self.next_id += 1;
        self.ranges.insert(id, TextRange::new(start, end));
        id
    }

    /// Deregister a range; returns false if it was already gone
    pub fn dispose(&mut self, id: RangeId) -> bool {
        self.ranges.remove(&id).is_some()
    }

    pub fn get(&self, id: RangeId) -> Option<TextRange> {
        self.ranges.get(&id).copied()
    }

    pub fn contains(&self, id: RangeId) -> bool {
        self.ranges.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (RangeId, TextRange)> + '_ {
        self.ranges.iter().map(|(id, range)| (*id, *range))
    }

    /// Shift every range for an edit at `at` changing the length by `delta`.
    /// Ranges swallowed by a deletion are disposed and their ids returned.
    pub fn shift(&mut self, at: usize, delta: isize) -> Vec<RangeId> {
        if delta == 0 {
            return Vec::new();
        }
        let mut disposed = Vec::new();
        self.ranges.retain(|id, range| match range.shifted(at, delta) {
            Some(shifted) => {
                *range = shifted;
                true
            }
            None => {
                disposed.push(*id);
                false
            }
        });
        disposed
    }

    pub(crate) fn snapshot(&self) -> BTreeMap<RangeId, TextRange> {
        self.ranges.clone()
    }

    /// Undo a shift: ranges known to `snapshot` get their recorded position
    /// back (including the ones the shift disposed), ranges registered since
    /// are shifted in reverse.
    pub(crate) fn restore(
        &mut self,
        snapshot: &BTreeMap<RangeId, TextRange>,
        disposed: &[RangeId],
        at: usize,
        delta: isize,
    ) {
        for (id, range) in self.ranges.iter_mut() {
            *range = match snapshot.get(id) {
                Some(recorded) => *recorded,
                None => range.unshifted(at, delta),
            };
        }
        for id in disposed {
            if let Some(recorded) = snapshot.get(id) {
                self.ranges.insert(*id, *recorded);
            }
        }
    }

    /// Reverse a shift for which no snapshot exists
    pub(crate) fn unshift(&mut self, at: usize, delta: isize) {
        for range in self.ranges.values_mut() {
            *range = range.unshifted(at, delta);
        }
    }
}
