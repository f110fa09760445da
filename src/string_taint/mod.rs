//! Per-string taint index
//!
//! [`StringTaint`] maps character ranges of one string to provenance chains.
//! At all times its ranges are:
//!
//! - sorted by `begin`,
//! - non-empty and pairwise non-overlapping (`end_i <= begin_{i+1}`),
//! - merged: two ranges that touch (`end_i == begin_{i+1}`) never share the
//!   same chain.
//!
//! An index with no ranges is represented as *absent*, the canonical
//! untainted state. Every mutation (see `algebra.rs`) builds its new range
//! list completely before swapping it in, so a panic in the middle of an
//! operation leaves the previous state intact.

mod algebra;

pub use algebra::BaseDirection;

use std::slice;

use crate::flow::{TaintFlow, TaintOperation};
use crate::range::TaintRange;

/// Taint information of one string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringTaint {
    ranges: Option<Vec<TaintRange>>,
}

/// The untainted index.
pub const EMPTY_TAINT: StringTaint = StringTaint::new();

impl StringTaint {
    /// Untainted index.
    pub const fn new() -> Self {
        Self { ranges: None }
    }

    /// Index with a single range. An empty range yields the untainted index.
    pub fn from_range(range: TaintRange) -> Self {
        let mut taint = Self::new();
        taint.append(range);
        taint
    }

    /// `[begin, end)` tainted by a new source node for `operation`.
    pub fn from_operation(begin: u32, end: u32, operation: TaintOperation) -> Self {
        Self::from_range(TaintRange::from_operation(begin, end, operation))
    }

    /// The whole string of `length` characters carries `flow`.
    pub fn from_flow(flow: TaintFlow, length: u32) -> Self {
        Self::from_range(TaintRange::new(0, length, flow))
    }

    /// Build from ranges supplied in order.
    ///
    /// # Panics
    ///
    /// Panics if a range starts before the end of its predecessor.
    pub fn from_ranges<I>(ranges: I) -> Self
    where
        I: IntoIterator<Item = TaintRange>,
    {
        let mut taint = Self::new();
        for range in ranges {
            taint.append(range);
        }
        taint
    }

    /// True iff the index is present.
    pub fn is_tainted(&self) -> bool {
        self.ranges.is_some()
    }

    /// Number of ranges.
    pub fn len(&self) -> usize {
        self.ranges().len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges().is_empty()
    }

    pub fn ranges(&self) -> &[TaintRange] {
        self.ranges.as_deref().unwrap_or(&[])
    }

    pub fn iter(&self) -> slice::Iter<'_, TaintRange> {
        self.ranges().iter()
    }

    /// Chain of the character at `index`, if it is tainted.
    pub fn at(&self, index: u32) -> Option<&TaintFlow> {
        let ranges = self.ranges();
        // First range that ends after `index`; sorted and disjoint.
        let pos = ranges.partition_point(|range| range.end() <= index);
        ranges
            .get(pos)
            .filter(|range| range.contains(index))
            .map(TaintRange::flow)
    }

    /// Total number of tainted characters.
    pub fn tainted_len(&self) -> u64 {
        self.iter().map(|range| u64::from(range.len())).sum()
    }

    /// First range.
    pub fn top_range(&self) -> Option<&TaintRange> {
        self.ranges().first()
    }

    /// Last range.
    pub fn bottom_range(&self) -> Option<&TaintRange> {
        self.ranges().last()
    }

    /// Attach `range`, replacing whatever taint was in its span.
    ///
    /// Appends in O(1) when the range lies past the current tail.
    pub fn add_range(&mut self, range: TaintRange) -> &mut Self {
        if range.is_empty() {
            return self;
        }
        let at_tail = self
            .bottom_range()
            .map_or(true, |last| last.end() <= range.begin());
        if at_tail {
            return self.append(range);
        }

        let mut builder = RangeBuilder::with_capacity(self.len() + 2);
        let mut pending = Some(range);
        for existing in self.iter() {
            let Some((begin, end)) = pending.as_ref().map(|new| (new.begin(), new.end())) else {
                builder.push(existing.clone());
                continue;
            };
            if existing.begin() >= end {
                builder.extend(pending.take());
                builder.push(existing.clone());
            } else if existing.end() > begin {
                if existing.begin() < begin {
                    builder.push(existing.with_bounds(existing.begin(), begin));
                }
                if existing.end() > end {
                    builder.extend(pending.take());
                    builder.push(existing.with_bounds(end, existing.end()));
                }
            } else {
                builder.push(existing.clone());
            }
        }
        if let Some(new) = pending {
            builder.push(new);
        }
        self.assign(builder.finish());
        self
    }

    /// Attach every range of `other`; later additions win where they overlap.
    pub fn add_taint(&mut self, other: &StringTaint) -> &mut Self {
        for range in other {
            self.add_range(range.clone());
        }
        self
    }

    /// Remove taint from `[begin, end)`.
    pub fn remove_range(&mut self, begin: u32, end: u32) -> &mut Self {
        self.clear_between(begin, end)
    }

    /// Drop all taint.
    pub fn remove_all(&mut self) -> &mut Self {
        self.clear();
        self
    }

    /// Check the sorted / disjoint / merged invariants.
    pub fn is_well_formed(&self) -> bool {
        match &self.ranges {
            None => true,
            Some(ranges) if ranges.is_empty() => false,
            Some(ranges) => {
                ranges.iter().all(|range| !range.is_empty())
                    && ranges.windows(2).all(|pair| {
                        let (a, b) = (&pair[0], &pair[1]);
                        a.end() <= b.begin() && !(a.end() == b.begin() && a.flow() == b.flow())
                    })
            }
        }
    }

    /// Swap in a freshly built range list; an empty list means untainted.
    fn assign(&mut self, ranges: Vec<TaintRange>) {
        debug_assert!(ranges.iter().all(|range| !range.is_empty()));
        self.ranges = if ranges.is_empty() { None } else { Some(ranges) };
        debug_assert!(self.is_well_formed());
    }
}

impl<'a> IntoIterator for &'a StringTaint {
    type Item = &'a TaintRange;
    type IntoIter = slice::Iter<'a, TaintRange>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<TaintRange> for StringTaint {
    fn from_iter<I: IntoIterator<Item = TaintRange>>(iter: I) -> Self {
        Self::from_ranges(iter)
    }
}

/// Collects ranges in ascending order, merging touching ranges that share a
/// chain and skipping empty ones.
pub(crate) struct RangeBuilder {
    ranges: Vec<TaintRange>,
}

impl RangeBuilder {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            ranges: Vec::with_capacity(capacity),
        }
    }

    /// End of the last pushed range, 0 if none.
    pub(crate) fn end(&self) -> u32 {
        self.ranges.last().map_or(0, TaintRange::end)
    }

    pub(crate) fn push(&mut self, range: TaintRange) {
        push_merged(&mut self.ranges, range);
    }

    pub(crate) fn extend<I: IntoIterator<Item = TaintRange>>(&mut self, ranges: I) {
        for range in ranges {
            self.push(range);
        }
    }

    pub(crate) fn finish(self) -> Vec<TaintRange> {
        self.ranges
    }
}

/// Append `range` to a sorted list, merging it into the tail when possible.
///
/// # Panics
///
/// Panics if `range` starts before the tail ends.
fn push_merged(ranges: &mut Vec<TaintRange>, range: TaintRange) {
    if range.is_empty() {
        return;
    }
    if let Some(last) = ranges.last_mut() {
        assert!(
            last.end() <= range.begin(),
            "taint range {} - {} appended before previous end {}",
            range.begin(),
            range.end(),
            last.end()
        );
        if last.end() == range.begin() && last.flow() == range.flow() {
            let begin = last.begin();
            last.resize(begin, range.end());
            return;
        }
    }
    ranges.push(range);
}
