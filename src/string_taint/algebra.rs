//! Range algebra: every way a string's taint changes when the string does.
//!
//! All coordinates are half-open and local to the string described. Each
//! operation on an untainted index is a no-op that keeps it untainted.

use rustc_hash::FxHashMap;
use tracing::trace;

use super::{push_merged, RangeBuilder, StringTaint};
use crate::flow::{TaintFlow, TaintNode, TaintOperation};
use crate::range::TaintRange;

/// Which way a base conversion goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseDirection {
    /// Units of `unit_width` bits become units of `encoded_width` bits
    /// (e.g. bytes to base64 characters).
    Encode,
    /// The reverse mapping.
    Decode,
}

/// Per-call cache so ranges that shared a chain keep sharing it after being
/// extended with the same operation.
///
/// Keys are head addresses; every cached flow keeps its key alive as parent,
/// so an address cannot be reused while the map exists.
struct ExtendMemo<'a> {
    operation: &'a TaintOperation,
    extended: FxHashMap<*const TaintNode, TaintFlow>,
}

impl<'a> ExtendMemo<'a> {
    fn new(operation: &'a TaintOperation) -> Self {
        Self {
            operation,
            extended: FxHashMap::default(),
        }
    }

    fn extend(&mut self, flow: &TaintFlow) -> TaintFlow {
        let operation = self.operation;
        self.extended
            .entry(flow.head_ptr())
            .or_insert_with(|| flow.extended(operation.clone()))
            .clone()
    }
}

fn offset_position(pos: u32, amount: i64) -> u32 {
    u32::try_from(i64::from(pos) + amount)
        .unwrap_or_else(|_| panic!("taint position {pos} shifted by {amount} out of bounds"))
}

impl StringTaint {
    /// Add a range at the tail, merging it into the last range when the two
    /// touch and share a chain. Empty ranges are ignored.
    ///
    /// # Panics
    ///
    /// Panics if `range` starts before the current tail ends.
    pub fn append(&mut self, range: TaintRange) -> &mut Self {
        if range.is_empty() {
            return self;
        }
        push_merged(self.ranges.get_or_insert_with(Vec::new), range);
        self
    }

    /// Append all of `other`, shifted right by `offset`.
    ///
    /// # Panics
    ///
    /// Panics if `offset` lies before the current tail end.
    pub fn concat(&mut self, other: &StringTaint, offset: u32) -> &mut Self {
        if let Some(last) = self.bottom_range() {
            assert!(
                last.end() <= offset,
                "concat offset {offset} before taint end {}",
                last.end()
            );
        }
        let shifted: Vec<TaintRange> = other
            .iter()
            .map(|range| range.shifted(i64::from(offset)))
            .collect();
        for range in shifted {
            self.append(range);
        }
        self
    }

    /// Taint of `left` followed by `right`, where `left` is `left_len` long.
    pub fn concat_of(left: &StringTaint, left_len: u32, right: &StringTaint) -> StringTaint {
        let mut taint = left.clone();
        taint.concat(right, left_len);
        taint
    }

    /// Taint of the substring `[begin, end)`, rebased to start at 0.
    ///
    /// # Panics
    ///
    /// Panics if `begin > end`.
    #[must_use]
    pub fn subtaint(&self, begin: u32, end: u32) -> StringTaint {
        assert!(begin <= end, "inverted subtaint window {begin} - {end}");

        let mut builder = RangeBuilder::with_capacity(self.len());
        for range in self.iter().filter(|range| range.overlaps(begin, end)) {
            builder.push(range.with_bounds(
                range.begin().max(begin) - begin,
                range.end().min(end) - begin,
            ));
        }
        let mut taint = StringTaint::new();
        taint.assign(builder.finish());
        taint
    }

    /// Same as [`StringTaint::subtaint`].
    pub fn substr(taint: &StringTaint, begin: u32, end: u32) -> StringTaint {
        taint.subtaint(begin, end)
    }

    /// Drop all taint.
    pub fn clear(&mut self) {
        self.ranges = None;
    }

    /// Remove taint from `[begin, end)`, splitting ranges that straddle
    /// either boundary.
    ///
    /// # Panics
    ///
    /// Panics if `begin > end`.
    pub fn clear_between(&mut self, begin: u32, end: u32) -> &mut Self {
        assert!(begin <= end, "inverted clear window {begin} - {end}");
        if !self.is_tainted() || begin == end {
            return self;
        }

        let mut builder = RangeBuilder::with_capacity(self.len() + 1);
        for range in self.iter() {
            if !range.overlaps(begin, end) {
                builder.push(range.clone());
                continue;
            }
            if range.begin() < begin {
                builder.push(range.with_bounds(range.begin(), begin));
            }
            if range.end() > end {
                builder.push(range.with_bounds(end, range.end()));
            }
        }
        self.assign(builder.finish());
        self
    }

    /// Remove taint from the single character at `index`.
    pub fn clear_at(&mut self, index: u32) -> &mut Self {
        self.clear_between(index, index.saturating_add(1))
    }

    /// Account for `amount` characters inserted (`amount > 0`) or deleted
    /// (`amount < 0`) at `index`.
    ///
    /// On insertion, ranges at or after `index` move right and a range
    /// straddling `index` splits around the inserted gap. On deletion, the
    /// span `[index + amount, index)` loses its taint and everything from
    /// `index` on moves left; parts of one range meeting again merge.
    ///
    /// # Panics
    ///
    /// Panics if `index + amount < 0` or a position overflows.
    pub fn shift(&mut self, index: u32, amount: i64) -> &mut Self {
        assert!(
            i64::from(index) + amount >= 0,
            "shift by {amount} at {index} moves before the string start"
        );
        if !self.is_tainted() || amount == 0 {
            return self;
        }

        let mut builder = RangeBuilder::with_capacity(self.len() + 1);
        if amount > 0 {
            for range in self.iter() {
                if range.begin() >= index {
                    builder.push(range.shifted(amount));
                } else if range.end() > index {
                    builder.push(range.with_bounds(range.begin(), index));
                    builder.push(range.with_bounds(
                        offset_position(index, amount),
                        offset_position(range.end(), amount),
                    ));
                } else {
                    builder.push(range.clone());
                }
            }
        } else {
            let deleted_from = offset_position(index, amount);
            for range in self.iter() {
                if range.begin() < deleted_from {
                    builder.push(range.with_bounds(range.begin(), range.end().min(deleted_from)));
                }
                if range.end() > index {
                    builder.push(range.with_bounds(
                        offset_position(range.begin().max(index), amount),
                        offset_position(range.end(), amount),
                    ));
                }
            }
        }
        self.assign(builder.finish());
        self
    }

    /// Splice `other`, rebased by `index`, into this index.
    ///
    /// Existing ranges must already be separated at `index`: those before it
    /// must end at or before `index`, those after it must start at or after
    /// the end of the inserted block.
    ///
    /// # Panics
    ///
    /// Panics if an existing range crosses the insertion point or the
    /// inserted block.
    pub fn insert(&mut self, index: u32, other: &StringTaint) -> &mut Self {
        let mut builder = RangeBuilder::with_capacity(self.len() + other.len());
        let mut existing = self.iter().peekable();

        while let Some(range) = existing.next_if(|range| range.begin() < index) {
            assert!(
                range.end() <= index,
                "taint range {} - {} crosses insertion point {index}",
                range.begin(),
                range.end()
            );
            builder.push(range.clone());
        }

        for range in other {
            builder.push(range.shifted(i64::from(index)));
        }

        let inserted_end = builder.end().max(index);
        for range in existing {
            assert!(
                range.begin() >= inserted_end,
                "taint range {} - {} overlaps inserted taint ending at {inserted_end}",
                range.begin(),
                range.end()
            );
            builder.push(range.clone());
        }

        self.assign(builder.finish());
        self
    }

    /// Make the single character at `index` carry `flow`.
    ///
    /// Appending past the tail is O(1); anything else rebuilds the index.
    ///
    /// # Panics
    ///
    /// Panics if `index` is the last representable position.
    pub fn set(&mut self, index: u32, flow: TaintFlow) -> &mut Self {
        let Some(next) = index.checked_add(1) else {
            panic!("taint position {index} has no following position");
        };
        let past_tail = self.bottom_range().map_or(true, |last| index >= last.end());
        if past_tail {
            return self.append(TaintRange::new(index, next, flow));
        }
        self.clear_at(index);
        self.insert(index, &StringTaint::from_range(TaintRange::new(0, 1, flow)))
    }

    /// Record that `operation` touched `[begin, end)`.
    ///
    /// Untainted parts of the window become tainted with a new source node
    /// for `operation`; tainted parts get their chain extended with it.
    /// Outside the window nothing changes.
    ///
    /// # Panics
    ///
    /// Panics if `begin > end`.
    pub fn overlay(&mut self, begin: u32, end: u32, operation: &TaintOperation) -> &mut Self {
        assert!(begin <= end, "inverted overlay window {begin} - {end}");
        if begin == end {
            return self;
        }

        let mut gap_flow: Option<TaintFlow> = None;
        let mut gap = |from: u32, to: u32| {
            let flow = gap_flow
                .get_or_insert_with(|| TaintFlow::new(operation.clone()))
                .clone();
            TaintRange::new(from, to, flow)
        };
        let mut memo = ExtendMemo::new(operation);
        let mut builder = RangeBuilder::with_capacity(self.len() + 2);
        // First position of the window not yet emitted.
        let mut cursor = begin;

        for range in self.iter() {
            if range.end() <= begin {
                builder.push(range.clone());
                continue;
            }
            if range.begin() >= end {
                if cursor < end {
                    builder.push(gap(cursor, end));
                    cursor = end;
                }
                builder.push(range.clone());
                continue;
            }

            if range.begin() < begin {
                builder.push(range.with_bounds(range.begin(), begin));
            }
            let covered_begin = range.begin().max(begin);
            let covered_end = range.end().min(end);
            if cursor < covered_begin {
                builder.push(gap(cursor, covered_begin));
            }
            builder.push(TaintRange::new(
                covered_begin,
                covered_end,
                memo.extend(range.flow()),
            ));
            cursor = covered_end;
            if range.end() > end {
                builder.push(range.with_bounds(end, range.end()));
            }
        }
        if cursor < end {
            builder.push(gap(cursor, end));
        }

        trace!(
            "Overlay '{}' on {} - {} produced {} ranges",
            operation.name(),
            begin,
            end,
            builder.ranges.len()
        );
        self.assign(builder.finish());
        self
    }

    /// Extend every chain with `operation`, keeping all boundaries.
    pub fn extend(&mut self, operation: &TaintOperation) -> &mut Self {
        if let Some(ranges) = self.ranges.as_mut() {
            let mut memo = ExtendMemo::new(operation);
            for range in ranges.iter_mut() {
                // The memo's new head holds the old one before we drop ours.
                let extended = memo.extend(range.flow());
                *range.flow_mut() = extended;
            }
        }
        self
    }

    /// Copy of `taint` with every chain extended by `operation`; `taint`
    /// itself keeps its chains.
    pub fn extended(taint: &StringTaint, operation: &TaintOperation) -> StringTaint {
        let mut memo = ExtendMemo::new(operation);
        let mut builder = RangeBuilder::with_capacity(taint.len());
        for range in taint {
            builder.push(TaintRange::new(
                range.begin(),
                range.end(),
                memo.extend(range.flow()),
            ));
        }
        let mut result = StringTaint::new();
        result.assign(builder.finish());
        result
    }

    /// Remap positions between unit widths, e.g. bytes and base64 digits.
    ///
    /// With `n / m` the width ratio for `direction`, every range becomes
    /// `[floor(begin * n / m), ceil(end * n / m))`. Output units straddling
    /// two input ranges are counted as tainted (by the earlier range).
    ///
    /// # Panics
    ///
    /// Panics if either width is zero.
    pub fn convert_base(
        &mut self,
        direction: BaseDirection,
        unit_width: u32,
        encoded_width: u32,
    ) -> &mut Self {
        assert!(
            unit_width > 0 && encoded_width > 0,
            "zero unit width in base conversion"
        );
        if !self.is_tainted() {
            return self;
        }
        let (n, m) = match direction {
            BaseDirection::Encode => (u64::from(unit_width), u64::from(encoded_width)),
            BaseDirection::Decode => (u64::from(encoded_width), u64::from(unit_width)),
        };
        let clamp = |pos: u64| u32::try_from(pos).unwrap_or(u32::MAX);

        let mut builder = RangeBuilder::with_capacity(self.len());
        for range in self.iter() {
            let begin = clamp(u64::from(range.begin()) * n / m).max(builder.end());
            let end = clamp((u64::from(range.end()) * n).div_ceil(m));
            if begin < end {
                builder.push(range.with_bounds(begin, end));
            }
        }
        self.assign(builder.finish());
        self
    }
}
