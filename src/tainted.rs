//! Strings carrying their taint
//!
//! [`TaintedString`] pairs an owned `String` with the [`StringTaint`] of its
//! bytes and shows how host string operations map onto the range algebra.
//! Positions are byte offsets into the UTF-8 value.

use std::fmt::{self, Display};
use std::ops::Range;

use tracing::trace;

use crate::flow::{CallSite, OperationFactory, TaintFlow, TaintSource};
use crate::range::TaintRange;
use crate::string_taint::StringTaint;

fn position(index: usize) -> u32 {
    u32::try_from(index)
        .unwrap_or_else(|_| panic!("string offset {index} exceeds taint position range"))
}

/// Extend every chain of `taint` with a builtin operation, unless tracking
/// is switched off or there is nothing to extend.
fn record<C, I>(taint: &mut StringTaint, factory: &OperationFactory<C>, name: &'static str, args: I)
where
    C: CallSite,
    I: IntoIterator,
    I::Item: Display,
{
    if factory.config().enabled && taint.is_tainted() {
        taint.extend(&factory.native_operation(name, args));
    }
}

// ============================================================================
// TaintedString
// ============================================================================

/// An owned string together with its taint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaintedString {
    value: String,
    taint: StringTaint,
}

impl TaintedString {
    /// Create an untainted string.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            taint: StringTaint::new(),
        }
    }

    /// Create a string whose every byte comes from `source`.
    #[must_use]
    pub fn tainted(value: impl Into<String>, source: TaintSource) -> Self {
        let value = value.into();
        let taint = StringTaint::from_operation(0, position(value.len()), source);
        Self { value, taint }
    }

    /// Pair `value` with existing taint.
    ///
    /// # Panics
    ///
    /// Panics if the taint reaches past the end of `value`.
    #[must_use]
    pub fn with_taint(value: impl Into<String>, taint: StringTaint) -> Self {
        let value = value.into();
        if let Some(last) = taint.bottom_range() {
            assert!(
                last.end() as usize <= value.len(),
                "taint ends at {} beyond string length {}",
                last.end(),
                value.len()
            );
        }
        Self { value, taint }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn taint(&self) -> &StringTaint {
        &self.taint
    }

    pub fn taint_mut(&mut self) -> &mut StringTaint {
        &mut self.taint
    }

    pub fn len(&self) -> usize {
        self.value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    pub fn is_tainted(&self) -> bool {
        self.taint.is_tainted()
    }

    /// Split into value and taint.
    pub fn into_parts(self) -> (String, StringTaint) {
        (self.value, self.taint)
    }

    /// Replace all taint with `[begin, end)` coming from `source`.
    ///
    /// # Panics
    ///
    /// Panics if the window is inverted or exceeds the string.
    pub fn mark_source(&mut self, begin: usize, end: usize, source: TaintSource) -> &mut Self {
        assert!(
            end <= self.value.len(),
            "source window {begin} - {end} beyond string length {}",
            self.value.len()
        );
        self.taint = StringTaint::from_operation(position(begin), position(end), source);
        self
    }

    /// Drop all taint, keeping the value.
    pub fn untaint(&mut self) -> &mut Self {
        self.taint.remove_all();
        self
    }

    /// Bytes `[begin, end)`, with a `substring` step on every carried chain.
    ///
    /// # Panics
    ///
    /// Panics if the bounds are not on char boundaries, as `str` slicing does.
    #[must_use]
    pub fn substring<C: CallSite>(
        &self,
        begin: usize,
        end: usize,
        factory: &OperationFactory<C>,
    ) -> Self {
        let value = self.value[begin..end].to_owned();
        let mut taint = self.taint.subtaint(position(begin), position(end));
        record(&mut taint, factory, "substring", [begin, end]);
        Self { value, taint }
    }

    /// `self` followed by `other`. Concatenation adds no chain step.
    #[must_use]
    pub fn concat(&self, other: &TaintedString) -> Self {
        let mut value = String::with_capacity(self.value.len() + other.value.len());
        value.push_str(&self.value);
        value.push_str(&other.value);
        let taint = StringTaint::concat_of(&self.taint, position(self.value.len()), &other.taint);
        Self { value, taint }
    }

    /// Append `other` in place.
    pub fn push_str(&mut self, other: &TaintedString) -> &mut Self {
        self.taint.concat(&other.taint, position(self.value.len()));
        self.value.push_str(&other.value);
        self
    }

    /// Insert `other` at byte `index`, moving later taint right.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not a char boundary.
    pub fn insert_str(&mut self, index: usize, other: &TaintedString) -> &mut Self {
        if other.is_empty() {
            return self;
        }
        self.value.insert_str(index, &other.value);
        let at = position(index);
        self.taint
            .shift(at, i64::from(position(other.value.len())))
            .insert(at, &other.taint);
        self
    }

    /// Delete the bytes in `range`, moving later taint left.
    ///
    /// # Panics
    ///
    /// Panics if the range is out of bounds or not on char boundaries.
    pub fn remove(&mut self, range: Range<usize>) -> &mut Self {
        let removed = range.end.saturating_sub(range.start);
        self.value.replace_range(range.clone(), "");
        self.taint
            .shift(position(range.end), -i64::from(position(removed)));
        self
    }

    /// Replace the bytes in `range` with `replacement`, then tag the result
    /// with a `replace` step.
    ///
    /// # Panics
    ///
    /// Panics if the range is out of bounds or not on char boundaries.
    pub fn replace_range<C: CallSite>(
        &mut self,
        range: Range<usize>,
        replacement: &TaintedString,
        factory: &OperationFactory<C>,
    ) -> &mut Self {
        let replaced = self.value[range.clone()].to_owned();
        let start = position(range.start);
        let removed = position(range.end - range.start);

        self.value.replace_range(range, &replacement.value);
        self.taint.shift(start + removed, -i64::from(removed));
        if !replacement.is_empty() {
            self.taint
                .shift(start, i64::from(position(replacement.len())))
                .insert(start, &replacement.taint);
        }
        record(
            &mut self.taint,
            factory,
            "replace",
            [replaced.as_str(), replacement.value.as_str()],
        );
        self
    }

    /// Lowercase copy; taint follows each char to its mapped bytes.
    #[must_use]
    pub fn to_lowercase<C: CallSite>(&self, factory: &OperationFactory<C>) -> Self {
        self.map_chars(factory, "toLowerCase", char::to_lowercase)
    }

    /// Uppercase copy; taint follows each char to its mapped bytes.
    #[must_use]
    pub fn to_uppercase<C: CallSite>(&self, factory: &OperationFactory<C>) -> Self {
        self.map_chars(factory, "toUpperCase", char::to_uppercase)
    }

    fn map_chars<C, F, I>(&self, factory: &OperationFactory<C>, name: &'static str, map: F) -> Self
    where
        C: CallSite,
        F: Fn(char) -> I,
        I: Iterator<Item = char>,
    {
        let mut value = String::with_capacity(self.value.len());
        let mut taint = StringTaint::new();
        for (index, c) in self.value.char_indices() {
            let begin = value.len();
            value.extend(map(c));
            if let Some(flow) = self.first_flow_in(index, index + c.len_utf8()) {
                taint.append(TaintRange::new(
                    position(begin),
                    position(value.len()),
                    flow.clone(),
                ));
            }
        }
        record(&mut taint, factory, name, std::iter::empty::<&str>());
        Self { value, taint }
    }

    /// Chain of the first tainted byte in `[begin, end)`.
    fn first_flow_in(&self, begin: usize, end: usize) -> Option<&TaintFlow> {
        let (begin, end) = (position(begin), position(end));
        let ranges = self.taint.ranges();
        let pos = ranges.partition_point(|range| range.end() <= begin);
        ranges
            .get(pos)
            .filter(|range| range.overlaps(begin, end))
            .map(TaintRange::flow)
    }

    /// Split on `separator`, each tainted part tagged `split(separator, index)`.
    ///
    /// An empty separator splits into single chars.
    pub fn split<C: CallSite>(
        &self,
        separator: &str,
        factory: &OperationFactory<C>,
    ) -> Vec<TaintedString> {
        let bounds: Vec<(usize, usize)> = if separator.is_empty() {
            self.value
                .char_indices()
                .map(|(i, c)| (i, i + c.len_utf8()))
                .collect()
        } else {
            let mut bounds = Vec::new();
            let mut start = 0;
            for (i, _) in self.value.match_indices(separator) {
                bounds.push((start, i));
                start = i + separator.len();
            }
            bounds.push((start, self.value.len()));
            bounds
        };
        trace!("Split on {:?} into {} parts", separator, bounds.len());

        bounds
            .into_iter()
            .enumerate()
            .map(|(index, (begin, end))| {
                let mut taint = self.taint.subtaint(position(begin), position(end));
                record(
                    &mut taint,
                    factory,
                    "split",
                    [separator.to_owned(), index.to_string()],
                );
                Self {
                    value: self.value[begin..end].to_owned(),
                    taint,
                }
            })
            .collect()
    }

    /// Copy the taint of `source` bytes `[begin, end)` onto this string,
    /// at their original positions moved right by `offset`. Chains are
    /// shared, not extended. `end = None` means the end of `source`; an empty
    /// or inverted window copies nothing.
    pub fn copy_taint_from(
        &mut self,
        source: &TaintedString,
        begin: usize,
        offset: usize,
        end: Option<usize>,
    ) -> &mut Self {
        let end = end.unwrap_or(source.value.len());
        if begin >= end {
            return self;
        }
        let window = source.taint.subtaint(position(begin), position(end));
        let mut moved = StringTaint::new();
        moved.concat(&window, position(begin + offset));
        self.taint.add_taint(&moved);
        self
    }
}

impl Display for TaintedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl AsRef<str> for TaintedString {
    fn as_ref(&self) -> &str {
        &self.value
    }
}

impl From<&str> for TaintedString {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TaintedString {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

// ============================================================================
// Function arguments
// ============================================================================

/// Record that tainted `args` were passed to `function`.
///
/// Each tainted argument gets an operation named after the function, with
/// arguments `[function, source_info, position]`. `source_info` usually is
/// `file:line` of the function definition.
pub fn mark_tainted_arguments<C: CallSite>(
    function: &str,
    source_info: &str,
    args: &mut [TaintedString],
    factory: &OperationFactory<C>,
) {
    if !factory.config().enabled {
        return;
    }
    for (index, arg) in args.iter_mut().enumerate() {
        if !arg.is_tainted() {
            continue;
        }
        let operation = factory.operation(
            function.to_owned(),
            [function.to_owned(), source_info.to_owned(), index.to_string()],
        );
        arg.taint.extend(&operation);
    }
}
