//! Range algebra integration tests.
//!
//! Walks string operations end to end through the public API.

use string_taint::{BaseDirection, StringTaint, TaintFlow, TaintOperation, TaintRange};

fn source(name: &'static str) -> TaintFlow {
    TaintFlow::new(TaintOperation::new(name))
}

fn bounds(taint: &StringTaint) -> Vec<(u32, u32)> {
    taint.iter().map(|r| (r.begin(), r.end())).collect()
}

fn sources(taint: &StringTaint) -> Vec<String> {
    taint
        .iter()
        .map(|r| r.flow().source().name().to_owned())
        .collect()
}

// =============================================================================
// Overlay
// =============================================================================

#[test]
fn test_overlay_on_untainted_creates_source() {
    let mut taint = StringTaint::new();
    taint.overlay(0, 5, &TaintOperation::new("escape"));

    assert_eq!(bounds(&taint), [(0, 5)]);
    assert_eq!(taint.at(2).unwrap().source().name(), "escape");
    assert_eq!(taint.at(2).unwrap().depth(), 1);
}

#[test]
fn test_second_overlay_stacks_inside_window() {
    let mut taint = StringTaint::new();
    taint.overlay(0, 5, &TaintOperation::new("escape"));
    taint.overlay(2, 4, &TaintOperation::new("encodeURI"));

    assert_eq!(bounds(&taint), [(0, 2), (2, 4), (4, 5)]);
    let names: Vec<&str> = taint.at(3).unwrap().operations().map(|op| op.name()).collect();
    assert_eq!(names, ["encodeURI", "escape"]);
    // Outside the window the chain is untouched and still shared.
    assert!(taint.at(0).unwrap().ptr_eq(taint.at(4).unwrap()));
}

#[test]
fn test_overlay_fills_gaps_between_ranges() {
    let a = source("a");
    let mut taint = StringTaint::from_ranges([
        TaintRange::new(2, 4, a.clone()),
        TaintRange::new(6, 8, a.clone()),
    ]);
    taint.overlay(0, 10, &TaintOperation::new("op"));

    assert_eq!(bounds(&taint), [(0, 2), (2, 4), (4, 6), (6, 8), (8, 10)]);
    // Gap pieces share one new source node, extended pieces one new head.
    assert!(taint.at(0).unwrap().ptr_eq(taint.at(5).unwrap()));
    assert!(taint.at(2).unwrap().ptr_eq(taint.at(7).unwrap()));
    assert_eq!(taint.at(2).unwrap().source().name(), "a");
    assert!(taint.is_well_formed());
}

// =============================================================================
// Shift / insert
// =============================================================================

#[test]
fn test_shift_open_and_close_gap() {
    let mut taint = StringTaint::from_range(TaintRange::new(0, 5, source("a")));

    taint.shift(3, 2);
    assert_eq!(bounds(&taint), [(0, 3), (5, 7)]);

    taint.shift(5, -2);
    assert_eq!(bounds(&taint), [(0, 5)]);
    assert_eq!(taint.len(), 1);
}

#[test]
fn test_insert_after_shift() {
    let mut taint = StringTaint::from_range(TaintRange::new(0, 4, source("host")));
    let inserted = StringTaint::from_range(TaintRange::new(0, 3, source("guest")));

    taint.shift(2, 3).insert(2, &inserted);
    assert_eq!(bounds(&taint), [(0, 2), (2, 5), (5, 7)]);
    assert_eq!(sources(&taint), ["host", "guest", "host"]);
}

#[test]
#[should_panic(expected = "crosses insertion point")]
fn test_insert_into_unsplit_range_panics() {
    let mut taint = StringTaint::from_range(TaintRange::new(0, 4, source("host")));
    taint.insert(2, &StringTaint::from_range(TaintRange::new(0, 1, source("x"))));
}

#[test]
#[should_panic(expected = "before the string start")]
fn test_shift_before_start_panics() {
    let mut taint = StringTaint::from_range(TaintRange::new(0, 4, source("a")));
    taint.shift(1, -2);
}

// =============================================================================
// Concatenation and substrings
// =============================================================================

#[test]
fn test_concat_then_substring_recovers_parts() {
    let left = StringTaint::from_ranges([
        TaintRange::new(1, 3, source("l1")),
        TaintRange::new(5, 6, source("l2")),
    ]);
    let right = StringTaint::from_range(TaintRange::new(0, 4, source("r")));

    let joined = StringTaint::concat_of(&left, 6, &right);
    assert_eq!(bounds(&joined), [(1, 3), (5, 6), (6, 10)]);
    assert_eq!(joined.subtaint(0, 6), left);
    assert_eq!(joined.subtaint(6, 10), right);
}

#[test]
fn test_concat_merges_shared_chain_at_seam() {
    let a = source("a");
    let left = StringTaint::from_range(TaintRange::new(0, 3, a.clone()));
    let right = StringTaint::from_range(TaintRange::new(0, 2, a));

    let joined = StringTaint::concat_of(&left, 3, &right);
    assert_eq!(bounds(&joined), [(0, 5)]);
}

#[test]
fn test_substring_of_untainted_is_untainted() {
    assert_eq!(StringTaint::new().subtaint(0, 100), StringTaint::new());
}

// =============================================================================
// Attach contract
// =============================================================================

#[test]
fn test_attach_contract() {
    let mut taint = StringTaint::new();
    assert!(!taint.is_tainted());
    assert!(taint.top_range().is_none());

    taint.add_range(TaintRange::new(10, 20, source("a")));
    taint.add_range(TaintRange::new(0, 5, source("b")));
    assert_eq!(bounds(&taint), [(0, 5), (10, 20)]);
    assert_eq!(taint.top_range().unwrap().begin(), 0);
    assert_eq!(taint.bottom_range().unwrap().end(), 20);

    taint.add_range(TaintRange::new(3, 12, source("c")));
    assert_eq!(bounds(&taint), [(0, 3), (3, 12), (12, 20)]);
    assert_eq!(sources(&taint), ["b", "c", "a"]);

    taint.remove_range(2, 15);
    assert_eq!(bounds(&taint), [(0, 2), (15, 20)]);

    taint.remove_all();
    assert!(!taint.is_tainted());
    assert_eq!(taint, StringTaint::new());
}

#[test]
fn test_add_taint_copies_all_ranges() {
    let other = StringTaint::from_ranges([
        TaintRange::new(0, 2, source("x")),
        TaintRange::new(4, 6, source("y")),
    ]);
    let mut taint = StringTaint::from_range(TaintRange::new(1, 5, source("base")));
    taint.add_taint(&other);

    assert_eq!(bounds(&taint), [(0, 2), (2, 4), (4, 6)]);
    assert_eq!(sources(&taint), ["x", "base", "y"]);
}

// =============================================================================
// Base conversion
// =============================================================================

#[test]
fn test_base64_roundtrip_over_approximates() {
    let mut taint = StringTaint::from_range(TaintRange::new(1, 2, source("byte")));

    // Byte 1 spans bits 8..16, i.e. sextets 1 and 2.
    taint.convert_base(BaseDirection::Encode, 8, 6);
    assert_eq!(bounds(&taint), [(1, 3)]);

    // Sextets 1..3 span bits 6..18, i.e. bytes 0..3.
    taint.convert_base(BaseDirection::Decode, 8, 6);
    assert_eq!(bounds(&taint), [(0, 3)]);
}

#[test]
fn test_hex_encoding_doubles_positions() {
    let mut taint = StringTaint::from_range(TaintRange::new(3, 5, source("byte")));
    taint.convert_base(BaseDirection::Encode, 8, 4);
    assert_eq!(bounds(&taint), [(6, 10)]);
}
