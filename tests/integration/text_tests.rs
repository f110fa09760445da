//! Text format integration tests.

use string_taint::encoding::{TextDecoder, TextEncoder};
use string_taint::{parse_taint, print_taint, try_parse_taint, StringTaint, TextError};

const TWO_RANGES: &str = "[{begin:10,end:20,source:'src1'},{begin:80,end:90,source:'src2'}]";

#[test]
fn test_parse_then_print() {
    let taint = parse_taint(TWO_RANGES);
    assert_eq!(taint.len(), 2);
    assert_eq!(print_taint(&taint), "10 - 20 : src1\n80 - 90 : src2\n");
    assert_eq!(taint.to_string(), print_taint(&taint));
}

#[test]
fn test_overlapping_input_degrades_to_untainted() {
    let text = "[{begin:5,end:15,source:'x'},{begin:10,end:20,source:'y'}]";
    assert_eq!(parse_taint(text), StringTaint::new());
    assert!(matches!(
        try_parse_taint(text),
        Err(TextError::Overlapping { previous_end: 15, .. })
    ));
}

#[test]
fn test_parsed_sources_are_separate_nodes() {
    let taint = parse_taint("[{begin:0,end:2,source:'a'},{begin:4,end:6,source:'a'}]");
    let ranges = taint.ranges();
    assert!(!ranges[0].flow().ptr_eq(ranges[1].flow()));
    assert!(ranges.iter().all(|r| r.flow().head().is_source()));
}

#[test]
fn test_parsed_taint_feeds_algebra() {
    let mut taint = parse_taint(TWO_RANGES);
    taint.shift(0, 5);
    let shifted = taint.subtaint(15, 95);
    assert_eq!(print_taint(&shifted), "0 - 10 : src1\n70 - 80 : src2\n");
}

#[test]
fn test_encoder_writes_to_any_sink() {
    let taint = parse_taint("[{begin:0,end:1,source:\"q\"}]");
    let mut sink = Vec::new();
    TextEncoder::new().encode(&taint, &mut sink).unwrap();
    assert_eq!(sink, b"0 - 1 : q\n");
}

#[test]
fn test_decoder_error_messages() {
    let decoder = TextDecoder::new();
    let err = decoder.try_decode("[{begin:3,end:1,source:'x'}]").unwrap_err();
    assert_eq!(err.to_string(), "Inverted taint range 3 - 1");
    assert!(!decoder.decode("not a list").is_tainted());
}
