//! Provenance chain integration tests.
//!
//! Chain sharing, node lifetimes and reporting.

use std::cell::Cell;

use string_taint::{
    OperationFactory, StringTaint, TaintConfig, TaintFlow, TaintLocation, TaintOperation,
    TaintRange, TaintedString,
};

// =============================================================================
// Node lifetimes
// =============================================================================

#[test]
fn test_ten_thousand_extends_free_every_node() {
    let mut taint = StringTaint::from_operation(0, 8, TaintOperation::new("src"));
    let weak_source = taint.at(0).unwrap().downgrade();

    let mut weak_heads = Vec::new();
    for i in 0..10_000 {
        taint.extend(&TaintOperation::with_arguments("step", [i.to_string()]));
        if i % 1_000 == 0 {
            weak_heads.push(taint.at(0).unwrap().downgrade());
        }
    }
    assert_eq!(taint.at(0).unwrap().depth(), 10_001);
    assert!(weak_source.upgrade().is_some());

    drop(taint);
    assert!(weak_source.upgrade().is_none());
    assert!(weak_heads.iter().all(|weak| weak.upgrade().is_none()));
}

#[test]
fn test_shared_prefix_outlives_extended_sibling() {
    let mut base = StringTaint::from_operation(0, 4, TaintOperation::new("src"));
    base.extend(&TaintOperation::new("shared"));
    let shared = base.at(0).unwrap().downgrade();

    // A second string holding the same chain.
    let mut copy = base.clone();
    for _ in 0..10_000 {
        copy.extend(&TaintOperation::new("only-copy"));
    }
    drop(copy);

    let head = base.at(0).unwrap();
    assert!(shared.upgrade().is_some());
    assert_eq!(head.operation().name(), "shared");
    assert_eq!(head.depth(), 2);
    assert_eq!(head.holders(), 1);

    drop(base);
    assert!(shared.upgrade().is_none());
}

#[test]
fn test_extend_keeps_shared_chains_shared() {
    let a = TaintFlow::new(TaintOperation::new("a"));
    let mut taint = StringTaint::from_ranges([
        TaintRange::new(0, 2, a.clone()),
        TaintRange::new(5, 7, a.clone()),
    ]);
    taint.extend(&TaintOperation::new("escape"));

    let first = taint.at(0).unwrap();
    let second = taint.at(5).unwrap();
    assert!(first.ptr_eq(second));
    assert!(first.head().parent().is_some_and(|p| std::ptr::eq(p, a.head())));
}

#[test]
fn test_pure_extended_leaves_input_alone() {
    let taint = StringTaint::from_operation(0, 3, TaintOperation::new("src"));
    let derived = StringTaint::extended(&taint, &TaintOperation::new("quote"));

    assert_eq!(taint.at(0).unwrap().depth(), 1);
    assert_eq!(derived.at(0).unwrap().depth(), 2);
    assert_ne!(taint, derived);
}

// =============================================================================
// Factory and reporting
// =============================================================================

#[test]
fn test_factory_with_closure_call_site() {
    let line = Cell::new(10);
    let site = || {
        line.set(line.get() + 1);
        Some(TaintLocation::new("app.js", line.get(), 1, "handler"))
    };
    let factory = OperationFactory::new(site, TaintConfig::default());

    let first = factory.named("escape");
    let second = factory.named("unescape");
    assert_eq!(first.location().unwrap().line, 11);
    assert_eq!(second.location().unwrap().line, 12);
}

#[test]
fn test_report_after_string_operations() {
    let factory = OperationFactory::new(
        string_taint::flow::FixedCallSite(TaintLocation::new("page.js", 7, 3, "main")),
        TaintConfig::default(),
    );
    let hash = TaintedString::tainted("#payload", TaintOperation::new("location.hash"));
    let value = hash.substring(1, 8, &factory).to_uppercase(&factory);

    let report = value.taint().report();
    assert_eq!(report.len(), 1);
    assert_eq!((report[0].begin, report[0].end), (0, 7));

    let names: Vec<&str> = report[0].operations.iter().map(|op| op.name.as_str()).collect();
    assert_eq!(names, ["toUpperCase", "substring", "location.hash"]);
    assert_eq!(report[0].operations[1].arguments, ["1", "8"]);
    assert_eq!(
        report[0].operations[0].location.as_ref().map(|l| l.function.as_str()),
        Some("main")
    );
    assert!(report[0].operations[2].location.is_none());

    let json: serde_json::Value = serde_json::from_str(&value.taint().report_json().unwrap()).unwrap();
    assert_eq!(json[0]["operations"][1]["name"], "substring");
}
