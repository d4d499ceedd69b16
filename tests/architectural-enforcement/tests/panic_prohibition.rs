//! Integration Test: Panic Prohibition
//!
//! **Policy**: Production code propagates errors with `?` and reports them
//! as state or `anyhow` errors. `unwrap()` and `expect()` are for tests.

use architectural_enforcement::{report, scan_production};

fn is_panicking_unwrap(code: &str) -> bool {
    code.contains(".unwrap()") || code.contains(".expect(")
}

#[test]
fn test_no_unwrap_in_production_code() {
    report(
        "unwrap()/expect() in production code (propagate the error)",
        &scan_production(is_panicking_unwrap),
    );
}

#[test]
fn test_detector_allows_fallbacks() {
    assert!(is_panicking_unwrap("let v = map.get(k).unwrap();"));
    assert!(is_panicking_unwrap("let v = x.expect(\"present\");"));
    assert!(!is_panicking_unwrap("let v = x.unwrap_or_default();"));
    assert!(!is_panicking_unwrap("let v = x.unwrap_or_else(|| y);"));
}
