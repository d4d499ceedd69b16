//! Integration Test: Sleep Prohibition
//!
//! **Policy**: Production code MUST NOT sleep. Controllers wait on gateway
//! futures or on `watch` changes, never on a timer.

use architectural_enforcement::{report, scan_production};

fn is_sleep(code: &str) -> bool {
    code.contains("::sleep(") || code.contains(".sleep(")
}

#[test]
fn test_no_sleep_in_production_code() {
    report(
        "Sleep calls in production code (wait on I/O or state instead)",
        &scan_production(is_sleep),
    );
}

#[test]
fn test_detector_flags_both_runtimes() {
    assert!(is_sleep("tokio::time::sleep(Duration::from_millis(10)).await;"));
    assert!(is_sleep("std::thread::sleep(delay);"));
    assert!(!is_sleep("rx.changed().await?;"));
}
