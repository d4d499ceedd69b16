//! Integration Test: Blocking I/O Prohibition
//!
//! **Policy**: Production code in the tracker crates MUST NOT use blocking
//! I/O. Files go through `tokio::fs`, HTTP through async `reqwest`.

use architectural_enforcement::{report, scan_production};

fn is_blocking_io(code: &str) -> bool {
    code.contains("std::fs::")
        || code.contains("use std::fs")
        || code.contains("std::net::")
        || code.contains("use std::net")
        || code.contains("reqwest::blocking")
        || code.contains("std::process::Command")
        || code.contains("std::io::stdin()")
}

#[test]
fn test_no_blocking_io_in_production_code() {
    report(
        "Blocking I/O in production code (use tokio::fs / async reqwest)",
        &scan_production(is_blocking_io),
    );
}

#[test]
fn test_detector_flags_std_fs() {
    assert!(is_blocking_io("let s = std::fs::read_to_string(path)?;"));
    assert!(is_blocking_io("use std::fs;"));
    assert!(!is_blocking_io("let s = tokio::fs::read_to_string(path).await?;"));
    assert!(!is_blocking_io(".with_writer(std::io::stderr)"));
}
