//! Architectural Enforcement Integration Tests
//!
//! This package scans the tracker's production sources and fails the build
//! when they break a house rule:
//! - No blocking I/O (`std::fs`, `std::net`, `reqwest::blocking`)
//! - No sleeping, only waiting on I/O or state changes
//! - No `unwrap()` / `expect()` outside tests
//!
//! The scanners live here; the rules live in `tests/`.

use std::path::{Path, PathBuf};

/// Production source roots, relative to the workspace root
pub const PRODUCTION_DIRS: [&str; 2] = ["tracker/core/src", "tracker/cli/src"];

/// One offending line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// File containing the line
    pub path: PathBuf,
    /// 1-based line number
    pub line: usize,
    /// Trimmed source text
    pub text: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{} - {}", self.path.display(), self.line, self.text)
    }
}

/// Workspace root, found from this crate's manifest directory
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../..")
}

/// Code part of a line, without a trailing `//` comment
pub fn code_part(line: &str) -> &str {
    line.split("//").next().unwrap_or(line)
}

/// Lines of `content` that are production code
///
/// Everything from the first `#[cfg(test)]` on is test code; the crates
/// keep their unit tests in a trailing `mod tests`.
pub fn production_lines(content: &str) -> impl Iterator<Item = (usize, &str)> {
    content
        .lines()
        .enumerate()
        .take_while(|(_, line)| line.trim() != "#[cfg(test)]")
        .map(|(idx, line)| (idx + 1, line))
}

/// Scan every `.rs` file under the production roots with `is_violation`
pub fn scan_production(is_violation: impl Fn(&str) -> bool) -> Vec<Violation> {
    let root = workspace_root();
    let mut violations = Vec::new();

    for dir in PRODUCTION_DIRS {
        let path = root.join(dir);
        if !path.exists() {
            continue;
        }

        for entry in walkdir::WalkDir::new(&path)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("rs"))
        {
            let Ok(content) = std::fs::read_to_string(entry.path()) else {
                continue;
            };
            violations.extend(scan_source(entry.path(), &content, &is_violation));
        }
    }

    violations
}

/// Scan one file's content
pub fn scan_source(
    path: &Path,
    content: &str,
    is_violation: &impl Fn(&str) -> bool,
) -> Vec<Violation> {
    production_lines(content)
        .filter(|(_, line)| {
            let trimmed = line.trim_start();
            !trimmed.starts_with("//") && is_violation(code_part(line))
        })
        .map(|(line, text)| Violation {
            path: path.to_path_buf(),
            line,
            text: text.trim().to_string(),
        })
        .collect()
}

/// Print violations and panic if there are any
pub fn report(rule: &str, violations: &[Violation]) {
    if violations.is_empty() {
        return;
    }

    eprintln!("\n❌ {rule}\n");
    for violation in violations {
        eprintln!("  ❌ {violation}");
    }
    panic!(
        "\nFound {} violation(s) of: {rule}\nFix these before merging!",
        violations.len()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_test_module_is_not_production() {
        let source = "fn a() {}\n#[cfg(test)]\nmod tests {\n    fn b() { x.unwrap() }\n}\n";
        let lines: Vec<_> = production_lines(source).collect();
        assert_eq!(lines, vec![(1, "fn a() {}")]);
    }

    #[test]
    fn test_comments_are_ignored() {
        let source = "// std::fs::read\nlet x = 1; // std::fs::write\nstd::fs::remove_file(p);\n";
        let found = scan_source(Path::new("a.rs"), source, &|l: &str| l.contains("std::fs::"));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].line, 3);
    }

    #[test]
    fn test_production_roots_exist() {
        for dir in PRODUCTION_DIRS {
            assert!(workspace_root().join(dir).is_dir(), "{dir} is missing");
        }
    }
}
