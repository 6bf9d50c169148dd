//! Integration Test: Blocking I/O Prohibition
//!
//! **Policy**: async functions MUST NOT use blocking I/O.
//! **Required**: `tokio::io`, `tokio::fs`, `reqwest` (async client).
//! **Acceptable**: blocking calls in plain `fn` (configuration is loaded
//! before any request is served), test code.

use architectural_enforcement::{all_production_files, code_part, report, violation};

const BLOCKING_PATTERNS: &[&str] = &[
    "std::fs::",
    "std::net::",
    "std::io::stdin",
    "std::thread::sleep",
    "reqwest::blocking",
    ".read_line(",
];

/// Test that async production code does not use blocking I/O
#[test]
fn test_no_blocking_io_in_async_code() {
    let mut violations = Vec::new();

    for file in all_production_files() {
        let lines: Vec<&str> = file.lines.iter().map(String::as_str).collect();
        for (idx, line) in lines.iter().enumerate() {
            let code = code_part(line);
            if !BLOCKING_PATTERNS.iter().any(|p| code.contains(p)) {
                continue;
            }
            if !is_in_async_function(&lines, idx) {
                continue;
            }
            violations.push(violation(&file, idx));
        }
    }

    report(
        "Blocking I/O calls found in async production code!",
        &violations,
        &[
            "❌ FORBIDDEN in async fn: std::fs, std::net, reqwest::blocking",
            "✅ REQUIRED: tokio::fs, tokio::io, the async reqwest client",
        ],
    );
}

/// Check if the nearest enclosing `fn` above the line is async
fn is_in_async_function(lines: &[&str], current_idx: usize) -> bool {
    for i in (0..=current_idx).rev() {
        let line = lines[i].trim();
        if let Some(pos) = line.find("fn ") {
            let head = &line[..pos];
            if head.is_empty()
                || head.ends_with("pub ")
                || head.ends_with("async ")
                || head.ends_with(") ")
            {
                return head.contains("async");
            }
        }
    }
    false
}

#[test]
fn test_async_detection() {
    let code = vec![
        "pub async fn load() {",
        "    let s = std::fs::read_to_string(path);",
        "}",
        "fn sync_load() {",
        "    let s = std::fs::read_to_string(path);",
        "}",
    ];

    assert!(is_in_async_function(&code, 1));
    assert!(!is_in_async_function(&code, 4));
}
