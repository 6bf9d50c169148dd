//! Integration Test: Sleep Prohibition
//!
//! **Policy**: Production code MUST NOT call sleep methods. Waiting happens
//! on I/O, on locks, or under `tokio::time::timeout`.
//! **Exceptions**: retry backoff in the hosted API client, test code.

use architectural_enforcement::{all_production_files, code_part, report, violation};

/// Test that production code does not contain sleep() calls
#[test]
fn test_no_sleep_in_production_code() {
    let mut violations = Vec::new();

    for file in all_production_files() {
        let lines: Vec<&str> = file.lines.iter().map(String::as_str).collect();
        for (idx, line) in lines.iter().enumerate() {
            let code = code_part(line);
            if !(code.contains("::sleep(") || code.contains(".sleep(")) {
                continue;
            }
            if is_backoff_context(&lines, idx) {
                continue;
            }
            violations.push(violation(&file, idx));
        }
    }

    report(
        "Sleep calls found in production code!",
        &violations,
        &[
            "✅ ACCEPTABLE: backoff between retries of a retryable error",
            "❌ FORBIDDEN: polling loops, sleep as synchronization",
            "   Use tokio::time::timeout, a Mutex, or a channel instead.",
        ],
    );
}

/// Check if sleep is a retry backoff
fn is_backoff_context(lines: &[&str], current_idx: usize) -> bool {
    let context_range = current_idx.saturating_sub(15)..std::cmp::min(current_idx + 5, lines.len());

    let mut has_backoff_calc = false;
    let mut has_retry_context = false;

    for line in &lines[context_range] {
        let line = line.to_lowercase();

        if line.contains("backoff_for_attempt") || line.contains("<<") || line.contains("pow") {
            has_backoff_calc = true;
        }

        if line.contains("retry") || line.contains("attempt") {
            has_retry_context = true;
        }
    }

    has_backoff_calc && has_retry_context
}

#[test]
fn test_backoff_detection() {
    let code = vec![
        "Err(e) if e.is_retryable() && attempt < max_retries => {",
        "    let backoff = self.retry.backoff_for_attempt(attempt);",
        "    tokio::time::sleep(backoff).await;",
        "}",
    ];

    assert!(is_backoff_context(&code, 2));
}

#[test]
fn test_polling_sleep_is_not_backoff() {
    let code = vec![
        "loop {",
        "    if ready() { break; }",
        "    tokio::time::sleep(Duration::from_millis(10)).await;",
        "}",
    ];

    assert!(!is_backoff_context(&code, 2));
}
