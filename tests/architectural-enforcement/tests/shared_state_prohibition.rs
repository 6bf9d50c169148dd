//! Integration Test: Context Object Discipline
//!
//! **Policy**: lingua-core keeps all shared state inside the service
//! context. No process-global mutable state, and no panicking shortcuts
//! in production paths.

use architectural_enforcement::{code_part, production_files, report, violation};

const GLOBAL_STATE_PATTERNS: &[&str] = &[
    "static mut ",
    "lazy_static!",
    "OnceLock<",
    "OnceCell<",
    "LazyLock<",
    "thread_local!",
];

#[test]
fn test_no_global_state_in_core() {
    let mut violations = Vec::new();

    for file in production_files("lingua/core/src") {
        for (idx, line) in file.lines.iter().enumerate() {
            let code = code_part(line);
            let is_static_item = code.trim_start().starts_with("static ")
                || code.trim_start().starts_with("pub static ");
            if is_static_item || GLOBAL_STATE_PATTERNS.iter().any(|p| code.contains(p)) {
                violations.push(violation(&file, idx));
            }
        }
    }

    report(
        "Process-global state found in lingua-core!",
        &violations,
        &["Move the state into TranslationService or one of its components."],
    );
}

#[test]
fn test_no_unwrap_in_production_code() {
    let mut violations = Vec::new();

    for dir in ["lingua/core/src", "lingua/daemon/src"] {
        for file in production_files(dir) {
            for (idx, line) in file.lines.iter().enumerate() {
                let code = code_part(line);
                if code.contains(".unwrap()") || code.contains(".expect(") {
                    violations.push(violation(&file, idx));
                }
            }
        }
    }

    report(
        "unwrap()/expect() found in production code!",
        &violations,
        &["Propagate with `?`, or use unwrap_or / unwrap_or_else with a fallback."],
    );
}
