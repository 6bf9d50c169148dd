//! Architectural Enforcement Integration Tests
//!
//! This package contains integration tests that enforce architectural principles:
//! - No sleep() calls in production code outside retry backoff
//! - No blocking I/O inside async functions
//! - No process-global mutable state in lingua-core
//! - No `unwrap()` / `expect()` in production code
//!
//! The helpers here scan source text. An item gated by `#[cfg(test)]` is
//! test code and is blanked out before checking; line numbers are kept.

use std::fs;
use std::path::{Path, PathBuf};

/// Production source roots, relative to the workspace root
pub const PRODUCTION_DIRS: &[&str] = &["lingua/core/src", "lingua/daemon/src"];

/// Files that only exist for tests
const TEST_ONLY_FILES: &[&str] = &["test_utils.rs"];

/// Workspace root, resolved from this package's manifest directory
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../..")
}

/// One production source file with its test module cut off
pub struct SourceFile {
    /// Path relative to the workspace root
    pub path: String,
    /// Production lines only
    pub lines: Vec<String>,
}

const TEST_GATE: &str = "#[cfg(test)]";

/// Blank out every item gated by `#[cfg(test)]`
///
/// Only the gated item is removed (a `mod tests { .. }` block, or a single
/// `pub mod test_utils;`); code after it is still production code. Newlines
/// inside removed items are kept so line numbers stay accurate.
pub fn production_part(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut rest = content;

    while let Some(start) = find_gate(rest) {
        out.push_str(&rest[..start]);
        let after_gate = start + TEST_GATE.len();
        let end = after_gate + gated_item_len(&rest[after_gate..]);
        out.extend(rest[start..end].chars().filter(|&c| c == '\n'));
        rest = &rest[end..];
    }
    out.push_str(rest);
    out
}

/// Byte offset of the first `#[cfg(test)]` that starts a line
fn find_gate(content: &str) -> Option<usize> {
    let mut offset = 0;
    for line in content.split_inclusive('\n') {
        let indent = line.len() - line.trim_start().len();
        if line.trim_start().starts_with(TEST_GATE) {
            return Some(offset + indent);
        }
        offset += line.len();
    }
    None
}

/// Length of the item following a gate: through its closing brace, or
/// through the `;` of a braceless item
///
/// Braces inside strings, char literals and comments are ignored.
fn gated_item_len(item: &str) -> usize {
    let bytes = item.as_bytes();
    let mut depth = 0usize;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                i = find_from(bytes, i, b"\n").unwrap_or(bytes.len());
                continue;
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = find_from(bytes, i + 2, b"*/").map_or(bytes.len(), |end| end + 2);
                continue;
            }
            b'r' if is_raw_string_start(bytes, i) => {
                let hashes = bytes[i + 1..].iter().take_while(|&&b| b == b'#').count();
                let body = i + 1 + hashes + 1;
                let mut close = vec![b'"'];
                close.extend(std::iter::repeat(b'#').take(hashes));
                i = find_from(bytes, body, &close).map_or(bytes.len(), |end| end + close.len());
                continue;
            }
            b'"' => {
                i = skip_string(bytes, i + 1);
                continue;
            }
            b'\'' => {
                i = skip_char_literal(bytes, i);
                continue;
            }
            b'{' => depth += 1,
            b'}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return i + 1;
                }
            }
            b';' if depth == 0 => return i + 1,
            _ => {}
        }
        i += 1;
    }
    bytes.len()
}

fn find_from(bytes: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    if from >= bytes.len() {
        return None;
    }
    bytes[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|pos| from + pos)
}

fn is_raw_string_start(bytes: &[u8], i: usize) -> bool {
    let prev_is_ident = i > 0 && {
        let prev = bytes[i - 1];
        (prev.is_ascii_alphanumeric() || prev == b'_') && prev != b'b'
    };
    if prev_is_ident {
        return false;
    }
    let hashes = bytes[i + 1..].iter().take_while(|&&b| b == b'#').count();
    bytes.get(i + 1 + hashes) == Some(&b'"')
}

/// Index just past the closing quote of a string whose body starts at `i`
fn skip_string(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}

/// Skip a char literal at `i`; a lifetime only skips its quote
fn skip_char_literal(bytes: &[u8], i: usize) -> usize {
    match bytes.get(i + 1) {
        Some(b'\\') => find_from(bytes, i + 3, b"'").map_or(bytes.len(), |end| end + 1),
        Some(_) if bytes.get(i + 2) == Some(&b'\'') => i + 3,
        _ => i + 1,
    }
}

/// The code part of a line, without a trailing `//` comment
pub fn code_part(line: &str) -> &str {
    line.split("//").next().unwrap_or(line)
}

/// Production source files under `dir` (relative to the workspace root)
pub fn production_files(dir: &str) -> Vec<SourceFile> {
    let root = workspace_root();
    let base = root.join(dir);
    if !base.exists() {
        return Vec::new();
    }

    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(&base)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) != Some("rs") {
            continue;
        }
        let name = path.file_name().and_then(|s| s.to_str()).unwrap_or("");
        if TEST_ONLY_FILES.contains(&name) {
            continue;
        }
        let Ok(content) = fs::read_to_string(path) else {
            continue;
        };

        let relative = path
            .strip_prefix(&root)
            .unwrap_or(path)
            .display()
            .to_string();
        files.push(SourceFile {
            path: relative,
            lines: production_part(&content)
                .lines()
                .map(str::to_string)
                .collect(),
        });
    }
    files
}

/// Every production file in [`PRODUCTION_DIRS`]
pub fn all_production_files() -> Vec<SourceFile> {
    PRODUCTION_DIRS
        .iter()
        .flat_map(|dir| production_files(dir))
        .collect()
}

/// Format a violation the way the reports print it
pub fn violation(file: &SourceFile, idx: usize) -> String {
    format!("{}:{} - {}", file.path, idx + 1, file.lines[idx].trim())
}

/// Panic with a report if any violations were found
pub fn report(title: &str, violations: &[String], hints: &[&str]) {
    if violations.is_empty() {
        return;
    }

    eprintln!("\n❌ CRITICAL: {title}\n");
    for v in violations {
        eprintln!("  ❌ {v}");
    }
    if !hints.is_empty() {
        eprintln!();
        for hint in hints {
            eprintln!("  {hint}");
        }
    }

    panic!(
        "\nFound {} violation(s) in production code.\nFix these before merging!",
        violations.len()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_production_part_cuts_test_module() {
        let content = "fn a() {}\n#[cfg(test)]\nmod tests { fn b() { x.unwrap(); } }\n";
        let production = production_part(content);

        assert!(production.starts_with("fn a() {}\n"));
        assert!(!production.contains("unwrap"));
        assert_eq!(production.lines().count(), content.lines().count());
    }

    #[test]
    fn test_code_after_gated_declaration_is_kept() {
        let content = "pub mod table;\n\n#[cfg(test)]\npub mod test_utils;\n\npub use table::Table;\nfn f() { x.unwrap(); }\n";
        let production = production_part(content);

        assert!(!production.contains("test_utils"));
        assert!(production.contains("pub use table::Table;"));
        assert!(production.contains("x.unwrap()"));
        let lines: Vec<&str> = production.lines().collect();
        assert_eq!(lines[5], "pub use table::Table;");
    }

    #[test]
    fn test_gated_item_on_one_line() {
        let production = production_part("#[cfg(test)] pub mod test_utils;\nstatic X: u8 = 0;\n");
        assert_eq!(production, "\nstatic X: u8 = 0;\n");
    }

    #[test]
    fn test_braces_in_literals_do_not_end_the_item() {
        let content = concat!(
            "#[cfg(test)]\n",
            "mod tests {\n",
            "    fn t() { let a = \"{not json\"; let b = r#\"{\"id\":1\"#; let c = '{'; }\n",
            "    // } stray brace in a comment\n",
            "    fn u<'a>(s: &'a str) -> &'a str { s }\n",
            "}\n",
            "fn after() { y.expect(\"boom\"); }\n",
        );
        let production = production_part(content);

        assert!(!production.contains("not json"));
        assert!(production.contains("fn after()"));
        assert_eq!(production.lines().count(), content.lines().count());
    }

    #[test]
    fn test_code_part_drops_comments() {
        assert_eq!(code_part("let x = 1; // sleep(1)"), "let x = 1; ");
    }

    #[test]
    fn test_production_dirs_exist() {
        for dir in PRODUCTION_DIRS {
            assert!(workspace_root().join(dir).exists(), "missing {dir}");
        }
    }
}
