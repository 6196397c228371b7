//! PDF text extraction boundary.
//!
//! Extraction is best-effort: an unreadable document yields an empty
//! string, and the downstream pipeline degrades through its fallbacks
//! instead of failing the whole batch.

use std::sync::OnceLock;

use regex::Regex;
use tracing::warn;

fn horizontal_ws_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[ \t]+").expect("whitespace pattern is valid"))
}

fn newline_run_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n{3,}").expect("newline run pattern is valid"))
}

/// Extracts and normalizes text from raw PDF bytes.
pub fn extract_text(filename: &str, bytes: &[u8]) -> String {
    match pdf_extract::extract_text_from_mem(bytes) {
        Ok(text) => cleanup(&text),
        Err(e) => {
            warn!("text extraction failed for {filename}: {e}");
            String::new()
        }
    }
}

/// Strips control noise and collapses whitespace so prompts stay compact:
/// no NUL bytes, runs of spaces and tabs collapse to one space, and at
/// most two consecutive newlines survive.
pub fn cleanup(text: &str) -> String {
    let without_nulls: String = text.replace('\u{0}', "");
    let normalized = without_nulls.replace("\r\n", "\n").replace('\r', "\n");
    let collapsed = horizontal_ws_regex().replace_all(&normalized, " ");
    let trimmed_lines: Vec<&str> = collapsed.lines().map(str::trim).collect();
    let rejoined = trimmed_lines.join("\n");
    newline_run_regex()
        .replace_all(&rejoined, "\n\n")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cleanup_collapses_horizontal_whitespace() {
        assert_eq!(cleanup("Jane   Doe\tEngineer"), "Jane Doe Engineer");
    }

    #[test]
    fn test_cleanup_caps_newline_runs() {
        assert_eq!(cleanup("Summary\n\n\n\n\nSkills"), "Summary\n\nSkills");
    }

    #[test]
    fn test_cleanup_strips_nulls_and_carriage_returns() {
        assert_eq!(cleanup("Jane\u{0} Doe\r\nEngineer"), "Jane Doe\nEngineer");
    }

    #[test]
    fn test_extract_text_tolerates_garbage_bytes() {
        assert_eq!(extract_text("broken.pdf", b"not a pdf at all"), "");
    }
}
