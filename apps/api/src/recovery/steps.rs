//! The cleaning cascade — an ordered list of named textual repairs.
//!
//! The full sequence runs over a working buffer and the result is
//! re-parsed once; individual steps are deliberately blunt, regex-level
//! rewrites, not a parser. Each is independently unit-testable by name.

use regex::{Captures, Regex};
use tracing::trace;

type Step = fn(&Cleaner, &str) -> String;

/// Compiled patterns for every cleaning step.
pub struct Cleaner {
    re_fence: Regex,
    re_spaced_key: Regex,
    re_bare_key: Regex,
    re_bare_item: Regex,
    re_trailing_comma: Regex,
    re_missing_comma: Regex,
    re_quoted_bool: Regex,
    re_quoted_number: Regex,
}

impl Cleaner {
    pub fn new() -> Self {
        Self {
            re_fence: Regex::new(r"(?i)```(?:json)?").expect("fence pattern is valid"),
            re_spaced_key: Regex::new(r#""([^"\n]*[ \t][^"\n]*)"\s*:"#)
                .expect("spaced key pattern is valid"),
            re_bare_key: Regex::new(r"(?m)(^|[{,\s])([A-Za-z_][A-Za-z0-9_]*)(\s*:)")
                .expect("bare key pattern is valid"),
            re_bare_item: Regex::new(r"([\[,]\s*)([A-Za-z_][A-Za-z0-9_ .+#/-]*)([,\]])")
                .expect("bare item pattern is valid"),
            re_trailing_comma: Regex::new(r",\s*([}\]])").expect("trailing comma pattern is valid"),
            re_missing_comma: Regex::new(r#"(["}\d])\s*\n\s*""#)
                .expect("missing comma pattern is valid"),
            re_quoted_bool: Regex::new(r#"(?i):\s*"(true|false)""#)
                .expect("quoted bool pattern is valid"),
            re_quoted_number: Regex::new(r#":\s*"(-?\d+)""#).expect("quoted number pattern is valid"),
        }
    }

    /// The cascade, in fixed order. Names exist for logging and tests.
    fn steps() -> &'static [(&'static str, Step)] {
        &[
            ("isolate_object", Cleaner::isolate_object),
            ("strip_code_fences", Cleaner::strip_code_fences),
            ("underscore_spaced_keys", Cleaner::underscore_spaced_keys),
            ("quote_bare_keys", Cleaner::quote_bare_keys),
            ("quote_bare_list_items", Cleaner::quote_bare_list_items),
            ("normalize_quotes", Cleaner::normalize_quotes),
            ("strip_trailing_commas", Cleaner::strip_trailing_commas),
            ("insert_missing_commas", Cleaner::insert_missing_commas),
            ("unquote_scalars", Cleaner::unquote_scalars),
            ("balance_brackets", Cleaner::balance_brackets),
        ]
    }

    /// Applies every step in order to a working copy of `raw`.
    pub fn run(&self, raw: &str) -> String {
        let mut buffer = raw.to_string();
        for (name, step) in Self::steps() {
            let next = step(self, &buffer);
            if next != buffer {
                trace!("cleaning step `{name}` changed the buffer");
                buffer = next;
            }
        }
        buffer
    }

    /// Crops to the substring from the first `{` to the last `}` when the
    /// JSON is wrapped in commentary. Without both delimiters the buffer
    /// is left alone.
    fn isolate_object(&self, input: &str) -> String {
        match (input.find('{'), input.rfind('}')) {
            (Some(start), Some(end)) if start < end => input[start..=end].to_string(),
            _ => input.to_string(),
        }
    }

    fn strip_code_fences(&self, input: &str) -> String {
        self.re_fence.replace_all(input, "").into_owned()
    }

    /// `"years of experience":` → `"years_of_experience":`.
    fn underscore_spaced_keys(&self, input: &str) -> String {
        self.re_spaced_key
            .replace_all(input, |caps: &Captures| {
                format!("\"{}\":", caps[1].replace(' ', "_"))
            })
            .into_owned()
    }

    /// `name:` → `"name":`. Only identifiers in key position (after `{`,
    /// `,` or line start); values are left to the list-item step.
    fn quote_bare_keys(&self, input: &str) -> String {
        self.re_bare_key
            .replace_all(input, |caps: &Captures| {
                format!("{}\"{}\"{}", &caps[1], &caps[2], &caps[3])
            })
            .into_owned()
    }

    /// `[Go, Rust]` → `["Go", "Rust"]`. Runs to a fixpoint because
    /// adjacent tokens share their separating comma.
    fn quote_bare_list_items(&self, input: &str) -> String {
        let mut buffer = input.to_string();
        loop {
            let next = self
                .re_bare_item
                .replace_all(&buffer, |caps: &Captures| {
                    let token = caps[2].trim_end();
                    if token.is_empty() || is_json_literal(token) {
                        caps[0].to_string()
                    } else {
                        format!("{}\"{}\"{}", &caps[1], token, &caps[3])
                    }
                })
                .into_owned();
            if next == buffer {
                return buffer;
            }
            buffer = next;
        }
    }

    /// Blunt single-to-double quote normalization. Apostrophes inside
    /// prose values will break, which the salvage stage then absorbs.
    fn normalize_quotes(&self, input: &str) -> String {
        input.replace('\'', "\"")
    }

    fn strip_trailing_commas(&self, input: &str) -> String {
        self.re_trailing_comma.replace_all(input, "${1}").into_owned()
    }

    /// Inserts a comma between a value end and a key start separated only
    /// by a newline.
    fn insert_missing_commas(&self, input: &str) -> String {
        self.re_missing_comma
            .replace_all(input, "${1},\n\"")
            .into_owned()
    }

    /// `: "7"` → `: 7` and `: "true"` → `: true`.
    fn unquote_scalars(&self, input: &str) -> String {
        let pass = self
            .re_quoted_bool
            .replace_all(input, |caps: &Captures| {
                format!(": {}", caps[1].to_ascii_lowercase())
            })
            .into_owned();
        self.re_quoted_number.replace_all(&pass, ": ${1}").into_owned()
    }

    /// Appends the closing `]`/`}` characters needed to balance raw
    /// open/close counts. Counts, not nesting: strings containing braces
    /// or interleaved closers can still come out structurally wrong.
    /// Known bounded-effort limitation, absorbed by the salvage stage.
    fn balance_brackets(&self, input: &str) -> String {
        let mut buffer = input.to_string();
        let open_brackets = buffer.matches('[').count();
        let close_brackets = buffer.matches(']').count();
        if open_brackets > close_brackets {
            buffer.push_str(&"]".repeat(open_brackets - close_brackets));
        }
        let open_braces = buffer.matches('{').count();
        let close_braces = buffer.matches('}').count();
        if open_braces > close_braces {
            buffer.push_str(&"}".repeat(open_braces - close_braces));
        }
        buffer
    }
}

impl Default for Cleaner {
    fn default() -> Self {
        Self::new()
    }
}

fn is_json_literal(token: &str) -> bool {
    token.eq_ignore_ascii_case("true")
        || token.eq_ignore_ascii_case("false")
        || token.eq_ignore_ascii_case("null")
}
