//! Field reconciliation — merges a recovered mapping with the
//! deterministic fallback under the task schema's validation rules.
//!
//! This function is total: whatever the recovered mapping looks like
//! (including empty), the result carries every declared field with a
//! type-correct, range-clamped value. There is no error channel, only
//! per-field provenance.

use regex::Regex;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::OnceLock;
use tracing::debug;

use crate::schema::{FieldKind, FieldSpec, Provenance, TaskSpec, ValidatedRecord};

fn digit_run_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+").expect("digit run pattern is valid"))
}

/// Merges `recovered` against `fallback` per field of `spec`.
///
/// `source_id` is the document's file identifier, used only for the
/// last-resort display-name derivation on identity fields.
pub fn reconcile(
    recovered: &Map<String, Value>,
    fallback: &Map<String, Value>,
    spec: &TaskSpec,
    source_id: Option<&str>,
) -> ValidatedRecord {
    let mut values = Map::new();
    let mut provenance = BTreeMap::new();

    for field in &spec.fields {
        let (value, origin) = reconcile_field(field, recovered.get(&field.name), fallback, source_id);
        if origin != Provenance::Generated {
            debug!("field `{}` resolved from {:?}", field.name, origin);
        }
        values.insert(field.name.clone(), value);
        provenance.insert(field.name.clone(), origin);
    }

    ValidatedRecord { values, provenance }
}

fn reconcile_field(
    field: &FieldSpec,
    candidate: Option<&Value>,
    fallback: &Map<String, Value>,
    source_id: Option<&str>,
) -> (Value, Provenance) {
    match &field.kind {
        FieldKind::Text => reconcile_text(field, candidate, fallback, source_id),
        FieldKind::Number => reconcile_number(field, candidate, fallback, None),
        FieldKind::BoundedNumber { min, max } => {
            reconcile_number(field, candidate, fallback, Some((*min, *max)))
        }
        FieldKind::StringList { max_len } => reconcile_list(field, candidate, fallback, *max_len),
        FieldKind::Categorical { allowed } => {
            reconcile_categorical(field, candidate, fallback, allowed)
        }
    }
}

fn reconcile_text(
    field: &FieldSpec,
    candidate: Option<&Value>,
    fallback: &Map<String, Value>,
    source_id: Option<&str>,
) -> (Value, Provenance) {
    if let Some(text) = candidate.and_then(Value::as_str) {
        let text = text.trim();
        if field.check.accepts(text) {
            return (Value::String(text.to_string()), Provenance::Generated);
        }
    }

    if let Some(text) = fallback.get(&field.name).and_then(Value::as_str) {
        if !text.is_empty() {
            return (Value::String(text.to_string()), Provenance::Fallback);
        }
    }

    if field.identity {
        if let Some(id) = source_id {
            let derived = display_name_from_source_id(id);
            if !derived.is_empty() {
                return (Value::String(derived), Provenance::Derived);
            }
        }
    }

    (field.default.clone(), Provenance::Default)
}

fn reconcile_number(
    field: &FieldSpec,
    candidate: Option<&Value>,
    fallback: &Map<String, Value>,
    bounds: Option<(i64, i64)>,
) -> (Value, Provenance) {
    let clamp = |n: i64| match bounds {
        Some((min, max)) => n.clamp(min, max),
        None => n,
    };

    if let Some(n) = candidate.and_then(coerce_number) {
        return (Value::from(clamp(n)), Provenance::Generated);
    }

    if let Some(n) = fallback.get(&field.name).and_then(coerce_number) {
        return (Value::from(clamp(n)), Provenance::Fallback);
    }

    // No sensible number anywhere: the field's declared neutral default.
    (field.default.clone(), Provenance::Default)
}

fn reconcile_list(
    field: &FieldSpec,
    candidate: Option<&Value>,
    fallback: &Map<String, Value>,
    max_len: usize,
) -> (Value, Provenance) {
    if let Some(items) = candidate.map(coerce_list) {
        if !items.is_empty() {
            return (
                Value::Array(items.into_iter().take(max_len).map(Value::String).collect()),
                Provenance::Generated,
            );
        }
    }

    if let Some(items) = fallback.get(&field.name).map(coerce_list) {
        if !items.is_empty() {
            return (
                Value::Array(items.into_iter().take(max_len).map(Value::String).collect()),
                Provenance::Fallback,
            );
        }
    }

    (field.default.clone(), Provenance::Default)
}

fn reconcile_categorical(
    field: &FieldSpec,
    candidate: Option<&Value>,
    fallback: &Map<String, Value>,
    allowed: &[String],
) -> (Value, Provenance) {
    let canonical = |raw: &Value| -> Option<String> {
        let text = raw.as_str()?.trim();
        allowed
            .iter()
            .find(|variant| variant.eq_ignore_ascii_case(text))
            .cloned()
    };

    if let Some(variant) = candidate.and_then(|v| canonical(v)) {
        return (Value::String(variant), Provenance::Generated);
    }
    if let Some(variant) = fallback.get(&field.name).and_then(|v| canonical(v)) {
        return (Value::String(variant), Provenance::Fallback);
    }
    (field.default.clone(), Provenance::Default)
}

/// Numbers pass through; numeric-looking strings yield their first
/// embedded digit run. Everything else is non-coercible.
fn coerce_number(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => digit_run_regex()
            .find(s)
            .and_then(|m| m.as_str().parse::<i64>().ok()),
        _ => None,
    }
}

/// Lists keep their string members (numbers are stringified); a non-empty
/// scalar string is wrapped as a single-element list.
fn coerce_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        Value::String(s) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => Vec::new(),
    }
}

/// `jane_doe_resume.pdf` → `Jane Doe Resume`.
fn display_name_from_source_id(source_id: &str) -> String {
    let stem = std::path::Path::new(source_id)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(source_id);
    title_case(&stem.replace('_', " "))
}

/// Title-cases each whitespace-separated word.
pub(crate) fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn profile_like_spec() -> TaskSpec {
        TaskSpec::new(vec![
            FieldSpec::text("name", 2).identity(),
            FieldSpec::email("email"),
            FieldSpec::phone("phone"),
            FieldSpec::bounded_number("years_experience", 0, 50, json!("")),
            FieldSpec::string_list("top_skills", 5),
        ])
    }

    fn as_map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_schema_complete_even_from_empty_inputs() {
        let record = reconcile(&Map::new(), &Map::new(), &profile_like_spec(), None);
        for field in &profile_like_spec().fields {
            assert!(record.get(&field.name).is_some(), "missing {}", field.name);
        }
    }

    #[test]
    fn test_valid_generated_values_win_over_fallback() {
        let recovered = as_map(json!({"name": "Jane Doe", "email": "jane@example.com"}));
        let fallback = as_map(json!({"name": "Wrong Name", "email": "other@example.com"}));
        let record = reconcile(&recovered, &fallback, &profile_like_spec(), None);
        assert_eq!(record.get_str("name"), Some("Jane Doe"));
        assert_eq!(record.provenance_of("name"), Some(Provenance::Generated));
    }

    #[test]
    fn test_invalid_email_falls_back() {
        let recovered = as_map(json!({"email": "not an address"}));
        let fallback = as_map(json!({"email": "jane@example.com"}));
        let record = reconcile(&recovered, &fallback, &profile_like_spec(), None);
        assert_eq!(record.get_str("email"), Some("jane@example.com"));
        assert_eq!(record.provenance_of("email"), Some(Provenance::Fallback));
    }

    #[test]
    fn test_short_phone_falls_back_to_default_when_fallback_empty() {
        let recovered = as_map(json!({"phone": "555"}));
        let record = reconcile(&recovered, &Map::new(), &profile_like_spec(), None);
        assert_eq!(record.get_str("phone"), Some(""));
        assert_eq!(record.provenance_of("phone"), Some(Provenance::Default));
    }

    #[test]
    fn test_numeric_string_is_coerced() {
        let recovered = as_map(json!({"years_experience": "7+ years"}));
        let record = reconcile(&recovered, &Map::new(), &profile_like_spec(), None);
        assert_eq!(record.get_i64("years_experience"), Some(7));
    }

    #[test]
    fn test_clamping_law_holds_for_extreme_values() {
        for raw in [json!(-3), json!(0), json!(50), json!(9000), json!("120 years")] {
            let recovered = as_map(json!({ "years_experience": raw }));
            let record = reconcile(&recovered, &Map::new(), &profile_like_spec(), None);
            let v = record.get_i64("years_experience").unwrap();
            assert!((0..=50).contains(&v), "value {v} escaped bounds");
        }
    }

    #[test]
    fn test_non_numeric_everywhere_yields_neutral_default() {
        let recovered = as_map(json!({"years_experience": "unknown"}));
        let fallback = as_map(json!({"years_experience": ""}));
        let record = reconcile(&recovered, &fallback, &profile_like_spec(), None);
        assert_eq!(record.get_str("years_experience"), Some(""));
        assert_eq!(
            record.provenance_of("years_experience"),
            Some(Provenance::Default)
        );
    }

    #[test]
    fn test_list_truncation_law() {
        let recovered = as_map(json!({
            "top_skills": ["a", "b", "c", "d", "e", "f", "g"]
        }));
        let record = reconcile(&recovered, &Map::new(), &profile_like_spec(), None);
        assert_eq!(record.get("top_skills").unwrap().as_array().unwrap().len(), 5);
    }

    #[test]
    fn test_scalar_is_wrapped_as_single_element_list() {
        let recovered = as_map(json!({"top_skills": "Rust"}));
        let record = reconcile(&recovered, &Map::new(), &profile_like_spec(), None);
        assert_eq!(record.get("top_skills").unwrap(), &json!(["Rust"]));
    }

    #[test]
    fn test_empty_list_falls_back() {
        let recovered = as_map(json!({"top_skills": []}));
        let fallback = as_map(json!({"top_skills": ["Python", "Go"]}));
        let record = reconcile(&recovered, &fallback, &profile_like_spec(), None);
        assert_eq!(record.get("top_skills").unwrap(), &json!(["Python", "Go"]));
        assert_eq!(record.provenance_of("top_skills"), Some(Provenance::Fallback));
    }

    #[test]
    fn test_identity_field_derives_from_source_id() {
        let record = reconcile(
            &Map::new(),
            &Map::new(),
            &profile_like_spec(),
            Some("jane_doe_resume.pdf"),
        );
        assert_eq!(record.get_str("name"), Some("Jane Doe Resume"));
        assert_eq!(record.provenance_of("name"), Some(Provenance::Derived));
    }

    #[test]
    fn test_categorical_is_canonicalized_case_insensitively() {
        let spec = TaskSpec::new(vec![FieldSpec::categorical(
            "recommendation",
            &["Highly Recommend", "Recommend", "Consider", "Not Recommended"],
            "Not available",
        )]);
        let recovered = as_map(json!({"recommendation": "highly recommend"}));
        let record = reconcile(&recovered, &Map::new(), &spec, None);
        assert_eq!(record.get_str("recommendation"), Some("Highly Recommend"));
    }

    #[test]
    fn test_unknown_categorical_uses_default() {
        let spec = TaskSpec::new(vec![FieldSpec::categorical(
            "recommendation",
            &["Recommend", "Consider"],
            "Not available",
        )]);
        let recovered = as_map(json!({"recommendation": "maybe???"}));
        let record = reconcile(&recovered, &Map::new(), &spec, None);
        assert_eq!(record.get_str("recommendation"), Some("Not available"));
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("jane doe"), "Jane Doe");
        assert_eq!(title_case("JANE"), "Jane");
        assert_eq!(title_case(""), "");
    }
}
