//! Field-level regex salvage — last resort after the cleaning cascade.
//!
//! Searches the raw text for each field the task schema declares and
//! assembles whatever subset is found. Patterns are literal `"name": value`
//! shapes keyed by the field's kind, so the salvage is schema-driven
//! rather than a hardcoded field list.

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;
use tracing::info;

use crate::schema::{FieldKind, TaskSpec};

fn list_item_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#""([^"]+)""#).expect("list item pattern is valid"))
}

/// Scans `raw` for every field in `spec`, returning the partial mapping of
/// whatever could be found. Never fails; an unsalvageable field is simply
/// absent.
pub fn salvage_fields(raw: &str, spec: &TaskSpec) -> Map<String, Value> {
    let mut mapping = Map::new();

    for field in &spec.fields {
        let name = regex::escape(&field.name);
        let salvaged = match &field.kind {
            FieldKind::Number | FieldKind::BoundedNumber { .. } => {
                salvage_number(raw, &name)
            }
            FieldKind::StringList { .. } => salvage_list(raw, &name),
            FieldKind::Text | FieldKind::Categorical { .. } => salvage_string(raw, &name),
        };
        if let Some(value) = salvaged {
            mapping.insert(field.name.clone(), value);
        }
    }

    info!(
        "salvaged {} of {} fields from unparseable output",
        mapping.len(),
        spec.fields.len()
    );
    mapping
}

fn salvage_string(raw: &str, name: &str) -> Option<Value> {
    let pattern = format!(r#""{name}"\s*:\s*"([^"]+)""#);
    let re = Regex::new(&pattern).ok()?;
    re.captures(raw)
        .map(|caps| Value::String(caps[1].to_string()))
}

fn salvage_number(raw: &str, name: &str) -> Option<Value> {
    let pattern = format!(r#""{name}"\s*:\s*"?(\d+)"?"#);
    let re = Regex::new(&pattern).ok()?;
    let caps = re.captures(raw)?;
    caps[1].parse::<i64>().ok().map(Value::from)
}

fn salvage_list(raw: &str, name: &str) -> Option<Value> {
    let pattern = format!(r#"(?s)"{name}"\s*:\s*\[(.*?)\]"#);
    let re = Regex::new(&pattern).ok()?;
    let caps = re.captures(raw)?;
    let items: Vec<Value> = list_item_regex()
        .captures_iter(&caps[1])
        .map(|item| Value::String(item[1].to_string()))
        .collect();
    Some(Value::Array(items))
}
