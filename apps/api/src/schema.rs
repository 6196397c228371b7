//! Target schemas for structured-output recovery.
//!
//! A [`TaskSpec`] declares, for one recovery operation, the ordered set of
//! fields the final record must carry. Reconciliation dispatches on
//! [`FieldKind`] uniformly — there is no per-field branching anywhere else.

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Value family of a field, with its normalization parameters.
#[derive(Debug, Clone)]
pub enum FieldKind {
    Text,
    /// Unbounded integer. No current task declares one; every numeric
    /// field in use carries bounds.
    #[allow(dead_code)]
    Number,
    BoundedNumber { min: i64, max: i64 },
    StringList { max_len: usize },
    Categorical { allowed: Vec<String> },
}

/// Minimal shape check a recovered value must pass before it is accepted
/// over the fallback.
#[derive(Debug, Clone)]
pub enum ShapeCheck {
    None,
    /// String must be strictly longer than this many characters.
    MinLen(usize),
    EmailAddress,
    /// At least one digit and at least 7 characters.
    PhoneNumber,
}

pub(crate) fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$")
            .expect("email pattern is valid")
    })
}

impl ShapeCheck {
    pub fn accepts(&self, value: &str) -> bool {
        match self {
            ShapeCheck::None => !value.is_empty(),
            ShapeCheck::MinLen(min) => value.len() > *min,
            ShapeCheck::EmailAddress => email_regex().is_match(value),
            ShapeCheck::PhoneNumber => {
                value.len() >= 7 && value.chars().any(|c| c.is_ascii_digit())
            }
        }
    }
}

/// One field of a target schema.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    /// Neutral value used when neither the recovered mapping nor the
    /// fallback can supply one.
    pub default: Value,
    pub check: ShapeCheck,
    /// Identity fields may, as a last resort, derive their value from the
    /// document's file identifier.
    pub identity: bool,
}

impl FieldSpec {
    pub fn text(name: &str, min_len: usize) -> Self {
        Self {
            name: name.to_string(),
            kind: FieldKind::Text,
            default: Value::String(String::new()),
            check: ShapeCheck::MinLen(min_len),
            identity: false,
        }
    }

    pub fn email(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: FieldKind::Text,
            default: Value::String(String::new()),
            check: ShapeCheck::EmailAddress,
            identity: false,
        }
    }

    pub fn phone(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: FieldKind::Text,
            default: Value::String(String::new()),
            check: ShapeCheck::PhoneNumber,
            identity: false,
        }
    }

    pub fn bounded_number(name: &str, min: i64, max: i64, default: Value) -> Self {
        Self {
            name: name.to_string(),
            kind: FieldKind::BoundedNumber { min, max },
            default,
            check: ShapeCheck::None,
            identity: false,
        }
    }

    pub fn string_list(name: &str, max_len: usize) -> Self {
        Self {
            name: name.to_string(),
            kind: FieldKind::StringList { max_len },
            default: Value::Array(Vec::new()),
            check: ShapeCheck::None,
            identity: false,
        }
    }

    pub fn categorical(name: &str, allowed: &[&str], default: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: FieldKind::Categorical {
                allowed: allowed.iter().map(|s| s.to_string()).collect(),
            },
            default: Value::String(default.to_string()),
            check: ShapeCheck::None,
            identity: false,
        }
    }

    pub fn identity(mut self) -> Self {
        self.identity = true;
        self
    }
}

/// Ordered target schema for one recovery operation.
#[derive(Debug, Clone)]
pub struct TaskSpec {
    pub fields: Vec<FieldSpec>,
}

impl TaskSpec {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self { fields }
    }

    /// Schema-complete mapping of every field to its declared default.
    pub fn defaults(&self) -> Map<String, Value> {
        self.fields
            .iter()
            .map(|f| (f.name.clone(), f.default.clone()))
            .collect()
    }
}

/// Where a validated field's value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Accepted from the recovered generation output.
    Generated,
    /// Taken from the deterministic fallback extraction.
    Fallback,
    /// Derived from the document identifier (identity fields only).
    Derived,
    /// The field's declared neutral default.
    Default,
}

/// Final schema-complete, type-correct, range-clamped record.
///
/// Invariant: every field of the producing [`TaskSpec`] is present, and
/// every value satisfies its kind and shape check. Provenance is carried
/// per field for observability but not serialized into the record.
#[derive(Debug, Clone, Serialize)]
pub struct ValidatedRecord {
    #[serde(flatten)]
    pub values: Map<String, Value>,
    #[serde(skip)]
    pub provenance: BTreeMap<String, Provenance>,
}

impl ValidatedRecord {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_i64)
    }

    pub fn provenance_of(&self, name: &str) -> Option<Provenance> {
        self.provenance.get(name).copied()
    }
}
