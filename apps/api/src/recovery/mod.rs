//! Structured output recovery — turns a raw model response into a
//! best-effort JSON mapping.
//!
//! Strategies are attempted strictly in order, stopping at the first
//! success:
//! 1. direct parse of the raw text;
//! 2. the full cleaning cascade ([`steps`]) followed by one re-parse;
//! 3. schema-driven field-level regex salvage ([`salvage`]).
//!
//! This stage never fails: the worst outcome is an empty mapping.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::schema::TaskSpec;

pub mod salvage;
pub mod steps;

/// Untyped recovered mapping. Absence of data is an empty map, never an
/// error.
pub type RecoveredMapping = Map<String, Value>;

/// Recovery engine with its compiled cleaning steps.
pub struct JsonRecovery {
    cleaner: steps::Cleaner,
}

impl JsonRecovery {
    pub fn new() -> Self {
        Self {
            cleaner: steps::Cleaner::new(),
        }
    }

    /// Best-effort recovery of a JSON object from `raw`.
    ///
    /// Already-valid input is returned from the direct parse untouched;
    /// the cleaning cascade runs only after the direct parse fails, and
    /// salvage only after the cleaned text also fails to parse.
    pub fn recover(&self, raw: &str, spec: &TaskSpec) -> RecoveredMapping {
        if let Some(mapping) = parse_object(raw) {
            return mapping;
        }

        debug!(
            "direct parse failed, cleaning: {:.100}",
            raw.replace('\n', " ")
        );
        let cleaned = self.cleaner.run(raw);
        if let Some(mapping) = parse_object(&cleaned) {
            debug!("cleaning cascade produced valid JSON");
            return mapping;
        }

        warn!(
            "cleaning cascade failed to yield valid JSON, salvaging fields: {:.50}",
            raw.replace('\n', " ")
        );
        salvage::salvage_fields(raw, spec)
    }
}

impl Default for JsonRecovery {
    fn default() -> Self {
        Self::new()
    }
}

/// Strict parse, accepting only a top-level object.
fn parse_object(text: &str) -> Option<RecoveredMapping> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(mapping)) => Some(mapping),
        _ => None,
    }
}
