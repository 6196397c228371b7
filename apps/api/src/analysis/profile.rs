//! Candidate profile extraction — generation plus deterministic fallback,
//! reconciled into a schema-complete profile record.

use serde_json::{json, Map};
use tracing::warn;

use crate::analysis::fallback::FallbackExtractor;
use crate::analysis::lang::Lang;
use crate::llm_client::gateway::Gateway;
use crate::llm_client::{prompts, GenerateParams};
use crate::reconcile::reconcile;
use crate::recovery::JsonRecovery;
use crate::schema::{FieldSpec, TaskSpec, ValidatedRecord};

/// Target schema for one profile extraction. Field names line up with
/// `PROFILE_SYSTEM_TEMPLATE` and with the fallback extractor's families.
pub fn profile_spec() -> TaskSpec {
    TaskSpec::new(vec![
        FieldSpec::text("name", 2).identity(),
        FieldSpec::email("email"),
        FieldSpec::phone("phone"),
        FieldSpec::bounded_number("years_experience", 0, 50, json!("")),
        FieldSpec::text("education", 5),
        FieldSpec::string_list("top_skills", 5),
        FieldSpec::text("last_position", 3),
    ])
}

/// Extracts a validated profile record for one resume.
///
/// The fallback extraction always runs first; a generation failure is
/// absorbed here by reconciling an empty mapping, so every field comes
/// from the fallback (or its default). There is no error path.
pub async fn extract_profile(
    gateway: &Gateway,
    recovery: &JsonRecovery,
    extractor: &FallbackExtractor,
    resume_text: &str,
    filename: &str,
    lang: Lang,
) -> ValidatedRecord {
    let spec = profile_spec();
    let fallback = extractor.extract(resume_text, &spec);

    let system = prompts::PROFILE_SYSTEM_TEMPLATE.replace("{lang}", lang.adjective());
    let prompt = prompts::wrap_inst(&system, &format!("Resume Content:\n{resume_text}"));
    let params = GenerateParams {
        max_tokens: 1024,
        temperature: 0.1,
        top_p: 0.3,
        stop: Vec::new(),
    };

    let recovered = match gateway.invoke(&prompt, &params).await {
        Ok(raw) => recovery.recover(&raw, &spec),
        Err(e) => {
            warn!("profile generation failed, fallback extraction only: {e}");
            Map::new()
        }
    };

    reconcile(&recovered, &fallback, &spec, Some(filename))
}
