//! Hiring recommendation — generated narrative reconciled against a
//! criteria-driven fallback, plus the deterministic tier derived from the
//! weighted score.

use serde::{Serialize, Serializer};
use serde_json::{json, Map, Value};
use tracing::warn;

use crate::analysis::criteria::CriterionResult;
use crate::analysis::lang::Lang;
use crate::llm_client::gateway::Gateway;
use crate::llm_client::{prompts, GenerateParams};
use crate::reconcile::reconcile;
use crate::recovery::JsonRecovery;
use crate::schema::{FieldSpec, TaskSpec, ValidatedRecord};

const RECOMMENDATION_LABELS: [&str; 4] = [
    "Highly Recommend",
    "Recommend",
    "Consider",
    "Not Recommended",
];

/// Recommendation tier derived from the weighted score alone, ordered
/// weakest to strongest so tiers compare naturally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Tier {
    NotRecommended,
    Consider,
    Recommend,
    HighlyRecommend,
}

impl Serialize for Tier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl Tier {
    /// Boundaries are inclusive: 80 lands in the top tier, 65 and 50 in
    /// theirs.
    pub fn from_weighted_score(score: f64) -> Self {
        if score >= 80.0 {
            Tier::HighlyRecommend
        } else if score >= 65.0 {
            Tier::Recommend
        } else if score >= 50.0 {
            Tier::Consider
        } else {
            Tier::NotRecommended
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Tier::HighlyRecommend => "Highly Recommend",
            Tier::Recommend => "Recommend",
            Tier::Consider => "Consider",
            Tier::NotRecommended => "Not Recommended",
        }
    }

    pub fn suggested_rating(self) -> u8 {
        match self {
            Tier::HighlyRecommend => 8,
            Tier::Recommend => 7,
            Tier::Consider => 5,
            Tier::NotRecommended => 3,
        }
    }
}

/// Composite score: criteria match rate weighted 60%, skill score 40%.
pub fn weighted_score(criteria_match_rate: f64, skill_match_score: f64) -> f64 {
    criteria_match_rate * 0.6 + skill_match_score * 0.4
}

/// Target schema for one recommendation.
pub fn recommendation_spec() -> TaskSpec {
    TaskSpec::new(vec![
        FieldSpec::bounded_number("overall_rating", 1, 10, json!(5)),
        FieldSpec::string_list("strengths", 3),
        FieldSpec::string_list("concerns", 3),
        FieldSpec::string_list("interview_questions", 3),
        FieldSpec::categorical("recommendation", &RECOMMENDATION_LABELS, "Not available"),
    ])
}

fn canned(items: &[&str]) -> Value {
    json!(items)
}

/// Recommendation built purely from the criteria match rate, used when
/// generation fails outright.
pub fn fallback_recommendation(criteria_results: &[CriterionResult]) -> Map<String, Value> {
    let matched = criteria_results.iter().filter(|r| r.matched).count();
    let total = criteria_results.len();
    let percentage = if total > 0 {
        matched as f64 / total as f64 * 100.0
    } else {
        0.0
    };

    let (rating, label, strengths, concerns, questions): (i64, &str, &[&str], &[&str], &[&str]) =
        if percentage >= 80.0 {
            (
                8,
                "Highly Recommend",
                &["Meets most job requirements", "Strong match for required criteria"],
                &["Verify depth of knowledge in matched areas"],
                &["Can you elaborate on your experience with the technologies mentioned?"],
            )
        } else if percentage >= 60.0 {
            (
                6,
                "Recommend",
                &["Meets many job requirements", "Good alignment with key criteria"],
                &["Some required skills may be missing", "Verify experience level"],
                &["How would you address the gaps in your skillset for this role?"],
            )
        } else if percentage >= 40.0 {
            (
                4,
                "Consider",
                &["Meets some job requirements", "May have transferable skills"],
                &["Several required skills missing", "May require significant training"],
                &["How would you compensate for your missing qualifications?"],
            )
        } else {
            (
                2,
                "Not Recommended",
                &[
                    "May have some relevant background",
                    "Could be considered for a different role",
                ],
                &[
                    "Very few required skills present",
                    "Significant skill gap for this position",
                ],
                &["Why do you believe you're qualified for this specific position?"],
            )
        };

    let mut result = Map::new();
    result.insert("overall_rating".into(), json!(rating));
    result.insert("strengths".into(), canned(strengths));
    result.insert("concerns".into(), canned(concerns));
    result.insert("interview_questions".into(), canned(questions));
    result.insert("recommendation".into(), json!(label));
    result
}

fn criteria_summary(criteria_results: &[CriterionResult]) -> String {
    criteria_results
        .iter()
        .map(|r| {
            let sentinel = if r.matched { '\u{2705}' } else { '\u{274c}' };
            format!("{sentinel} {}", r.criterion)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Produces the validated recommendation record for one resume. Always
/// yields a complete record, falling back to the criteria table when
/// generation fails.
pub async fn recommend(
    gateway: &Gateway,
    recovery: &JsonRecovery,
    resume_text: &str,
    job_description: &str,
    criteria_results: &[CriterionResult],
    lang: Lang,
) -> ValidatedRecord {
    let spec = recommendation_spec();
    let fallback = fallback_recommendation(criteria_results);

    let system = prompts::RECOMMENDATION_SYSTEM_TEMPLATE.replace("{lang}", lang.adjective());
    let user = format!(
        "Resume Content:\n{resume_text}\n\nJob Description:\n{job_description}\n\nCriteria Evaluation Results:\n{}",
        criteria_summary(criteria_results)
    );
    let prompt = prompts::wrap_inst(&system, &user);
    let params = GenerateParams {
        max_tokens: 1024,
        temperature: 0.3,
        top_p: 0.5,
        stop: Vec::new(),
    };

    let recovered = match gateway.invoke(&prompt, &params).await {
        Ok(raw) => recovery.recover(&raw, &spec),
        Err(e) => {
            warn!("recommendation generation failed, criteria fallback only: {e}");
            Map::new()
        }
    };

    reconcile(&recovered, &fallback, &spec, None)
}
