//! Per-criterion screening — one yes/no generation call per criterion,
//! evaluated concurrently, with an aggregate match rate.

use serde::Serialize;
use tracing::warn;

use crate::analysis::lang::Lang;
use crate::llm_client::gateway::Gateway;
use crate::llm_client::{prompts, GenerateParams};

/// Outcome for a single screening criterion.
#[derive(Debug, Clone, Serialize)]
pub struct CriterionResult {
    pub criterion: String,
    pub matched: bool,
}

/// Splits user-supplied criteria text into individual criteria: one per
/// line, and comma-separated items within a line each count separately.
/// A blob that produces nothing is kept whole as a single criterion.
pub fn parse_criteria_text(text: &str) -> Vec<String> {
    let mut parts: Vec<String> = Vec::new();
    for line in text.lines() {
        if line.contains(',') {
            parts.extend(
                line.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string),
            );
        } else if !line.trim().is_empty() {
            parts.push(line.trim().to_string());
        }
    }
    if parts.is_empty() && !text.trim().is_empty() {
        parts.push(text.trim().to_string());
    }
    parts
}

/// Evaluates one criterion against a resume. A failed generation call
/// counts as not matched rather than surfacing an error.
pub async fn evaluate_criterion(
    gateway: &Gateway,
    resume_text: &str,
    criterion: &str,
    lang: Lang,
) -> CriterionResult {
    let system = prompts::CRITERION_SYSTEM_TEMPLATE
        .replace("{lang}", lang.adjective())
        .replace("{criterion}", criterion);
    let prompt = prompts::wrap_inst(&system, &format!("Resume Content:\n{resume_text}"));
    let params = GenerateParams {
        max_tokens: 10,
        temperature: 0.1,
        top_p: 0.3,
        stop: vec!["\n".to_string()],
    };

    let matched = match gateway.invoke(&prompt, &params).await {
        Ok(text) => text.contains('\u{2705}') || text.to_uppercase().contains("PASS"),
        Err(e) => {
            warn!("criterion check failed, treating as not matched: {e}");
            false
        }
    };

    CriterionResult {
        criterion: criterion.to_string(),
        matched,
    }
}

/// Evaluates all criteria concurrently, preserving input order.
pub async fn evaluate_criteria(
    gateway: &Gateway,
    resume_text: &str,
    criteria: &[String],
    lang: Lang,
) -> Vec<CriterionResult> {
    let handles: Vec<_> = criteria
        .iter()
        .map(|criterion| {
            let gateway = gateway.clone();
            let resume = resume_text.to_string();
            let criterion = criterion.clone();
            tokio::spawn(async move {
                evaluate_criterion(&gateway, &resume, &criterion, lang).await
            })
        })
        .collect();

    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        match handle.await {
            Ok(result) => results.push(result),
            Err(e) => warn!("criterion task panicked: {e}"),
        }
    }
    results
}

/// Percentage of matched criteria. Empty input yields 0.0, not NaN.
pub fn match_rate(results: &[CriterionResult]) -> f64 {
    if results.is_empty() {
        return 0.0;
    }
    let matched = results.iter().filter(|r| r.matched).count();
    matched as f64 / results.len() as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::gateway::test_support::{fast_gateway, ScriptedGenerator};
    use crate::llm_client::LlmError;

    fn result(criterion: &str, matched: bool) -> CriterionResult {
        CriterionResult {
            criterion: criterion.to_string(),
            matched,
        }
    }

    #[test]
    fn test_parse_criteria_splits_lines_and_commas() {
        let parsed = parse_criteria_text("5+ years of Rust\nTeam lead, Kubernetes ,  CI/CD\n\n");
        assert_eq!(
            parsed,
            vec!["5+ years of Rust", "Team lead", "Kubernetes", "CI/CD"]
        );
    }

    #[test]
    fn test_parse_criteria_single_blob() {
        assert_eq!(
            parse_criteria_text("Willing to relocate"),
            vec!["Willing to relocate"]
        );
        assert!(parse_criteria_text("   ").is_empty());
    }

    #[tokio::test]
    async fn test_checkmark_sentinel_matches() {
        let (gateway, _) = fast_gateway(ScriptedGenerator::always("\u{2705} yes"));
        let result = evaluate_criterion(&gateway, "resume", "Rust experience", Lang::En).await;
        assert!(result.matched);
    }

    #[tokio::test]
    async fn test_pass_keyword_matches_case_insensitively() {
        let (gateway, _) = fast_gateway(ScriptedGenerator::always("pass"));
        let result = evaluate_criterion(&gateway, "resume", "Rust experience", Lang::En).await;
        assert!(result.matched);
    }

    #[tokio::test]
    async fn test_cross_sentinel_does_not_match() {
        let (gateway, _) = fast_gateway(ScriptedGenerator::always("\u{274c} no"));
        let result = evaluate_criterion(&gateway, "resume", "Rust experience", Lang::En).await;
        assert!(!result.matched);
    }

    #[tokio::test]
    async fn test_generation_failure_counts_as_not_matched() {
        let (gateway, _) = fast_gateway(ScriptedGenerator::new(vec![Err(LlmError::EmptyOutput)]));
        let result = evaluate_criterion(&gateway, "resume", "Rust experience", Lang::En).await;
        assert!(!result.matched);
    }

    #[tokio::test]
    async fn test_fan_out_preserves_criterion_order() {
        let (gateway, _) = fast_gateway(ScriptedGenerator::always("\u{2705}"));
        let criteria = vec!["first".to_string(), "second".to_string(), "third".to_string()];
        let results = evaluate_criteria(&gateway, "resume", &criteria, Lang::En).await;
        let order: Vec<&str> = results.iter().map(|r| r.criterion.as_str()).collect();
        assert_eq!(order, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_match_rate_empty_is_zero() {
        assert_eq!(match_rate(&[]), 0.0);
    }

    #[test]
    fn test_match_rate_percentage() {
        let results = vec![
            result("a", true),
            result("b", false),
            result("c", true),
            result("d", true),
        ];
        assert_eq!(match_rate(&results), 75.0);
    }
}
