//! Batch orchestration: runs the full analysis pipeline for each resume
//! concurrently and assembles the batch report.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::analysis::criteria::{evaluate_criteria, match_rate};
use crate::analysis::fallback::FallbackExtractor;
use crate::analysis::lang;
use crate::analysis::profile::extract_profile;
use crate::analysis::recommend::{recommend, weighted_score, Tier};
use crate::analysis::skills::analyze_skills;
use crate::llm_client::gateway::Gateway;
use crate::recovery::JsonRecovery;
use crate::report::{BatchReport, CandidateReport};
use crate::schema::Provenance;

/// One extracted resume queued for analysis.
#[derive(Debug, Clone)]
pub struct ResumeInput {
    pub filename: String,
    pub text: String,
}

/// Owns the shared pipeline pieces. Cheap to share behind an [`Arc`].
pub struct Analyzer {
    gateway: Gateway,
    recovery: JsonRecovery,
    fallback: FallbackExtractor,
}

impl Analyzer {
    pub fn new(gateway: Gateway) -> Self {
        Self {
            gateway,
            recovery: JsonRecovery::new(),
            fallback: FallbackExtractor::new(),
        }
    }

    /// Runs the full pipeline for one resume. A resume that defeats
    /// every stage still produces a schema-complete report entry.
    pub async fn analyze_resume(
        &self,
        input: &ResumeInput,
        criteria: &[String],
        job_description: &str,
    ) -> CandidateReport {
        let lang = lang::detect(&input.text);
        info!("analyzing {} ({:?})", input.filename, lang);

        let (profile, criteria_results, skills) = tokio::join!(
            extract_profile(
                &self.gateway,
                &self.recovery,
                &self.fallback,
                &input.text,
                &input.filename,
                lang,
            ),
            evaluate_criteria(&self.gateway, &input.text, criteria, lang),
            analyze_skills(
                &self.gateway,
                &self.recovery,
                &input.text,
                job_description,
                lang,
            ),
        );

        if profile.provenance_of("name") == Some(Provenance::Derived) {
            debug!(
                "{}: display name `{}` derived from the filename",
                input.filename,
                profile.get_str("name").unwrap_or_default()
            );
        }

        let recommendation = recommend(
            &self.gateway,
            &self.recovery,
            &input.text,
            job_description,
            &criteria_results,
            lang,
        )
        .await;

        let criteria_match_rate = match_rate(&criteria_results);
        let skill_score = skills.get_i64("match_score").unwrap_or(0) as f64;
        let score = weighted_score(criteria_match_rate, skill_score);
        let tier = Tier::from_weighted_score(score);

        CandidateReport {
            filename: input.filename.clone(),
            profile,
            criteria: criteria_results,
            criteria_match_rate,
            skills,
            recommendation,
            weighted_score: score,
            tier,
            tier_rating: tier.suggested_rating(),
        }
    }

    /// Analyzes every resume concurrently, preserving input order in the
    /// report.
    pub async fn analyze_batch(
        self: Arc<Self>,
        resumes: Vec<ResumeInput>,
        criteria: Vec<String>,
        job_description: String,
    ) -> BatchReport {
        let criteria = Arc::new(criteria);
        let job_description = Arc::new(job_description);

        let handles: Vec<_> = resumes
            .into_iter()
            .map(|input| {
                let analyzer = Arc::clone(&self);
                let criteria = Arc::clone(&criteria);
                let job_description = Arc::clone(&job_description);
                tokio::spawn(async move {
                    analyzer
                        .analyze_resume(&input, &criteria, &job_description)
                        .await
                })
            })
            .collect();

        let mut reports = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.await {
                Ok(report) => reports.push(report),
                Err(e) => warn!("resume analysis task panicked: {e}"),
            }
        }

        BatchReport::new(reports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::gateway::test_support::{fast_gateway, ScriptedGenerator};
    use crate::llm_client::LlmError;
    use serde_json::json;

    fn input(filename: &str, text: &str) -> ResumeInput {
        ResumeInput {
            filename: filename.to_string(),
            text: text.to_string(),
        }
    }

    #[tokio::test]
    async fn test_single_resume_report_is_schema_complete_under_total_failure() {
        let (gateway, _) = fast_gateway(ScriptedGenerator::new(vec![Err(LlmError::EmptyOutput)]));
        let analyzer = Analyzer::new(gateway);

        let report = analyzer
            .analyze_resume(
                &input("jane_doe.pdf", "Jane Doe\njane@example.com\nPython and Docker."),
                &["Rust experience".to_string()],
                "Python role",
            )
            .await;

        assert_eq!(report.filename, "jane_doe.pdf");
        assert_eq!(report.profile.get_str("email"), Some("jane@example.com"));
        assert_eq!(report.criteria.len(), 1);
        assert!(!report.criteria[0].matched);
        assert_eq!(report.criteria_match_rate, 0.0);
        assert!(report.recommendation.get_str("recommendation").is_some());
        assert_eq!(report.tier, Tier::from_weighted_score(report.weighted_score));
    }

    #[tokio::test]
    async fn test_weighted_score_feeds_the_tier() {
        // Every criterion passes and the skill score is generated at 100,
        // so the weighted score reaches the top band.
        let (gateway, _) = fast_gateway(ScriptedGenerator::always(
            r#"✅ {"match_score": 100, "overall_rating": 9,
                "matching_skills": ["python"], "missing_skills": [],
                "strengths": ["solid"], "concerns": ["none"],
                "interview_questions": ["why?"],
                "name": "Jane Doe", "recommendation": "Highly Recommend"}"#,
        ));
        let analyzer = Analyzer::new(gateway);

        let report = analyzer
            .analyze_resume(
                &input("jane_doe.pdf", "Python everywhere."),
                &["Python".to_string()],
                "Python role",
            )
            .await;

        assert_eq!(report.criteria_match_rate, 100.0);
        assert_eq!(report.weighted_score, 100.0);
        assert_eq!(report.tier, Tier::HighlyRecommend);
    }

    #[tokio::test]
    async fn test_batch_preserves_resume_order() {
        let (gateway, _) = fast_gateway(ScriptedGenerator::new(vec![Err(LlmError::EmptyOutput)]));
        let analyzer = Arc::new(Analyzer::new(gateway));

        let report = analyzer
            .analyze_batch(
                vec![
                    input("a_first.pdf", "Python."),
                    input("b_second.pdf", "Java."),
                    input("c_third.pdf", "Go services."),
                ],
                vec!["Python".to_string()],
                "Python role".to_string(),
            )
            .await;

        let order: Vec<&str> = report.resumes.iter().map(|r| r.filename.as_str()).collect();
        assert_eq!(order, vec!["a_first.pdf", "b_second.pdf", "c_third.pdf"]);
        assert_eq!(
            serde_json::to_value(&report.resumes[0].profile).unwrap()["name"],
            json!("A First")
        );
    }
}
