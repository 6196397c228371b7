//! Batch report assembly and JSON persistence.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::analysis::criteria::CriterionResult;
use crate::analysis::recommend::Tier;
use crate::schema::ValidatedRecord;

/// Full analysis outcome for one resume.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateReport {
    pub filename: String,
    pub profile: ValidatedRecord,
    pub criteria: Vec<CriterionResult>,
    pub criteria_match_rate: f64,
    pub skills: ValidatedRecord,
    pub recommendation: ValidatedRecord,
    pub weighted_score: f64,
    pub tier: Tier,
    /// Rating implied by the tier alone, independent of the generated
    /// `overall_rating`.
    pub tier_rating: u8,
}

/// One batch run, as persisted and as returned over the API.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub generated_at: DateTime<Utc>,
    pub resumes: Vec<CandidateReport>,
}

impl BatchReport {
    pub fn new(resumes: Vec<CandidateReport>) -> Self {
        Self {
            generated_at: Utc::now(),
            resumes,
        }
    }
}

/// Writes the report as pretty-printed JSON under `dir`, creating the
/// directory if needed. The filename carries the generation timestamp.
pub fn save_report(report: &BatchReport, dir: &Path) -> anyhow::Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("creating report directory {}", dir.display()))?;

    let stamp = report.generated_at.format("%Y%m%d_%H%M%S");
    let path = dir.join(format!("analysis_{stamp}.json"));

    let file = fs::File::create(&path)
        .with_context(|| format!("creating report file {}", path.display()))?;
    serde_json::to_writer_pretty(file, report).context("serializing batch report")?;

    info!("report saved to {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn record(fields: serde_json::Value) -> ValidatedRecord {
        match fields {
            serde_json::Value::Object(values) => ValidatedRecord {
                values,
                provenance: BTreeMap::new(),
            },
            _ => panic!("expected object"),
        }
    }

    fn sample_report() -> BatchReport {
        BatchReport::new(vec![CandidateReport {
            filename: "jane_doe.pdf".into(),
            profile: record(json!({"name": "Jane Doe"})),
            criteria: vec![CriterionResult {
                criterion: "Rust".into(),
                matched: true,
            }],
            criteria_match_rate: 100.0,
            skills: record(json!({"match_score": 80})),
            recommendation: record(json!({"recommendation": "Recommend"})),
            weighted_score: 92.0,
            tier: Tier::HighlyRecommend,
            tier_rating: Tier::HighlyRecommend.suggested_rating(),
        }])
    }

    #[test]
    fn test_save_report_writes_readable_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = save_report(&sample_report(), dir.path()).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&contents).unwrap();
        assert_eq!(parsed["resumes"][0]["filename"], json!("jane_doe.pdf"));
        assert_eq!(parsed["resumes"][0]["profile"]["name"], json!("Jane Doe"));
        assert_eq!(parsed["resumes"][0]["tier"], json!("Highly Recommend"));
        assert_eq!(parsed["resumes"][0]["tier_rating"], json!(8));
    }

    #[test]
    fn test_save_report_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("reports").join("2026");
        let path = save_report(&sample_report(), &nested).unwrap();
        assert!(path.starts_with(&nested));
        assert!(path.exists());
    }
}
