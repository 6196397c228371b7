//! POST /api/v1/analyze — multipart batch analysis.
//!
//! Accepts repeated `files` parts (PDF bytes), a required `criteria` text
//! part and an optional `job_description` part, and returns the full
//! batch report as JSON.

use std::path::Path;
use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::Json;
use tracing::warn;

use crate::analysis::criteria::parse_criteria_text;
use crate::batch::ResumeInput;
use crate::errors::AppError;
use crate::pdf;
use crate::report::{save_report, BatchReport};
use crate::state::AppState;

pub async fn handle_analyze(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<BatchReport>, AppError> {
    let mut resumes: Vec<ResumeInput> = Vec::new();
    let mut criteria_text = String::new();
    let mut job_description = String::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "files" => {
                let filename = field
                    .file_name()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("resume_{}.pdf", resumes.len() + 1));
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Unreadable file part: {e}")))?;
                let text = pdf::extract_text(&filename, &bytes);
                resumes.push(ResumeInput { filename, text });
            }
            "criteria" => {
                criteria_text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Unreadable criteria part: {e}")))?;
            }
            "job_description" => {
                job_description = field.text().await.map_err(|e| {
                    AppError::Validation(format!("Unreadable job description part: {e}"))
                })?;
            }
            other => {
                warn!("ignoring unexpected multipart field `{other}`");
            }
        }
    }

    if resumes.is_empty() {
        return Err(AppError::Validation("No resume files provided".to_string()));
    }

    let criteria = parse_criteria_text(&criteria_text);
    if criteria.is_empty() {
        return Err(AppError::Validation(
            "No evaluation criteria provided".to_string(),
        ));
    }

    let report = Arc::clone(&state.analyzer)
        .analyze_batch(resumes, criteria, job_description)
        .await;

    // Persistence is best-effort; the response carries the report either way.
    if let Err(e) = save_report(&report, Path::new(&state.config.output_dir)) {
        warn!("failed to persist batch report: {e:#}");
    }

    Ok(Json(report))
}
