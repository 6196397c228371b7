//! Skill matching between a resume and a job description.
//!
//! Generation produces the scored comparison; a keyword alias table gives
//! a deterministic manual fallback so a dead model service still yields a
//! usable score.

use regex::Regex;
use serde_json::{json, Map, Value};
use tracing::warn;

use crate::analysis::lang::Lang;
use crate::llm_client::gateway::Gateway;
use crate::llm_client::{prompts, GenerateParams};
use crate::reconcile::reconcile;
use crate::recovery::JsonRecovery;
use crate::schema::{FieldSpec, TaskSpec, ValidatedRecord};

const MAX_LISTED_SKILLS: usize = 5;

/// Canonical skill names with the aliases that count as a mention.
/// Declared order is the iteration order, which keeps manual matching
/// deterministic.
const SKILL_ALIASES: &[(&str, &[&str])] = &[
    ("python", &["python", "py", "django", "flask"]),
    ("javascript", &["javascript", "js", "node", "react", "angular", "vue"]),
    ("java", &["java", "spring", "j2ee"]),
    ("c#", &["c#", ".net", "asp.net"]),
    ("c++", &["c++", "cpp"]),
    ("go", &["golang", "go lang"]),
    ("ruby", &["ruby", "rails"]),
    ("php", &["php", "laravel", "symfony"]),
    ("sql", &["sql", "mysql", "postgresql", "oracle"]),
    ("nosql", &["nosql", "mongodb", "dynamodb", "cosmosdb"]),
    ("aws", &["aws", "amazon web services", "ec2", "s3", "lambda"]),
    ("azure", &["azure", "microsoft azure"]),
    ("gcp", &["gcp", "google cloud"]),
    ("docker", &["docker", "container"]),
    ("kubernetes", &["kubernetes", "k8s"]),
    ("jenkins", &["jenkins", "ci/cd"]),
    ("git", &["git", "github", "gitlab"]),
    ("agile", &["agile", "scrum", "kanban"]),
    ("jira", &["jira", "atlassian"]),
    ("communication", &["communication", "interpersonal"]),
    ("leadership", &["leadership", "team lead", "manager"]),
    ("problem solving", &["problem solving", "analytical"]),
    ("team player", &["team player", "teamwork", "collaboration"]),
];

/// Target schema for one skill-match result.
pub fn skill_spec() -> TaskSpec {
    TaskSpec::new(vec![
        FieldSpec::bounded_number("match_score", 0, 100, json!(0)),
        FieldSpec::string_list("matching_skills", MAX_LISTED_SKILLS),
        FieldSpec::string_list("missing_skills", MAX_LISTED_SKILLS),
    ])
}

fn alias_mentioned(text: &str, alias: &str) -> bool {
    // Word-bounded, except that aliases ending in a symbol (c#, c++)
    // have no trailing word boundary to anchor on.
    let escaped = regex::escape(alias);
    let pattern = if alias.ends_with(|c: char| c.is_alphanumeric()) {
        format!(r"\b{escaped}\b")
    } else {
        format!(r"\b{escaped}")
    };
    match Regex::new(&pattern) {
        Ok(re) => re.is_match(text),
        Err(_) => text.contains(alias),
    }
}

fn mentioned_skills(text: &str) -> Vec<&'static str> {
    let lower = text.to_lowercase();
    SKILL_ALIASES
        .iter()
        .filter(|(_, aliases)| aliases.iter().any(|alias| alias_mentioned(&lower, alias)))
        .map(|(skill, _)| *skill)
        .collect()
}

/// Keyword-based skill comparison. The score is the percentage of job
/// description skills also found in the resume, zero when the job
/// description mentions none.
pub fn manual_skill_match(resume_text: &str, job_description: &str) -> Map<String, Value> {
    let resume_skills = mentioned_skills(resume_text);
    let job_skills = mentioned_skills(job_description);

    let matching: Vec<&str> = job_skills
        .iter()
        .filter(|skill| resume_skills.contains(skill))
        .copied()
        .collect();
    let missing: Vec<&str> = job_skills
        .iter()
        .filter(|skill| !resume_skills.contains(skill))
        .copied()
        .collect();

    let score = if job_skills.is_empty() {
        0
    } else {
        (matching.len() * 100 / job_skills.len()).min(100) as i64
    };

    let mut result = Map::new();
    result.insert("match_score".into(), json!(score));
    result.insert(
        "matching_skills".into(),
        json!(matching.iter().take(MAX_LISTED_SKILLS).collect::<Vec<_>>()),
    );
    result.insert(
        "missing_skills".into(),
        json!(missing.iter().take(MAX_LISTED_SKILLS).collect::<Vec<_>>()),
    );
    result
}

/// Compares one resume to the job description, reconciling the generated
/// comparison against the manual keyword match. Never fails; a dead
/// model service degrades to the manual result.
pub async fn analyze_skills(
    gateway: &Gateway,
    recovery: &JsonRecovery,
    resume_text: &str,
    job_description: &str,
    lang: Lang,
) -> ValidatedRecord {
    let spec = skill_spec();
    let fallback = manual_skill_match(resume_text, job_description);

    let system = prompts::SKILL_MATCH_SYSTEM_TEMPLATE.replace("{lang}", lang.adjective());
    let user = format!("Resume Content:\n{resume_text}\n\nJob Description:\n{job_description}");
    let prompt = prompts::wrap_inst(&system, &user);
    let params = GenerateParams {
        max_tokens: 1024,
        temperature: 0.1,
        top_p: 0.3,
        stop: Vec::new(),
    };

    let recovered = match gateway.invoke(&prompt, &params).await {
        Ok(raw) => recovery.recover(&raw, &spec),
        Err(e) => {
            warn!("skill match generation failed, manual comparison only: {e}");
            Map::new()
        }
    };

    reconcile(&recovered, &fallback, &spec, None)
}

fn boundary_regex(skill: &str) -> Option<Regex> {
    Regex::new(&format!(r"(?i)\b{}\b", regex::escape(skill))).ok()
}

/// Wraps each matched skill occurrence in the resume with `**SKILL**`
/// markers. Reserved for the report-rendering frontend.
#[allow(dead_code)]
pub fn highlight_matching_skills(resume_text: &str, matching_skills: &[String]) -> String {
    let mut highlighted = resume_text.to_string();
    for skill in matching_skills {
        if let Some(re) = boundary_regex(skill) {
            let marker = format!("**{}**", skill.to_uppercase());
            highlighted = re.replace_all(&highlighted, marker.as_str()).into_owned();
        }
    }
    highlighted
}
