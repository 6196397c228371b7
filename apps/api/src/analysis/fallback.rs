//! Deterministic fallback extraction — pattern rules over the raw resume
//! text, fully independent of the generation service.
//!
//! Pure function of the source text: no I/O, no randomness, so it can be
//! recomputed as the reconciliation baseline on every call. Within each
//! field family the rules are ordered and the first match wins; more
//! constrained patterns come before looser ones.

use regex::Regex;
use serde_json::{Map, Value};

use crate::reconcile::title_case;
use crate::schema::TaskSpec;

/// Closed skill vocabulary for the `top_skills` family. Matches are
/// collected in vocabulary order, not input order, and capped to 5.
const SKILL_VOCAB: &[&str] = &[
    "python",
    "javascript",
    "java",
    "c++",
    "ruby",
    "go",
    "rust",
    "sql",
    "nosql",
    "react",
    "angular",
    "vue",
    "node",
    "express",
    "django",
    "flask",
    "rails",
    "spring",
    "bootstrap",
    "css",
    "html",
    "aws",
    "azure",
    "gcp",
    "docker",
    "kubernetes",
    "terraform",
    "ci/cd",
    "git",
    "agile",
    "scrum",
    "management",
    "leadership",
    "communication",
    "teamwork",
    "problem solving",
    "analytical",
    "creative",
    "time management",
    "project management",
    "marketing",
    "sales",
    "crm",
    "seo",
    "digital marketing",
    "content writing",
    "copywriting",
    "graphic design",
    "ui/ux",
    "product management",
    "data analysis",
    "machine learning",
    "ai",
];

const MAX_SKILLS: usize = 5;

/// Pattern-rule extractor for the profile field families.
pub struct FallbackExtractor {
    re_email: Regex,
    re_phones: Vec<Regex>,
    re_years: Vec<Regex>,
    re_education: Vec<Regex>,
    re_positions: Vec<Regex>,
    re_name_heading: Regex,
    re_name_labeled: Regex,
    re_skills: Vec<Regex>,
}

impl FallbackExtractor {
    pub fn new() -> Self {
        let compile = |pattern: &str| Regex::new(pattern).expect("fallback pattern is valid");
        Self {
            re_email: compile(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b"),
            // Local, international, parenthesized, in that order.
            re_phones: vec![
                compile(r"\b\d{3}[-.\s]?\d{3}[-.\s]?\d{4}\b"),
                compile(r"\+\d{1,3}[-.\s]?\d{1,4}[-.\s]?\d{1,4}[-.\s]?\d{1,4}\b"),
                compile(r"\(\d{3}\)[-.\s]?\d{3}[-.\s]?\d{4}\b"),
            ],
            // "N years experience" and "experience of N years".
            re_years: vec![
                compile(r"(?i)(\d+)\+?\s*(?:years|year|yrs|yr)(?:\s+of\s+|\s+)(?:experience|work)"),
                compile(r"(?i)(?:experience|work)(?:\s+of\s+|\s+)(\d+)\+?\s*(?:years|year|yrs|yr)"),
            ],
            // Degree keyword near an institution keyword, both orderings.
            re_education: vec![
                compile(
                    r"(?i)(?:bachelor|master|phd|mba|bs|ba|ms|b\.s\.|m\.s\.|b\.a\.|ph\.d\.).{1,50}(?:university|college|institute|school)",
                ),
                compile(
                    r"(?i)(?:university|college|institute|school).{1,50}(?:bachelor|master|phd|mba|bs|ba|ms|b\.s\.|m\.s\.|b\.a\.|ph\.d\.)",
                ),
            ],
            // Heading phrasings in priority order: explicit "current",
            // any position label, then a title-like line.
            re_positions: vec![
                compile(r"(?i)(?:current|present|latest|recent)\s+(?:position|title|role)[\s:]+([^\n.]+)"),
                compile(r"(?i)(?:position|title|role)[\s:]+([^\n.]+)"),
                compile(
                    r"(?i)(?:senior|lead|principal|director|manager|engineer|developer|analyst|consultant|specialist)[^,\n.]{1,30}(?:at|@|,|-)([^,\n.]{1,30})",
                ),
            ],
            re_name_heading: compile(r"^([A-Z][a-z]+(?:\s+[A-Z][a-z]+){1,2})(?:\n|\r)"),
            re_name_labeled: compile(
                r"(?i)(?:name|cv|curriculum vitae|resume)\s*(?::|of|for)\s*([A-Za-z]+(?:\s+[A-Za-z]+){1,2})",
            ),
            re_skills: SKILL_VOCAB
                .iter()
                .map(|skill| {
                    compile(&format!(r"(?i)\b{}\b", regex::escape(skill)))
                })
                .collect(),
        }
    }

    /// Schema-complete extraction: every field of `spec` is present, with
    /// its declared default when no pattern matches.
    pub fn extract(&self, source_text: &str, spec: &TaskSpec) -> Map<String, Value> {
        let mut record = spec.defaults();

        for field in &spec.fields {
            let value = match field.name.as_str() {
                "name" => self.extract_name(source_text).map(Value::String),
                "email" => self.extract_email(source_text).map(Value::String),
                "phone" => self.extract_phone(source_text).map(Value::String),
                "years_experience" => self.extract_years(source_text).map(Value::String),
                "education" => self.extract_education(source_text).map(Value::String),
                "last_position" => self.extract_position(source_text).map(Value::String),
                "top_skills" => {
                    let skills = self.extract_skills(source_text);
                    (!skills.is_empty())
                        .then(|| Value::Array(skills.into_iter().map(Value::String).collect()))
                }
                // Unknown family: the declared default stands.
                _ => None,
            };
            if let Some(value) = value {
                record.insert(field.name.clone(), value);
            }
        }

        record
    }

    fn extract_email(&self, text: &str) -> Option<String> {
        self.re_email.find(text).map(|m| m.as_str().to_string())
    }

    fn extract_phone(&self, text: &str) -> Option<String> {
        self.re_phones
            .iter()
            .find_map(|re| re.find(text).map(|m| m.as_str().to_string()))
    }

    fn extract_years(&self, text: &str) -> Option<String> {
        self.re_years
            .iter()
            .find_map(|re| re.captures(text).map(|caps| caps[1].to_string()))
    }

    fn extract_education(&self, text: &str) -> Option<String> {
        self.re_education
            .iter()
            .find_map(|re| re.find(text).map(|m| m.as_str().trim().to_string()))
    }

    fn extract_position(&self, text: &str) -> Option<String> {
        self.re_positions
            .iter()
            .find_map(|re| re.captures(text).map(|caps| caps[1].trim().to_string()))
    }

    fn extract_name(&self, text: &str) -> Option<String> {
        self.re_name_heading
            .captures(text)
            .or_else(|| self.re_name_labeled.captures(text))
            .map(|caps| caps[1].trim().to_string())
    }

    /// Membership test of the text against the vocabulary; first
    /// `MAX_SKILLS` hits in vocabulary order.
    fn extract_skills(&self, text: &str) -> Vec<String> {
        SKILL_VOCAB
            .iter()
            .zip(&self.re_skills)
            .filter(|(_, re)| re.is_match(text))
            .take(MAX_SKILLS)
            .map(|(skill, _)| title_case(skill))
            .collect()
    }
}

impl Default for FallbackExtractor {
    fn default() -> Self {
        Self::new()
    }
}
