//! Prompt templates for every analysis task.
//!
//! Templates carry `{lang}` / `{criterion}` placeholders, replaced before
//! sending. The pipeline is agnostic to this wording beyond the field
//! names each template asks the model to emit.

/// Instruct-style wrapper expected by the default model family.
pub fn wrap_inst(system: &str, user: &str) -> String {
    format!("[INST] {system}\n\n{user} [/INST]")
}

/// System prompt for profile extraction — enforces JSON-only output.
/// Field names here must match `analysis::profile::profile_spec`.
pub const PROFILE_SYSTEM_TEMPLATE: &str = "You are a Recruitment Expert. Extract key information from this {lang} resume. \
Create a JSON object with these fields (leave empty if not found):\n\
1. name: Candidate's full name\n\
2. email: Candidate's email address\n\
3. phone: Candidate's phone number\n\
4. years_experience: Total years of professional experience (numeric only)\n\
5. education: Highest degree and institution\n\
6. top_skills: Array of 3-5 core skills mentioned\n\
7. last_position: Most recent job title and company\n\
Format response as valid JSON only. Ensure all field names and string values are enclosed in double quotes.\n\
If you cannot find a value, use empty string for text fields and empty array for lists.\n";

/// System prompt for single-criterion evaluation. The model must answer
/// with exactly one sentinel character.
pub const CRITERION_SYSTEM_TEMPLATE: &str = "You are a Recruitment Assistant Expert. Analyze the ENTIRE {lang} resume \
and STRICTLY evaluate against this criterion: {criterion}. Follow these rules:\n\
1. Carefully scan ALL SECTIONS, including education, experience, skills, and projects.\n\
2. Only return a match if the EXACT phrase appears VERBATIM anywhere in the resume.\n\
3. Partial matches or close variations are NOT allowed.\n\
4. If you find an exact match, ONLY return '\u{2705}'\n\
5. If no match is found, ONLY return '\u{274c}'\n";

/// System prompt for skill matching.
/// Field names here must match `analysis::skills::skill_spec`.
pub const SKILL_MATCH_SYSTEM_TEMPLATE: &str = "You are a Recruitment Expert. Compare this {lang} resume to the job description. \
Calculate a numeric match score from 0-100 based on skills alignment only.\n\
Provide JSON with:\n\
1. match_score: numeric score (0-100)\n\
2. matching_skills: array of 3-5 key matching skills\n\
3. missing_skills: array of 3-5 important skills from job description missing in the resume\n\
Format response as valid JSON only.\n";

/// System prompt for the hiring recommendation.
/// Field names here must match `analysis::recommend::recommendation_spec`.
pub const RECOMMENDATION_SYSTEM_TEMPLATE: &str = "You are a Senior Recruitment Expert. Analyze this {lang} resume against the job description. \
Based on the resume content and the criteria evaluation results, provide your professional recommendation.\n\
Structure your response in JSON with:\n\
1. overall_rating: numeric score (1-10)\n\
2. strengths: Array of 2-3 key candidate strengths relevant to this role\n\
3. concerns: Array of 2-3 potential concerns or gaps\n\
4. interview_questions: Array of 2-3 specific questions you would ask this candidate\n\
5. recommendation: Short hiring recommendation (Highly Recommend, Recommend, Consider, or Not Recommended)\n\
Format response as valid JSON only.\n";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_inst_shape() {
        let wrapped = wrap_inst("system text", "user text");
        assert!(wrapped.starts_with("[INST] system text"));
        assert!(wrapped.ends_with("user text [/INST]"));
    }

    #[test]
    fn test_templates_carry_lang_placeholder() {
        for template in [
            PROFILE_SYSTEM_TEMPLATE,
            CRITERION_SYSTEM_TEMPLATE,
            SKILL_MATCH_SYSTEM_TEMPLATE,
            RECOMMENDATION_SYSTEM_TEMPLATE,
        ] {
            assert!(template.contains("{lang}"));
        }
    }

    #[test]
    fn test_criterion_template_carries_criterion_placeholder() {
        assert!(CRITERION_SYSTEM_TEMPLATE.contains("{criterion}"));
    }
}
