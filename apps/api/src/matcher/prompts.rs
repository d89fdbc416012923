pub const MATCH_SYSTEM: &str = "You are a recruiting assistant that compares a candidate's résumé \
against a single job description. You respond with JSON only, no prose and no markdown.";

pub const MATCH_PROMPT_TEMPLATE: &str = r#"Compare the résumé with the job description.

Return exactly this JSON object:
{
  "similarity_score": <number between 0 and 1>,
  "matched_skills": [<skills the job asks for that the résumé shows>],
  "missing_skills": [<skills the job asks for that the résumé lacks>]
}

List skills in the order the job description mentions them. Use short skill names.

JOB DESCRIPTION:
{description}

RÉSUMÉ:
{resume_text}"#;

pub fn build_match_prompt(description: &str, resume_text: &str) -> String {
    MATCH_PROMPT_TEMPLATE
        .replace("{description}", description.trim())
        .replace("{resume_text}", resume_text.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_both_texts() {
        let prompt = build_match_prompt("  Rust engineer ", "Kafka veteran\n");
        assert!(prompt.contains("JOB DESCRIPTION:\nRust engineer\n"));
        assert!(prompt.ends_with("RÉSUMÉ:\nKafka veteran"));
        assert!(!prompt.contains("{description}"));
    }
}
