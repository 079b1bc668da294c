// Suitability analysis prompt and the reply shape it asks for.
//
// The parser in `analysis::parser` depends on the shape requested here: one
// `<digits>%` score placed before the suggestions section. Bump
// `PROMPT_TEMPLATE_VERSION` and update the parser together.

use crate::analysis::models::{AnalysisPrompt, ExtractedText, JobDescription};

/// Identifier of the reply shape shared by the prompt and the parser.
pub const PROMPT_TEMPLATE_VERSION: &str = "suitability-v1";

/// Pattern the parser uses to find the score: 1-3 ASCII digits followed by `%`.
pub const SCORE_PATTERN: &str = r"([0-9]{1,3})%";

const OUTPUT_INSTRUCTIONS: &str = "\
Provide a suitability score (0-100%) and key improvements in a clear, structured format \
using bullet points. Separate strengths, weaknesses, and suggestions into distinct sections.
State the score exactly once, on its own line, as `Score: <number>%`, and place it before \
the suggestions section. Do not use the % sign anywhere in the suggestions section.";

/// Builds the analysis prompt. Pure and total: any input, including empty
/// strings, yields a prompt, and identical inputs yield identical prompts.
pub fn build_analysis_prompt(resume: &ExtractedText, job: &JobDescription) -> AnalysisPrompt {
    let text = format!(
        "Analyze the suitability of the following resume:\n\n{resume}\n\n\
         against this job description:\n\n{job}\n\n{instructions}",
        resume = resume.content,
        job = job.text,
        instructions = OUTPUT_INSTRUCTIONS,
    );

    AnalysisPrompt {
        text,
        template_version: PROMPT_TEMPLATE_VERSION,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(text: &str) -> JobDescription {
        JobDescription {
            text: text.to_string(),
        }
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let resume = ExtractedText::new("Senior Rust engineer, 6 years");
        let jd = job("Extracted job description from: https://jobs.example.com/1");

        let first = build_analysis_prompt(&resume, &jd);
        let second = build_analysis_prompt(&resume, &jd);
        assert_eq!(first, second);
        assert_eq!(first.template_version, PROMPT_TEMPLATE_VERSION);
    }

    #[test]
    fn test_prompt_embeds_resume_and_job_description() {
        let prompt = build_analysis_prompt(
            &ExtractedText::new("RESUME-BODY"),
            &job("JOB-BODY"),
        );
        let resume_at = prompt.text.find("RESUME-BODY").unwrap();
        let job_at = prompt.text.find("JOB-BODY").unwrap();
        assert!(resume_at < job_at);
    }

    #[test]
    fn test_prompt_requests_the_reply_shape() {
        let prompt = build_analysis_prompt(&ExtractedText::new(""), &job(""));
        assert!(prompt.text.contains("Score: <number>%"));
        assert!(prompt.text.contains("strengths, weaknesses, and suggestions"));
        assert!(prompt.text.contains("bullet points"));
    }

    #[test]
    fn test_placeholders_in_inputs_are_not_expanded() {
        let prompt = build_analysis_prompt(&ExtractedText::new("{job}"), &job("actual job"));
        assert!(prompt.text.contains("{job}"));
        assert_eq!(prompt.text.matches("actual job").count(), 1);
    }
}
