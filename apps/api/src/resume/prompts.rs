// Summary-generation prompts for resume ingestion.

pub const SUMMARY_SYSTEM_PROMPT: &str = "You are a professional resume summarizer. \
    Summarize the following resume text into a concise, professional summary of \
    2-3 sentences highlighting key skills and experience.";

/// Builds the summarizer system prompt, optionally tailored toward a role
/// slug such as `backend-engineer`.
pub fn summary_system_prompt(kind: Option<&str>) -> String {
    match kind {
        Some(role) if !role.trim().is_empty() => {
            format!("{SUMMARY_SYSTEM_PROMPT} Tailor the summary toward a {role} role.")
        }
        _ => SUMMARY_SYSTEM_PROMPT.to_string(),
    }
}
