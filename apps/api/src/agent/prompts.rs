// Resume Q&A prompt construction.
// Pure functions — no I/O, no LLM calls. The orchestrator feeds the output
// straight to the LLM gateway.

/// Maximum number of resume characters forwarded upstream per request.
/// Longer resumes are cut to this prefix — never summarized or sampled.
pub const MAX_RESUME_CHARS: usize = 20_000;

/// Resumes shorter than this after trimming are treated as unreadable and
/// never reach the LLM gateway.
pub const MIN_RESUME_CHARS: usize = 10;

/// The exact sentence the model must return when the requested information
/// is not present in the resume. Fixed so tests can compare verbatim.
pub const NOT_FOUND_IN_RESUME: &str = "Not found in this resume.";

pub const CHAT_SYSTEM_PROMPT: &str = "\
You are a resume Q&A assistant.

RULES:
- Use ONLY information present between the RESUME START and RESUME END markers.
- You MAY extract and reorganize information from section headers
  such as Name, Summary, Skills, Experience, Projects, Education.
- You MAY restate listed skills, roles, tools, and technologies.
- You MUST NOT invent facts that are not present.

If the resume does not contain information relevant to the question,
reply EXACTLY:
\"Not found in this resume.\"

CLARIFICATIONS:
- Interpreting section headers is allowed.
- Grouping listed items is allowed.
- Rephrasing bullet points into short sentences is allowed.

FORMATTING:
- Use bullet points for lists.
- Do NOT add tags like [OUT], [/OUT], [/s].
- Do NOT explain your reasoning.";

/// Builds the `(system, user)` prompt pair for one chat exchange.
///
/// The resume is wrapped in explicit delimiters so the question can never
/// be mistaken for resume content, and truncated to [`MAX_RESUME_CHARS`]
/// by taking a prefix on a character boundary.
pub fn build_chat_prompts(question: &str, resume_text: &str) -> (String, String) {
    let resume_to_send = truncate_chars(resume_text.trim(), MAX_RESUME_CHARS);

    let user_prompt = format!(
        "QUESTION:\n{}\n\nRESUME CONTENT:\nRESUME START\n{}\nRESUME END",
        question.trim(),
        resume_to_send
    );

    (CHAT_SYSTEM_PROMPT.to_string(), user_prompt)
}

/// Prefix truncation counted in `char`s, safe for multi-byte text.
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_long_resume_truncated_to_exact_prefix() {
        let prefix = "a".repeat(MAX_RESUME_CHARS);
        let resume = format!("{prefix}OVERFLOW");
        let (_, user) = build_chat_prompts("What is her role?", &resume);

        // Exactly the budget survives: the delimiter follows the prefix directly.
        assert!(user.contains(&format!("{prefix}\nRESUME END")));
        assert!(!user.contains("OVERFLOW"));
    }

    #[test]
    fn test_short_resume_passed_through_untouched() {
        let (_, user) = build_chat_prompts("Role?", "Jane Doe. 5 years backend engineer.");
        assert!(user.contains("Jane Doe. 5 years backend engineer."));
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        // 3-byte chars: byte-based slicing would panic mid-codepoint.
        let resume = "é".repeat(MAX_RESUME_CHARS + 50);
        let (_, user) = build_chat_prompts("Role?", &resume);
        assert!(user.contains(&"é".repeat(MAX_RESUME_CHARS)));
        assert!(!user.contains(&"é".repeat(MAX_RESUME_CHARS + 1)));
    }

    #[test]
    fn test_user_prompt_delimits_resume_from_question() {
        let (_, user) = build_chat_prompts("What is her role?", "Jane Doe.");
        assert!(user.contains("QUESTION:\nWhat is her role?"));
        assert!(user.contains("RESUME START\nJane Doe.\nRESUME END"));
    }

    #[test]
    fn test_system_prompt_mandates_canonical_refusal() {
        let (system, _) = build_chat_prompts("Role?", "Jane Doe.");
        assert!(system.contains(NOT_FOUND_IN_RESUME));
        assert!(system.contains("MUST NOT invent"));
    }

    #[test]
    fn test_truncate_chars_counts_chars_not_bytes() {
        assert_eq!(truncate_chars("ééé", 2), "éé");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }
}
