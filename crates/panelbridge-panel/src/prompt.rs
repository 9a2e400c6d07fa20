//! Prompt construction.

use panelbridge_protocols::AiProviderKind;

/// The first `limit` characters of `text`, cut on a char boundary.
pub fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

const FORMAT_SPEC: &str = "Your response MUST be formatted as a valid JSON array with objects containing these exact keys:
1. \"originalText\" - The exact text to improve (brief, under 20 words)
2. \"suggestion\" - Your suggested improvement
3. \"reason\" - Brief explanation why this is better";

const LOCAL_EXAMPLE: &str = r#"EXAMPLE FORMAT:
[
  {
    "originalText": "The man walked quickly.",
    "suggestion": "The man strode purposefully.",
    "reason": "More descriptive and conveys intent."
  }
]"#;

fn build(provider: AiProviderKind, task: &str, text: &str) -> String {
    match provider {
        // Local models need the format spelled out.
        AiProviderKind::Ollama => format!(
            "You are a helpful writing assistant. {task}\n\n{FORMAT_SPEC}\n\n{LOCAL_EXAMPLE}\n\n\
             Here's the text to analyze:\n{text}\n\nRespond ONLY with the JSON array and nothing else."
        ),
        AiProviderKind::OpenAi => {
            format!("{task}\n{FORMAT_SPEC}\n\nHere's the text to analyze:\n{text}")
        }
    }
}

/// Review prompt for the whole document. `content` is cut to `limit` chars.
pub fn review_prompt(provider: AiProviderKind, content: &str, limit: usize) -> String {
    build(
        provider,
        "Please review the following text and provide 3 specific writing suggestions for improvement.",
        truncate_chars(content, limit),
    )
}

/// Review prompt for a selection.
pub fn selection_prompt(provider: AiProviderKind, selection: &str, limit: usize) -> String {
    build(
        provider,
        "Please review the following selected passage and provide up to 3 specific writing suggestions for improvement.",
        truncate_chars(selection, limit),
    )
}

/// Free-form chat with optional document context.
pub fn chat_prompt(message: &str, selection: Option<&str>, context: Option<&str>) -> String {
    let mut prompt = format!("User message: {message}\n\n");
    if let Some(selection) = selection.filter(|s| !s.trim().is_empty()) {
        prompt.push_str(&format!("Selected text in document: {selection}\n\n"));
    }
    if let Some(context) = context.filter(|c| !c.trim().is_empty()) {
        prompt.push_str(&format!(
            "Context from document: {}...\n\n",
            truncate_chars(context, 1000)
        ));
    }
    prompt.push_str("Please provide helpful writing advice based on this context.");
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_on_char_boundary() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("abc", 0), "");
    }

    #[test]
    fn test_review_prompt_truncates_content() {
        let content = "x".repeat(5000);
        let prompt = review_prompt(AiProviderKind::OpenAi, &content, 2000);
        assert!(prompt.contains(&"x".repeat(2000)));
        assert!(!prompt.contains(&"x".repeat(2001)));
    }

    #[test]
    fn test_local_prompt_is_stricter() {
        let prompt = review_prompt(AiProviderKind::Ollama, "Some text", 2000);
        assert!(prompt.contains("EXAMPLE FORMAT"));
        assert!(prompt.ends_with("Respond ONLY with the JSON array and nothing else."));
        assert!(!review_prompt(AiProviderKind::OpenAi, "Some text", 2000).contains("EXAMPLE FORMAT"));
    }

    #[test]
    fn test_chat_prompt_sections() {
        let prompt = chat_prompt("Is this clear?", Some("the clause"), None);
        assert!(prompt.contains("Selected text in document: the clause"));
        assert!(!prompt.contains("Context from document"));

        let prompt = chat_prompt("Hi", Some("  "), Some("Body"));
        assert!(!prompt.contains("Selected text"));
        assert!(prompt.contains("Context from document: Body..."));
    }
}
