//! Writing suggestions decoded from model output.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::PanelError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WritingSuggestion {
    #[serde(default)]
    pub original_text: String,
    pub suggestion: String,
    #[serde(default)]
    pub reason: String,
}

/// Decode a model reply into suggestions.
///
/// Accepts a bare JSON array, a JSON array wrapped in prose or code fences,
/// or `originalText:` / `suggestion:` / `reason:` lines.
pub fn parse_suggestions(raw: &str) -> Result<Vec<WritingSuggestion>, PanelError> {
    let trimmed = raw.trim();
    if let Ok(list) = serde_json::from_str::<Vec<WritingSuggestion>>(trimmed) {
        return Ok(list);
    }

    if let (Some(start), Some(end)) = (trimmed.find('['), trimmed.rfind(']')) {
        if start < end {
            match serde_json::from_str::<Vec<WritingSuggestion>>(&trimmed[start..=end]) {
                Ok(list) => return Ok(list),
                Err(e) => debug!(error = %e, "Embedded array did not decode"),
            }
        }
    }

    let list = parse_lines(trimmed);
    if list.is_empty() {
        return Err(PanelError::Parse(
            "model reply contained no suggestions".to_string(),
        ));
    }
    Ok(list)
}

fn field<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(key)?.trim_start();
    let rest = rest.strip_prefix(':')?;
    Some(rest.trim().trim_matches(|c| c == '"' || c == ',').trim())
}

fn parse_lines(text: &str) -> Vec<WritingSuggestion> {
    let mut out = Vec::new();
    let mut current: Option<WritingSuggestion> = None;

    for line in text.lines() {
        let line = line
            .trim()
            .trim_start_matches(|c: char| c == '-' || c == '*' || c.is_ascii_digit() || c == '.')
            .trim()
            .trim_start_matches('"');

        if let Some(value) = field(line, "originalText\"").or_else(|| field(line, "originalText")) {
            if let Some(done) = current.take().filter(|s| !s.suggestion.is_empty()) {
                out.push(done);
            }
            current = Some(WritingSuggestion {
                original_text: value.to_string(),
                ..Default::default()
            });
        } else if let Some(value) = field(line, "suggestion\"").or_else(|| field(line, "suggestion")) {
            current.get_or_insert_with(Default::default).suggestion = value.to_string();
        } else if let Some(value) = field(line, "reason\"").or_else(|| field(line, "reason")) {
            current.get_or_insert_with(Default::default).reason = value.to_string();
        }
    }

    if let Some(done) = current.filter(|s| !s.suggestion.is_empty()) {
        out.push(done);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_array() {
        let raw = r#"[{"originalText":"a","suggestion":"b","reason":"c"}]"#;
        let list = parse_suggestions(raw).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].suggestion, "b");
    }

    #[test]
    fn test_array_inside_prose() {
        let raw = "Sure! Here you go:\n```json\n[{\"originalText\":\"x\",\"suggestion\":\"y\",\"reason\":\"z\"}]\n```";
        let list = parse_suggestions(raw).unwrap();
        assert_eq!(list[0].original_text, "x");
        assert_eq!(list[0].reason, "z");
    }

    #[test]
    fn test_line_format() {
        let raw = "1. originalText: The man walked quickly.\n   suggestion: The man strode.\n   reason: Stronger verb.\n\
                   2. originalText: It was good.\n   suggestion: It was excellent.\n   reason: More precise.";
        let list = parse_suggestions(raw).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].original_text, "The man walked quickly.");
        assert_eq!(list[1].suggestion, "It was excellent.");
    }

    #[test]
    fn test_nothing_usable() {
        let err = parse_suggestions("I cannot help with that.").unwrap_err();
        assert!(matches!(err, PanelError::Parse(_)));
    }
}
