use once_cell::sync::Lazy;
use regex::Regex;

pub const UNKNOWN_LANGUAGE: &str = "unknown";

static BRACKET_LANG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([A-Za-z]{2})\]").expect("failed to compile language tag regex"));

/// Resolve the language code for a file. Priority: trimmed user input,
/// then a bracketed 2-letter tag in the filename, then "unknown".
pub fn resolve_language(user_language: &str, file_name: &str) -> String {
    let trimmed = user_language.trim();
    if !trimmed.is_empty() {
        return trimmed.to_lowercase();
    }
    if let Some(captures) = BRACKET_LANG_RE.captures(file_name) {
        return captures[1].to_lowercase();
    }
    UNKNOWN_LANGUAGE.to_string()
}
