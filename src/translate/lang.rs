//! Language code to display name mapping for prompts.

/// Common ISO 639-1 codes and their English display names. Unknown codes
/// pass through unchanged, so any code the model understands still works.
static LANGUAGES: &[(&str, &str)] = &[
    ("ar", "Arabic"),
    ("bg", "Bulgarian"),
    ("cs", "Czech"),
    ("da", "Danish"),
    ("de", "German"),
    ("el", "Greek"),
    ("en", "English"),
    ("es", "Spanish"),
    ("fi", "Finnish"),
    ("fr", "French"),
    ("he", "Hebrew"),
    ("hi", "Hindi"),
    ("hu", "Hungarian"),
    ("id", "Indonesian"),
    ("it", "Italian"),
    ("ja", "Japanese"),
    ("ko", "Korean"),
    ("nl", "Dutch"),
    ("no", "Norwegian"),
    ("pl", "Polish"),
    ("pt", "Portuguese"),
    ("pt-br", "Brazilian Portuguese"),
    ("ro", "Romanian"),
    ("ru", "Russian"),
    ("sv", "Swedish"),
    ("th", "Thai"),
    ("tr", "Turkish"),
    ("uk", "Ukrainian"),
    ("vi", "Vietnamese"),
    ("zh", "Chinese"),
    ("zh-tw", "Traditional Chinese"),
];

/// English display name for a language code ("fr" -> "French"). Unknown or
/// empty codes are returned as-is.
pub fn language_display_name(code: &str) -> String {
    let clean = code.trim();
    if clean.is_empty() {
        return code.to_string();
    }
    let lower = clean.to_lowercase();
    LANGUAGES
        .iter()
        .find(|(c, _)| *c == lower)
        .map(|(_, name)| (*name).to_string())
        .unwrap_or_else(|| code.to_string())
}
