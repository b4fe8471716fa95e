//! Small text-cleaning helpers applied to scraped content before it is
//! placed in a prompt.

use std::sync::LazyLock;

use regex::Regex;

/// Collapse whitespace runs into single spaces and replace non-ASCII
/// characters with a space.
pub fn clean_text(text: &str) -> String {
    static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

    let ascii: String = text
        .chars()
        .map(|c| if c.is_ascii() { c } else { ' ' })
        .collect();
    WS_RE.replace_all(&ascii, " ").trim().to_string()
}

/// Cut `text` to at most `max_chars` characters, preferring to end on the
/// last full stop inside the budget.
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    let cut = match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => byte_idx,
        None => return text.to_string(),
    };

    let truncated = &text[..cut];
    match truncated.rfind('.') {
        Some(dot) => truncated[..=dot].to_string(),
        None => truncated.to_string(),
    }
}

/// Join the non-blank entries of `texts`, each cleaned, with `separator`.
pub fn safe_join<S: AsRef<str>>(texts: &[S], separator: &str) -> String {
    texts
        .iter()
        .map(|t| AsRef::<str>::as_ref(t))
        .filter(|t| !t.trim().is_empty())
        .map(clean_text)
        .collect::<Vec<_>>()
        .join(separator)
}
