//! Text normalization and similarity helpers shared by the parser and the strategies.

/// Collapse runs of whitespace into single spaces and trim.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lower-case, drop punctuation, collapse whitespace.
///
/// Punctuation is removed rather than spaced, so "E-mail" and "Email" agree.
pub fn normalize_text(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();
    collapse_whitespace(&cleaned).to_lowercase()
}

/// Normalized Levenshtein similarity in `[0, 1]` after normalization.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a = normalize_text(a);
    let b = normalize_text(b);
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    strsim::normalized_levenshtein(&a, &b)
}

/// True when `similarity(a, b)` reaches `threshold`. The boundary is inclusive.
pub fn fuzzy_match(a: &str, b: &str, threshold: f64) -> bool {
    similarity(a, b) >= threshold
}

/// Case-insensitive containment on normalized text.
///
/// Needles made only of symbols ("☰", "×") normalize to nothing and are
/// matched literally instead.
pub fn contains_normalized(haystack: &str, needle: &str) -> bool {
    let normalized = normalize_text(needle);
    if normalized.is_empty() {
        let raw = needle.trim();
        return !raw.is_empty() && haystack.contains(raw);
    }
    normalize_text(haystack).contains(&normalized)
}

/// Equality on normalized text, with the same literal fallback for symbols.
pub fn equals_normalized(a: &str, b: &str) -> bool {
    let normalized = normalize_text(b);
    if normalized.is_empty() {
        let raw = b.trim();
        return !raw.is_empty() && a.trim() == raw;
    }
    normalize_text(a) == normalized
}

/// Containment on whole words: "no" is in "no thanks" but not in "notes".
pub fn contains_words(haystack: &str, needle: &str) -> bool {
    let normalized = normalize_text(needle);
    if normalized.is_empty() {
        let raw = needle.trim();
        return !raw.is_empty() && haystack.contains(raw);
    }
    format!(" {} ", normalize_text(haystack)).contains(&format!(" {} ", normalized))
}
