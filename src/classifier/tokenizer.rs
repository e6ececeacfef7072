//! Text normalization for the statistical scorer

/// Shortest token kept after splitting
pub const MIN_TOKEN_LEN: usize = 2;

/// Full case fold: uppercase then lowercase.
///
/// Characters whose uppercase form expands (the `ﬁ` ligature, `ß`) fold to
/// the same text as their spelled-out forms, so `fold_case(s)` matches
/// `fold_case(&s.to_uppercase())`.
pub fn fold_case(text: &str) -> String {
    text.to_uppercase().to_lowercase()
}

/// Case-fold, replace everything outside `[a-z0-9]` with whitespace, split,
/// and drop tokens shorter than two characters.
pub fn tokenize(text: &str) -> Vec<String> {
    let normalized: String = fold_case(text)
        .chars()
        .map(|c| if c.is_ascii_lowercase() || c.is_ascii_digit() { c } else { ' ' })
        .collect();

    normalized
        .split_whitespace()
        .filter(|t| t.len() >= MIN_TOKEN_LEN)
        .map(str::to_string)
        .collect()
}
