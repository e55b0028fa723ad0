use unicode_normalization::UnicodeNormalization;

/// Canonical form of free-text search input.
///
/// NFKC folds full-width and compatibility characters so the same query
/// typed on different keyboards hits the same results.
pub fn normalize_search(text: &str) -> String {
    let text = text.trim();

    if text.is_empty() {
        return String::new();
    }

    let text: String = text.nfkc().collect();

    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
