//! Token-set similarity between free-text fields
//!
//! Scores are the Jaccard index of the whitespace-separated word sets of the
//! two inputs after case and whitespace normalization.

use std::collections::HashSet;

/// Lower-case, collapse whitespace runs to a single space, trim.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Jaccard similarity of the normalized word sets of `a` and `b`, in `[0, 1]`.
///
/// Identical normalized strings score exactly `1.0`, including two blank
/// strings. Repeated words count once.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a = normalize(a);
    let b = normalize(b);

    if a == b {
        return 1.0;
    }

    let words_a: HashSet<&str> = a.split(' ').filter(|w| !w.is_empty()).collect();
    let words_b: HashSet<&str> = b.split(' ').filter(|w| !w.is_empty()).collect();

    let union = words_a.union(&words_b).count();
    if union == 0 {
        return 0.0;
    }
    let intersection = words_a.intersection(&words_b).count();

    intersection as f64 / union as f64
}
