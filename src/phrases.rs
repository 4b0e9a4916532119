//! # Phrase Reconstruction
//!
//! Maps missing ingredient tokens back to the human-readable ingredient lines
//! they came from, so a user sees "1 tsp black pepper" instead of "pepper".

use std::collections::HashSet;

use crate::text_processing::tokenize;

/// Rebuild readable phrases for a set of missing tokens
///
/// Every phrase sharing at least one token with `missing_tokens` is kept, in
/// phrase order and without duplicates. Missing tokens not covered by any kept
/// phrase are appended individually, in their original order.
///
/// # Examples
///
/// ```rust
/// use meal_match::phrases::reconstruct_phrases;
///
/// let missing = vec!["pepper".to_string(), "thyme".to_string()];
/// let phrases = vec!["2 tsp salt".to_string(), "1 tsp black pepper".to_string()];
/// assert_eq!(reconstruct_phrases(&missing, &phrases), vec!["1 tsp black pepper", "thyme"]);
/// ```
pub fn reconstruct_phrases<S, P>(missing_tokens: &[S], original_phrases: &[P]) -> Vec<String>
where
    S: AsRef<str>,
    P: AsRef<str>,
{
    let missing: HashSet<&str> = missing_tokens.iter().map(AsRef::as_ref).collect();
    if missing.is_empty() {
        return Vec::new();
    }

    let mut result: Vec<String> = Vec::new();
    let mut used: HashSet<&str> = HashSet::new();
    let mut covered: HashSet<String> = HashSet::new();

    for phrase in original_phrases {
        let phrase = phrase.as_ref();
        if used.contains(phrase) {
            continue;
        }
        let tokens = tokenize(phrase);
        if tokens.iter().any(|token| missing.contains(token.as_str())) {
            used.insert(phrase);
            result.push(phrase.to_string());
            covered.extend(tokens);
        }
    }

    let mut appended: HashSet<&str> = HashSet::new();
    for token in missing_tokens {
        let token = token.as_ref();
        if !covered.contains(token) && appended.insert(token) {
            result.push(token.to_string());
        }
    }

    result
}
