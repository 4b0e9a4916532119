//! # Measurement Patterns Module
//!
//! This module contains the regex patterns and word lists shared by the
//! tokenizer and the recommender: characters the tokenizer keeps, numeric
//! fractions, sentence boundaries, and the unit/qualifier stoplist used when
//! normalizing recipe ingredients for matching.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

/// Anything that is not a lowercase ASCII letter, digit or hyphen
pub const NON_TOKEN_PATTERN: &str = r"[^a-z0-9\-]+";

/// Numeric fractions such as `1/2` or `3/4`
pub const FRACTION_PATTERN: &str = r"\d+/\d+";

/// Sentence boundaries inside instruction text
pub const SENTENCE_BOUNDARY_PATTERN: &str = r"[.!?;]+";

/// Units of measure and quantity qualifiers that carry no ingredient identity
pub const UNIT_STOPWORDS: &[&str] = &[
    // Volume and weight units
    "tsp", "tbsp", "tablespoon", "tablespoons", "teaspoon", "teaspoons",
    "cup", "cups", "ounce", "ounces", "oz", "lb", "lbs", "pound", "pounds",
    "gram", "grams", "kg", "kilogram", "ml", "l", "liter", "liters",
    // Quantity qualifiers
    "pinch", "dash", "plus", "more", "divided", "finely", "chopped", "room",
    "temperature", "freshly", "ground", "about", "such", "as",
];

lazy_static! {
    pub static ref NON_TOKEN_REGEX: Regex =
        Regex::new(NON_TOKEN_PATTERN).expect("Token scrub pattern should be valid");
    pub static ref FRACTION_REGEX: Regex =
        Regex::new(FRACTION_PATTERN).expect("Fraction pattern should be valid");
    pub static ref SENTENCE_BOUNDARY_REGEX: Regex =
        Regex::new(SENTENCE_BOUNDARY_PATTERN).expect("Sentence boundary pattern should be valid");
    static ref UNIT_STOPWORD_SET: HashSet<&'static str> = UNIT_STOPWORDS.iter().copied().collect();
}

/// Check whether a token is a unit of measure or a quantity qualifier
pub fn is_stopword(token: &str) -> bool {
    UNIT_STOPWORD_SET.contains(token)
}

/// Check whether a token is a bare quantity (`2`, `250`, `1/2`)
pub fn is_numeric_token(token: &str) -> bool {
    !token.is_empty()
        && token.chars().any(|c| c.is_ascii_digit())
        && token.chars().all(|c| c.is_ascii_digit() || c == '/')
}
