//! # Text Processing Module
//!
//! This module turns free text into the lowercase word tokens every other part
//! of the recommender works with, and splits raw instruction text into
//! sentences.
//!
//! ## Features
//!
//! - Crude alphanumeric tokenizer: everything that is not `a-z`, `0-9` or a
//!   hyphen becomes whitespace, and hyphenated compounds are split
//! - **Fraction-preserving mode** for ingredient fields, so `"1/2 cup"` yields
//!   the token `"1/2"` instead of `"1"` and `"2"`
//! - Sentence splitting on `. ! ? ;` with newline normalization
//!
//! ## Usage
//!
//! ```rust
//! use meal_match::text_processing::tokenize;
//!
//! assert_eq!(tokenize("Extra-virgin Olive Oil!"), vec!["extra", "virgin", "olive", "oil"]);
//! ```

use log::trace;

use crate::measurement_patterns::{FRACTION_REGEX, NON_TOKEN_REGEX, SENTENCE_BOUNDARY_REGEX};

/// Configuration options for tokenization
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenizerConfig {
    /// Keep numeric fractions such as `1/2` as single tokens
    pub preserve_fractions: bool,
}

/// Word tokenizer shared by corpus building, training and matching
#[derive(Debug, Clone, Default)]
pub struct Tokenizer {
    config: TokenizerConfig,
}

impl Tokenizer {
    /// Create a tokenizer with the default (plain) configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a tokenizer with custom configuration
    ///
    /// # Examples
    ///
    /// ```rust
    /// use meal_match::text_processing::{Tokenizer, TokenizerConfig};
    ///
    /// let tokenizer = Tokenizer::with_config(TokenizerConfig { preserve_fractions: true });
    /// assert_eq!(tokenizer.tokenize("1/2 cup sugar"), vec!["1/2", "cup", "sugar"]);
    /// ```
    pub fn with_config(config: TokenizerConfig) -> Self {
        Self { config }
    }

    /// Tokenize text into lowercase word tokens
    ///
    /// Empty input yields an empty vector. The result is stable under
    /// re-tokenization: joining the tokens with spaces and tokenizing again
    /// returns the same tokens.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        let mut tokens = Vec::new();

        if self.config.preserve_fractions {
            let mut last = 0;
            for fraction in FRACTION_REGEX.find_iter(&lowered) {
                scrub_into(&lowered[last..fraction.start()], &mut tokens);
                tokens.push(fraction.as_str().to_string());
                last = fraction.end();
            }
            scrub_into(&lowered[last..], &mut tokens);
        } else {
            scrub_into(&lowered, &mut tokens);
        }

        trace!("Tokenized '{}' -> {:?}", text, tokens);
        tokens
    }
}

fn scrub_into(segment: &str, tokens: &mut Vec<String>) {
    let cleaned = NON_TOKEN_REGEX.replace_all(segment, " ");
    tokens.extend(
        cleaned
            .split(|c: char| c == '-' || c.is_whitespace())
            .filter(|token| !token.is_empty())
            .map(str::to_string),
    );
}

/// Tokenize text with the plain tokenizer
pub fn tokenize(text: &str) -> Vec<String> {
    Tokenizer::new().tokenize(text)
}

/// Tokenize text keeping numeric fractions intact
pub fn tokenize_preserving_fractions(text: &str) -> Vec<String> {
    Tokenizer::with_config(TokenizerConfig {
        preserve_fractions: true,
    })
    .tokenize(text)
}

/// Split raw instruction text into trimmed, non-empty sentences
///
/// Carriage returns and newlines are treated as spaces before splitting on
/// runs of `.`, `!`, `?` and `;`.
///
/// # Examples
///
/// ```rust
/// use meal_match::text_processing::split_sentences;
///
/// let steps = split_sentences("Preheat oven.\nMix flour; add eggs!");
/// assert_eq!(steps, vec!["Preheat oven", "Mix flour", "add eggs"]);
/// ```
pub fn split_sentences(text: &str) -> Vec<String> {
    let flattened = text.replace(['\r', '\n'], " ");
    SENTENCE_BOUNDARY_REGEX
        .split(flattened.trim())
        .map(str::trim)
        .filter(|sentence| !sentence.is_empty())
        .map(str::to_string)
        .collect()
}
