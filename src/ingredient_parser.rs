//! # Ingredient Parser
//!
//! This module parses the raw ingredient field of a recipe row. The same field
//! is read two ways:
//!
//! - as **tokens** for the ingredient corpus and the matching map
//! - as **phrases**, the human-readable ingredient lines shown when reporting
//!   what a user is missing
//!
//! Datasets store the field in several shapes, all handled here:
//!
//! - list literal: `"['1 cup flour', '2 eggs']"`
//! - comma separated: `"salt, pepper"`
//! - one line: `"salt pepper"`
//!
//! ## Usage
//!
//! ```rust
//! use meal_match::ingredient_parser::{parse_ingredient_field, parse_ingredient_phrases};
//!
//! let raw = "['1/2 cup sugar', '2 eggs, beaten']";
//! assert_eq!(parse_ingredient_field(raw), vec!["1/2", "cup", "sugar", "2", "eggs", "beaten"]);
//! assert_eq!(parse_ingredient_phrases(raw), vec!["1/2 cup sugar", "2 eggs, beaten"]);
//! ```

use log::trace;

use crate::text_processing::tokenize_preserving_fractions;

/// Strip a `[...]` wrapper if the whole field is bracketed
fn strip_list_wrapper(text: &str) -> &str {
    if text.len() >= 2 && text.starts_with('[') && text.ends_with(']') {
        &text[1..text.len() - 1]
    } else {
        text
    }
}

/// Parse an ingredient field into corpus tokens
///
/// Strips an optional bracket-list wrapper and quote characters, splits the
/// remainder on commas and tokenizes each part with the fraction-preserving
/// tokenizer. Empty or blank fields yield no tokens.
pub fn parse_ingredient_field(raw: &str) -> Vec<String> {
    let text = raw.trim();
    if text.is_empty() {
        return Vec::new();
    }

    let unwrapped = strip_list_wrapper(text).replace(['"', '\''], " ");

    let tokens: Vec<String> = unwrapped
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .flat_map(tokenize_preserving_fractions)
        .collect();

    trace!("Parsed ingredient field into {} tokens", tokens.len());
    tokens
}

/// Parse an ingredient field into human-readable phrases
///
/// A bracketed list of quoted strings yields the quoted items (commas inside
/// quotes are kept). Any other shape is split on commas. Phrases are trimmed
/// and empty ones dropped.
pub fn parse_ingredient_phrases(raw: &str) -> Vec<String> {
    let text = raw.trim();
    if text.is_empty() {
        return Vec::new();
    }

    let inner = strip_list_wrapper(text);
    if inner.len() != text.len() {
        let quoted = quoted_items(inner);
        if !quoted.is_empty() {
            return quoted;
        }
    }

    inner
        .split(',')
        .map(|part| part.trim().trim_matches(|c| c == '"' || c == '\'').trim())
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

/// Extract quoted string items from the inside of a list literal
///
/// Only separators (commas and whitespace) may appear between items; any
/// other text outside quotes means the literal is not a list we understand.
fn quoted_items(inner: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut chars = inner.chars();

    while let Some(c) = chars.next() {
        if c != '\'' && c != '"' {
            if c == ',' || c.is_whitespace() {
                continue;
            }
            return Vec::new();
        }
        let quote = c;
        let mut item = String::new();
        let mut closed = false;
        while let Some(next) = chars.next() {
            match next {
                '\\' => match chars.next() {
                    Some('n') => item.push(' '),
                    Some(escaped) => item.push(escaped),
                    None => break,
                },
                n if n == quote => {
                    closed = true;
                    break;
                }
                n => item.push(n),
            }
        }
        if !closed {
            // Unterminated literal: not a list we understand
            return Vec::new();
        }
        let trimmed = item.trim();
        if !trimmed.is_empty() {
            items.push(trimmed.to_string());
        }
    }

    items
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comma_separated_tokens() {
        assert_eq!(parse_ingredient_field("salt, pepper, chicken"), vec!["salt", "pepper", "chicken"]);
    }

    #[test]
    fn test_single_line_tokens() {
        assert_eq!(parse_ingredient_field("salt pepper"), vec!["salt", "pepper"]);
    }

    #[test]
    fn test_list_literal_tokens() {
        let raw = r#"['2 Tbsp. olive oil', "1/2 tsp salt"]"#;
        assert_eq!(
            parse_ingredient_field(raw),
            vec!["2", "tbsp", "olive", "oil", "1/2", "tsp", "salt"]
        );
    }

    #[test]
    fn test_empty_field() {
        assert!(parse_ingredient_field("").is_empty());
        assert!(parse_ingredient_field("  [] ").is_empty());
        assert!(parse_ingredient_phrases("").is_empty());
    }

    #[test]
    fn test_list_literal_phrases_keep_inner_commas() {
        let raw = "['1 cup flour, sifted', '2 large eggs', '']";
        assert_eq!(parse_ingredient_phrases(raw), vec!["1 cup flour, sifted", "2 large eggs"]);
    }

    #[test]
    fn test_list_literal_with_escaped_quote() {
        let raw = r#"['1 cup confectioners\' sugar', "2 tbsp. Baker's yeast"]"#;
        assert_eq!(
            parse_ingredient_phrases(raw),
            vec!["1 cup confectioners' sugar", "2 tbsp. Baker's yeast"]
        );
    }

    #[test]
    fn test_comma_separated_phrases() {
        assert_eq!(
            parse_ingredient_phrases("1 lb chicken thighs, 2 tsp salt ,  black pepper"),
            vec!["1 lb chicken thighs", "2 tsp salt", "black pepper"]
        );
    }

    #[test]
    fn test_unterminated_list_falls_back_to_commas() {
        assert_eq!(parse_ingredient_phrases("['salt, 'pepper]"), vec!["salt", "pepper"]);
    }

    #[test]
    fn test_text_outside_quotes_falls_back_to_commas() {
        assert_eq!(parse_ingredient_phrases("['salt', pepper]"), vec!["salt", "pepper"]);
        assert_eq!(
            parse_ingredient_phrases("['2 tsp salt', 'black pepper' ]"),
            vec!["2 tsp salt", "black pepper"]
        );
    }
}
