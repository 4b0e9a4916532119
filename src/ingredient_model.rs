//! # Recipe and Match Data Model
//!
//! This module defines the records produced by corpus building and the
//! results returned by recommender queries.
//!
//! ## Core Concepts
//!
//! - **RecipeRecord**: one parsed dataset row, keyed by title
//! - **MatchResult**: the single best recipe for a user's ingredients
//! - **RankedMatch**: one entry of the blended coverage/likelihood ranking
//! - **Suggestion**: a next-word prediction with its probability

use serde::{Deserialize, Serialize};
use std::fmt;

/// A recipe parsed from one dataset row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeRecord {
    /// Unique recipe title (`untitled-N` when the row had none)
    pub title: String,

    /// Ingredient tokens in field order
    pub ingredient_tokens: Vec<String>,

    /// Original ingredient lines, empty when the row had none
    pub ingredient_phrases: Vec<String>,

    /// Original instruction sentences (natural language, not tokens)
    pub instruction_sentences: Vec<String>,
}

impl RecipeRecord {
    /// Create an empty record for a title
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ingredient_tokens: Vec::new(),
            ingredient_phrases: Vec::new(),
            instruction_sentences: Vec::new(),
        }
    }
}

/// Result of a best-match query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Matched recipe title, `None` when nothing cleared the match floor
    pub dish: Option<String>,

    /// Missing ingredients, phrases preferred over raw tokens
    pub missing: Vec<String>,

    /// Coverage as a rounded percentage (0-100)
    pub confidence: u8,
}

impl MatchResult {
    /// The empty "no match" result
    pub fn no_match() -> Self {
        Self::default()
    }

    /// Whether a recipe was matched
    pub fn is_match(&self) -> bool {
        self.dish.is_some()
    }
}

/// One entry in a ranked match list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedMatch {
    /// Recipe title
    pub title: String,

    /// Combined score `alpha * coverage + (1 - alpha) * seq_p`
    pub score: f64,

    /// Fraction of the recipe's ingredient tokens the user supplied
    pub coverage: f64,

    /// Missing ingredients for this recipe
    pub missing: Vec<String>,
}

/// A next-token prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    /// Predicted token
    pub token: String,

    /// Relative frequency of the token in the winning context, in `(0, 1]`
    pub probability: f64,
}

impl fmt::Display for MatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.dish {
            Some(dish) => write!(f, "{} ({}%)", dish, self.confidence),
            None => write!(f, "no match"),
        }
    }
}

impl fmt::Display for Suggestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.2})", self.token, self.probability)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_match_defaults() {
        let result = MatchResult::no_match();
        assert!(!result.is_match());
        assert!(result.missing.is_empty());
        assert_eq!(result.confidence, 0);
        assert_eq!(result.to_string(), "no match");
    }

    #[test]
    fn test_match_display() {
        let result = MatchResult {
            dish: Some("Roast Chicken".to_string()),
            missing: vec!["pepper".to_string()],
            confidence: 67,
        };
        assert_eq!(result.to_string(), "Roast Chicken (67%)");
    }

    #[test]
    fn test_record_serialization() {
        let mut record = RecipeRecord::new("Toast");
        record.ingredient_tokens = vec!["bread".to_string(), "butter".to_string()];
        let json = serde_json::to_string(&record).unwrap();
        let back: RecipeRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
