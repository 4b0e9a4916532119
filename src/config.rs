//! # Configuration Module
//!
//! This module defines the tuning constants of the recommender, the default
//! cache file layout and the application configuration read from the
//! environment.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use log::debug;

use crate::errors::RecipeError;

// Constants for model and matching configuration
pub const DEFAULT_NGRAM_ORDER: usize = 4;
pub const MAX_INSTRUCTION_ORDER: usize = 3;
pub const DEFAULT_MIN_MATCHES: usize = 2;
pub const DEFAULT_TOP_K: usize = 10;
pub const DEFAULT_ALPHA: f64 = 0.7;
pub const DEFAULT_MAX_STEPS: usize = 6;
pub const DEFAULT_SUGGESTIONS: usize = 5;

// Default file names
pub const DEFAULT_DATASET: &str = "13k-recipes.csv";
pub const INGREDIENT_CORPUS_FILE: &str = "ingredients_corpus.txt";
pub const INSTRUCTION_CORPUS_FILE: &str = "process_corpus.txt";
pub const INGREDIENT_MAP_FILE: &str = "ingredients_map.json";
pub const INSTRUCTION_MAP_FILE: &str = "process_map.json";
pub const PHRASE_MAP_FILE: &str = "ingredient_phrases.json";
pub const MANIFEST_FILE: &str = "cache_manifest.json";

/// Query tuning exposed to callers
#[derive(Debug, Clone, PartialEq)]
pub struct MatchConfig {
    /// Minimum shared tokens before `best_match` declares a dish
    pub min_matches: usize,
    /// Number of entries returned by `ranked_matches`
    pub top_k: usize,
    /// Weight of coverage against sequence likelihood, in `[0, 1]`
    pub alpha: f64,
    /// Number of instruction sentences shown per recipe
    pub max_steps: usize,
    /// Number of autocomplete suggestions
    pub suggestions: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            min_matches: DEFAULT_MIN_MATCHES,
            top_k: DEFAULT_TOP_K,
            alpha: DEFAULT_ALPHA,
            max_steps: DEFAULT_MAX_STEPS,
            suggestions: DEFAULT_SUGGESTIONS,
        }
    }
}

/// Application configuration for the binary and the load-or-build pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Raw recipe dataset (CSV)
    pub dataset_path: PathBuf,
    /// Directory holding the corpus/map cache
    pub cache_dir: PathBuf,
    /// Order of the ingredient n-gram model
    pub ngram_order: usize,
    /// Query tuning
    pub matching: MatchConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from(DEFAULT_DATASET),
            cache_dir: PathBuf::from("."),
            ngram_order: DEFAULT_NGRAM_ORDER,
            matching: MatchConfig::default(),
        }
    }
}

impl AppConfig {
    /// Read configuration from `MEAL_MATCH_*` environment variables
    ///
    /// Unset variables keep their defaults; values that fail to parse are
    /// reported as [`RecipeError::Config`].
    pub fn from_env() -> Result<Self, RecipeError> {
        let mut config = Self::default();

        if let Ok(path) = env::var("MEAL_MATCH_DATASET") {
            config.dataset_path = PathBuf::from(path);
        }
        if let Ok(dir) = env::var("MEAL_MATCH_CACHE_DIR") {
            config.cache_dir = PathBuf::from(dir);
        }
        if let Some(order) = parse_var::<usize>("MEAL_MATCH_NGRAM_ORDER")? {
            config.ngram_order = order;
        }
        if let Some(min_matches) = parse_var::<usize>("MEAL_MATCH_MIN_MATCHES")? {
            config.matching.min_matches = min_matches;
        }
        if let Some(top_k) = parse_var::<usize>("MEAL_MATCH_TOP_K")? {
            config.matching.top_k = top_k;
        }
        if let Some(alpha) = parse_var::<f64>("MEAL_MATCH_ALPHA")? {
            config.matching.alpha = alpha;
        }
        if let Some(max_steps) = parse_var::<usize>("MEAL_MATCH_MAX_STEPS")? {
            config.matching.max_steps = max_steps;
        }

        config.validate()?;
        debug!("Loaded configuration: {:?}", config);
        Ok(config)
    }

    /// Check value ranges, clamping nothing silently
    pub fn validate(&self) -> Result<(), RecipeError> {
        if self.ngram_order == 0 {
            return Err(RecipeError::Config(
                "MEAL_MATCH_NGRAM_ORDER must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.matching.alpha) {
            return Err(RecipeError::Config(format!(
                "MEAL_MATCH_ALPHA must lie in [0, 1], got {}",
                self.matching.alpha
            )));
        }
        Ok(())
    }

    /// Order of the instruction model derived from the ingredient order
    pub fn instruction_order(&self) -> usize {
        instruction_order(self.ngram_order)
    }
}

/// Instruction sentences are short, so their model never exceeds trigrams
pub fn instruction_order(ngram_order: usize) -> usize {
    ngram_order.min(MAX_INSTRUCTION_ORDER)
}

fn parse_var<T: FromStr>(name: &str) -> Result<Option<T>, RecipeError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| RecipeError::Config(format!("{name} has an invalid value: {raw:?}"))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.ngram_order, 4);
        assert_eq!(config.instruction_order(), 3);
        assert_eq!(config.matching.min_matches, 2);
        assert!((config.matching.alpha - 0.7).abs() < 1e-12);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_instruction_order_follows_small_orders() {
        let config = AppConfig {
            ngram_order: 2,
            ..Default::default()
        };
        assert_eq!(config.instruction_order(), 2);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let config = AppConfig {
            ngram_order: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(RecipeError::Config(_))));

        let mut config = AppConfig::default();
        config.matching.alpha = 1.5;
        assert!(matches!(config.validate(), Err(RecipeError::Config(_))));
    }

    #[test]
    fn test_parse_var_reports_invalid_values() {
        env::set_var("MEAL_MATCH_TEST_ONLY_ORDER", "four");
        let parsed = parse_var::<usize>("MEAL_MATCH_TEST_ONLY_ORDER");
        env::remove_var("MEAL_MATCH_TEST_ONLY_ORDER");
        assert!(matches!(parsed, Err(RecipeError::Config(msg)) if msg.contains("four")));

        assert_eq!(parse_var::<usize>("MEAL_MATCH_TEST_ONLY_UNSET").unwrap(), None);
    }
}
