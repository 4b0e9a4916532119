//! # Recipe Recommender
//!
//! This module answers the cooking-assistant queries on top of the corpus
//! artifacts:
//!
//! - **best match**: which recipe the user's ingredients cover best, and what
//!   is missing
//! - **ranked matches**: every overlapping recipe scored by a blend of
//!   coverage and n-gram likelihood of the matched ingredient sequence
//! - **recipe steps** and **autocomplete** suggestions
//!
//! The recommender is built once and queried through `&self`; it holds no
//! interior mutability, so a shared reference can serve many threads.
//!
//! ## Usage
//!
//! ```rust
//! use meal_match::corpus_builder::CorpusBuilder;
//! use meal_match::recommender::Recommender;
//!
//! let csv = "title,ingredients,instructions\nRoast Chicken,\"salt, pepper, chicken\",Season. Roast.\n";
//! let artifacts = CorpusBuilder::new().build(csv.as_bytes())?;
//! let recommender = Recommender::new(artifacts, 4);
//!
//! let result = recommender.best_match("chicken and salt", 2);
//! assert_eq!(result.dish.as_deref(), Some("Roast Chicken"));
//! assert_eq!(result.missing, vec!["pepper"]);
//! assert_eq!(result.confidence, 67);
//! # Ok::<(), meal_match::errors::RecipeError>(())
//! ```

use std::collections::{BTreeMap, HashSet};

use log::{debug, info};

use crate::config::instruction_order;
use crate::corpus_builder::CorpusArtifacts;
use crate::ingredient_model::{MatchResult, RankedMatch, Suggestion};
use crate::measurement_patterns::{is_numeric_token, is_stopword};
use crate::ngram_model::NGramModel;
use crate::phrases::reconstruct_phrases;
use crate::text_processing::tokenize;

const COVERAGE_EPSILON: f64 = 1e-9;

/// Matching context built once at startup
#[derive(Debug, Clone)]
pub struct Recommender {
    ingredient_model: NGramModel,
    instruction_model: NGramModel,
    ingredient_map: BTreeMap<String, Vec<String>>,
    instruction_map: BTreeMap<String, Vec<String>>,
    ingredient_phrases: BTreeMap<String, Vec<String>>,
    /// Title to matchable tokens; recipes with no such tokens are absent
    normalized: BTreeMap<String, Vec<String>>,
}

impl Recommender {
    /// Train both models on the artifacts and index the ingredient map
    ///
    /// The ingredient model has order `ngram_order`; the instruction model
    /// uses `min(ngram_order, 3)`.
    pub fn new(artifacts: CorpusArtifacts, ngram_order: usize) -> Self {
        let ingredient_model = NGramModel::from_lines(ngram_order, &artifacts.ingredient_corpus);
        let instruction_model =
            NGramModel::from_lines(instruction_order(ngram_order), &artifacts.instruction_corpus);
        Self::from_parts(ingredient_model, instruction_model, artifacts)
    }

    /// Assemble a recommender from already-trained models
    pub fn from_parts(
        ingredient_model: NGramModel,
        instruction_model: NGramModel,
        artifacts: CorpusArtifacts,
    ) -> Self {
        let normalized = normalize_ingredient_map(&artifacts.ingredient_map);
        info!(
            "Recommender ready: {} matchable recipes, {} with steps",
            normalized.len(),
            artifacts.instruction_map.len()
        );
        Self {
            ingredient_model,
            instruction_model,
            ingredient_map: artifacts.ingredient_map,
            instruction_map: artifacts.instruction_map,
            ingredient_phrases: artifacts.ingredient_phrases,
            normalized,
        }
    }

    /// Find the recipe best covered by the user's ingredients
    ///
    /// Coverage is the share of a recipe's distinct tokens the user supplied.
    /// The highest coverage wins, then the higher raw overlap, then the
    /// lexically first title. A winner sharing fewer than `min_matches` tokens
    /// is not reported.
    pub fn best_match(&self, user_text: &str, min_matches: usize) -> MatchResult {
        let user_tokens = token_set(user_text);
        if user_tokens.is_empty() {
            return MatchResult::no_match();
        }

        let mut best: Option<(&str, f64, usize)> = None;
        for (title, tokens) in &self.normalized {
            let recipe_tokens: HashSet<&str> = tokens.iter().map(String::as_str).collect();
            let match_count = recipe_tokens
                .iter()
                .filter(|token| user_tokens.contains(**token))
                .count();
            if match_count == 0 {
                continue;
            }
            let coverage = match_count as f64 / recipe_tokens.len() as f64;

            let better = match best {
                None => true,
                Some((_, best_coverage, best_count)) => {
                    coverage > best_coverage + COVERAGE_EPSILON
                        || ((coverage - best_coverage).abs() < COVERAGE_EPSILON
                            && match_count > best_count)
                }
            };
            if better {
                best = Some((title.as_str(), coverage, match_count));
            }
        }

        match best {
            Some((title, coverage, match_count)) if match_count >= min_matches => {
                debug!(
                    "Best match '{}' with {} shared tokens ({:.2} coverage)",
                    title, match_count, coverage
                );
                MatchResult {
                    dish: Some(title.to_string()),
                    missing: self.missing_phrases(title, &user_tokens),
                    confidence: to_percent(coverage),
                }
            }
            Some((title, _, match_count)) => {
                debug!(
                    "Best candidate '{}' shares only {} tokens (need {})",
                    title, match_count, min_matches
                );
                MatchResult::no_match()
            }
            None => MatchResult::no_match(),
        }
    }

    /// Rank every overlapping recipe by coverage blended with likelihood
    ///
    /// `score = alpha * coverage + (1 - alpha) * exp(score_sequence(overlap))`,
    /// where `overlap` is the recipe's tokens the user supplied, in recipe
    /// order. `alpha` is clamped into `[0, 1]`. Ties fall back to coverage and
    /// then title.
    pub fn ranked_matches(&self, user_text: &str, top_k: usize, alpha: f64) -> Vec<RankedMatch> {
        let user_tokens = token_set(user_text);
        if user_tokens.is_empty() || top_k == 0 {
            return Vec::new();
        }
        let alpha = alpha.clamp(0.0, 1.0);

        let mut scored: Vec<(&str, f64, f64)> = Vec::new();
        for (title, tokens) in &self.normalized {
            let overlap: Vec<&str> = tokens
                .iter()
                .map(String::as_str)
                .filter(|token| user_tokens.contains(*token))
                .collect();
            if overlap.is_empty() {
                continue;
            }

            let distinct: HashSet<&str> = tokens.iter().map(String::as_str).collect();
            let shared: HashSet<&str> = overlap.iter().copied().collect();
            let coverage = shared.len() as f64 / distinct.len() as f64;

            let avg_log_prob = self.ingredient_model.score_sequence(&overlap);
            let sequence_probability = if avg_log_prob == f64::NEG_INFINITY {
                0.0
            } else {
                avg_log_prob.exp()
            };

            let score = alpha * coverage + (1.0 - alpha) * sequence_probability;
            scored.push((title.as_str(), score, coverage));
        }

        scored.sort_by(|a, b| {
            b.1.total_cmp(&a.1)
                .then_with(|| b.2.total_cmp(&a.2))
                .then_with(|| a.0.cmp(b.0))
        });
        scored.truncate(top_k);
        debug!("Ranked {} recipes for '{}'", scored.len(), user_text);

        scored
            .into_iter()
            .map(|(title, score, coverage)| RankedMatch {
                title: title.to_string(),
                score,
                coverage,
                missing: self.missing_phrases(title, &user_tokens),
            })
            .collect()
    }

    /// Ranked titles with their score as a rounded percentage
    pub fn alternative_dishes(&self, user_text: &str, top_k: usize, alpha: f64) -> Vec<(String, u8)> {
        self.ranked_matches(user_text, top_k, alpha)
            .into_iter()
            .map(|ranked| (ranked.title, to_percent(ranked.score)))
            .collect()
    }

    /// First `max_steps` original instruction sentences of a recipe
    pub fn recipe_steps(&self, title: &str, max_steps: usize) -> Vec<String> {
        self.instruction_map
            .get(title)
            .map(|steps| steps.iter().take(max_steps).cloned().collect())
            .unwrap_or_default()
    }

    /// Autocomplete the next ingredient word
    pub fn next_word_suggestions(&self, partial_text: &str, top_k: usize) -> Vec<Suggestion> {
        self.ingredient_model.predict_next(partial_text, top_k)
    }

    /// Autocomplete the next instruction word
    pub fn instruction_suggestions(&self, partial_text: &str, top_k: usize) -> Vec<Suggestion> {
        self.instruction_model.predict_next(partial_text, top_k)
    }

    /// Missing ingredients of `title`, as phrases where possible
    pub fn missing_phrases(&self, title: &str, user_tokens: &HashSet<String>) -> Vec<String> {
        let Some(tokens) = self.normalized.get(title) else {
            return Vec::new();
        };

        let mut seen = HashSet::new();
        let missing: Vec<&str> = tokens
            .iter()
            .map(String::as_str)
            .filter(|token| !user_tokens.contains(*token) && seen.insert(*token))
            .collect();

        reconstruct_phrases(&missing, self.phrases_for(title))
    }

    /// Original phrases of a recipe, falling back to the raw map items
    fn phrases_for(&self, title: &str) -> &[String] {
        match self.ingredient_phrases.get(title) {
            Some(phrases) if !phrases.is_empty() => phrases,
            _ => self.raw_ingredients(title),
        }
    }

    /// Matchable (normalized) ingredient tokens of a recipe
    pub fn ingredient_tokens(&self, title: &str) -> &[String] {
        self.normalized.get(title).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Ingredient map items exactly as stored
    pub fn raw_ingredients(&self, title: &str) -> &[String] {
        self.ingredient_map.get(title).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of recipes that can be matched
    pub fn recipe_count(&self) -> usize {
        self.normalized.len()
    }

    /// Titles of all matchable recipes, in lexical order
    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.normalized.keys().map(String::as_str)
    }

    pub fn ingredient_model(&self) -> &NGramModel {
        &self.ingredient_model
    }

    pub fn instruction_model(&self) -> &NGramModel {
        &self.instruction_model
    }

    /// The normalized title-to-tokens map used for matching
    pub fn normalized_map(&self) -> &BTreeMap<String, Vec<String>> {
        &self.normalized
    }
}

/// Tokenize stored ingredient items into matchable tokens
///
/// Items may be phrases or single tokens. Numeric quantities and unit or
/// qualifier words are dropped; titles left without tokens are omitted.
pub fn normalize_ingredient_map(
    map: &BTreeMap<String, Vec<String>>,
) -> BTreeMap<String, Vec<String>> {
    map.iter()
        .filter_map(|(title, items)| {
            let tokens: Vec<String> = items
                .iter()
                .flat_map(|item| tokenize(item))
                .filter(|token| !is_numeric_token(token) && !is_stopword(token))
                .collect();
            (!tokens.is_empty()).then(|| (title.clone(), tokens))
        })
        .collect()
}

fn token_set(text: &str) -> HashSet<String> {
    tokenize(text).into_iter().collect()
}

fn to_percent(fraction: f64) -> u8 {
    (fraction * 100.0).round().clamp(0.0, 100.0) as u8
}
