//! # Meal Match
//!
//! Suggests dishes from the ingredients a user has on hand. A recipe dataset
//! is turned into token corpora and per-recipe maps, n-gram models are
//! trained on the corpora, and queries are answered by ingredient coverage
//! blended with sequence likelihood.

pub mod cache;
pub mod config;
pub mod corpus_builder;
pub mod errors;
pub mod ingredient_model;
pub mod ingredient_parser;
pub mod measurement_patterns;
pub mod ngram_model;
pub mod phrases;
pub mod pipeline;
pub mod recommender;
pub mod text_processing;
