//! # Error Types Module
//!
//! This module defines the error type shared by the corpus builder, the cache
//! layer and configuration loading. Query operations never return errors:
//! "no match" and "no steps" are modelled as empty results.

/// Custom error types for recipe corpus operations
#[derive(Debug, Clone, PartialEq)]
pub enum RecipeError {
    /// The dataset lacks an identifiable ingredient or instruction column
    Schema(String),
    /// Filesystem errors while reading the dataset or writing the cache
    Io(String),
    /// Malformed CSV records in the source dataset
    Csv(String),
    /// Unreadable or inconsistent cache artifacts
    Cache(String),
    /// Invalid configuration values
    Config(String),
}

impl std::fmt::Display for RecipeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecipeError::Schema(msg) => write!(f, "Schema error: {msg}"),
            RecipeError::Io(msg) => write!(f, "I/O error: {msg}"),
            RecipeError::Csv(msg) => write!(f, "CSV error: {msg}"),
            RecipeError::Cache(msg) => write!(f, "Cache error: {msg}"),
            RecipeError::Config(msg) => write!(f, "Configuration error: {msg}"),
        }
    }
}

impl std::error::Error for RecipeError {}

impl From<std::io::Error> for RecipeError {
    fn from(err: std::io::Error) -> Self {
        RecipeError::Io(err.to_string())
    }
}

impl From<csv::Error> for RecipeError {
    fn from(err: csv::Error) -> Self {
        RecipeError::Csv(err.to_string())
    }
}

impl From<serde_json::Error> for RecipeError {
    fn from(err: serde_json::Error) -> Self {
        RecipeError::Cache(err.to_string())
    }
}

impl From<tempfile::PersistError> for RecipeError {
    fn from(err: tempfile::PersistError) -> Self {
        RecipeError::Io(err.error.to_string())
    }
}
