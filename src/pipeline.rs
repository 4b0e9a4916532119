//! # Load-or-Build Pipeline
//!
//! Wires the dataset, the artifact cache and the recommender together, and
//! renders query results as plain text for the interactive binary.

use std::fmt;
use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::{info, info_span, warn};

use crate::cache::{self, CacheLookup, CachePaths};
use crate::config::AppConfig;
use crate::corpus_builder::{CorpusArtifacts, CorpusBuilder};
use crate::ingredient_model::{MatchResult, RankedMatch, Suggestion};
use crate::recommender::Recommender;

/// Where the recommender's artifacts came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactSource {
    /// A cache matching the dataset, or trusted because no dataset exists
    Cache,
    /// Parsed from the dataset and written back to the cache
    Dataset,
    /// Derived from the two corpus files only
    CorporaOnly,
}

impl fmt::Display for ArtifactSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ArtifactSource::Cache => "cache",
            ArtifactSource::Dataset => "dataset",
            ArtifactSource::CorporaOnly => "corpus files",
        };
        f.write_str(label)
    }
}

/// Produce a ready recommender from whatever is on disk
///
/// With a dataset present, a cache built from the same bytes is reused and
/// anything else triggers a rebuild that refreshes the cache. Without a
/// dataset, the cache is trusted; if its maps are unusable the corpus files
/// alone are used.
pub fn load_or_build(config: &AppConfig) -> Result<(Recommender, ArtifactSource)> {
    let span = info_span!(
        "load_or_build",
        dataset = %config.dataset_path.display(),
        cache_dir = %config.cache_dir.display()
    );
    let _enter = span.enter();

    let paths = CachePaths::in_dir(&config.cache_dir);
    let (artifacts, source) = load_artifacts(&config.dataset_path, &paths)?;

    let recommender = {
        let _train = info_span!(
            "train",
            order = config.ngram_order,
            instruction_order = config.instruction_order()
        )
        .entered();
        Recommender::new(artifacts, config.ngram_order)
    };
    info!(
        recipes = recommender.recipe_count(),
        source = %source,
        "Recommender loaded"
    );
    Ok((recommender, source))
}

/// Resolve artifacts without training anything
pub fn load_artifacts(
    dataset_path: &Path,
    paths: &CachePaths,
) -> Result<(CorpusArtifacts, ArtifactSource)> {
    if dataset_path.is_file() {
        let fingerprint = cache::fingerprint_file(dataset_path)
            .with_context(|| format!("Failed to hash dataset {}", dataset_path.display()))?;

        match cache::load(paths, Some(fingerprint.as_str())) {
            CacheLookup::Hit(artifacts) => {
                info!("Using cached artifacts");
                Ok((artifacts, ArtifactSource::Cache))
            }
            CacheLookup::Miss(reason) => {
                info!(%reason, "Rebuilding artifacts from dataset");
                let artifacts = build_and_cache(dataset_path, paths, &fingerprint)?;
                Ok((artifacts, ArtifactSource::Dataset))
            }
        }
    } else {
        match cache::load(paths, None) {
            CacheLookup::Hit(artifacts) => {
                info!("No dataset found, trusting cached artifacts");
                Ok((artifacts, ArtifactSource::Cache))
            }
            CacheLookup::Miss(reason) if paths.has_corpora() => {
                warn!(%reason, "Cached maps unusable, falling back to corpus files");
                let artifacts = cache::load_from_corpora(paths)
                    .context("Failed to read corpus files")?;
                Ok((artifacts, ArtifactSource::CorporaOnly))
            }
            CacheLookup::Miss(reason) => bail!(
                "no dataset at {} and no usable cache in {}: {}",
                dataset_path.display(),
                paths.dir.display(),
                reason
            ),
        }
    }
}

/// Parse the dataset and persist the result
pub fn build_and_cache(
    dataset_path: &Path,
    paths: &CachePaths,
    fingerprint: &str,
) -> Result<CorpusArtifacts> {
    let _build = info_span!("build_corpus").entered();

    let artifacts = CorpusBuilder::new()
        .build_from_path(dataset_path)
        .with_context(|| format!("Failed to build corpus from {}", dataset_path.display()))?;

    // A read-only cache directory should not stop the session.
    if let Err(e) = cache::save(paths, &artifacts, Some(fingerprint)) {
        warn!(error = %e, "Could not write cache");
    }
    Ok(artifacts)
}

/// Render a best-match result with its missing items
pub fn format_match_for_display(result: &MatchResult) -> String {
    let Some(dish) = &result.dish else {
        return "No matching dish found. Try adding more ingredients.\n".to_string();
    };

    let mut output = format!("Best match: {} ({}% of ingredients)\n", dish, result.confidence);
    if result.missing.is_empty() {
        output.push_str("You have everything you need.\n");
    } else {
        output.push_str("\nMissing:\n");
        for item in &result.missing {
            output.push_str(&format!("  - {}\n", item));
        }
    }
    output
}

/// Render ranked alternatives as a numbered list
pub fn format_ranked_for_display(ranked: &[RankedMatch]) -> String {
    if ranked.is_empty() {
        return String::new();
    }

    let mut output = String::from("Other dishes:\n");
    for (i, entry) in ranked.iter().enumerate() {
        output.push_str(&format!(
            "{}. {} (score {:.0}%, coverage {:.0}%)\n",
            i + 1,
            entry.title,
            entry.score * 100.0,
            entry.coverage * 100.0
        ));
        if !entry.missing.is_empty() {
            output.push_str(&format!("   missing: {}\n", entry.missing.join(", ")));
        }
    }
    output
}

/// Render recipe steps as a numbered list
pub fn format_steps_for_display(title: &str, steps: &[String]) -> String {
    if steps.is_empty() {
        return format!("No steps recorded for {}.\n", title);
    }

    let mut output = format!("Steps for {}:\n", title);
    for (i, step) in steps.iter().enumerate() {
        output.push_str(&format!("{}. {}\n", i + 1, step));
    }
    output
}

/// Render autocomplete suggestions on one line
pub fn format_suggestions_for_display(suggestions: &[Suggestion]) -> String {
    if suggestions.is_empty() {
        return "No suggestions.\n".to_string();
    }
    let items: Vec<String> = suggestions.iter().map(ToString::to_string).collect();
    format!("Suggestions: {}\n", items.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_match_lists_missing_items() {
        let result = MatchResult {
            dish: Some("Roast Chicken".to_string()),
            missing: vec!["1 tsp black pepper".to_string()],
            confidence: 67,
        };
        let text = format_match_for_display(&result);
        assert!(text.starts_with("Best match: Roast Chicken (67% of ingredients)"));
        assert!(text.contains("  - 1 tsp black pepper\n"));
    }

    #[test]
    fn test_format_match_without_dish() {
        let text = format_match_for_display(&MatchResult::no_match());
        assert!(text.contains("No matching dish"));
    }

    #[test]
    fn test_format_match_complete() {
        let result = MatchResult {
            dish: Some("Toast".to_string()),
            missing: Vec::new(),
            confidence: 100,
        };
        assert!(format_match_for_display(&result).contains("everything you need"));
    }

    #[test]
    fn test_format_ranked() {
        let ranked = vec![RankedMatch {
            title: "Toast".to_string(),
            score: 0.85,
            coverage: 0.5,
            missing: vec!["butter".to_string()],
        }];
        let text = format_ranked_for_display(&ranked);
        assert!(text.contains("1. Toast (score 85%, coverage 50%)"));
        assert!(text.contains("missing: butter"));
        assert!(format_ranked_for_display(&[]).is_empty());
    }

    #[test]
    fn test_format_steps() {
        let steps = vec!["Melt butter.".to_string(), "Add leeks.".to_string()];
        assert_eq!(
            format_steps_for_display("Soup", &steps),
            "Steps for Soup:\n1. Melt butter.\n2. Add leeks.\n"
        );
        assert!(format_steps_for_display("Soup", &[]).contains("No steps"));
    }

    #[test]
    fn test_artifact_source_labels() {
        assert_eq!(ArtifactSource::Cache.to_string(), "cache");
        assert_eq!(ArtifactSource::CorporaOnly.to_string(), "corpus files");
    }
}
