//! # Pipeline Tests
//!
//! Load-or-build behavior against a real cache directory.

use std::fs;
use std::path::Path;

use tempfile::TempDir;

use meal_match::cache::{self, CacheLookup, CachePaths};
use meal_match::config::AppConfig;
use meal_match::corpus_builder::CorpusBuilder;
use meal_match::pipeline::{load_artifacts, load_or_build, ArtifactSource};
use meal_match::recommender::normalize_ingredient_map;

const DATASET: &str = "\
Title,Ingredients,Instructions,Image_Name
Leek Soup,\"['3 leeks', '2 tbsp butter', '1 l stock']\",Melt the butter. Add leeks and stock.,leek.jpg
Toast,\"['2 slices bread', '1 tbsp butter']\",Toast the bread. Spread butter!,toast.jpg
Omelette,\"['3 eggs', 'butter', 'salt']\",Whisk the eggs; cook in butter.,omelette.jpg
";

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn config_for(dir: &Path) -> AppConfig {
    AppConfig {
        dataset_path: dir.join("recipes.csv"),
        cache_dir: dir.join("cache"),
        ..Default::default()
    }
}

#[test]
fn test_build_then_reuse_cache() {
    init();
    let dir = TempDir::new().unwrap();
    let config = config_for(dir.path());
    fs::write(&config.dataset_path, DATASET).unwrap();

    let (first, source) = load_or_build(&config).unwrap();
    assert_eq!(source, ArtifactSource::Dataset);
    assert_eq!(first.recipe_count(), 3);
    assert!(config.cache_dir.join("cache_manifest.json").is_file());

    let (second, source) = load_or_build(&config).unwrap();
    assert_eq!(source, ArtifactSource::Cache);
    assert_eq!(second.normalized_map(), first.normalized_map());
    assert_eq!(
        second.best_match("leeks butter", 2).dish.as_deref(),
        Some("Leek Soup")
    );
}

#[test]
fn test_cache_round_trip_matches_direct_build() {
    init();
    let dir = TempDir::new().unwrap();
    let paths = CachePaths::in_dir(dir.path());

    let built = CorpusBuilder::new().build(DATASET.as_bytes()).unwrap();
    cache::save(&paths, &built, Some("fingerprint")).unwrap();

    let loaded = match cache::load(&paths, Some("fingerprint")) {
        CacheLookup::Hit(artifacts) => artifacts,
        CacheLookup::Miss(reason) => panic!("expected cache hit: {reason}"),
    };
    assert_eq!(
        normalize_ingredient_map(&loaded.ingredient_map),
        normalize_ingredient_map(&built.ingredient_map)
    );
    assert_eq!(loaded, built);
}

#[test]
fn test_multiline_title_survives_cache_round_trip() {
    init();
    let dir = TempDir::new().unwrap();
    let paths = CachePaths::in_dir(dir.path());
    let csv = "Title,Ingredients,Instructions\n\
               \"Foo\nBar\",\"salt, pepper\",Mix well. Serve.\n\
               Toast,\"bread, butter\",Toast the bread.\n";

    let built = CorpusBuilder::new().build(csv.as_bytes()).unwrap();
    assert_eq!(built.ingredient_corpus[0], "Foo Bar: salt pepper");
    cache::save(&paths, &built, None).unwrap();

    match cache::load(&paths, None) {
        CacheLookup::Hit(loaded) => assert_eq!(loaded, built),
        CacheLookup::Miss(reason) => panic!("expected cache hit: {reason}"),
    }
    let from_corpora = cache::load_from_corpora(&paths).unwrap();
    assert_eq!(from_corpora.ingredient_map, built.ingredient_map);
}

#[test]
fn test_changed_dataset_invalidates_cache() {
    init();
    let dir = TempDir::new().unwrap();
    let config = config_for(dir.path());
    let paths = CachePaths::in_dir(&config.cache_dir);
    fs::write(&config.dataset_path, DATASET).unwrap();
    load_or_build(&config).unwrap();

    let extended = format!("{DATASET}Pancakes,\"['flour', 'milk', 'eggs']\",Mix. Fry.,p.jpg\n");
    fs::write(&config.dataset_path, extended).unwrap();

    let (artifacts, source) = load_artifacts(&config.dataset_path, &paths).unwrap();
    assert_eq!(source, ArtifactSource::Dataset);
    assert!(artifacts.ingredient_map.contains_key("Pancakes"));

    let (_, source) = load_artifacts(&config.dataset_path, &paths).unwrap();
    assert_eq!(source, ArtifactSource::Cache);
}

#[test]
fn test_malformed_cache_triggers_rebuild() {
    init();
    let dir = TempDir::new().unwrap();
    let config = config_for(dir.path());
    let paths = CachePaths::in_dir(&config.cache_dir);
    fs::write(&config.dataset_path, DATASET).unwrap();
    load_or_build(&config).unwrap();

    fs::write(&paths.instruction_map, "[[[").unwrap();
    let (artifacts, source) = load_artifacts(&config.dataset_path, &paths).unwrap();
    assert_eq!(source, ArtifactSource::Dataset);
    assert_eq!(artifacts.instruction_map.len(), 3);
}

#[test]
fn test_cache_trusted_without_dataset() {
    init();
    let dir = TempDir::new().unwrap();
    let config = config_for(dir.path());
    fs::write(&config.dataset_path, DATASET).unwrap();
    load_or_build(&config).unwrap();
    fs::remove_file(&config.dataset_path).unwrap();

    let (recommender, source) = load_or_build(&config).unwrap();
    assert_eq!(source, ArtifactSource::Cache);
    assert_eq!(
        recommender.recipe_steps("Toast", 6),
        vec!["Toast the bread", "Spread butter"]
    );
}

#[test]
fn test_corpus_files_alone_are_enough() {
    init();
    let dir = TempDir::new().unwrap();
    let config = config_for(dir.path());
    let paths = CachePaths::in_dir(&config.cache_dir);
    fs::create_dir_all(&config.cache_dir).unwrap();
    fs::write(
        &paths.ingredient_corpus,
        "Leek Soup: 3 leeks 2 tbsp butter 1 l stock\nToast: 2 slices bread 1 tbsp butter\n",
    )
    .unwrap();
    fs::write(
        &paths.instruction_corpus,
        "Leek Soup: melt the butter\nToast: toast the bread\n",
    )
    .unwrap();

    let (recommender, source) = load_or_build(&config).unwrap();
    assert_eq!(source, ArtifactSource::CorporaOnly);

    let result = recommender.best_match("bread butter", 2);
    assert_eq!(result.dish.as_deref(), Some("Toast"));
    assert_eq!(result.missing, vec!["slices"]);
    assert_eq!(recommender.recipe_steps("Leek Soup", 6), vec!["melt the butter"]);
}

#[test]
fn test_nothing_on_disk_is_an_error() {
    init();
    let dir = TempDir::new().unwrap();
    let config = config_for(dir.path());
    let err = load_or_build(&config).err().expect("load should fail");
    assert!(err.to_string().contains("no usable cache"));
}

#[test]
fn test_dataset_without_columns_is_an_error() {
    init();
    let dir = TempDir::new().unwrap();
    let config = config_for(dir.path());
    fs::write(&config.dataset_path, "title,notes\nSoup,hot\n").unwrap();
    assert!(load_or_build(&config).is_err());
}
