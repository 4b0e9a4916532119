//! # Artifact Cache
//!
//! Persists [`CorpusArtifacts`] next to a manifest so later runs can skip the
//! dataset parse. The on-disk layout is:
//!
//! - `ingredients_corpus.txt` and `process_corpus.txt`, one line per entry
//! - `ingredients_map.json`, `process_map.json` and `ingredient_phrases.json`
//! - `cache_manifest.json`, written last
//!
//! The manifest carries the SHA-256 of the dataset the cache was built from.
//! A cache whose manifest disagrees with the current dataset is stale. When no
//! dataset is available the cache is trusted as-is, and a cache holding only
//! the two corpus files can still be expanded into a full set of artifacts.

use std::collections::BTreeMap;
use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;

use crate::config::{
    INGREDIENT_CORPUS_FILE, INGREDIENT_MAP_FILE, INSTRUCTION_CORPUS_FILE, INSTRUCTION_MAP_FILE,
    MANIFEST_FILE, PHRASE_MAP_FILE,
};
use crate::corpus_builder::{split_corpus_line, CorpusArtifacts};
use crate::errors::RecipeError;

/// Bumped whenever the artifact layout changes
pub const CACHE_FORMAT_VERSION: u32 = 1;

/// Locations of every cache file inside one directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePaths {
    pub dir: PathBuf,
    pub ingredient_corpus: PathBuf,
    pub instruction_corpus: PathBuf,
    pub ingredient_map: PathBuf,
    pub instruction_map: PathBuf,
    pub ingredient_phrases: PathBuf,
    pub manifest: PathBuf,
}

impl CachePaths {
    pub fn in_dir<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref().to_path_buf();
        Self {
            ingredient_corpus: dir.join(INGREDIENT_CORPUS_FILE),
            instruction_corpus: dir.join(INSTRUCTION_CORPUS_FILE),
            ingredient_map: dir.join(INGREDIENT_MAP_FILE),
            instruction_map: dir.join(INSTRUCTION_MAP_FILE),
            ingredient_phrases: dir.join(PHRASE_MAP_FILE),
            manifest: dir.join(MANIFEST_FILE),
            dir,
        }
    }

    /// True when both corpus files are present
    pub fn has_corpora(&self) -> bool {
        self.ingredient_corpus.is_file() && self.instruction_corpus.is_file()
    }

    fn required_files(&self) -> [&Path; 4] {
        [
            &self.ingredient_corpus,
            &self.instruction_corpus,
            &self.ingredient_map,
            &self.instruction_map,
        ]
    }
}

/// Provenance of a cache directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheManifest {
    pub format_version: u32,
    /// Hex SHA-256 of the dataset, absent when built without one
    pub source_sha256: Option<String>,
    pub built_at: DateTime<Utc>,
    pub recipe_count: usize,
}

impl CacheManifest {
    pub fn new(source_sha256: Option<String>, recipe_count: usize) -> Self {
        Self {
            format_version: CACHE_FORMAT_VERSION,
            source_sha256,
            built_at: Utc::now(),
            recipe_count,
        }
    }
}

/// Why a cache could not be used
#[derive(Debug, Clone, PartialEq)]
pub enum CacheMiss {
    /// A required file does not exist
    Missing(PathBuf),
    /// A file exists but could not be read or parsed
    Malformed(String),
    /// The manifest belongs to another dataset or layout
    Stale { expected: String, found: Option<String> },
}

impl fmt::Display for CacheMiss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheMiss::Missing(path) => write!(f, "missing cache file {}", path.display()),
            CacheMiss::Malformed(msg) => write!(f, "malformed cache: {msg}"),
            CacheMiss::Stale { expected, found } => write!(
                f,
                "stale cache: dataset hash {expected}, manifest has {}",
                found.as_deref().unwrap_or("none")
            ),
        }
    }
}

/// Outcome of [`load`]
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup {
    Hit(CorpusArtifacts),
    Miss(CacheMiss),
}

/// Hex SHA-256 of a byte slice
pub fn fingerprint_bytes(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Hex SHA-256 of a file's contents, streamed
pub fn fingerprint_file(path: &Path) -> Result<String, RecipeError> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 64 * 1024];
    loop {
        let read = reader.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Write every artifact, then the manifest
///
/// Each file is replaced atomically, so an interrupted save leaves either the
/// previous file or the new one. A cache without a fresh manifest is treated
/// as stale on the next run whenever a dataset is present.
pub fn save(
    paths: &CachePaths,
    artifacts: &CorpusArtifacts,
    source_sha256: Option<&str>,
) -> Result<CacheManifest, RecipeError> {
    fs::create_dir_all(&paths.dir)?;

    // Drop the old manifest first so a partial save never looks fresh.
    match fs::remove_file(&paths.manifest) {
        Ok(()) => debug!("Removed previous manifest {}", paths.manifest.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }

    write_lines(&paths.ingredient_corpus, &artifacts.ingredient_corpus)?;
    write_lines(&paths.instruction_corpus, &artifacts.instruction_corpus)?;
    write_json(&paths.ingredient_map, &artifacts.ingredient_map)?;
    write_json(&paths.instruction_map, &artifacts.instruction_map)?;
    write_json(&paths.ingredient_phrases, &artifacts.ingredient_phrases)?;

    let manifest = CacheManifest::new(
        source_sha256.map(str::to_string),
        artifacts.recipe_count(),
    );
    write_json(&paths.manifest, &manifest)?;

    info!(
        "Saved cache for {} recipes to {}",
        manifest.recipe_count,
        paths.dir.display()
    );
    Ok(manifest)
}

/// Load cached artifacts
///
/// With `expected_sha256` set, the manifest must exist and match it. Without
/// it the manifest is not consulted. Unreadable or malformed files are
/// reported as a miss, never as an error.
pub fn load(paths: &CachePaths, expected_sha256: Option<&str>) -> CacheLookup {
    for path in paths.required_files() {
        if !path.is_file() {
            return CacheLookup::Miss(CacheMiss::Missing(path.to_path_buf()));
        }
    }

    if let Some(expected) = expected_sha256 {
        if !paths.manifest.is_file() {
            return CacheLookup::Miss(CacheMiss::Missing(paths.manifest.clone()));
        }
        let manifest: CacheManifest = match read_json(&paths.manifest) {
            Ok(manifest) => manifest,
            Err(e) => return CacheLookup::Miss(CacheMiss::Malformed(e.to_string())),
        };
        if manifest.format_version != CACHE_FORMAT_VERSION
            || manifest.source_sha256.as_deref() != Some(expected)
        {
            return CacheLookup::Miss(CacheMiss::Stale {
                expected: expected.to_string(),
                found: manifest.source_sha256,
            });
        }
    }

    match read_artifacts(paths) {
        Ok(artifacts) => {
            debug!(
                "Loaded cache with {} recipes from {}",
                artifacts.recipe_count(),
                paths.dir.display()
            );
            CacheLookup::Hit(artifacts)
        }
        Err(e) => CacheLookup::Miss(CacheMiss::Malformed(e.to_string())),
    }
}

/// Rebuild artifacts from the two corpus files alone
///
/// Ingredient maps come from the ingredient corpus lines, instruction maps
/// from the instruction corpus lines, which stand in for the original
/// sentences. No phrases are available, so presentation falls back to the
/// ingredient tokens.
pub fn load_from_corpora(paths: &CachePaths) -> Result<CorpusArtifacts, RecipeError> {
    let ingredient_corpus = read_lines(&paths.ingredient_corpus)?;
    let instruction_corpus = read_lines(&paths.instruction_corpus)?;

    let artifacts = CorpusArtifacts {
        ingredient_map: ingredient_map_from_corpus(&ingredient_corpus),
        instruction_map: instruction_map_from_corpus(&instruction_corpus),
        ingredient_corpus,
        instruction_corpus,
        ingredient_phrases: BTreeMap::new(),
    };
    warn!(
        "Rebuilt {} recipes from corpus files only; original phrases are unavailable",
        artifacts.recipe_count()
    );
    Ok(artifacts)
}

/// Title to tokens from `"<title>: <tokens>"` lines; later lines win
pub fn ingredient_map_from_corpus<S: AsRef<str>>(lines: &[S]) -> BTreeMap<String, Vec<String>> {
    let mut map = BTreeMap::new();
    for line in lines {
        if let (Some(title), body) = split_corpus_line(line.as_ref()) {
            let tokens: Vec<String> = body.split_whitespace().map(str::to_string).collect();
            if !title.is_empty() && !tokens.is_empty() {
                map.insert(title.to_string(), tokens);
            }
        }
    }
    map
}

/// Title to steps from `"<title>: <tokens>"` lines, in line order
pub fn instruction_map_from_corpus<S: AsRef<str>>(lines: &[S]) -> BTreeMap<String, Vec<String>> {
    let mut map: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for line in lines {
        if let (Some(title), body) = split_corpus_line(line.as_ref()) {
            if !title.is_empty() && !body.is_empty() {
                map.entry(title.to_string())
                    .or_default()
                    .push(body.to_string());
            }
        }
    }
    map
}

fn read_artifacts(paths: &CachePaths) -> Result<CorpusArtifacts, RecipeError> {
    let ingredient_phrases = if paths.ingredient_phrases.is_file() {
        read_json(&paths.ingredient_phrases)?
    } else {
        BTreeMap::new()
    };

    Ok(CorpusArtifacts {
        ingredient_corpus: read_lines(&paths.ingredient_corpus)?,
        instruction_corpus: read_lines(&paths.instruction_corpus)?,
        ingredient_map: read_json(&paths.ingredient_map)?,
        instruction_map: read_json(&paths.instruction_map)?,
        ingredient_phrases,
    })
}

fn read_lines(path: &Path) -> Result<Vec<String>, RecipeError> {
    let text = fs::read_to_string(path)?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, RecipeError> {
    let text = fs::read_to_string(path)?;
    serde_json::from_str(&text)
        .map_err(|e| RecipeError::Cache(format!("{}: {}", path.display(), e)))
}

fn write_lines(path: &Path, lines: &[String]) -> Result<(), RecipeError> {
    write_atomic(path, lines.join("\n").as_bytes())
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), RecipeError> {
    let json = serde_json::to_string_pretty(value)?;
    write_atomic(path, json.as_bytes())
}

fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), RecipeError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp_file = NamedTempFile::new_in(parent)?;
    temp_file.write_all(contents)?;
    temp_file.flush()?;
    temp_file.persist(path)?;
    debug!("Wrote {} ({} bytes)", path.display(), contents.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_artifacts() -> CorpusArtifacts {
        let mut artifacts = CorpusArtifacts::default();
        artifacts.ingredient_corpus = vec![
            "Leek Soup: leeks butter stock".to_string(),
            "Toast: bread butter".to_string(),
        ];
        artifacts.instruction_corpus = vec![
            "Leek Soup: melt the butter".to_string(),
            "Leek Soup: add leeks and stock".to_string(),
            "Toast: toast the bread".to_string(),
        ];
        artifacts.ingredient_map.insert(
            "Leek Soup".to_string(),
            vec!["leeks".to_string(), "butter".to_string(), "stock".to_string()],
        );
        artifacts.ingredient_map.insert(
            "Toast".to_string(),
            vec!["bread".to_string(), "butter".to_string()],
        );
        artifacts.instruction_map.insert(
            "Leek Soup".to_string(),
            vec!["Melt the butter.".to_string(), "Add leeks and stock.".to_string()],
        );
        artifacts
            .instruction_map
            .insert("Toast".to_string(), vec!["Toast the bread.".to_string()]);
        artifacts.ingredient_phrases.insert(
            "Toast".to_string(),
            vec!["2 slices bread".to_string(), "1 tbsp butter".to_string()],
        );
        artifacts
    }

    #[test]
    fn test_fingerprint_is_stable_hex() {
        let digest = fingerprint_bytes(b"abc");
        assert_eq!(
            digest,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_fingerprint_file_matches_bytes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.csv");
        fs::write(&path, "Title,Ingredients\n").unwrap();
        assert_eq!(
            fingerprint_file(&path).unwrap(),
            fingerprint_bytes(b"Title,Ingredients\n")
        );
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let paths = CachePaths::in_dir(dir.path());
        let artifacts = sample_artifacts();

        let manifest = save(&paths, &artifacts, Some("abc123")).unwrap();
        assert_eq!(manifest.recipe_count, 2);
        assert_eq!(manifest.format_version, CACHE_FORMAT_VERSION);

        assert_eq!(load(&paths, Some("abc123")), CacheLookup::Hit(artifacts.clone()));
        assert_eq!(load(&paths, None), CacheLookup::Hit(artifacts));
    }

    #[test]
    fn test_hash_mismatch_is_stale() {
        let dir = TempDir::new().unwrap();
        let paths = CachePaths::in_dir(dir.path());
        save(&paths, &sample_artifacts(), Some("old")).unwrap();

        match load(&paths, Some("new")) {
            CacheLookup::Miss(CacheMiss::Stale { expected, found }) => {
                assert_eq!(expected, "new");
                assert_eq!(found.as_deref(), Some("old"));
            }
            other => panic!("expected stale cache, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_manifest_is_a_miss_only_when_hash_expected() {
        let dir = TempDir::new().unwrap();
        let paths = CachePaths::in_dir(dir.path());
        save(&paths, &sample_artifacts(), None).unwrap();
        fs::remove_file(&paths.manifest).unwrap();

        assert!(matches!(
            load(&paths, Some("abc")),
            CacheLookup::Miss(CacheMiss::Missing(_))
        ));
        assert!(matches!(load(&paths, None), CacheLookup::Hit(_)));
    }

    #[test]
    fn test_malformed_map_is_a_miss() {
        let dir = TempDir::new().unwrap();
        let paths = CachePaths::in_dir(dir.path());
        save(&paths, &sample_artifacts(), None).unwrap();
        fs::write(&paths.ingredient_map, "{not json").unwrap();

        assert!(matches!(
            load(&paths, None),
            CacheLookup::Miss(CacheMiss::Malformed(_))
        ));
    }

    #[test]
    fn test_empty_directory_is_a_miss() {
        let dir = TempDir::new().unwrap();
        let paths = CachePaths::in_dir(dir.path());
        assert!(matches!(
            load(&paths, None),
            CacheLookup::Miss(CacheMiss::Missing(_))
        ));
        assert!(!paths.has_corpora());
    }

    #[test]
    fn test_missing_phrase_file_loads_empty_phrases() {
        let dir = TempDir::new().unwrap();
        let paths = CachePaths::in_dir(dir.path());
        save(&paths, &sample_artifacts(), None).unwrap();
        fs::remove_file(&paths.ingredient_phrases).unwrap();

        match load(&paths, None) {
            CacheLookup::Hit(artifacts) => assert!(artifacts.ingredient_phrases.is_empty()),
            other => panic!("expected hit, got {other:?}"),
        }
    }

    #[test]
    fn test_load_from_corpora_derives_maps() {
        let dir = TempDir::new().unwrap();
        let paths = CachePaths::in_dir(dir.path());
        fs::write(
            &paths.ingredient_corpus,
            "Leek Soup: leeks butter stock\n\nToast: bread butter\n",
        )
        .unwrap();
        fs::write(
            &paths.instruction_corpus,
            "Leek Soup: melt the butter\nLeek Soup: add leeks\n",
        )
        .unwrap();
        assert!(paths.has_corpora());

        let artifacts = load_from_corpora(&paths).unwrap();
        assert_eq!(artifacts.ingredient_map["Toast"], vec!["bread", "butter"]);
        assert_eq!(
            artifacts.instruction_map["Leek Soup"],
            vec!["melt the butter", "add leeks"]
        );
        assert!(artifacts.ingredient_phrases.is_empty());
        assert_eq!(artifacts.ingredient_corpus.len(), 2);
    }

    #[test]
    fn test_corpus_lines_without_title_are_ignored_in_maps() {
        let lines = vec!["leeks butter", "Toast: bread"];
        let map = ingredient_map_from_corpus(&lines);
        assert_eq!(map.len(), 1);
        assert_eq!(map["Toast"], vec!["bread"]);
    }
}
