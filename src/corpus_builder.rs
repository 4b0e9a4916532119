//! # Corpus Builder Module
//!
//! This module reads a raw recipe dataset and derives the four artifacts the
//! recommender is trained on:
//!
//! - the ingredient corpus, one `"<title>: <tokens>"` line per recipe
//! - the instruction corpus, one `"<title>: <tokens>"` line per sentence
//! - the ingredient map, `title -> [token, ...]`
//! - the instruction map, `title -> [sentence, ...]`
//!
//! It also keeps the original ingredient phrases per title for presentation.
//!
//! ## Column Resolution
//!
//! Dataset headers are matched case-insensitively against a small table of
//! [`ColumnRule`]s and resolved once into a [`ResolvedSchema`]. Exact name
//! matches win over substring matches, then the leftmost header wins. A
//! dataset without an ingredient or instruction column is rejected with
//! [`RecipeError::Schema`].

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use log::{debug, info, trace, warn};
use serde::{Deserialize, Serialize};

use crate::errors::RecipeError;
use crate::ingredient_model::RecipeRecord;
use crate::ingredient_parser::{parse_ingredient_field, parse_ingredient_phrases};
use crate::text_processing::{split_sentences, tokenize};

/// Canonical dataset fields the builder needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanonicalField {
    Title,
    Ingredients,
    Instructions,
}

/// How a header is compared against a rule's candidate name
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchKind {
    /// Lowercased header equals the candidate
    Exact,
    /// Lowercased header contains the candidate
    Contains,
}

/// One entry of the column-name table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnRule {
    pub candidate: &'static str,
    pub kind: MatchKind,
    pub field: CanonicalField,
}

impl ColumnRule {
    const fn new(candidate: &'static str, kind: MatchKind, field: CanonicalField) -> Self {
        Self {
            candidate,
            kind,
            field,
        }
    }

    fn matches(&self, header: &str) -> bool {
        match self.kind {
            MatchKind::Exact => header == self.candidate,
            MatchKind::Contains => header.contains(self.candidate),
        }
    }
}

/// Default column-name table
pub const DEFAULT_COLUMN_RULES: &[ColumnRule] = &[
    ColumnRule::new("title", MatchKind::Exact, CanonicalField::Title),
    ColumnRule::new("name", MatchKind::Exact, CanonicalField::Title),
    ColumnRule::new("recipe", MatchKind::Exact, CanonicalField::Title),
    ColumnRule::new("ingredients", MatchKind::Exact, CanonicalField::Ingredients),
    ColumnRule::new("ingredient", MatchKind::Contains, CanonicalField::Ingredients),
    ColumnRule::new("instructions", MatchKind::Exact, CanonicalField::Instructions),
    ColumnRule::new("instruction", MatchKind::Contains, CanonicalField::Instructions),
    ColumnRule::new("direction", MatchKind::Contains, CanonicalField::Instructions),
    ColumnRule::new("step", MatchKind::Contains, CanonicalField::Instructions),
];

/// Column indices resolved from a dataset header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSchema {
    /// Title column, if any (rows get `untitled-N` titles otherwise)
    pub title: Option<usize>,
    pub ingredients: usize,
    pub instructions: usize,
}

impl ResolvedSchema {
    /// Resolve headers against the default rule table
    pub fn resolve<S: AsRef<str>>(headers: &[S]) -> Result<Self, RecipeError> {
        Self::resolve_with_rules(headers, DEFAULT_COLUMN_RULES)
    }

    /// Resolve headers against a custom rule table
    pub fn resolve_with_rules<S: AsRef<str>>(
        headers: &[S],
        rules: &[ColumnRule],
    ) -> Result<Self, RecipeError> {
        let lowered: Vec<String> = headers
            .iter()
            .map(|h| h.as_ref().trim().to_lowercase())
            .collect();

        let find = |field: CanonicalField| -> Option<usize> {
            lowered
                .iter()
                .enumerate()
                .filter_map(|(index, header)| {
                    rules
                        .iter()
                        .filter(|rule| rule.field == field && rule.matches(header))
                        .map(|rule| rule.kind)
                        .min()
                        .map(|kind| (kind, index))
                })
                .min()
                .map(|(_, index)| index)
        };

        let title = find(CanonicalField::Title);
        let ingredients = find(CanonicalField::Ingredients);
        let instructions = find(CanonicalField::Instructions);

        match (ingredients, instructions) {
            (Some(ingredients), Some(instructions)) => {
                debug!(
                    "Resolved schema: title={:?}, ingredients={}, instructions={}",
                    title, ingredients, instructions
                );
                Ok(Self {
                    title,
                    ingredients,
                    instructions,
                })
            }
            _ => Err(RecipeError::Schema(format!(
                "dataset is missing an ingredient or instruction column (headers: {})",
                lowered.join(", ")
            ))),
        }
    }
}

/// Everything derived from a dataset, ready to persist or to train on
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorpusArtifacts {
    /// `"<title>: <tokens>"`, one line per recipe
    pub ingredient_corpus: Vec<String>,
    /// `"<title>: <tokens>"`, one line per instruction sentence
    pub instruction_corpus: Vec<String>,
    /// Title to ingredient tokens; every entry is non-empty
    pub ingredient_map: BTreeMap<String, Vec<String>>,
    /// Title to original instruction sentences; every entry is non-empty
    pub instruction_map: BTreeMap<String, Vec<String>>,
    /// Title to original ingredient phrases
    pub ingredient_phrases: BTreeMap<String, Vec<String>>,
}

impl CorpusArtifacts {
    /// Derive corpora and maps from parsed records
    pub fn from_records(records: &[RecipeRecord]) -> Self {
        let mut artifacts = Self::default();

        for record in records {
            if !record.ingredient_tokens.is_empty() {
                artifacts.ingredient_corpus.push(format!(
                    "{}: {}",
                    record.title,
                    record.ingredient_tokens.join(" ")
                ));
                artifacts
                    .ingredient_map
                    .insert(record.title.clone(), record.ingredient_tokens.clone());
                if !record.ingredient_phrases.is_empty() {
                    artifacts
                        .ingredient_phrases
                        .insert(record.title.clone(), record.ingredient_phrases.clone());
                }
            }

            let mut steps = Vec::new();
            for sentence in &record.instruction_sentences {
                let tokens = tokenize(sentence);
                if tokens.is_empty() {
                    continue;
                }
                artifacts
                    .instruction_corpus
                    .push(format!("{}: {}", record.title, tokens.join(" ")));
                steps.push(sentence.clone());
            }
            if !steps.is_empty() {
                artifacts.instruction_map.insert(record.title.clone(), steps);
            }
        }

        artifacts
    }

    /// Number of distinct titles across both maps
    pub fn recipe_count(&self) -> usize {
        self.ingredient_map
            .keys()
            .chain(self.instruction_map.keys())
            .collect::<std::collections::BTreeSet<_>>()
            .len()
    }
}

/// Builds recipe records and corpora from tabular data
#[derive(Debug, Clone)]
pub struct CorpusBuilder {
    rules: Vec<ColumnRule>,
}

impl Default for CorpusBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CorpusBuilder {
    /// Create a builder using [`DEFAULT_COLUMN_RULES`]
    pub fn new() -> Self {
        Self {
            rules: DEFAULT_COLUMN_RULES.to_vec(),
        }
    }

    /// Create a builder with a custom column-name table
    pub fn with_rules(rules: Vec<ColumnRule>) -> Self {
        Self { rules }
    }

    /// Build all artifacts from a CSV file
    pub fn build_from_path(&self, path: &Path) -> Result<CorpusArtifacts, RecipeError> {
        info!("Building corpora from {}", path.display());
        let file = File::open(path)
            .map_err(|e| RecipeError::Io(format!("cannot open {}: {e}", path.display())))?;
        self.build(file)
    }

    /// Build all artifacts from CSV data
    pub fn build<R: Read>(&self, reader: R) -> Result<CorpusArtifacts, RecipeError> {
        let records = self.read_records(reader)?;
        let artifacts = CorpusArtifacts::from_records(&records);
        info!(
            "Built corpora: {} ingredient lines, {} instruction lines, {} recipes",
            artifacts.ingredient_corpus.len(),
            artifacts.instruction_corpus.len(),
            records.len()
        );
        Ok(artifacts)
    }

    /// Parse CSV data into recipe records
    ///
    /// Invalid UTF-8 is replaced rather than rejected; rows shorter than the
    /// header are padded with empty fields.
    pub fn read_records<R: Read>(&self, reader: R) -> Result<Vec<RecipeRecord>, RecipeError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader
            .byte_headers()?
            .iter()
            .map(|h| String::from_utf8_lossy(h).into_owned())
            .collect();

        let mut rows = Vec::new();
        for row in csv_reader.byte_records() {
            let row = row?;
            rows.push(
                row.iter()
                    .map(|field| String::from_utf8_lossy(field).into_owned())
                    .collect::<Vec<String>>(),
            );
        }

        self.records_from_rows(&headers, rows)
    }

    /// Parse already-split rows into recipe records
    ///
    /// Rows yielding neither ingredient tokens nor instruction sentences are
    /// skipped. A repeated title replaces the earlier record.
    pub fn records_from_rows<S, I>(
        &self,
        headers: &[S],
        rows: I,
    ) -> Result<Vec<RecipeRecord>, RecipeError>
    where
        S: AsRef<str>,
        I: IntoIterator<Item = Vec<String>>,
    {
        let schema = ResolvedSchema::resolve_with_rules(headers, &self.rules)?;

        let mut records: Vec<RecipeRecord> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();

        for (row_number, row) in rows.into_iter().enumerate() {
            let field = |index: usize| row.get(index).map(String::as_str).unwrap_or("");

            let raw_title = normalize_title(schema.title.map(field).unwrap_or(""));
            let title = if raw_title.is_empty() {
                format!("untitled-{}", records.len() + 1)
            } else {
                raw_title
            };

            let record = parse_row(title, field(schema.ingredients), field(schema.instructions));
            if record.ingredient_tokens.is_empty() && record.instruction_sentences.is_empty() {
                trace!("Skipping row {} ('{}'): nothing usable", row_number, record.title);
                continue;
            }

            match positions.get(&record.title) {
                Some(&existing) => {
                    warn!("Duplicate recipe title '{}', keeping the later row", record.title);
                    records[existing] = record;
                }
                None => {
                    positions.insert(record.title.clone(), records.len());
                    records.push(record);
                }
            }
        }

        debug!("Parsed {} recipe records", records.len());
        Ok(records)
    }
}

/// Split a corpus line into its optional title and its token text
///
/// Corpus tokens never contain a colon, so the last colon ends the title.
pub fn split_corpus_line(line: &str) -> (Option<&str>, &str) {
    match line.rsplit_once(':') {
        Some((title, rest)) => (Some(title.trim()), rest.trim()),
        None => (None, line.trim()),
    }
}

/// Collapse line breaks and whitespace runs so a title fits on one corpus line
pub fn normalize_title(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse one row's fields into a record
fn parse_row(title: String, raw_ingredients: &str, raw_instructions: &str) -> RecipeRecord {
    let mut record = RecipeRecord::new(title);

    record.ingredient_tokens = parse_ingredient_field(raw_ingredients);
    if !record.ingredient_tokens.is_empty() {
        record.ingredient_phrases = parse_ingredient_phrases(raw_ingredients);
    }

    record.instruction_sentences = split_sentences(raw_instructions)
        .into_iter()
        .filter(|sentence| !tokenize(sentence).is_empty())
        .collect();

    record
}
