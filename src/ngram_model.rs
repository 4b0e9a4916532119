//! # N-gram Language Model
//!
//! Frequency-table language model over corpus tokens with simple backoff.
//!
//! For every order `n` in `1..=max_n` the model keeps, per history (the
//! previous `n - 1` tokens joined by spaces, empty for unigrams), the count of
//! every token observed next. Probabilities are plain frequency ratios; there
//! is no smoothing beyond a `1 / (|vocabulary| + 1)` floor for tokens never
//! seen in any matching context.
//!
//! # Backoff
//!
//! Lookups prefer the longest history the model has data for:
//! - `max_n`-gram context first
//! - then progressively shorter contexts
//! - finally global unigram counts
//!
//! ```rust
//! use meal_match::ngram_model::NGramModel;
//!
//! let mut model = NGramModel::new(3);
//! model.train(["Pancakes: flour milk eggs", "flour milk butter"]);
//!
//! let next = model.predict_next("Flour milk", 2);
//! assert_eq!(next[0].token, "butter");
//! assert!((next[0].probability - 0.5).abs() < 1e-12);
//! ```

use std::collections::{HashMap, HashSet};
use std::io::BufRead;

use log::{debug, info};

use crate::corpus_builder::split_corpus_line;
use crate::errors::RecipeError;
use crate::ingredient_model::Suggestion;
use crate::text_processing::tokenize;

/// Next-token counts observed after one history
#[derive(Debug, Clone, Default, PartialEq)]
struct ContextTable {
    counts: HashMap<String, u64>,
    total: u64,
}

impl ContextTable {
    fn add(&mut self, token: &str) {
        *self.counts.entry(token.to_string()).or_insert(0) += 1;
        self.total += 1;
    }

    fn probability(&self, token: &str) -> Option<f64> {
        match self.counts.get(token) {
            Some(&count) if count > 0 && self.total > 0 => Some(count as f64 / self.total as f64),
            _ => None,
        }
    }

    /// Most frequent tokens first, ties broken by token
    fn ranked(&self, top_k: usize) -> Vec<Suggestion> {
        let mut entries: Vec<(&String, &u64)> = self.counts.iter().collect();
        entries.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        entries
            .into_iter()
            .take(top_k)
            .map(|(token, &count)| Suggestion {
                token: token.clone(),
                probability: count as f64 / self.total as f64,
            })
            .collect()
    }
}

/// Backoff n-gram model trained on `"<title>: <tokens>"` corpus lines
#[derive(Debug, Clone, PartialEq)]
pub struct NGramModel {
    max_n: usize,
    /// `tables[n - 1]` maps a history of `n - 1` tokens to its next-token counts
    tables: Vec<HashMap<String, ContextTable>>,
    vocabulary: HashSet<String>,
}

impl NGramModel {
    /// Create an empty model of order `max_n` (at least 1)
    pub fn new(max_n: usize) -> Self {
        let max_n = max_n.max(1);
        Self {
            max_n,
            tables: vec![HashMap::new(); max_n],
            vocabulary: HashSet::new(),
        }
    }

    /// Create a model and train it on corpus lines
    pub fn from_lines<I, S>(max_n: usize, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut model = Self::new(max_n);
        model.train(lines);
        model
    }

    /// Create a model from a line-oriented corpus reader
    pub fn from_reader<R: BufRead>(max_n: usize, reader: R) -> Result<Self, RecipeError> {
        let lines = reader.lines().collect::<Result<Vec<String>, _>>()?;
        Ok(Self::from_lines(max_n, lines))
    }

    /// Accumulate counts from corpus lines
    ///
    /// Each line is either `"<title>: <tokens>"` or bare tokens. Counts only
    /// ever grow; there is no way to remove training data.
    pub fn train<I, S>(&mut self, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut trained = 0usize;
        for line in lines {
            let line = line.as_ref().trim();
            if line.is_empty() {
                continue;
            }
            self.train_tokens(&corpus_tokens(line));
            trained += 1;
        }
        info!(
            "Trained {}-gram model on {} lines ({} distinct tokens)",
            self.max_n,
            trained,
            self.vocabulary.len()
        );
    }

    fn train_tokens(&mut self, tokens: &[&str]) {
        for token in tokens {
            if !self.vocabulary.contains(*token) {
                self.vocabulary.insert((*token).to_string());
            }
        }

        for n in 1..=self.max_n {
            if tokens.len() < n {
                break;
            }
            for window in tokens.windows(n) {
                let history = window[..n - 1].join(" ");
                self.tables[n - 1]
                    .entry(history)
                    .or_default()
                    .add(window[n - 1]);
            }
        }
    }

    /// Predict the most likely next tokens after `history_text`
    ///
    /// The text is tokenized and the longest history with recorded
    /// continuations wins. Returns up to `top_k` suggestions sorted by
    /// descending count (ties by token), with probabilities relative to that
    /// context. An untrained model yields no suggestions.
    pub fn predict_next(&self, history_text: &str, top_k: usize) -> Vec<Suggestion> {
        let tokens = tokenize(history_text);

        for n in (1..=self.max_n).rev() {
            let Some(table) = self.context(&tokens, n) else {
                continue;
            };
            if table.total == 0 {
                continue;
            }
            debug!(
                "Predicting from {}-gram context '{}'",
                n,
                history_key(&tokens, n - 1)
            );
            return table.ranked(top_k);
        }

        Vec::new()
    }

    /// Mean log-probability of a token sequence
    ///
    /// Each token is scored against the longest preceding history under which
    /// it was observed, backing off order by order; tokens never observed in
    /// any matching context get `1 / (|vocabulary| + 1)`. Averaging keeps
    /// sequences of different lengths comparable. An empty sequence is
    /// unscorable and yields negative infinity.
    pub fn score_sequence<S: AsRef<str>>(&self, tokens: &[S]) -> f64 {
        if tokens.is_empty() {
            return f64::NEG_INFINITY;
        }

        let total: f64 = (0..tokens.len())
            .map(|i| {
                self.token_probability(&tokens[..i], tokens[i].as_ref())
                    .ln()
            })
            .sum();

        total / tokens.len() as f64
    }

    /// Backoff probability of `token` following `history`
    pub fn token_probability<S: AsRef<str>>(&self, history: &[S], token: &str) -> f64 {
        for n in (1..=self.max_n).rev() {
            if let Some(probability) = self
                .context(history, n)
                .and_then(|table| table.probability(token))
            {
                return probability;
            }
        }
        self.default_probability()
    }

    /// Floor probability for unseen tokens
    pub fn default_probability(&self) -> f64 {
        1.0 / (self.vocabulary.len() as f64 + 1.0)
    }

    /// Raw count of `token` after the space-joined `history`
    pub fn count(&self, history: &str, token: &str) -> u64 {
        let order = if history.is_empty() {
            1
        } else {
            history.split(' ').count() + 1
        };
        self.tables
            .get(order - 1)
            .and_then(|table| table.get(history))
            .and_then(|context| context.counts.get(token))
            .copied()
            .unwrap_or(0)
    }

    /// Context table of order `n` for the tail of `history`
    fn context<S: AsRef<str>>(&self, history: &[S], n: usize) -> Option<&ContextTable> {
        let history_len = n - 1;
        if history.len() < history_len {
            return None;
        }
        self.tables[n - 1].get(&history_key(history, history_len))
    }

    /// Highest order the model tracks
    pub fn max_n(&self) -> usize {
        self.max_n
    }

    /// Whether a token was seen during training
    pub fn contains(&self, token: &str) -> bool {
        self.vocabulary.contains(token)
    }

    /// Number of distinct tokens seen during training
    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    /// Whether the model has seen no training data
    pub fn is_empty(&self) -> bool {
        self.vocabulary.is_empty()
    }
}

/// Space-joined last `len` tokens of `tokens`
fn history_key<S: AsRef<str>>(tokens: &[S], len: usize) -> String {
    tokens[tokens.len() - len..]
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<&str>>()
        .join(" ")
}

/// Tokens of a corpus line with any `"<title>:"` prefix removed
pub fn corpus_tokens(line: &str) -> Vec<&str> {
    split_corpus_line(line).1.split_whitespace().collect()
}
