//! Two-word phrase counting.
//!
//! Comments are lowercased, split into runs of word characters and turned
//! into overlapping adjacent pairs. Pairs touching a stop word are dropped.

use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::LazyLock;
use stop_words::{get, LANGUAGE};

static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+").unwrap());

/// An ordered pair of adjacent lowercase tokens.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PhraseKey {
    pub first: String,
    pub second: String,
}

impl PhraseKey {
    pub fn new(first: impl Into<String>, second: impl Into<String>) -> Self {
        Self {
            first: first.into(),
            second: second.into(),
        }
    }
}

impl fmt::Display for PhraseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.first, self.second)
    }
}

/// Lowercase stop word set. Lookups expect already-lowercased tokens.
#[derive(Debug, Clone, Default)]
pub struct StopWords {
    words: HashSet<String>,
}

impl StopWords {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_list<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            words: words
                .into_iter()
                .map(|w| w.as_ref().trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect(),
        }
    }

    /// The bundled English list.
    pub fn english() -> Self {
        Self {
            words: get(LANGUAGE::English)
                .iter()
                .map(|s| s.to_string().to_lowercase())
                .collect(),
        }
    }

    pub fn extend<I, S>(&mut self, words: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.words.extend(
            words
                .into_iter()
                .map(|w| w.as_ref().trim().to_lowercase())
                .filter(|w| !w.is_empty()),
        );
    }

    pub fn contains(&self, token: &str) -> bool {
        self.words.contains(token)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Phrase counts for one group. Entries keep first-encounter order so that
/// equal counts rank deterministically.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhraseFrequencyTable {
    index: HashMap<PhraseKey, usize>,
    entries: Vec<(PhraseKey, u64)>,
}

impl PhraseFrequencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, key: PhraseKey) {
        match self.index.get(&key) {
            Some(&slot) => self.entries[slot].1 += 1,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, 1));
            }
        }
    }

    pub fn count(&self, key: &PhraseKey) -> u64 {
        self.index
            .get(key)
            .map(|&slot| self.entries[slot].1)
            .unwrap_or(0)
    }

    /// Number of distinct phrases.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all phrase occurrences.
    pub fn total(&self) -> u64 {
        self.entries.iter().map(|(_, count)| count).sum()
    }

    /// Entries in first-encounter order.
    pub fn iter(&self) -> impl Iterator<Item = (&PhraseKey, u64)> {
        self.entries.iter().map(|(key, count)| (key, *count))
    }
}

pub fn tokenize(comment: &str) -> Vec<String> {
    let lowered = comment.to_lowercase();
    WORD.find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

pub fn count_phrases<S: AsRef<str>>(comments: &[S], stop_words: &StopWords) -> PhraseFrequencyTable {
    let mut table = PhraseFrequencyTable::new();

    for comment in comments {
        let tokens = tokenize(comment.as_ref());
        for pair in tokens.windows(2) {
            if stop_words.contains(&pair[0]) || stop_words.contains(&pair[1]) {
                continue;
            }
            table.record(PhraseKey::new(pair[0].as_str(), pair[1].as_str()));
        }
    }

    table
}

/// The `n` most frequent phrases, highest count first, ties in
/// first-encounter order. An empty table gives an empty list.
pub fn select_top(table: &PhraseFrequencyTable, n: usize) -> Vec<(PhraseKey, u64)> {
    let mut ranked: Vec<(PhraseKey, u64)> = table.entries.clone();
    // Stable sort keeps first-encounter order among equal counts.
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked.truncate(n);
    ranked
}
