//! Weighted word matching for free-text identifiers such as equipment names.
//!
//! Search text and row text are canonicalized and split on whitespace. Words
//! found in the caller's common-word list carry low weight: a row that shares
//! no uncommon word with the search scores zero, and a full match on common
//! words is always worth less than one uncommon word.

#![deny(unsafe_code)]

use tracing::debug;

use crate::table::LookupTable;

struct SearchWords {
    uncommon: Vec<String>,
    common: Vec<String>,
}

impl SearchWords {
    fn new<S: AsRef<str>>(words: Vec<String>, common_words: &[S]) -> Self {
        let (common, uncommon) = words
            .into_iter()
            .partition(|w| common_words.iter().any(|c| c.as_ref() == w));
        Self { uncommon, common }
    }

    /// Uncommon hits are weighted so that all common words together never
    /// outweigh a single uncommon word.
    fn uncommon_factor(&self) -> usize {
        self.uncommon.len() + 1
    }

    /// Numerator of the row score; the denominator is the same for every row
    /// so only numerators are compared.
    fn score(&self, row_words: &[String]) -> usize {
        let hits = |words: &[String]| words.iter().filter(|w| row_words.contains(w)).count();
        let uncommon = hits(&self.uncommon);
        if uncommon == 0 {
            return 0;
        }
        uncommon * self.uncommon_factor() + hits(&self.common)
    }
}

fn words(input: &str, canonicalize: &dyn Fn(&str) -> String) -> Vec<String> {
    canonicalize(input)
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

impl LookupTable {
    /// Finds the row of `search_column` that best matches `search_value` and
    /// returns its `lookup_column` value.
    ///
    /// Returns `None` when no row shares an uncommon word with the search, or
    /// when the best-scoring rows disagree on the value of `lookup_column`.
    /// An optional `(column, value)` filter restricts candidate rows.
    pub fn lookup_best_match<S: AsRef<str>>(
        &self,
        search_column: &str,
        search_value: &str,
        lookup_column: &str,
        canonicalize: &dyn Fn(&str) -> String,
        common_words: &[S],
        filter: Option<(&str, &str)>,
    ) -> Option<String> {
        let search_idx = self.column_index(search_column)?;
        let lookup_idx = self.column_index(lookup_column)?;

        let mut builder = self.filter_builder();
        if let Some((column, value)) = filter {
            builder = builder.equals(column, value);
        }

        let search = SearchWords::new(words(search_value, canonicalize), common_words);
        let scores: Vec<(usize, &Vec<String>)> = builder
            .matching_rows()
            .map(|cells| (search.score(&words(&cells[search_idx], canonicalize)), cells))
            .collect();

        let best = scores.iter().map(|(score, _)| *score).max()?;
        if best == 0 {
            return None;
        }

        let mut values: Vec<&str> = Vec::new();
        for (score, cells) in &scores {
            if *score == best && !values.contains(&cells[lookup_idx].as_str()) {
                values.push(cells[lookup_idx].as_str());
            }
        }
        debug!(
            table = %self.name(),
            best,
            candidates = values.len(),
            "best match scored"
        );
        match values.as_slice() {
            [value] => Some((*value).to_string()),
            _ => None,
        }
    }
}
