//! Composable row filters over a [`LookupTable`].

#![deny(unsafe_code)]

use std::collections::HashSet;

use crate::table::{LookupTable, single};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Predicate {
    Equals,
    EqualsIgnoreCase,
    NotEqualsIgnoreCase,
    StartsWith,
    StartsWithIgnoreCase,
    /// Case-insensitive equality after dropping one trailing `char` from both sides.
    EqualsIgnoringSuffix(char),
}

#[derive(Debug, Clone)]
struct Condition {
    predicate: Predicate,
    column: usize,
    value: String,
}

impl Condition {
    fn matches(&self, row: &[String]) -> bool {
        let cell = row[self.column].as_str();
        let value = self.value.as_str();
        match self.predicate {
            Predicate::Equals => cell == value,
            Predicate::EqualsIgnoreCase => eq_ignore_case(cell, value),
            Predicate::NotEqualsIgnoreCase => !eq_ignore_case(cell, value),
            Predicate::StartsWith => cell.starts_with(value),
            Predicate::StartsWithIgnoreCase => cell.to_lowercase().starts_with(&value.to_lowercase()),
            Predicate::EqualsIgnoringSuffix(suffix) => eq_ignore_case(
                strip_one_suffix(cell, suffix),
                strip_one_suffix(value, suffix),
            ),
        }
    }
}

fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b) || a.to_lowercase() == b.to_lowercase()
}

fn strip_one_suffix(value: &str, suffix: char) -> &str {
    value.strip_suffix(suffix).unwrap_or(value)
}

/// Accumulates predicates against one table. Cloning a builder copies its
/// predicates so a shared base filter can be extended several ways.
///
/// Naming a column the table does not have marks the builder as errored:
/// every terminal operation then yields nothing.
#[derive(Debug, Clone)]
pub struct FilterBuilder<'a> {
    table: &'a LookupTable,
    conditions: Vec<Condition>,
    missing_columns: Vec<String>,
}

impl<'a> FilterBuilder<'a> {
    pub fn new(table: &'a LookupTable) -> Self {
        Self {
            table,
            conditions: Vec::new(),
            missing_columns: Vec::new(),
        }
    }

    fn push(mut self, predicate: Predicate, column: &str, value: &str) -> Self {
        match self.table.column_index(column) {
            Some(column) => self.conditions.push(Condition {
                predicate,
                column,
                value: value.to_string(),
            }),
            None => self.missing_columns.push(column.to_string()),
        }
        self
    }

    #[must_use]
    pub fn equals(self, column: &str, value: &str) -> Self {
        self.push(Predicate::Equals, column, value)
    }

    #[must_use]
    pub fn equals_ignore_case(self, column: &str, value: &str) -> Self {
        self.push(Predicate::EqualsIgnoreCase, column, value)
    }

    #[must_use]
    pub fn not_equals_ignore_case(self, column: &str, value: &str) -> Self {
        self.push(Predicate::NotEqualsIgnoreCase, column, value)
    }

    #[must_use]
    pub fn starts_with(self, column: &str, prefix: &str) -> Self {
        self.push(Predicate::StartsWith, column, prefix)
    }

    #[must_use]
    pub fn starts_with_ignore_case(self, column: &str, prefix: &str) -> Self {
        self.push(Predicate::StartsWithIgnoreCase, column, prefix)
    }

    /// Case-insensitive match once a single trailing `suffix` (a wildcard
    /// marker such as `*`) is removed from both the cell and `value`.
    #[must_use]
    pub fn equals_ignoring_suffix(self, column: &str, value: &str, suffix: char) -> Self {
        self.push(Predicate::EqualsIgnoringSuffix(suffix), column, value)
    }

    pub fn has_error(&self) -> bool {
        !self.missing_columns.is_empty()
    }

    pub fn missing_columns(&self) -> &[String] {
        &self.missing_columns
    }

    pub fn table(&self) -> &'a LookupTable {
        self.table
    }

    /// Rows satisfying every predicate, in table order.
    pub fn matching_rows(&self) -> impl Iterator<Item = &'a Vec<String>> + '_ {
        let errored = self.has_error();
        self.table
            .data_rows()
            .iter()
            .filter(move |row| !errored && self.conditions.iter().all(|c| c.matches(row)))
    }

    /// Distinct values of `column` across matching rows, in first-seen order.
    pub fn find_all_unique(&self, column: &str) -> Vec<String> {
        let Some(idx) = self.table.column_index(column) else {
            return Vec::new();
        };
        let mut seen = HashSet::new();
        let mut values = Vec::new();
        for row in self.matching_rows() {
            let value = &row[idx];
            if seen.insert(value.as_str()) {
                values.push(value.clone());
            }
        }
        values
    }

    /// The value of `column` when all matching rows agree on exactly one.
    pub fn find_single_result(&self, column: &str) -> Option<String> {
        single(self.find_all_unique(column))
    }

    /// A new table with only the matching rows.
    pub fn filter(&self) -> LookupTable {
        self.table
            .with_rows(self.matching_rows().cloned().collect())
    }
}
