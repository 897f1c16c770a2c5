//! Content hashing of rows for order-independent comparison.
//!
//! [`ReconciliationIndex::build()`] hashes each row of a [`RowSet`] over a
//! chosen subset of columns and groups row numbers by hash. Rows that share
//! a hash are kept together in scan order; duplicates are part of the
//! output, never an error. [`reconcile()`] compares an expected and an
//! actual index and reports what matched, what is missing, what is
//! unexpected, and which hashes occur more than once on either side.

use std::collections::{BTreeMap, HashSet};

use log::{debug, info};
use sha2::{Digest, Sha256};

use crate::{data::decode, error::Result, rows::RowSet};

/// Placed before every hashed value so that adjacent values cannot run together.
pub const FIELD_SEPARATOR: char = '\u{1f}';

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciliationIndex {
    entries: BTreeMap<String, Vec<usize>>,
    row_count: usize,
}

impl ReconciliationIndex {
    /// Hash every row of `rows` over the columns named in `key_fields`
    /// (case-insensitive). Row numbers are 1-based.
    pub fn build<S: AsRef<str>>(rows: &RowSet, key_fields: &[S]) -> Result<Self> {
        let wanted: HashSet<String> = key_fields
            .iter()
            .map(|field| field.as_ref().to_lowercase())
            .collect();
        let selected: Vec<usize> = rows
            .columns()
            .iter()
            .enumerate()
            .filter(|(_, column)| wanted.contains(&column.name.to_lowercase()))
            .map(|(idx, _)| idx)
            .collect();

        let mut index = ReconciliationIndex::default();
        for (row_idx, row) in rows.rows().iter().enumerate() {
            let row_number = row_idx + 1;
            let mut input = String::new();
            for &col_idx in &selected {
                input.push(FIELD_SEPARATOR);
                input.push_str(&decode(&row[col_idx], &rows.columns()[col_idx])?);
            }
            let hash = content_hash(&input);
            let numbers = index.entries.entry(hash).or_default();
            if let Some(first) = numbers.first() {
                debug!("Row {row_number} duplicates the content of row {first}");
            }
            numbers.push(row_number);
            index.row_count += 1;
        }
        Ok(index)
    }

    /// Row numbers that produced `hash`, in scan order.
    pub fn rows_for(&self, hash: &str) -> Option<&[usize]> {
        self.entries.get(hash).map(Vec::as_slice)
    }

    pub fn contains(&self, hash: &str) -> bool {
        self.entries.contains_key(hash)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[usize])> {
        self.entries
            .iter()
            .map(|(hash, rows)| (hash.as_str(), rows.as_slice()))
    }

    /// Hashes produced by more than one row.
    pub fn duplicates(&self) -> impl Iterator<Item = (&str, &[usize])> {
        self.iter().filter(|(_, rows)| rows.len() > 1)
    }

    /// Number of distinct hashes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of rows hashed.
    pub fn row_count(&self) -> usize {
        self.row_count
    }
}

/// Hex SHA-256 of `input`.
pub fn content_hash(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashGroup {
    pub hash: String,
    pub rows: Vec<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// Hashes present on both sides.
    pub matched: Vec<String>,
    /// Expected rows with no counterpart in the actual result.
    pub missing: Vec<HashGroup>,
    /// Actual rows with no counterpart in the expected result.
    pub unexpected: Vec<HashGroup>,
    pub expected_duplicates: Vec<HashGroup>,
    pub actual_duplicates: Vec<HashGroup>,
}

impl Reconciliation {
    /// True when every hash appears on both sides. Duplicates do not count
    /// against this; callers that treat them as failures check the
    /// duplicate lists themselves.
    pub fn is_match(&self) -> bool {
        self.missing.is_empty() && self.unexpected.is_empty()
    }

    pub fn has_duplicates(&self) -> bool {
        !self.expected_duplicates.is_empty() || !self.actual_duplicates.is_empty()
    }
}

pub fn reconcile(expected: &ReconciliationIndex, actual: &ReconciliationIndex) -> Reconciliation {
    let mut report = Reconciliation::default();
    for (hash, rows) in expected.iter() {
        if actual.contains(hash) {
            report.matched.push(hash.to_string());
        } else {
            report.missing.push(group(hash, rows));
        }
    }
    report.unexpected = actual
        .iter()
        .filter(|(hash, _)| !expected.contains(hash))
        .map(|(hash, rows)| group(hash, rows))
        .collect();
    report.expected_duplicates = expected.duplicates().map(|(h, r)| group(h, r)).collect();
    report.actual_duplicates = actual.duplicates().map(|(h, r)| group(h, r)).collect();
    info!(
        "Reconciled {} expected against {} actual row(s): {} matched, {} missing, {} unexpected",
        expected.row_count(),
        actual.row_count(),
        report.matched.len(),
        report.missing.len(),
        report.unexpected.len()
    );
    report
}

fn group(hash: &str, rows: &[usize]) -> HashGroup {
    HashGroup {
        hash: hash.to_string(),
        rows: rows.to_vec(),
    }
}
