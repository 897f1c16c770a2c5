//! Fixture records: ordered, case-insensitive name → string mappings.
//!
//! Fixtures normally arrive from a scenario's data table. [`Fixture`] can be
//! built from a header plus rows, from any delimited reader, or from a
//! Gherkin-style pipe table.

use std::io::Read;

use anyhow::{Context, Result, ensure};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixtureRecord {
    fields: Vec<(String, String)>,
}

impl FixtureRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, replacing an existing one with the same (case-insensitive) name.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self
            .fields
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(&name))
        {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Value for `name`, or `None` when the field is not specified.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FixtureRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = FixtureRecord::new();
        for (name, value) in iter {
            record.insert(name, value);
        }
        record
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fixture {
    records: Vec<FixtureRecord>,
}

impl Fixture {
    pub fn new(records: Vec<FixtureRecord>) -> Self {
        Self { records }
    }

    /// Build one record per row, pairing cells with `headers` by position.
    pub fn from_rows<H, R, C>(headers: &[H], rows: R) -> Result<Self>
    where
        H: AsRef<str>,
        R: IntoIterator<Item = Vec<C>>,
        C: Into<String>,
    {
        let mut records = Vec::new();
        for (idx, row) in rows.into_iter().enumerate() {
            ensure!(
                row.len() == headers.len(),
                "Fixture row {} has {} cell(s) but the header has {}",
                idx + 1,
                row.len(),
                headers.len()
            );
            records.push(
                headers
                    .iter()
                    .map(|h| h.as_ref().to_string())
                    .zip(row.into_iter().map(Into::<String>::into))
                    .collect(),
            );
        }
        Ok(Self { records })
    }

    /// Read a delimited table whose first line is the header.
    ///
    /// Header names are trimmed; cell values are kept exactly as written.
    pub fn from_reader<R: Read>(reader: R, delimiter: u8) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .trim(csv::Trim::Headers)
            .from_reader(reader);
        let headers: Vec<String> = csv_reader
            .headers()
            .context("Reading fixture header")?
            .iter()
            .map(str::to_string)
            .collect();
        let mut rows = Vec::new();
        for (idx, record) in csv_reader.records().enumerate() {
            let record = record.with_context(|| format!("Reading fixture row {}", idx + 2))?;
            rows.push(record.iter().map(str::to_string).collect::<Vec<_>>());
        }
        Self::from_rows(&headers, rows)
    }

    /// Parse a pipe table such as
    ///
    /// ```text
    /// | id | name  |
    /// | 1  | Alice |
    /// ```
    ///
    /// Blank lines and lines starting with `#` are skipped. Cells are trimmed.
    pub fn parse_table(input: &str) -> Result<Self> {
        let mut lines = input
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .enumerate();
        let Some((_, header_line)) = lines.next() else {
            return Ok(Self::default());
        };
        let headers = split_pipe_row(header_line)
            .with_context(|| format!("Parsing fixture header '{header_line}'"))?;
        let mut rows = Vec::new();
        for (idx, line) in lines {
            rows.push(
                split_pipe_row(line).with_context(|| format!("Parsing fixture row {}", idx + 1))?,
            );
        }
        Self::from_rows(&headers, rows)
    }

    pub fn records(&self) -> &[FixtureRecord] {
        &self.records
    }

    pub fn first(&self) -> Option<&FixtureRecord> {
        self.records.first()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl From<Vec<FixtureRecord>> for Fixture {
    fn from(records: Vec<FixtureRecord>) -> Self {
        Self::new(records)
    }
}

fn split_pipe_row(line: &str) -> Result<Vec<String>> {
    ensure!(
        line.starts_with('|') && line.ends_with('|') && line.len() >= 2,
        "Table rows must start and end with '|'"
    );
    let inner = &line[1..line.len() - 1];
    Ok(inner.split('|').map(|cell| cell.trim().to_string()).collect())
}
