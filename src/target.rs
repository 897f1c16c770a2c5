//! Database target configuration.
//!
//! A [`DatabaseTarget`] names a database and carries everything the engine
//! needs from it: how to reach it, which schema to select after connecting,
//! how to spell column and table names in generated SQL, and which default
//! values fill columns a fixture leaves out. Targets are grouped in a
//! [`TargetCatalog`] loaded from YAML.

use std::{
    collections::{BTreeMap, HashSet},
    fs,
    path::Path,
};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

pub const SCHEMA_PLACEHOLDER: &str = "{SCHEMA}";
pub const TABLE_PLACEHOLDER: &str = "{TABLE}";

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum QuoteStyle {
    #[default]
    None,
    Double,
    Bracket,
    Backtick,
}

impl QuoteStyle {
    /// Quote an identifier, doubling any embedded closing quote.
    pub fn quote(&self, name: &str) -> String {
        match self {
            QuoteStyle::None => name.to_string(),
            QuoteStyle::Double => format!("\"{}\"", name.replace('"', "\"\"")),
            QuoteStyle::Bracket => format!("[{}]", name.replace(']', "]]")),
            QuoteStyle::Backtick => format!("`{}`", name.replace('`', "``")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NameCase {
    #[default]
    Preserve,
    Upper,
    Lower,
}

impl NameCase {
    pub fn apply(&self, name: &str) -> String {
        match self {
            NameCase::Preserve => name.to_string(),
            NameCase::Upper => name.to_uppercase(),
            NameCase::Lower => name.to_lowercase(),
        }
    }
}

/// Default values for columns a fixture does not specify, keyed case-insensitively.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct ColumnDefaults {
    values: BTreeMap<String, String>,
}

impl ColumnDefaults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(column.into(), value.into());
        self
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(column))
            .map(|(_, value)| value.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DatabaseTarget {
    pub name: String,
    /// Driver-specific location; for SQLite a file path or `:memory:`.
    pub url: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub schema: String,
    /// Statement selecting the schema, with `{SCHEMA}` substituted.
    #[serde(default)]
    pub set_schema_template: Option<String>,
    /// Qualified table spelling with `{SCHEMA}` and `{TABLE}` substituted.
    #[serde(default)]
    pub table_template: Option<String>,
    #[serde(default)]
    pub column_quote: QuoteStyle,
    #[serde(default)]
    pub column_case: NameCase,
    #[serde(default)]
    pub defaults: ColumnDefaults,
}

impl DatabaseTarget {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn formatted_column_name(&self, column: &str) -> String {
        self.column_quote.quote(&self.column_case.apply(column))
    }

    pub fn qualified_table_name(&self, table: &str) -> String {
        match &self.table_template {
            Some(template) => template
                .replace(SCHEMA_PLACEHOLDER, &self.schema)
                .replace(TABLE_PLACEHOLDER, table),
            None => table.to_string(),
        }
    }

    pub fn set_schema_statement(&self) -> Option<String> {
        self.set_schema_template
            .as_ref()
            .map(|template| template.replace(SCHEMA_PLACEHOLDER, &self.schema))
    }

    pub fn wants_schema(&self) -> bool {
        !self.schema.trim().is_empty()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TargetCatalog {
    #[serde(default)]
    pub targets: Vec<DatabaseTarget>,
}

impl TargetCatalog {
    pub fn new(targets: Vec<DatabaseTarget>) -> Result<Self> {
        let catalog = Self { targets };
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Reading target catalog {path:?}"))?;
        Self::from_yaml_str(&raw).with_context(|| format!("Parsing target catalog {path:?}"))
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        let catalog: TargetCatalog = serde_yaml::from_str(raw)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn get(&self, name: &str) -> Option<&DatabaseTarget> {
        self.targets.iter().find(|target| target.name == name)
    }

    pub fn insert(&mut self, target: DatabaseTarget) {
        match self.targets.iter_mut().find(|t| t.name == target.name) {
            Some(existing) => *existing = target,
            None => self.targets.push(target),
        }
    }

    fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for target in &self.targets {
            if target.name.trim().is_empty() {
                bail!("Database target names cannot be empty");
            }
            if !seen.insert(target.name.as_str()) {
                bail!("Database target '{}' is defined more than once", target.name);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formatted_column_name_applies_case_then_quote() {
        let mut target = DatabaseTarget::new("dwh", ":memory:");
        target.column_case = NameCase::Upper;
        target.column_quote = QuoteStyle::Double;
        assert_eq!(target.formatted_column_name("order id"), "\"ORDER ID\"");

        target.column_quote = QuoteStyle::Bracket;
        target.column_case = NameCase::Preserve;
        assert_eq!(target.formatted_column_name("a]b"), "[a]]b]");
    }

    #[test]
    fn templates_substitute_schema_and_table() {
        let mut target = DatabaseTarget::new("dwh", ":memory:");
        target.schema = "stage".to_string();
        target.table_template = Some("{SCHEMA}.{TABLE}".to_string());
        target.set_schema_template = Some("USE {SCHEMA}".to_string());
        assert_eq!(target.qualified_table_name("orders"), "stage.orders");
        assert_eq!(target.set_schema_statement().as_deref(), Some("USE stage"));
    }

    #[test]
    fn catalog_loads_from_yaml() {
        let yaml = r#"
targets:
  - name: dwh
    url: /tmp/dwh.db
    schema: main
    column_quote: double
    defaults:
      LOAD_DTS: "2024-01-01 00:00:00"
  - name: source
    url: ":memory:"
"#;
        let catalog = TargetCatalog::from_yaml_str(yaml).unwrap();
        let dwh = catalog.get("dwh").unwrap();
        assert_eq!(dwh.column_quote, QuoteStyle::Double);
        assert_eq!(dwh.defaults.get("load_dts"), Some("2024-01-01 00:00:00"));
        assert_eq!(catalog.get("source").unwrap().schema, "");
        assert!(catalog.get("missing").is_none());
    }

    #[test]
    fn catalog_rejects_duplicate_names() {
        let yaml = "targets:\n  - name: a\n    url: x\n  - name: a\n    url: y\n";
        let err = TargetCatalog::from_yaml_str(yaml).unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }
}
