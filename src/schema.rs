//! Schema catalog - the live table/column layout of a SQLite database.
//!
//! Handlers use it to map ontology concepts onto real column names. Matching
//! goes exact name first, then Jaro-Winkler similarity above a threshold.

use serde::{Deserialize, Serialize};
use strsim::jaro_winkler;

use crate::nlp::lexicon;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    pub data_type: String,
    pub not_null: bool,
    pub primary_key: bool,
}

impl ColumnSchema {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            not_null: false,
            primary_key: false,
        }
    }

    pub fn primary(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// INTEGER PRIMARY KEY columns are rowid aliases and fill themselves.
    pub fn is_rowid_alias(&self) -> bool {
        self.primary_key && self.data_type.eq_ignore_ascii_case("INTEGER")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<ColumnSchema>,
}

impl TableSchema {
    pub fn column(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaCatalog {
    tables: Vec<TableSchema>,
    #[serde(skip, default = "default_threshold")]
    similarity_threshold: f64,
}

fn default_threshold() -> f64 {
    SchemaCatalog::DEFAULT_THRESHOLD
}

impl SchemaCatalog {
    pub const DEFAULT_THRESHOLD: f64 = 0.85;

    pub fn new(tables: Vec<TableSchema>) -> Self {
        Self {
            tables,
            similarity_threshold: Self::DEFAULT_THRESHOLD,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.similarity_threshold = threshold;
        self
    }

    pub fn tables(&self) -> &[TableSchema] {
        &self.tables
    }

    pub fn table(&self, name: &str) -> Option<&TableSchema> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn table_names(&self) -> Vec<String> {
        self.tables.iter().map(|t| t.name.clone()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.tables.iter().any(|t| t.column(name).is_some())
    }

    /// Resolve a column name for `table`; `None` when nothing is close enough.
    pub fn resolve_column(&self, table: &str, name: &str) -> Option<String> {
        let table = self.table(table)?;
        if let Some(col) = table.column(name) {
            return Some(col.name.clone());
        }

        let target = lexicon::fold(name);
        table
            .columns
            .iter()
            .map(|c| (c, jaro_winkler(&lexicon::fold(&c.name), &target)))
            .filter(|(_, score)| *score >= self.similarity_threshold)
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(c, _)| c.name.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> SchemaCatalog {
        SchemaCatalog::new(vec![TableSchema {
            name: "clientes".to_string(),
            columns: vec![
                ColumnSchema::new("id", "INTEGER").primary(),
                ColumnSchema::new("apellidos", "TEXT"),
                ColumnSchema::new("telefono", "TEXT"),
            ],
        }])
    }

    #[test]
    fn test_exact_column() {
        assert_eq!(catalog().resolve_column("clientes", "telefono"), Some("telefono".to_string()));
    }

    #[test]
    fn test_fuzzy_column() {
        assert_eq!(catalog().resolve_column("clientes", "apellido"), Some("apellidos".to_string()));
        assert_eq!(catalog().resolve_column("clientes", "teléfono"), Some("telefono".to_string()));
    }

    #[test]
    fn test_unrelated_column_is_not_matched() {
        assert_eq!(catalog().resolve_column("clientes", "precio"), None);
        assert_eq!(catalog().resolve_column("pedidos", "id"), None);
    }

    #[test]
    fn test_rowid_alias() {
        let cat = catalog();
        let table = cat.table("clientes").unwrap();
        assert!(table.columns[0].is_rowid_alias());
        assert!(!table.columns[1].is_rowid_alias());
    }
}
