//! Ontology - the concept dictionary behind mention extraction.
//!
//! Domain concepts (tables and columns with their aliases) come from a JSON
//! file; grammar concepts (actions, aggregations, comparators, ...) come from
//! the lexicon. Both are compiled into lemma patterns matched greedily
//! against a [`Doc`].

use crate::error::{Nl2SqlError, Result};
use crate::nlp::analyzer::{Doc, DocToken};
use crate::nlp::lexicon;
use crate::schema::{SchemaCatalog, TableSchema};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

const DEFAULT_ONTOLOGY: &str = include_str!("../data/ontology_es.json");

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OntologyConfig {
    pub language: String,
    #[serde(default)]
    pub tables: Vec<TableConcept>,
    #[serde(default)]
    pub columns: Vec<ColumnConcept>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableConcept {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Column matched by bare proper nouns ("el registro de Luis")
    #[serde(default)]
    pub label_column: Option<String>,
    #[serde(default)]
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnConcept {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(rename = "type", default)]
    pub data_type: Option<String>,
    /// Unit words that name the column after a number ("50 años")
    #[serde(default)]
    pub units: Vec<String>,
}

/// Kinds are declared in match priority order: on equal span length the
/// earlier kind wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MentionKind {
    Comparator,
    Order,
    Direction,
    Aggregation,
    Limit,
    Group,
    Action,
    Table,
    Column,
    Keyword,
}

impl fmt::Display for MentionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MentionKind::Comparator => "COMPARATOR",
            MentionKind::Order => "ORDER",
            MentionKind::Direction => "DIRECTION",
            MentionKind::Aggregation => "AGGREGATION",
            MentionKind::Limit => "LIMIT",
            MentionKind::Group => "GROUP",
            MentionKind::Action => "ACTION",
            MentionKind::Table => "TABLE",
            MentionKind::Column => "COLUMN",
            MentionKind::Keyword => "KEYWORD",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mention {
    pub kind: MentionKind,
    pub concept: String,
    pub text: String,
    /// Token span `[start, end)`
    pub start: usize,
    pub end: usize,
}

impl Mention {
    pub fn contains(&self, idx: usize) -> bool {
        idx >= self.start && idx < self.end
    }
}

#[derive(Debug, Clone)]
struct Pattern {
    words: Vec<String>,
    kind: MentionKind,
    concept: String,
}

#[derive(Debug, Clone)]
pub struct Ontology {
    config: OntologyConfig,
    patterns: Vec<Pattern>,
    /// First pattern word -> pattern indices
    index: HashMap<String, Vec<usize>>,
}

fn phrase_key(phrase: &str) -> Vec<String> {
    phrase
        .split_whitespace()
        .map(|w| lexicon::lemmatize(&lexicon::fold(w)))
        .collect()
}

fn concept_key(name: &str) -> String {
    phrase_key(&name.replace('_', " ")).join(" ")
}

fn word_matches(token: &DocToken, word: &str) -> bool {
    if token.is_quoted || token.like_email || token.is_punct {
        return false;
    }
    token.lemma == word || token.lower == word || lexicon::lemmatize(&token.lower) == word
}

impl Ontology {
    pub fn from_config(config: OntologyConfig) -> Result<Self> {
        for table in &config.tables {
            if table.name.trim().is_empty() {
                return Err(Nl2SqlError::Ontology("tabla sin nombre".to_string()));
            }
        }
        for column in &config.columns {
            if column.name.trim().is_empty() {
                return Err(Nl2SqlError::Ontology("columna sin nombre".to_string()));
            }
        }

        let mut onto = Self {
            config,
            patterns: Vec::new(),
            index: HashMap::new(),
        };
        onto.build_patterns();
        debug!("Ontology compiled with {} patterns", onto.patterns.len());
        Ok(onto)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: OntologyConfig = serde_json::from_str(json)?;
        Self::from_config(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading ontology from {:?}", path);
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Built-in Spanish ontology.
    pub fn load_default() -> Result<Self> {
        Self::from_json(DEFAULT_ONTOLOGY)
    }

    pub fn config(&self) -> &OntologyConfig {
        &self.config
    }

    pub fn language(&self) -> &str {
        &self.config.language
    }

    pub fn tables(&self) -> &[TableConcept] {
        &self.config.tables
    }

    pub fn columns(&self) -> &[ColumnConcept] {
        &self.config.columns
    }

    pub fn table(&self, name: &str) -> Option<&TableConcept> {
        self.config.tables.iter().find(|t| t.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&ColumnConcept> {
        self.config.columns.iter().find(|c| c.name == name)
    }

    pub fn table_columns(&self, table: &str) -> Vec<String> {
        self.table(table).map(|t| t.columns.clone()).unwrap_or_default()
    }

    pub fn label_column(&self, table: &str) -> Option<&str> {
        self.table(table).and_then(|t| t.label_column.as_deref())
    }

    pub fn column_type(&self, column: &str) -> Option<&str> {
        self.column(column).and_then(|c| c.data_type.as_deref())
    }

    /// First table declaring `column`.
    pub fn owner_of(&self, column: &str) -> Option<&str> {
        self.config
            .tables
            .iter()
            .find(|t| t.columns.iter().any(|c| c == column))
            .map(|t| t.name.as_str())
    }

    fn build_patterns(&mut self) {
        let mut patterns = Vec::new();
        let mut push = |phrase: &str, kind: MentionKind, concept: &str| {
            let words = phrase_key(phrase);
            if !words.is_empty() {
                patterns.push(Pattern {
                    words,
                    kind,
                    concept: concept.to_string(),
                });
            }
        };

        for (concept, phrases) in lexicon::ACTION_PHRASES {
            phrases.iter().for_each(|p| push(*p, MentionKind::Action, *concept));
        }
        for (concept, phrases) in lexicon::AGGREGATION_PHRASES {
            phrases.iter().for_each(|p| push(*p, MentionKind::Aggregation, *concept));
        }
        for (concept, phrases) in lexicon::COMPARATOR_PHRASES {
            phrases.iter().for_each(|p| push(*p, MentionKind::Comparator, *concept));
        }
        for (concept, phrases) in lexicon::DIRECTION_PHRASES {
            phrases.iter().for_each(|p| push(*p, MentionKind::Direction, *concept));
        }
        for (concept, phrases) in lexicon::KEYWORD_PHRASES {
            phrases.iter().for_each(|p| push(*p, MentionKind::Keyword, *concept));
        }
        lexicon::LIMIT_PHRASES.iter().for_each(|p| push(*p, MentionKind::Limit, "LIMIT"));
        lexicon::GROUP_PHRASES.iter().for_each(|p| push(*p, MentionKind::Group, "GROUP BY"));
        lexicon::ORDER_PHRASES.iter().for_each(|p| push(*p, MentionKind::Order, "ORDER BY"));

        for table in &self.config.tables {
            push(table.name.as_str(), MentionKind::Table, table.name.as_str());
            table
                .aliases
                .iter()
                .for_each(|a| push(a.as_str(), MentionKind::Table, table.name.as_str()));
        }
        for column in &self.config.columns {
            push(column.name.replace('_', " ").as_str(), MentionKind::Column, column.name.as_str());
            column
                .aliases
                .iter()
                .chain(column.units.iter())
                .for_each(|a| push(a.as_str(), MentionKind::Column, column.name.as_str()));
        }

        let mut index: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, pattern) in patterns.iter().enumerate() {
            index.entry(pattern.words[0].clone()).or_default().push(i);
        }

        self.patterns = patterns;
        self.index = index;
    }

    fn candidates(&self, token: &DocToken) -> Vec<usize> {
        let mut keys = vec![token.lemma.clone(), token.lower.clone()];
        keys.push(lexicon::lemmatize(&token.lower));
        keys.sort();
        keys.dedup();

        let mut found: Vec<usize> = keys
            .iter()
            .filter_map(|k| self.index.get(k))
            .flatten()
            .copied()
            .collect();
        found.sort_unstable();
        found.dedup();
        found
    }

    fn matches_at(&self, doc: &Doc, start: usize, pattern: &Pattern) -> bool {
        if start + pattern.words.len() > doc.len() {
            return false;
        }
        pattern
            .words
            .iter()
            .zip(&doc.tokens[start..])
            .all(|(w, t)| word_matches(t, w))
    }

    /// Greedy left-to-right longest match of every concept pattern.
    pub fn mentions(&self, doc: &Doc) -> Vec<Mention> {
        let mut mentions = Vec::new();
        let mut i = 0;

        while i < doc.len() {
            let best = self
                .candidates(&doc.tokens[i])
                .into_iter()
                .map(|p| &self.patterns[p])
                .filter(|p| self.matches_at(doc, i, p))
                .min_by(|a, b| b.words.len().cmp(&a.words.len()).then(a.kind.cmp(&b.kind)));

            match best {
                Some(pattern) => {
                    let end = i + pattern.words.len();
                    let text = doc.tokens[i..end]
                        .iter()
                        .map(|t| t.text.as_str())
                        .collect::<Vec<_>>()
                        .join(" ");
                    mentions.push(Mention {
                        kind: pattern.kind,
                        concept: pattern.concept.clone(),
                        text,
                        start: i,
                        end,
                    });
                    i = end;
                }
                None => i += 1,
            }
        }

        mentions
    }

    /// Merge a live schema into the ontology. Concepts whose alias matches a
    /// real column or table are renamed to the real name; unknown tables and
    /// columns become new concepts.
    pub fn with_catalog(self, catalog: &SchemaCatalog) -> Result<Self> {
        let mut config = self.config;
        let real_columns: HashSet<String> = catalog
            .tables()
            .iter()
            .flat_map(|t| t.columns.iter().map(|c| c.name.clone()))
            .collect();

        for table in catalog.tables() {
            for column in &table.columns {
                merge_column(&mut config, &column.name, &column.data_type, &real_columns);
            }
            merge_table(&mut config, table);
        }

        info!(
            "Ontology merged with catalog ({} tables)",
            catalog.tables().len()
        );
        Self::from_config(config)
    }
}

fn concept_matches(name: &str, aliases: &[String], key: &str) -> bool {
    concept_key(name) == key || aliases.iter().any(|a| concept_key(a) == key)
}

fn merge_column(config: &mut OntologyConfig, name: &str, data_type: &str, real: &HashSet<String>) {
    if let Some(concept) = config.columns.iter_mut().find(|c| c.name == name) {
        if concept.data_type.is_none() && !data_type.is_empty() {
            concept.data_type = Some(data_type.to_string());
        }
        return;
    }

    let key = concept_key(name);
    let renamable = config.columns.iter_mut().find(|c| {
        !real.contains(&c.name)
            && concept_matches(&c.name, &c.aliases, &key)
    });

    if let Some(concept) = renamable {
        let old = std::mem::replace(&mut concept.name, name.to_string());
        concept.aliases.push(old.clone());
        for table in config.tables.iter_mut() {
            for col in table.columns.iter_mut() {
                if *col == old {
                    *col = name.to_string();
                }
            }
            if table.label_column.as_deref() == Some(old.as_str()) {
                table.label_column = Some(name.to_string());
            }
        }
        return;
    }

    let aliases = if name.contains('_') {
        vec![name.replace('_', " ")]
    } else {
        Vec::new()
    };
    config.columns.push(ColumnConcept {
        name: name.to_string(),
        aliases,
        data_type: (!data_type.is_empty()).then(|| data_type.to_string()),
        units: Vec::new(),
    });
}

fn guess_label(table: &TableSchema) -> Option<String> {
    if let Some(col) = table.column("nombre") {
        return Some(col.name.clone());
    }
    table
        .columns
        .iter()
        .find(|c| !c.primary_key && c.data_type.eq_ignore_ascii_case("TEXT"))
        .map(|c| c.name.clone())
}

fn merge_table(config: &mut OntologyConfig, table: &TableSchema) {
    let key = concept_key(&table.name);
    let columns = table.column_names();

    let existing = config
        .tables
        .iter_mut()
        .find(|t| t.name == table.name || concept_matches(&t.name, &t.aliases, &key));

    match existing {
        Some(concept) => {
            if concept.name != table.name {
                let old = std::mem::replace(&mut concept.name, table.name.clone());
                concept.aliases.push(old);
            }
            let label_ok = concept
                .label_column
                .as_ref()
                .map(|l| columns.contains(l))
                .unwrap_or(false);
            if !label_ok {
                concept.label_column = guess_label(table);
            }
            concept.columns = columns;
        }
        None => config.tables.push(TableConcept {
            name: table.name.clone(),
            aliases: Vec::new(),
            label_column: guess_label(table),
            columns,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nlp::analyzer::Analyzer;
    use crate::schema::ColumnSchema;

    fn mentions(text: &str) -> Vec<Mention> {
        let onto = Ontology::load_default().unwrap();
        let doc = Analyzer::new().analyze(text);
        onto.mentions(&doc)
    }

    #[test]
    fn test_default_ontology_loads() {
        let onto = Ontology::load_default().unwrap();
        assert_eq!(onto.language(), "es");
        assert_eq!(onto.label_column("usuarios"), Some("nombre"));
        assert_eq!(onto.owner_of("precio"), Some("productos"));
        assert_eq!(onto.column_type("edad"), Some("INTEGER"));
    }

    #[test]
    fn test_longest_comparator_wins() {
        let found = mentions("Mostrar todos los usuarios cuya edad sea mayor o igual a 25");
        let comparator = found.iter().find(|m| m.kind == MentionKind::Comparator).unwrap();
        assert_eq!(comparator.concept, ">=");
        assert_eq!(comparator.text, "mayor o igual a");
        assert!(found.iter().any(|m| m.kind == MentionKind::Table && m.concept == "usuarios"));
        assert!(found.iter().any(|m| m.kind == MentionKind::Column && m.concept == "edad"));
    }

    #[test]
    fn test_aliases_and_units() {
        let found = mentions("Dame los nombres de los usuarios que tengan más de 50 años");
        let concepts: Vec<(MentionKind, &str)> =
            found.iter().map(|m| (m.kind, m.concept.as_str())).collect();
        assert_eq!(
            concepts,
            vec![
                (MentionKind::Action, "SELECT"),
                (MentionKind::Column, "nombre"),
                (MentionKind::Table, "usuarios"),
                (MentionKind::Comparator, ">"),
                (MentionKind::Column, "edad"),
            ]
        );
    }

    #[test]
    fn test_direction_beats_comparator() {
        let found = mentions("Listar productos ordenados por precio de mayor a menor");
        assert!(found.iter().any(|m| m.kind == MentionKind::Order));
        assert!(found.iter().any(|m| m.kind == MentionKind::Direction && m.concept == "DESC"));
        assert!(!found.iter().any(|m| m.kind == MentionKind::Comparator));
    }

    #[test]
    fn test_quoted_text_is_not_a_mention() {
        let found = mentions("Mostrar usuarios con nombre \"tabla\"");
        assert!(!found.iter().any(|m| m.kind == MentionKind::Keyword));
    }

    #[test]
    fn test_catalog_renames_alias_concepts() {
        let catalog = SchemaCatalog::new(vec![TableSchema {
            name: "usuarios".to_string(),
            columns: vec![
                ColumnSchema::new("id", "INTEGER").primary(),
                ColumnSchema::new("nombre", "TEXT"),
                ColumnSchema::new("correo", "TEXT"),
                ColumnSchema::new("fecha_alta", "DATE"),
            ],
        }]);
        let onto = Ontology::load_default().unwrap().with_catalog(&catalog).unwrap();

        assert!(onto.column("correo").is_some());
        assert!(onto.column("email").is_none());
        assert_eq!(
            onto.table_columns("usuarios"),
            vec!["id", "nombre", "correo", "fecha_alta"]
        );

        let doc = Analyzer::new().analyze("Mostrar el email y la fecha alta de los usuarios");
        let found = onto.mentions(&doc);
        assert!(found.iter().any(|m| m.kind == MentionKind::Column && m.concept == "correo"));
        assert!(found.iter().any(|m| m.kind == MentionKind::Column && m.concept == "fecha_alta"));
    }
}
