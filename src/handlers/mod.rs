//! Intent handlers - one per SQL action.
//!
//! The registry scores every handler against the sentence and hands the
//! winner the analysed text to extract an [`Intent`] and render it.

mod common;
pub mod create;
pub mod delete;
pub mod insert;
pub mod select;
pub mod update;

use crate::error::Result;
use crate::intent::{Action, Intent};
use crate::nlp::analyzer::Doc;
use crate::ontology::{Mention, MentionKind, Ontology};
use crate::schema::SchemaCatalog;
use crate::token::Token;
use tracing::debug;

pub use create::CreateHandler;
pub use delete::DeleteHandler;
pub use insert::InsertHandler;
pub use select::SelectHandler;
pub use update::UpdateHandler;

/// Lookups a handler needs while extracting.
#[derive(Debug, Clone, Copy)]
pub struct HandlerContext<'a> {
    pub ontology: &'a Ontology,
    pub catalog: Option<&'a SchemaCatalog>,
}

impl<'a> HandlerContext<'a> {
    pub fn new(ontology: &'a Ontology, catalog: Option<&'a SchemaCatalog>) -> Self {
        Self { ontology, catalog }
    }

    /// Live columns when the table exists, otherwise the ontology's.
    pub fn table_columns(&self, table: &str) -> Vec<String> {
        self.catalog
            .and_then(|c| c.table(table))
            .map(|t| t.column_names())
            .unwrap_or_else(|| self.ontology.table_columns(table))
    }

    /// Columns an INSERT must supply: everything but the rowid key.
    pub fn insertable_columns(&self, table: &str) -> Vec<String> {
        if let Some(schema) = self.catalog.and_then(|c| c.table(table)) {
            return schema
                .columns
                .iter()
                .filter(|c| !c.is_rowid_alias())
                .map(|c| c.name.clone())
                .collect();
        }
        self.ontology
            .table_columns(table)
            .into_iter()
            .filter(|c| c != "id")
            .collect()
    }

    pub fn label_column(&self, table: &str) -> String {
        self.ontology
            .label_column(table)
            .unwrap_or("nombre")
            .to_string()
    }

    pub fn resolve_column(&self, table: &str, concept: &str) -> String {
        self.catalog
            .and_then(|c| c.resolve_column(table, concept))
            .unwrap_or_else(|| concept.to_string())
    }

    pub fn column_type(&self, column: &str) -> Option<String> {
        self.ontology.column_type(column).map(str::to_string)
    }
}

pub trait IntentHandler: Send + Sync {
    fn action(&self) -> Action;

    /// Confidence in `[0, 1]` that this handler owns the sentence.
    fn score(&self, doc: &Doc, mentions: &[Mention]) -> f32 {
        action_score(self.action(), doc, mentions)
    }

    fn extract(
        &self,
        ctx: &HandlerContext<'_>,
        doc: &Doc,
        toks: &[Token],
        mentions: &[Mention],
    ) -> Result<Intent>;

    fn generate_sql(&self, intent: &Intent) -> Result<String>;
}

/// Earlier action verbs score higher; no verb scores zero.
pub fn action_score(action: Action, _doc: &Doc, mentions: &[Mention]) -> f32 {
    mentions
        .iter()
        .find(|m| m.kind == MentionKind::Action && Action::from_concept(&m.concept) == Some(action))
        .map(|m| 1.0 - 0.01 * m.start.min(50) as f32)
        .unwrap_or(0.0)
}

pub struct HandlerRegistry {
    handlers: Vec<Box<dyn IntentHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self {
            handlers: vec![
                Box::new(CreateHandler),
                Box::new(InsertHandler),
                Box::new(UpdateHandler),
                Box::new(DeleteHandler),
                Box::new(SelectHandler),
            ],
        }
    }

    pub fn handlers(&self) -> &[Box<dyn IntentHandler>] {
        &self.handlers
    }

    /// Highest scoring handler; ties go to the first registered. SELECT
    /// keeps a small baseline so it is the fallback.
    pub fn select(&self, doc: &Doc, mentions: &[Mention]) -> &dyn IntentHandler {
        let mut best: Option<(&dyn IntentHandler, f32)> = None;
        for handler in &self.handlers {
            let score = handler.score(doc, mentions);
            debug!("handler {} scored {:.2}", handler.action(), score);
            if best.map(|(_, s)| score > s).unwrap_or(true) {
                best = Some((handler.as_ref(), score));
            }
        }
        match best {
            Some((handler, _)) => handler,
            None => &SelectHandler,
        }
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
