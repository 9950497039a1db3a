//! Compilation engine - runs the pipeline for one sentence at a time.
//!
//! ```text
//! preprocess -> mentions -> tokens -> handler -> intent -> SQL
//! ```
//!
//! `compile` never fails: errors and panics become a SQL comment starting
//! with [`ERROR_PREFIX`].

use crate::config::Settings;
use crate::error::{Nl2SqlError, Result};
use crate::handlers::{HandlerContext, HandlerRegistry};
use crate::intent::{Action, Intent};
use crate::nlp::Nlp;
use crate::ontology::{Mention, Ontology};
use crate::schema::SchemaCatalog;
use crate::sql;
use crate::token::ReductionMode;
use serde::Serialize;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, info, warn};

pub const ERROR_PREFIX: &str = "-- Error en compilación:";

pub const SUPPORTED_LANGUAGES: &[&str] = &["es"];

/// Full trace of one compilation.
#[derive(Debug, Clone, Serialize)]
pub struct Compilation {
    pub nl: String,
    pub sql: String,
    pub ok: bool,
    pub action: Option<Action>,
    pub intent: Option<Intent>,
    pub steps: Vec<String>,
    pub error: Option<String>,
}

pub struct Nl2SqlEngine {
    language: String,
    verbose: bool,
    reduction_mode: ReductionMode,
    nlp: Nlp,
    handlers: HandlerRegistry,
    catalog: Option<SchemaCatalog>,
}

pub struct EngineBuilder {
    language: String,
    verbose: bool,
    reduction_mode: ReductionMode,
    ontology: Option<Ontology>,
    catalog: Option<SchemaCatalog>,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self {
            language: "es".to_string(),
            verbose: false,
            reduction_mode: ReductionMode::Protected,
            ontology: None,
            catalog: None,
        }
    }

    /// Builder preloaded from [`Settings`]; reads the ontology file if one is set.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let mut builder = Self::new()
            .language(&settings.language)
            .verbose(settings.verbose)
            .reduction_mode(settings.reduction_mode);
        if let Some(path) = &settings.ontology_path {
            builder = builder.ontology(Ontology::load(path)?);
        }
        Ok(builder)
    }

    pub fn language(mut self, language: &str) -> Self {
        self.language = language.trim().to_lowercase();
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn reduction_mode(mut self, mode: ReductionMode) -> Self {
        self.reduction_mode = mode;
        self
    }

    pub fn ontology(mut self, ontology: Ontology) -> Self {
        self.ontology = Some(ontology);
        self
    }

    pub fn catalog(mut self, catalog: SchemaCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn build(self) -> Result<Nl2SqlEngine> {
        if !SUPPORTED_LANGUAGES.contains(&self.language.as_str()) {
            return Err(Nl2SqlError::UnsupportedLanguage(self.language));
        }

        let mut ontology = match self.ontology {
            Some(ontology) => ontology,
            None => Ontology::load_default()?,
        };
        if ontology.language() != self.language {
            return Err(Nl2SqlError::Ontology(format!(
                "la ontología es de idioma '{}', se pidió '{}'",
                ontology.language(),
                self.language
            )));
        }
        if let Some(catalog) = &self.catalog {
            ontology = ontology.with_catalog(catalog)?;
        }

        info!(
            "NL2SQL engine ready (language={}, mode={}, tables={})",
            self.language,
            self.reduction_mode,
            ontology.tables().len()
        );

        Ok(Nl2SqlEngine {
            language: self.language,
            verbose: self.verbose,
            reduction_mode: self.reduction_mode,
            nlp: Nlp::new(ontology),
            handlers: HandlerRegistry::new(),
            catalog: self.catalog,
        })
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "pánico sin mensaje".to_string()
    }
}

fn format_mentions(mentions: &[Mention]) -> String {
    let items: Vec<String> = mentions
        .iter()
        .map(|m| format!("({}, {}, {})", m.kind, m.concept, m.text))
        .collect();
    format!("[{}]", items.join(", "))
}

impl Nl2SqlEngine {
    /// Engine with the built-in ontology. `reduction_mode` is one of
    /// `none`, `stopword`, `protected`.
    pub fn new(language: &str, verbose: bool, reduction_mode: &str) -> Result<Self> {
        EngineBuilder::new()
            .language(language)
            .verbose(verbose)
            .reduction_mode(reduction_mode.parse()?)
            .build()
    }

    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    pub fn reduction_mode(&self) -> ReductionMode {
        self.reduction_mode
    }

    pub fn set_reduction_mode(&mut self, mode: ReductionMode) {
        self.reduction_mode = mode;
    }

    pub fn ontology(&self) -> &Ontology {
        &self.nlp.ontology
    }

    pub fn catalog(&self) -> Option<&SchemaCatalog> {
        self.catalog.as_ref()
    }

    fn log(&self, steps: &mut Vec<String>, line: String) {
        if self.verbose {
            info!("{}", line);
        } else {
            debug!("{}", line);
        }
        steps.push(line);
    }

    fn run(&self, text: &str, steps: &mut Vec<String>) -> Result<(Intent, String)> {
        let cleaned = self.nlp.preprocess(text)?;
        self.log(steps, format!("[1] Texto preprocesado: {}", cleaned));

        let doc = self.nlp.doc(&cleaned);
        let mentions = self.nlp.mentions(&doc);
        self.log(steps, format!("[2] Onto mentions: {}", format_mentions(&mentions)));

        let toks = self.nlp.to_tokens(&doc, &mentions, self.reduction_mode);
        let lemmas: Vec<&str> = toks.iter().map(|t| t.lemma.as_str()).collect();
        self.log(steps, format!("[3] Tokens reducidos: {:?}", lemmas));

        let handler = self.handlers.select(&doc, &mentions);
        self.log(steps, format!("[4] Acción detectada: {}", handler.action()));

        let ctx = HandlerContext::new(&self.nlp.ontology, self.catalog.as_ref());
        let intent = handler.extract(&ctx, &doc, &toks, &mentions)?;
        self.log(steps, format!("[5] Intención → {}", intent.summary()));

        let sql = handler.generate_sql(&intent)?;
        sql::validate(&sql)?;
        Ok((intent, sql))
    }

    /// Compile with the full step trace.
    pub fn compile_detailed(&self, text: &str) -> Compilation {
        let mut steps = Vec::new();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.run(text, &mut steps)));

        let result = match outcome {
            Ok(result) => result,
            Err(payload) => Err(Nl2SqlError::Internal(panic_message(payload))),
        };

        match result {
            Ok((intent, sql)) => Compilation {
                nl: text.to_string(),
                sql,
                ok: true,
                action: Some(intent.action),
                intent: Some(intent),
                steps,
                error: None,
            },
            Err(err) => {
                warn!("Compilation failed for {:?}: {}", text, err);
                Compilation {
                    nl: text.to_string(),
                    sql: format!("{} {}", ERROR_PREFIX, err),
                    ok: false,
                    action: None,
                    intent: None,
                    steps,
                    error: Some(err.to_string()),
                }
            }
        }
    }

    /// SQL for `text`, or `-- Error en compilación: <mensaje>`.
    pub fn compile(&self, text: &str) -> String {
        self.compile_detailed(text).sql
    }

    /// One result per query, in order. Prints a transcript when verbose.
    pub fn compile_batch<S: AsRef<str>>(&self, queries: &[S]) -> Vec<String> {
        queries
            .iter()
            .map(|q| {
                let q = q.as_ref();
                let sql = self.compile(q);
                if self.verbose {
                    println!("\nNL: {}", q);
                    println!("SQL: {}", sql);
                    println!("{}", "-".repeat(80));
                }
                sql
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> Nl2SqlEngine {
        Nl2SqlEngine::new("es", false, "protected").unwrap()
    }

    #[test]
    fn test_unsupported_language() {
        assert!(matches!(
            Nl2SqlEngine::new("en", false, "protected"),
            Err(Nl2SqlError::UnsupportedLanguage(_))
        ));
        assert!(Nl2SqlEngine::new("es", false, "agresivo").is_err());
    }

    #[test]
    fn test_empty_input_is_error_comment() {
        let sql = engine().compile("   ");
        assert!(sql.starts_with(ERROR_PREFIX));
        assert!(sql.contains("texto vacío"));
    }

    #[test]
    fn test_detailed_steps() {
        let out = engine().compile_detailed("Mostrar todos los usuarios cuya edad sea mayor o igual a 25");
        assert!(out.ok);
        assert_eq!(out.action, Some(Action::Select));
        assert_eq!(out.steps.len(), 5);
        assert!(out.steps[0].starts_with("[1] Texto preprocesado"));
        assert!(out.steps[4].contains("conds=[\"edad >= 25\"]"));
    }

    #[test]
    fn test_failed_compilation_keeps_partial_steps() {
        let out = engine().compile_detailed("Borrar la tabla usuarios");
        assert!(!out.ok);
        assert!(out.sql.starts_with(ERROR_PREFIX));
        assert_eq!(out.steps.len(), 4);
    }

    #[test]
    fn test_catalog_columns_are_used() {
        let catalog = SchemaCatalog::new(vec![crate::schema::TableSchema {
            name: "usuarios".to_string(),
            columns: vec![
                crate::schema::ColumnSchema::new("id", "INTEGER").primary(),
                crate::schema::ColumnSchema::new("nombre", "TEXT"),
                crate::schema::ColumnSchema::new("correo", "TEXT"),
            ],
        }]);
        let engine = Nl2SqlEngine::builder().catalog(catalog).build().unwrap();
        assert_eq!(
            engine.compile("Mostrar el email de los usuarios"),
            "SELECT correo FROM usuarios;"
        );
    }
}
