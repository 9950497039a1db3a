//! Spanish natural language to SQLite compiler.

pub mod api;
pub mod config;
pub mod db;
pub mod demo;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod intent;
pub mod nlp;
pub mod ontology;
pub mod schema;
pub mod sql;
pub mod token;

pub use config::Settings;
pub use db::{Database, QueryOutcome};
pub use engine::{Compilation, EngineBuilder, Nl2SqlEngine, ERROR_PREFIX};
pub use error::{Nl2SqlError, Result};
pub use intent::{Action, Intent};
pub use ontology::Ontology;
pub use schema::SchemaCatalog;
pub use token::ReductionMode;
