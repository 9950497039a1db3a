//! Runtime settings read from the environment (and `.env`).

use crate::error::{Nl2SqlError, Result};
use crate::token::ReductionMode;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

pub const ENV_LANGUAGE: &str = "NL2SQL_LANGUAGE";
pub const ENV_REDUCTION_MODE: &str = "NL2SQL_REDUCTION_MODE";
pub const ENV_VERBOSE: &str = "NL2SQL_VERBOSE";
pub const ENV_DB_PATH: &str = "NL2SQL_DB_PATH";
pub const ENV_ONTOLOGY_PATH: &str = "NL2SQL_ONTOLOGY_PATH";
pub const ENV_SERVER_ADDR: &str = "NL2SQL_SERVER_ADDR";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub language: String,
    pub reduction_mode: ReductionMode,
    pub verbose: bool,
    pub db_path: PathBuf,
    pub ontology_path: Option<PathBuf>,
    pub server_addr: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            language: "es".to_string(),
            reduction_mode: ReductionMode::Protected,
            verbose: false,
            db_path: PathBuf::from("nl2sqlite.db"),
            ontology_path: None,
            server_addr: "0.0.0.0:8000".to_string(),
        }
    }
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "si" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(Nl2SqlError::Config(format!("{}: valor booleano inválido '{}'", key, other))),
    }
}

impl Settings {
    /// Defaults overridden by `NL2SQL_*` variables. Loads `.env` first.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut settings = Self::default();

        if let Some(language) = lookup(ENV_LANGUAGE) {
            settings.language = language.trim().to_lowercase();
        }
        if let Some(mode) = lookup(ENV_REDUCTION_MODE) {
            settings.reduction_mode = mode.parse()?;
        }
        if let Some(verbose) = lookup(ENV_VERBOSE) {
            settings.verbose = parse_bool(ENV_VERBOSE, &verbose)?;
        }
        if let Some(path) = lookup(ENV_DB_PATH) {
            settings.db_path = PathBuf::from(path);
        }
        if let Some(path) = lookup(ENV_ONTOLOGY_PATH).filter(|p| !p.trim().is_empty()) {
            settings.ontology_path = Some(PathBuf::from(path));
        }
        if let Some(addr) = lookup(ENV_SERVER_ADDR) {
            settings.server_addr = addr;
        }

        Ok(settings)
    }
}

/// Install the stderr subscriber. `RUST_LOG` wins over the verbose default.
pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // A second call (tests, embedded use) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
