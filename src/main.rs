use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use nl2sqlite::config::{init_tracing, Settings};
use nl2sqlite::demo::DEMO_QUERIES;
use nl2sqlite::{Database, EngineBuilder, Nl2SqlEngine, QueryOutcome, ReductionMode};
use std::io::{self, BufRead};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "nl2sqlite")]
#[command(about = "Translate Spanish sentences into SQLite statements")]
struct Args {
    /// SQLite database file (or set NL2SQL_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Token reduction mode: none, stopword, protected
    #[arg(long, global = true)]
    mode: Option<ReductionMode>,

    /// Ontology JSON file (default: built-in)
    #[arg(long, global = true)]
    ontology: Option<PathBuf>,

    /// Log every pipeline step
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile one sentence and print the SQL
    Compile { text: String },
    /// Compile one sentence per line from a file, or stdin
    Batch { file: Option<PathBuf> },
    /// Compile the bundled sample sentences
    Demo,
    /// List tables in the database
    Tables,
    /// Show the columns of a table
    Describe { table: String },
    /// Run a SQL statement
    ExecSql {
        sql: String,
        #[arg(long)]
        allow_write: bool,
    },
    /// Compile a sentence against the database schema and run it
    ExecNl {
        text: String,
        #[arg(long)]
        allow_write: bool,
    },
}

fn read_lines(file: Option<&PathBuf>) -> Result<Vec<String>> {
    let lines: Vec<String> = match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("cannot read {}", path.display()))?
            .lines()
            .map(String::from)
            .collect(),
        None => io::stdin().lock().lines().collect::<io::Result<_>>()?,
    };
    Ok(lines.into_iter().filter(|l| !l.trim().is_empty()).collect())
}

fn print_outcome(outcome: &QueryOutcome) {
    if outcome.columns.is_empty() {
        println!("OK ({} filas afectadas)", outcome.rows_affected);
        return;
    }
    println!("{}", outcome.columns.join(" | "));
    for row in &outcome.rows {
        let cells: Vec<String> = row
            .iter()
            .map(|v| match v {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect();
        println!("{}", cells.join(" | "));
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut settings = Settings::from_env()?;
    if let Some(db) = args.db {
        settings.db_path = db;
    }
    if let Some(mode) = args.mode {
        settings.reduction_mode = mode;
    }
    if let Some(path) = args.ontology {
        settings.ontology_path = Some(path);
    }
    settings.verbose |= args.verbose;
    init_tracing(settings.verbose);

    match args.command {
        Command::Compile { text } => {
            let engine = EngineBuilder::from_settings(&settings)?.build()?;
            println!("{}", engine.compile(&text));
        }
        Command::Batch { file } => {
            let engine = EngineBuilder::from_settings(&settings)?.build()?;
            let queries = read_lines(file.as_ref())?;
            let results = engine.compile_batch(&queries);
            if !engine.verbose() {
                for sql in results {
                    println!("{}", sql);
                }
            }
        }
        Command::Demo => {
            let mut engine: Nl2SqlEngine = EngineBuilder::from_settings(&settings)?.build()?;
            // The demo always shows the NL/SQL transcript.
            engine.set_verbose(true);
            engine.compile_batch(DEMO_QUERIES);
        }
        Command::Tables => {
            let db = Database::open(&settings.db_path)?;
            for table in db.list_tables()? {
                println!("{}", table);
            }
        }
        Command::Describe { table } => {
            let db = Database::open(&settings.db_path)?;
            let schema = db.describe_table(&table)?;
            println!("{}", serde_json::to_string_pretty(&schema)?);
        }
        Command::ExecSql { sql, allow_write } => {
            let db = Database::open(&settings.db_path)?;
            print_outcome(&db.execute_sql(&sql, allow_write)?);
        }
        Command::ExecNl { text, allow_write } => {
            let db = Database::open(&settings.db_path)?;
            let engine = EngineBuilder::from_settings(&settings)?
                .catalog(db.catalog()?)
                .build()?;
            let compilation = engine.compile_detailed(&text);
            println!("SQL: {}", compilation.sql);
            if !compilation.ok {
                anyhow::bail!("{}", compilation.error.unwrap_or_default());
            }
            info!("Executing against {}", settings.db_path.display());
            print_outcome(&db.execute_sql(&compilation.sql, allow_write)?);
        }
    }

    Ok(())
}
