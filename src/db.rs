//! SQLite access: schema discovery and guarded statement execution.

use crate::error::{Nl2SqlError, Result};
use crate::schema::{ColumnSchema, SchemaCatalog, TableSchema};
use crate::sql::{self, StatementKind};
use rusqlite::types::ValueRef;
use rusqlite::Connection;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

#[derive(Debug, Clone, Serialize)]
pub struct QueryOutcome {
    pub sql: String,
    pub kind: StatementKind,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<serde_json::Value>>,
    /// Rows changed for writes, rows returned for queries
    pub rows_affected: usize,
}

pub struct Database {
    path: Option<PathBuf>,
    conn: Mutex<Connection>,
}

fn to_json(value: ValueRef<'_>) -> serde_json::Value {
    match value {
        ValueRef::Null => serde_json::Value::Null,
        ValueRef::Integer(i) => serde_json::Value::from(i),
        ValueRef::Real(f) => serde_json::Value::from(f),
        ValueRef::Text(t) => serde_json::Value::String(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => serde_json::Value::String(format!("<blob {} bytes>", b.len())),
    }
}

impl Database {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(&path)?;
        info!("Opened SQLite database {}", path.display());
        Ok(Self {
            path: Some(path),
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            path: None,
            conn: Mutex::new(Connection::open_in_memory()?),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Nl2SqlError::Internal("conexión SQLite envenenada".to_string()))
    }

    pub fn list_tables(&self) -> Result<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(names)
    }

    pub fn describe_table(&self, name: &str) -> Result<TableSchema> {
        let conn = self.conn()?;
        let exists: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [name],
            |row| row.get(0),
        )?;
        if exists == 0 {
            return Err(Nl2SqlError::Database(format!("no existe la tabla '{}'", name)));
        }

        let pragma = format!("PRAGMA table_info(\"{}\")", name.replace('"', "\"\""));
        let mut stmt = conn.prepare(&pragma)?;
        let columns = stmt
            .query_map([], |row| {
                Ok(ColumnSchema {
                    name: row.get(1)?,
                    data_type: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                    not_null: row.get::<_, i64>(3)? != 0,
                    primary_key: row.get::<_, i64>(5)? > 0,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(TableSchema {
            name: name.to_string(),
            columns,
        })
    }

    /// Snapshot of every user table.
    pub fn catalog(&self) -> Result<SchemaCatalog> {
        let tables = self
            .list_tables()?
            .iter()
            .map(|t| self.describe_table(t))
            .collect::<Result<Vec<_>>>()?;
        debug!("Catalog loaded with {} tables", tables.len());
        Ok(SchemaCatalog::new(tables))
    }

    /// Run exactly one statement. Anything but a query needs `allow_write`.
    pub fn execute_sql(&self, sql: &str, allow_write: bool) -> Result<QueryOutcome> {
        let kind = sql::statement_kind(sql)?;
        if kind != StatementKind::Query && !allow_write {
            return Err(Nl2SqlError::WriteNotAllowed);
        }

        let conn = self.conn()?;
        if kind != StatementKind::Query {
            let affected = conn.execute(sql, [])?;
            info!("Executed {:?} statement, {} rows affected", kind, affected);
            return Ok(QueryOutcome {
                sql: sql.to_string(),
                kind,
                columns: Vec::new(),
                rows: Vec::new(),
                rows_affected: affected,
            });
        }

        let mut stmt = conn.prepare(sql)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let mut rows = stmt.query([])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(columns.len());
            for i in 0..columns.len() {
                values.push(to_json(row.get_ref(i)?));
            }
            out.push(values);
        }

        Ok(QueryOutcome {
            sql: sql.to_string(),
            kind,
            columns,
            rows_affected: out.len(),
            rows: out,
        })
    }
}
