//! SQL rendering and validation for the SQLite dialect.
//!
//! Statements are built clause by clause from an [`Intent`]; every statement
//! ends with `;`. `validate` round-trips the text through `sqlparser`.

use crate::error::{Nl2SqlError, Result};
use crate::intent::{Condition, Intent, SqlValue};
use crate::nlp::lexicon;
use serde::{Deserialize, Serialize};
use sqlparser::ast::Statement;
use sqlparser::dialect::SQLiteDialect;
use sqlparser::parser::Parser;

pub fn format_value(value: &SqlValue) -> String {
    match value {
        SqlValue::Text(s) => format!("'{}'", s.replace('\'', "''")),
        SqlValue::Integer(n) => n.to_string(),
        SqlValue::Real(n) => n.to_string(),
        SqlValue::List(items) => {
            let items: Vec<String> = items.iter().map(format_value).collect();
            format!("({})", items.join(", "))
        }
        SqlValue::Null => "NULL".to_string(),
    }
}

/// Normalise free text into a snake_case identifier.
pub fn ident(raw: &str) -> String {
    let folded = lexicon::fold(raw.trim());
    let mut out = String::with_capacity(folded.len());
    for c in folded.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c);
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    let out = out.trim_matches('_').to_string();
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        format!("c_{}", out)
    } else {
        out
    }
}

/// SQL type guessed from a column name.
pub fn infer_type(name: &str) -> &'static str {
    let name = lexicon::fold(name);
    if name == "id" || name.ends_with("_id") || name.starts_with("id_") {
        return "INTEGER";
    }
    if name.contains("fecha") || name.contains("date") {
        return "DATE";
    }
    const INTEGER_HINTS: &[&str] = &["edad", "cantidad", "stock", "anio", "numero", "unidades"];
    const REAL_HINTS: &[&str] = &["precio", "monto", "total", "salario", "importe", "costo", "saldo"];
    if INTEGER_HINTS.iter().any(|h| name.contains(h)) {
        "INTEGER"
    } else if REAL_HINTS.iter().any(|h| name.contains(h)) {
        "REAL"
    } else {
        "TEXT"
    }
}

/// One WHERE term; BETWEEN bounds, IN lists and LIKE escapes included.
pub fn render_condition(cond: &Condition) -> String {
    cond.to_string()
}

pub fn render_where(conditions: &[Condition]) -> String {
    if conditions.is_empty() {
        return String::new();
    }
    let parts: Vec<String> = conditions.iter().map(render_condition).collect();
    format!(" WHERE {}", parts.join(" AND "))
}

pub fn create_table(intent: &Intent) -> Result<String> {
    if intent.column_defs.is_empty() {
        return Err(Nl2SqlError::MissingColumns(intent.table.clone()));
    }
    let defs: Vec<String> = intent
        .column_defs
        .iter()
        .map(|c| {
            if c.name == "id" && c.data_type == "INTEGER" {
                "id INTEGER PRIMARY KEY".to_string()
            } else {
                format!("{} {}", c.name, c.data_type)
            }
        })
        .collect();
    Ok(format!(
        "CREATE TABLE IF NOT EXISTS {} ({});",
        intent.table,
        defs.join(", ")
    ))
}

pub fn insert(intent: &Intent) -> Result<String> {
    if intent.values.is_empty() {
        return Err(Nl2SqlError::MissingValue(format!("INSERT INTO {}", intent.table)));
    }
    let values: Vec<String> = intent.values.iter().map(format_value).collect();
    let mut sql = format!("INSERT INTO {}", intent.table);
    if !intent.columns.is_empty() {
        if intent.columns.len() != intent.values.len() {
            return Err(Nl2SqlError::Internal(format!(
                "{} columnas para {} valores",
                intent.columns.len(),
                intent.values.len()
            )));
        }
        sql.push_str(&format!(" ({})", intent.columns.join(", ")));
    }
    sql.push_str(&format!(" VALUES ({});", values.join(", ")));
    Ok(sql)
}

pub fn update(intent: &Intent) -> Result<String> {
    if intent.assignments.is_empty() {
        return Err(Nl2SqlError::MissingValue(format!("UPDATE {}", intent.table)));
    }
    let sets: Vec<String> = intent
        .assignments
        .iter()
        .map(|a| format!("{} = {}", a.column, format_value(&a.value)))
        .collect();
    Ok(format!(
        "UPDATE {} SET {}{};",
        intent.table,
        sets.join(", "),
        render_where(&intent.conditions)
    ))
}

pub fn delete(intent: &Intent) -> Result<String> {
    Ok(format!(
        "DELETE FROM {}{};",
        intent.table,
        render_where(&intent.conditions)
    ))
}

pub fn select(intent: &Intent) -> Result<String> {
    let mut projection: Vec<String> = if intent.aggregations.is_empty() {
        intent.columns.clone()
    } else {
        intent.group_by.clone()
    };
    projection.extend(intent.aggregations.iter().map(|a| a.to_string()));
    if projection.is_empty() {
        projection.push("*".to_string());
    }

    let mut sql = format!("SELECT {} FROM {}", projection.join(", "), intent.table);
    sql.push_str(&render_where(&intent.conditions));

    if !intent.group_by.is_empty() {
        sql.push_str(&format!(" GROUP BY {}", intent.group_by.join(", ")));
    }

    if !intent.order_by.is_empty() {
        let order: Vec<String> = intent
            .order_by
            .iter()
            .map(|o| format!("{} {}", o.column, if o.descending { "DESC" } else { "ASC" }))
            .collect();
        sql.push_str(&format!(" ORDER BY {}", order.join(", ")));
    }

    if let Some(limit) = intent.limit {
        sql.push_str(&format!(" LIMIT {}", limit));
    }

    sql.push(';');
    Ok(sql)
}

pub fn parse(sql: &str) -> Result<Vec<Statement>> {
    let dialect = SQLiteDialect {};
    Ok(Parser::parse_sql(&dialect, sql)?)
}

/// Fails unless `sql` parses as exactly one SQLite statement.
pub fn validate(sql: &str) -> Result<()> {
    match parse(sql)?.len() {
        1 => Ok(()),
        0 => Err(Nl2SqlError::InvalidSql("sentencia vacía".to_string())),
        n => Err(Nl2SqlError::InvalidSql(format!("se esperaba una sentencia, hay {}", n))),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatementKind {
    Query,
    Modify,
    Schema,
}

/// Kind of the single statement in `sql`.
pub fn statement_kind(sql: &str) -> Result<StatementKind> {
    let statements = parse(sql)?;
    let statement = match statements.as_slice() {
        [single] => single,
        _ => return Err(Nl2SqlError::InvalidSql(format!("se esperaba una sentencia, hay {}", statements.len()))),
    };
    let kind = match statement {
        Statement::Query(_) => StatementKind::Query,
        Statement::CreateTable { .. }
        | Statement::CreateView { .. }
        | Statement::CreateIndex { .. }
        | Statement::AlterTable { .. }
        | Statement::Drop { .. } => StatementKind::Schema,
        _ => StatementKind::Modify,
    };
    Ok(kind)
}

/// True when `sql` is a single query that cannot modify the database.
pub fn is_read_only(sql: &str) -> bool {
    matches!(statement_kind(sql), Ok(StatementKind::Query))
}
