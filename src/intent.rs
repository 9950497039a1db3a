//! Intent - the structured query a handler extracts from a sentence.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    Create,
    Insert,
    Update,
    Delete,
    Select,
}

impl Action {
    pub fn value(&self) -> &'static str {
        match self {
            Action::Create => "CREATE",
            Action::Insert => "INSERT",
            Action::Update => "UPDATE",
            Action::Delete => "DELETE",
            Action::Select => "SELECT",
        }
    }

    /// Action for an ontology action concept ("CREATE", "SELECT", ...).
    pub fn from_concept(concept: &str) -> Option<Self> {
        match concept {
            "CREATE" => Some(Action::Create),
            "INSERT" => Some(Action::Insert),
            "UPDATE" => Some(Action::Update),
            "DELETE" => Some(Action::Delete),
            "SELECT" => Some(Action::Select),
            _ => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.value())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SqlValue {
    Integer(i64),
    Real(f64),
    Text(String),
    /// Alternatives for `IN`
    List(Vec<SqlValue>),
    Null,
}

/// Escape character for LIKE patterns built from user text.
pub const LIKE_ESCAPE: char = '!';

impl SqlValue {
    pub fn is_numeric(&self) -> bool {
        matches!(self, SqlValue::Integer(_) | SqlValue::Real(_))
    }

    /// Text with `%`, `_` and the escape character escaped for LIKE.
    pub fn like_literal(raw: &str) -> String {
        let mut out = String::with_capacity(raw.len());
        for c in raw.chars() {
            if matches!(c, '%' | '_') || c == LIKE_ESCAPE {
                out.push(LIKE_ESCAPE);
            }
            out.push(c);
        }
        out
    }

    fn is_escaped_pattern(&self) -> bool {
        matches!(self, SqlValue::Text(s) if s.contains(LIKE_ESCAPE))
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Integer(n) => write!(f, "{}", n),
            SqlValue::Real(n) => write!(f, "{}", n),
            SqlValue::Text(s) => write!(f, "'{}'", s.replace('\'', "''")),
            SqlValue::List(items) => {
                let items: Vec<String> = items.iter().map(|v| v.to_string()).collect();
                write!(f, "({})", items.join(", "))
            }
            SqlValue::Null => f.write_str("NULL"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = "LIKE")]
    Like,
    #[serde(rename = "NOT LIKE")]
    NotLike,
    #[serde(rename = "IN")]
    In,
    #[serde(rename = "NOT IN")]
    NotIn,
    #[serde(rename = "BETWEEN")]
    Between,
}

impl Operator {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Like => "LIKE",
            Operator::NotLike => "NOT LIKE",
            Operator::In => "IN",
            Operator::NotIn => "NOT IN",
            Operator::Between => "BETWEEN",
        }
    }

    /// Complement of the operator. BETWEEN has none here.
    pub fn negate(&self) -> Option<Self> {
        let op = match self {
            Operator::Eq => Operator::Ne,
            Operator::Ne => Operator::Eq,
            Operator::Gt => Operator::Le,
            Operator::Ge => Operator::Lt,
            Operator::Lt => Operator::Ge,
            Operator::Le => Operator::Gt,
            Operator::Like => Operator::NotLike,
            Operator::NotLike => Operator::Like,
            Operator::In => Operator::NotIn,
            Operator::NotIn => Operator::In,
            Operator::Between => return None,
        };
        Some(op)
    }

    pub fn from_concept(concept: &str) -> Option<Self> {
        match concept {
            "=" => Some(Operator::Eq),
            "!=" => Some(Operator::Ne),
            ">" => Some(Operator::Gt),
            ">=" => Some(Operator::Ge),
            "<" => Some(Operator::Lt),
            "<=" => Some(Operator::Le),
            "BETWEEN" => Some(Operator::Between),
            "CONTAINS" | "STARTS_WITH" | "ENDS_WITH" => Some(Operator::Like),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub column: String,
    pub operator: Operator,
    pub value: SqlValue,
    /// Upper bound for BETWEEN
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper: Option<SqlValue>,
}

impl Condition {
    pub fn new(column: impl Into<String>, operator: Operator, value: SqlValue) -> Self {
        Self {
            column: column.into(),
            operator,
            value,
            upper: None,
        }
    }

    pub fn eq(column: impl Into<String>, value: SqlValue) -> Self {
        Self::new(column, Operator::Eq, value)
    }

    /// `column = v` for one value, `column IN (...)` for several.
    pub fn any_of(column: impl Into<String>, mut values: Vec<SqlValue>) -> Self {
        if values.len() == 1 {
            Self::eq(column, values.remove(0))
        } else {
            Self::new(column, Operator::In, SqlValue::List(values))
        }
    }

    /// The same filter with its operator complemented.
    pub fn negated(self) -> Option<Self> {
        let operator = self.operator.negate()?;
        Some(Self { operator, ..self })
    }

    pub fn between(column: impl Into<String>, low: SqlValue, high: SqlValue) -> Self {
        Self {
            column: column.into(),
            operator: Operator::Between,
            value: low,
            upper: Some(high),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.operator, &self.upper) {
            (Operator::Between, Some(upper)) => {
                write!(f, "{} BETWEEN {} AND {}", self.column, self.value, upper)
            }
            (Operator::Like | Operator::NotLike, _) if self.value.is_escaped_pattern() => write!(
                f,
                "{} {} {} ESCAPE '{}'",
                self.column,
                self.operator.as_sql(),
                self.value,
                LIKE_ESCAPE
            ),
            (op, _) => write!(f, "{} {} {}", self.column, op.as_sql(), self.value),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AggFunc {
    Count,
    Sum,
    Avg,
    Max,
    Min,
}

impl AggFunc {
    pub fn as_sql(&self) -> &'static str {
        match self {
            AggFunc::Count => "COUNT",
            AggFunc::Sum => "SUM",
            AggFunc::Avg => "AVG",
            AggFunc::Max => "MAX",
            AggFunc::Min => "MIN",
        }
    }

    pub fn from_concept(concept: &str) -> Option<Self> {
        match concept {
            "COUNT" => Some(AggFunc::Count),
            "SUM" => Some(AggFunc::Sum),
            "AVG" => Some(AggFunc::Avg),
            "MAX" => Some(AggFunc::Max),
            "MIN" => Some(AggFunc::Min),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Aggregation {
    pub func: AggFunc,
    /// `None` only for COUNT(*)
    pub column: Option<String>,
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let arg = self.column.as_deref().unwrap_or("*");
        write!(f, "{}({})", self.func.as_sql(), arg)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub column: String,
    pub value: SqlValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    pub data_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub column: String,
    pub descending: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    pub action: Action,
    pub table: String,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub aggregations: Vec<Aggregation>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    /// INSERT values, aligned with `columns` when both are present
    #[serde(default)]
    pub values: Vec<SqlValue>,
    #[serde(default)]
    pub assignments: Vec<Assignment>,
    #[serde(default)]
    pub column_defs: Vec<ColumnDef>,
    #[serde(default)]
    pub group_by: Vec<String>,
    #[serde(default)]
    pub order_by: Vec<OrderBy>,
    #[serde(default)]
    pub limit: Option<usize>,
    /// Explicit "todos" in UPDATE/DELETE sentences
    #[serde(default)]
    pub all_rows: bool,
}

impl Intent {
    pub fn new(action: Action, table: impl Into<String>) -> Self {
        Self {
            action,
            table: table.into(),
            columns: Vec::new(),
            aggregations: Vec::new(),
            conditions: Vec::new(),
            values: Vec::new(),
            assignments: Vec::new(),
            column_defs: Vec::new(),
            group_by: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            all_rows: false,
        }
    }

    /// One-line summary used by the pipeline log.
    pub fn summary(&self) -> String {
        let aggs: Vec<String> = self.aggregations.iter().map(|a| a.to_string()).collect();
        let conds: Vec<String> = self.conditions.iter().map(|c| c.to_string()).collect();
        format!(
            "action={}, table={}, cols={:?}, aggs={:?}, conds={:?}",
            self.action, self.table, self.columns, aggs, conds
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_display() {
        let cond = Condition::new("edad", Operator::Ge, SqlValue::Integer(25));
        assert_eq!(cond.to_string(), "edad >= 25");

        let cond = Condition::between("precio", SqlValue::Integer(10), SqlValue::Real(20.5));
        assert_eq!(cond.to_string(), "precio BETWEEN 10 AND 20.5");
    }

    #[test]
    fn test_text_values_escape_quotes() {
        assert_eq!(SqlValue::Text("O'Brien".into()).to_string(), "'O''Brien'");
        assert_eq!(SqlValue::Null.to_string(), "NULL");
    }

    #[test]
    fn test_negated_conditions() {
        let cond = Condition::eq("edad", SqlValue::Integer(30)).negated().unwrap();
        assert_eq!(cond.to_string(), "edad != 30");

        let cond = Condition::new("precio", Operator::Gt, SqlValue::Integer(10)).negated().unwrap();
        assert_eq!(cond.to_string(), "precio <= 10");

        let between = Condition::between("precio", SqlValue::Integer(1), SqlValue::Integer(2));
        assert!(between.negated().is_none());
    }

    #[test]
    fn test_any_of_renders_in_list() {
        let values = vec![SqlValue::Text("Ana".into()), SqlValue::Text("Luis".into())];
        let cond = Condition::any_of("nombre", values);
        assert_eq!(cond.to_string(), "nombre IN ('Ana', 'Luis')");
        assert_eq!(cond.negated().unwrap().to_string(), "nombre NOT IN ('Ana', 'Luis')");

        let single = Condition::any_of("nombre", vec![SqlValue::Text("Ana".into())]);
        assert_eq!(single.to_string(), "nombre = 'Ana'");
    }

    #[test]
    fn test_like_escapes_wildcards() {
        let pattern = format!("%{}%", SqlValue::like_literal("a%b_c!"));
        assert_eq!(pattern, "%a!%b!_c!!%");
        let cond = Condition::new("nombre", Operator::Like, SqlValue::Text(pattern));
        assert_eq!(cond.to_string(), "nombre LIKE '%a!%b!_c!!%' ESCAPE '!'");
    }

    #[test]
    fn test_count_star() {
        let agg = Aggregation { func: AggFunc::Count, column: None };
        assert_eq!(agg.to_string(), "COUNT(*)");
    }

    #[test]
    fn test_summary() {
        let mut intent = Intent::new(Action::Select, "usuarios");
        intent.columns.push("nombre".into());
        intent.conditions.push(Condition::new("edad", Operator::Gt, SqlValue::Integer(50)));
        assert_eq!(
            intent.summary(),
            r#"action=SELECT, table=usuarios, cols=["nombre"], aggs=[], conds=["edad > 50"]"#
        );
    }
}
