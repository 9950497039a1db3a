use super::common::{literal, Clauses};
use super::{HandlerContext, IntentHandler};
use crate::error::{Nl2SqlError, Result};
use crate::intent::{Action, Intent, SqlValue};
use crate::nlp::analyzer::{Doc, DocToken};
use crate::ontology::{Mention, MentionKind};
use crate::sql;
use crate::token::Token;
use tracing::debug;

pub struct InsertHandler;

impl InsertHandler {
    /// Values listed after a colon: "productos: laptop, electrónica, 1500".
    fn positional_values(&self, doc: &Doc, colon: usize) -> Vec<SqlValue> {
        let mut groups: Vec<Vec<&DocToken>> = vec![Vec::new()];
        for t in doc.iter().skip(colon + 1) {
            let separator = (t.is_punct && matches!(t.text.as_str(), "," | ";"))
                || t.lower == "y"
                || t.lower == "e";
            if separator {
                groups.push(Vec::new());
            } else if !t.is_punct {
                if let Some(g) = groups.last_mut() {
                    g.push(t);
                }
            }
        }
        groups
            .iter()
            .filter(|g| !g.is_empty())
            .map(|g| literal(g))
            .collect()
    }

    /// Column/value pairs ("con edad 30") plus a proper noun for the label column.
    fn paired_values(
        &self,
        ctx: &HandlerContext<'_>,
        clauses: &mut Clauses<'_>,
        table: &str,
    ) -> Vec<(usize, String, SqlValue)> {
        let mut pairs = Vec::new();

        for mi in clauses.of_kind(MentionKind::Column) {
            let m = clauses.mention(mi);
            if let Some((start, end)) = clauses.next_value(m.end, true) {
                clauses.mark_used(mi);
                let value = clauses.take(start, end);
                pairs.push((start, ctx.resolve_column(table, &m.concept), value));
            }
        }

        let label = ctx.resolve_column(table, &ctx.label_column(table));
        if !pairs.iter().any(|(_, c, _)| *c == label) {
            let entity = (0..clauses.doc().len()).find(|&j| clauses.is_entity(j));
            if let Some(start) = entity {
                let end = clauses.value_end(start);
                let value = clauses.take(start, end);
                pairs.push((start, label, value));
            }
        }

        pairs.sort_by_key(|(start, _, _)| *start);
        pairs
    }
}

impl IntentHandler for InsertHandler {
    fn action(&self) -> Action {
        Action::Insert
    }

    fn extract(
        &self,
        ctx: &HandlerContext<'_>,
        doc: &Doc,
        toks: &[Token],
        mentions: &[Mention],
    ) -> Result<Intent> {
        let mut clauses = Clauses::new(doc, toks, mentions);
        let table = clauses.table(ctx)?;
        let mut intent = Intent::new(Action::Insert, table.clone());

        if let Some(colon) = doc.iter().position(|t| t.is_punct && t.text == ":") {
            intent.values = self.positional_values(doc, colon);
            let columns = ctx.insertable_columns(&table);
            if columns.len() == intent.values.len() {
                intent.columns = columns;
            } else {
                debug!(
                    "{} values for {} columns of {}, omitting column list",
                    intent.values.len(),
                    columns.len(),
                    table
                );
            }
        } else {
            for (_, column, value) in self.paired_values(ctx, &mut clauses, &table) {
                intent.columns.push(column);
                intent.values.push(value);
            }
        }

        if intent.values.is_empty() {
            return Err(Nl2SqlError::MissingValue(format!("INSERT INTO {}", table)));
        }
        Ok(intent)
    }

    fn generate_sql(&self, intent: &Intent) -> Result<String> {
        sql::insert(intent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nlp::Nlp;
    use crate::ontology::Ontology;
    use crate::schema::{ColumnSchema, SchemaCatalog, TableSchema};
    use crate::token::ReductionMode;

    fn compile_with(text: &str, catalog: Option<&SchemaCatalog>) -> Result<String> {
        let nlp = Nlp::new(Ontology::load_default().unwrap());
        let doc = nlp.doc(text);
        let mentions = nlp.mentions(&doc);
        let toks = nlp.to_tokens(&doc, &mentions, ReductionMode::Protected);
        let ctx = HandlerContext::new(&nlp.ontology, catalog);
        let intent = InsertHandler.extract(&ctx, &doc, &toks, &mentions)?;
        InsertHandler.generate_sql(&intent)
    }

    #[test]
    fn test_positional_count_mismatch_omits_columns() {
        let sql = compile_with("Agregar en productos: mesa, 80", None).unwrap();
        assert_eq!(sql, "INSERT INTO productos VALUES ('mesa', 80);");
    }

    #[test]
    fn test_positional_uses_live_columns() {
        let catalog = SchemaCatalog::new(vec![TableSchema {
            name: "productos".to_string(),
            columns: vec![
                ColumnSchema::new("id", "INTEGER").primary(),
                ColumnSchema::new("nombre", "TEXT"),
                ColumnSchema::new("precio", "REAL"),
            ],
        }]);
        let sql = compile_with("Agregar en productos: silla de oficina, 45.5", Some(&catalog)).unwrap();
        assert_eq!(
            sql,
            "INSERT INTO productos (nombre, precio) VALUES ('silla de oficina', 45.5);"
        );
    }

    #[test]
    fn test_pairs_keep_sentence_order() {
        let sql = compile_with("Registrar en usuarios con email luis@mail.com y edad 41 a Luis", None).unwrap();
        assert_eq!(
            sql,
            "INSERT INTO usuarios (email, edad, nombre) VALUES ('luis@mail.com', 41, 'Luis');"
        );
    }

    #[test]
    fn test_no_values() {
        assert!(matches!(
            compile_with("Insertar en usuarios", None),
            Err(Nl2SqlError::MissingValue(_))
        ));
    }
}
