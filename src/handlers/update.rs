use super::common::Clauses;
use super::{HandlerContext, IntentHandler};
use crate::error::{Nl2SqlError, Result};
use crate::intent::{Action, Assignment, Intent};
use crate::nlp::analyzer::Doc;
use crate::ontology::{Mention, MentionKind};
use crate::sql;
use crate::token::Token;

pub struct UpdateHandler;

impl UpdateHandler {
    /// `<columna> [de <Entidad>] a|por|= <valor>`.
    fn assignments(
        &self,
        ctx: &HandlerContext<'_>,
        clauses: &mut Clauses<'_>,
        table: &str,
    ) -> Vec<Assignment> {
        let doc = clauses.doc();
        let mut assignments = Vec::new();

        for mi in clauses.of_kind(MentionKind::Column) {
            if clauses.is_used(mi) {
                continue;
            }
            let m = clauses.mention(mi);

            let mut j = m.end;
            let mut target = None;
            while j < doc.len() {
                let t = &doc.tokens[j];
                if matches!(t.lower.as_str(), "a" | "por") || t.text == "=" {
                    target = clauses.next_value(j + 1, false);
                    break;
                }
                match clauses.owner(j).map(|o| clauses.mention(o)) {
                    Some(owner) if owner.kind == MentionKind::Table => j = owner.end,
                    Some(_) => break,
                    None if clauses.is_entity(j) => j = clauses.value_end(j),
                    None if t.is_stop => j += 1,
                    None => break,
                }
            }

            if let Some((start, end)) = target {
                clauses.mark_used(mi);
                let value = clauses.take(start, end);
                assignments.push(Assignment {
                    column: ctx.resolve_column(table, &m.concept),
                    value,
                });
            }
        }

        assignments
    }
}

impl IntentHandler for UpdateHandler {
    fn action(&self) -> Action {
        Action::Update
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
        let mut intent = Intent::new(Action::Update, table.clone());

        intent.assignments = self.assignments(ctx, &mut clauses, &table);
        if intent.assignments.is_empty() {
            return Err(Nl2SqlError::MissingValue(format!(
                "UPDATE {} sin asignación (columna a valor)",
                table
            )));
        }
        intent.columns = intent.assignments.iter().map(|a| a.column.clone()).collect();
        intent.conditions = clauses.filters(ctx, &table)?;
        intent.all_rows = clauses.all_rows();

        // Part of the filter was not understood; dropping it would widen the write
        if let Some(rest) = clauses.unparsed_filter() {
            return Err(Nl2SqlError::UnsafeStatement(format!(
                "UPDATE {}: filtro no reconocido \"{}\"",
                table, rest
            )));
        }

        if intent.conditions.is_empty() && !intent.all_rows {
            return Err(Nl2SqlError::UnsafeStatement(format!(
                "UPDATE {} sin condición; indique \"todos\" para modificar todas las filas",
                table
            )));
        }
        Ok(intent)
    }

    fn generate_sql(&self, intent: &Intent) -> Result<String> {
        sql::update(intent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nlp::Nlp;
    use crate::ontology::Ontology;
    use crate::token::ReductionMode;

    fn compile(text: &str) -> Result<String> {
        let nlp = Nlp::new(Ontology::load_default().unwrap());
        let doc = nlp.doc(text);
        let mentions = nlp.mentions(&doc);
        let toks = nlp.to_tokens(&doc, &mentions, ReductionMode::Protected);
        let ctx = HandlerContext::new(&nlp.ontology, None);
        let intent = UpdateHandler.extract(&ctx, &doc, &toks, &mentions)?;
        UpdateHandler.generate_sql(&intent)
    }

    #[test]
    fn test_assignment_with_comparator_filter() {
        let sql = compile("Cambiar el precio a 5 en productos con precio menor a 3").unwrap();
        assert_eq!(sql, "UPDATE productos SET precio = 5 WHERE precio < 3;");
    }

    #[test]
    fn test_assignment_by_por() {
        let sql = compile("Actualizar la categoría por hogar del producto Mesa").unwrap();
        assert_eq!(sql, "UPDATE productos SET categoria = 'hogar' WHERE nombre = 'Mesa';");
    }

    #[test]
    fn test_all_rows_needs_todos() {
        assert!(matches!(
            compile("Actualizar el precio a 0 en productos"),
            Err(Nl2SqlError::UnsafeStatement(_))
        ));
        let sql = compile("Actualizar el precio a 0 en todos los productos").unwrap();
        assert_eq!(sql, "UPDATE productos SET precio = 0;");
    }

    #[test]
    fn test_missing_assignment() {
        assert!(matches!(
            compile("Actualizar los productos de Ana"),
            Err(Nl2SqlError::MissingValue(_))
        ));
    }

    #[test]
    fn test_unrecognised_filter_is_not_dropped() {
        assert!(matches!(
            compile("Actualizar el precio a 0 en todos los productos más caros"),
            Err(Nl2SqlError::UnsafeStatement(_))
        ));
    }

    #[test]
    fn test_assignment_with_negated_filter() {
        let sql = compile("Cambiar el precio a 5 en productos sin categoría ropa").unwrap();
        assert_eq!(sql, "UPDATE productos SET precio = 5 WHERE categoria != 'ropa';");
    }
}
