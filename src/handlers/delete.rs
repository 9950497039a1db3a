use super::common::Clauses;
use super::{HandlerContext, IntentHandler};
use crate::error::{Nl2SqlError, Result};
use crate::intent::{Action, Intent};
use crate::nlp::analyzer::Doc;
use crate::ontology::Mention;
use crate::sql;
use crate::token::Token;

pub struct DeleteHandler;

impl IntentHandler for DeleteHandler {
    fn action(&self) -> Action {
        Action::Delete
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
        let mut intent = Intent::new(Action::Delete, table.clone());

        intent.conditions = clauses.filters(ctx, &table)?;
        intent.all_rows = clauses.all_rows();

        // Part of the filter was not understood; dropping it would widen the write
        if let Some(rest) = clauses.unparsed_filter() {
            return Err(Nl2SqlError::UnsafeStatement(format!(
                "DELETE FROM {}: filtro no reconocido \"{}\"",
                table, rest
            )));
        }

        // A bare DELETE empties the table; only allowed when asked for
        if intent.conditions.is_empty() && !intent.all_rows {
            return Err(Nl2SqlError::UnsafeStatement(format!(
                "DELETE FROM {} sin condición; indique \"todos\" para borrar todas las filas",
                table
            )));
        }
        Ok(intent)
    }

    fn generate_sql(&self, intent: &Intent) -> Result<String> {
        sql::delete(intent)
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
        let intent = DeleteHandler.extract(&ctx, &doc, &toks, &mentions)?;
        DeleteHandler.generate_sql(&intent)
    }

    #[test]
    fn test_delete_with_equality() {
        let sql = compile("Eliminar los usuarios con ciudad Lima").unwrap();
        assert_eq!(sql, "DELETE FROM usuarios WHERE ciudad = 'Lima';");
    }

    #[test]
    fn test_delete_everything_requires_todos() {
        assert!(matches!(
            compile("Borrar la tabla usuarios"),
            Err(Nl2SqlError::UnsafeStatement(_))
        ));
        assert_eq!(compile("Borrar todos los usuarios").unwrap(), "DELETE FROM usuarios;");
    }

    #[test]
    fn test_delete_needs_a_table() {
        assert!(matches!(compile("Borrar a Luis"), Err(Nl2SqlError::MissingTable(_))));
    }

    #[test]
    fn test_delete_with_negation() {
        assert_eq!(
            compile("Borrar los usuarios que no tienen edad 30").unwrap(),
            "DELETE FROM usuarios WHERE edad != 30;"
        );
        assert_eq!(
            compile("Eliminar los usuarios sin edad 30").unwrap(),
            "DELETE FROM usuarios WHERE edad != 30;"
        );
        assert_eq!(
            compile("Borrar todos los usuarios excepto Ana").unwrap(),
            "DELETE FROM usuarios WHERE nombre != 'Ana';"
        );
    }

    #[test]
    fn test_delete_alternatives() {
        assert_eq!(
            compile("Borrar el usuario Ana o Luis").unwrap(),
            "DELETE FROM usuarios WHERE nombre IN ('Ana', 'Luis');"
        );
    }

    #[test]
    fn test_unrecognised_filter_is_not_dropped() {
        for text in [
            "Borrar todos los usuarios mayores de 30",
            "Borrar los usuarios con edad 30 que viven lejos",
            "Eliminar todos los productos con precio",
        ] {
            assert!(
                matches!(compile(text), Err(Nl2SqlError::UnsafeStatement(_))),
                "{}",
                text
            );
        }
    }
}
