use super::common::Clauses;
use super::{action_score, HandlerContext, IntentHandler};
use crate::error::Result;
use crate::intent::{Action, Intent};
use crate::nlp::analyzer::Doc;
use crate::ontology::{Mention, MentionKind};
use crate::sql;
use crate::token::Token;

pub struct SelectHandler;

impl IntentHandler for SelectHandler {
    fn action(&self) -> Action {
        Action::Select
    }

    /// Questions without a verb ("¿cuántos productos hay?") still read as
    /// queries, and SELECT is the fallback for everything else.
    fn score(&self, doc: &Doc, mentions: &[Mention]) -> f32 {
        let score = action_score(Action::Select, doc, mentions);
        if score > 0.0 {
            score
        } else if mentions.iter().any(|m| m.kind == MentionKind::Aggregation) {
            0.5
        } else {
            0.1
        }
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
        let mut intent = Intent::new(Action::Select, table.clone());

        intent.limit = clauses.limit();
        intent.aggregations = clauses.aggregations(ctx, &table)?;
        intent.conditions = clauses.comparator_conditions(ctx, &table)?;
        if !intent.aggregations.is_empty() {
            intent.group_by = clauses.group_by(ctx, &table);
        }
        intent.order_by = clauses.order_by(ctx, &table);
        intent.conditions.extend(clauses.equality_conditions(ctx, &table)?);
        intent.conditions.extend(clauses.label_conditions(ctx, &table)?);
        clauses.check_disjunction(&intent.conditions)?;

        intent.columns = if intent.aggregations.is_empty() {
            clauses.projection(ctx, &table)
        } else {
            intent.group_by.clone()
        };

        Ok(intent)
    }

    fn generate_sql(&self, intent: &Intent) -> Result<String> {
        sql::select(intent)
    }
}
