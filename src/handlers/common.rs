//! Clause extraction shared by the handlers.
//!
//! [`Clauses`] walks the analysed sentence and turns mention/value
//! neighbourhoods into limits, aggregations, filters and projections. Every
//! consumed token and mention is marked used so later passes skip it.

use super::HandlerContext;
use crate::error::{Nl2SqlError, Result};
use crate::intent::{AggFunc, Aggregation, Condition, Operator, OrderBy, SqlValue};
use crate::nlp::analyzer::{Doc, DocToken, PosTag};
use crate::nlp::lexicon;
use crate::ontology::{Mention, MentionKind};
use crate::token::Token;
use itertools::Itertools;
use std::collections::HashSet;

pub(crate) fn number_value(token: &DocToken) -> Option<SqlValue> {
    if let Some(n) = lexicon::number_word(&token.lower) {
        return Some(SqlValue::Integer(n));
    }
    if !token.like_num {
        return None;
    }
    if token.text.contains('.') {
        token.text.parse::<f64>().ok().map(SqlValue::Real)
    } else {
        // Digits past the i64 range stay text
        token.text.parse::<i64>().ok().map(SqlValue::Integer)
    }
}

/// Literal for a run of tokens: a number when it is a single numeric token,
/// text otherwise.
pub(crate) fn literal(tokens: &[&DocToken]) -> SqlValue {
    if let [single] = tokens {
        if let Some(n) = number_value(single) {
            return n;
        }
    }
    SqlValue::Text(tokens.iter().map(|t| t.text.as_str()).join(" "))
}

fn is_de(token: &DocToken) -> bool {
    token.lower == "de" || token.lower == "del"
}

fn is_list_separator(token: &DocToken) -> bool {
    token.text == "," || matches!(token.lower.as_str(), "y" | "e" | "o" | "u")
}

pub(crate) struct Clauses<'a> {
    doc: &'a Doc,
    mentions: &'a [Mention],
    /// Token index -> owning mention index
    owner: Vec<Option<usize>>,
    /// Token indices that survived reduction
    content: HashSet<usize>,
    used_tokens: HashSet<usize>,
    used_mentions: HashSet<usize>,
}

impl<'a> Clauses<'a> {
    pub fn new(doc: &'a Doc, toks: &[Token], mentions: &'a [Mention]) -> Self {
        let mut owner = vec![None; doc.len()];
        for (mi, m) in mentions.iter().enumerate() {
            for slot in owner.iter_mut().take(m.end).skip(m.start) {
                *slot = Some(mi);
            }
        }
        Self {
            doc,
            mentions,
            owner,
            content: toks.iter().map(|t| t.idx).collect(),
            used_tokens: HashSet::new(),
            used_mentions: HashSet::new(),
        }
    }

    pub fn doc(&self) -> &'a Doc {
        self.doc
    }

    pub fn mention(&self, mi: usize) -> &'a Mention {
        &self.mentions[mi]
    }

    pub fn owner(&self, idx: usize) -> Option<usize> {
        self.owner.get(idx).copied().flatten()
    }

    /// Mention indices of `kind`, in sentence order.
    pub fn of_kind(&self, kind: MentionKind) -> Vec<usize> {
        self.mentions
            .iter()
            .enumerate()
            .filter(|(_, m)| m.kind == kind)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn first(&self, kind: MentionKind) -> Option<&'a Mention> {
        self.mentions.iter().find(|m| m.kind == kind)
    }

    pub fn is_used(&self, mi: usize) -> bool {
        self.used_mentions.contains(&mi)
    }

    pub fn mark_used(&mut self, mi: usize) {
        self.used_mentions.insert(mi);
    }

    /// An unconsumed literal: free text outside every mention.
    pub fn is_value(&self, idx: usize) -> bool {
        let Some(t) = self.doc.get(idx) else {
            return false;
        };
        self.content.contains(&idx)
            && !self.used_tokens.contains(&idx)
            && !t.is_punct
            && self.owner(idx).is_none()
            && t.pos != PosTag::Verb
            && (!t.is_stop || t.like_num || t.is_quoted || t.like_email)
    }

    pub fn is_entity(&self, idx: usize) -> bool {
        self.is_value(idx)
            && self
                .doc
                .get(idx)
                .map(|t| t.is_propn() || t.is_quoted)
                .unwrap_or(false)
    }

    /// End of the value starting at `idx`; consecutive proper nouns form one value.
    pub fn value_end(&self, idx: usize) -> usize {
        let mut end = idx + 1;
        if self.doc.tokens[idx].is_propn() {
            while end < self.doc.len() && self.doc.tokens[end].is_propn() && self.is_value(end) {
                end += 1;
            }
        }
        end
    }

    /// Consume `[start, end)` as a literal.
    pub fn take(&mut self, start: usize, end: usize) -> SqlValue {
        let tokens: Vec<&DocToken> = self.doc.tokens[start..end].iter().collect();
        self.used_tokens.extend(start..end);
        literal(&tokens)
    }

    /// Next value at or after `from`, skipping stopwords. `de`/`del` are
    /// skipped only with `through_de`.
    pub fn next_value(&self, from: usize, through_de: bool) -> Option<(usize, usize)> {
        let mut j = from;
        while j < self.doc.len() {
            if self.is_value(j) {
                return Some((j, self.value_end(j)));
            }
            let t = &self.doc.tokens[j];
            if self.owner(j).is_some() || !t.is_stop || (is_de(t) && !through_de) {
                return None;
            }
            j += 1;
        }
        None
    }

    /// True when a negation ("no", "sin", "excepto", ...) opens the filter
    /// starting at `start`. Only stopwords and verbs may sit in between.
    fn negated_before(&self, start: usize) -> bool {
        for j in (0..start).rev() {
            if self.owner(j).is_some() {
                return false;
            }
            let t = &self.doc.tokens[j];
            if lexicon::is_negation(&t.lower) {
                return true;
            }
            if !(t.is_stop || t.pos == PosTag::Verb || t.text == ",") {
                return false;
            }
        }
        false
    }

    fn apply_negation(&self, condition: Condition, start: usize) -> Result<Condition> {
        if !self.negated_before(start) {
            return Ok(condition);
        }
        let text = condition.to_string();
        condition
            .negated()
            .ok_or_else(|| Nl2SqlError::AmbiguousCondition(format!("negación de {}", text)))
    }

    /// Values chained after `end` by `,`, `y` or `o` ("Ana o Luis"). Takes
    /// the values and their separators; returns them with the new end.
    fn chained_values(&mut self, mut end: usize, entities_only: bool) -> (Vec<SqlValue>, usize) {
        let mut values = Vec::new();
        while end + 1 < self.doc.len() {
            let next = end + 1;
            let separator = self.owner(end).is_none() && is_list_separator(&self.doc.tokens[end]);
            let accepted = if entities_only {
                self.is_entity(next)
            } else {
                self.is_value(next)
            };
            if !separator || !accepted {
                break;
            }
            self.used_tokens.insert(end);
            let next_end = self.value_end(next);
            values.push(self.take(next, next_end));
            end = next_end;
        }
        (values, end)
    }

    /// Nearest unused Column mention before `start`, looking past stopwords only.
    fn column_before(&self, start: usize) -> Option<usize> {
        for j in (0..start).rev() {
            if let Some(mi) = self.owner(j) {
                let m = &self.mentions[mi];
                return (m.kind == MentionKind::Column && !self.is_used(mi)).then_some(mi);
            }
            if self.is_value(j) {
                return None;
            }
        }
        None
    }

    /// Unit mention right after a value ("50 años").
    fn unit_after(&self, end: usize) -> Option<usize> {
        self.owner(end).filter(|&mi| {
            let m = &self.mentions[mi];
            m.kind == MentionKind::Column && m.start == end && !self.is_used(mi)
        })
    }

    /// Next Column mention after `from`, looking past stopwords only.
    fn column_after(&self, from: usize) -> Option<usize> {
        let mut j = from;
        while j < self.doc.len() {
            if let Some(mi) = self.owner(j) {
                return (self.mentions[mi].kind == MentionKind::Column).then_some(mi);
            }
            if !self.doc.tokens[j].is_stop {
                return None;
            }
            j += 1;
        }
        None
    }

    pub fn table(&self, ctx: &HandlerContext<'_>) -> Result<String> {
        if let Some(m) = self.first(MentionKind::Table) {
            return Ok(m.concept.clone());
        }
        self.mentions
            .iter()
            .filter(|m| m.kind == MentionKind::Column)
            .find_map(|m| ctx.ontology.owner_of(&m.concept))
            .map(str::to_string)
            .ok_or_else(|| Nl2SqlError::MissingTable(self.doc.text.clone()))
    }

    /// "todos los ..." in the sentence.
    pub fn all_rows(&self) -> bool {
        self.doc
            .iter()
            .any(|t| matches!(t.lower.as_str(), "todo" | "toda" | "todos" | "todas"))
    }

    /// `primeros 10`, `top 5`, `los 3 primeros`.
    pub fn limit(&mut self) -> Option<usize> {
        for mi in self.of_kind(MentionKind::Limit) {
            let m = self.mention(mi);
            let after = self
                .next_value(m.end, false)
                .filter(|(s, e)| e - s == 1 && number_value(&self.doc.tokens[*s]).is_some());
            let before = m
                .start
                .checked_sub(1)
                .filter(|&j| self.is_value(j) && number_value(&self.doc.tokens[j]).is_some())
                .map(|j| (j, j + 1));

            if let Some((s, e)) = after.or(before) {
                self.mark_used(mi);
                if let SqlValue::Integer(n) = self.take(s, e) {
                    if let Ok(n) = usize::try_from(n) {
                        return Some(n);
                    }
                }
            }
        }
        None
    }

    /// Aggregations bound forward to the next column, or back to the
    /// preceding one. COUNT without a column counts rows.
    pub fn aggregations(&mut self, ctx: &HandlerContext<'_>, table: &str) -> Result<Vec<Aggregation>> {
        let mut bound = Vec::new();
        let mut unbound = Vec::new();

        for mi in self.of_kind(MentionKind::Aggregation) {
            let m = self.mentions[mi].clone();
            let Some(func) = AggFunc::from_concept(&m.concept) else {
                continue;
            };
            self.mark_used(mi);

            let forward = self.aggregation_target(m.end);
            let column = match (forward, func) {
                (Some(ci), _) => Some(ci),
                (None, AggFunc::Count) => None,
                (None, _) => self.aggregation_source(m.start),
            };

            match column {
                Some(ci) => {
                    self.mark_used(ci);
                    let name = ctx.resolve_column(table, &self.mentions[ci].concept);
                    bound.push(Aggregation { func, column: Some(name) });
                }
                None if func == AggFunc::Count => bound.push(Aggregation { func, column: None }),
                None => unbound.push(m),
            }
        }

        if let Some(m) = unbound.first() {
            if bound.is_empty() {
                return Err(Nl2SqlError::MissingColumns(format!(
                    "{} sin columna ({})",
                    m.concept, m.text
                )));
            }
        }

        Ok(bound.into_iter().unique().collect())
    }

    fn aggregation_target(&self, from: usize) -> Option<usize> {
        let mut j = from;
        while j < self.doc.len() {
            match self.owner(j) {
                Some(mi) => {
                    let m = &self.mentions[mi];
                    match m.kind {
                        MentionKind::Column => return Some(mi),
                        MentionKind::Aggregation => j = m.end,
                        _ => return None,
                    }
                }
                None if self.doc.tokens[j].is_stop => j += 1,
                None => return None,
            }
        }
        None
    }

    fn aggregation_source(&self, start: usize) -> Option<usize> {
        for j in (0..start).rev() {
            match self.owner(j) {
                Some(mi) if self.mentions[mi].kind == MentionKind::Column => return Some(mi),
                Some(_) => return None,
                None if self.doc.tokens[j].is_stop => continue,
                None => return None,
            }
        }
        None
    }

    /// Filters introduced by comparator phrases.
    pub fn comparator_conditions(&mut self, ctx: &HandlerContext<'_>, table: &str) -> Result<Vec<Condition>> {
        let mut conditions = Vec::new();

        for mi in self.of_kind(MentionKind::Comparator) {
            if self.is_used(mi) {
                continue;
            }
            let m = self.mentions[mi].clone();
            self.mark_used(mi);

            let (start, end) = self
                .next_value(m.end, true)
                .ok_or_else(|| Nl2SqlError::MissingValue(m.text.clone()))?;
            let value = self.take(start, end);

            let mut value_end = end;
            let mut upper = None;
            if m.concept == "BETWEEN" {
                let conj = self
                    .doc
                    .get(end)
                    .filter(|t| t.lower == "y" || t.lower == "e")
                    .map(|_| end + 1);
                let (s, e) = conj
                    .and_then(|from| self.next_value(from, false))
                    .ok_or_else(|| Nl2SqlError::MissingValue(format!("{} {} y ...", m.text, value)))?;
                upper = Some(self.take(s, e));
                value_end = e;
            }

            let ci = self
                .column_before(m.start)
                .or_else(|| self.unit_after(value_end))
                .ok_or_else(|| Nl2SqlError::AmbiguousCondition(format!("{} {}", m.text, value)))?;
            self.mark_used(ci);
            let column = ctx.resolve_column(table, &self.mentions[ci].concept);
            let column_start = self.mentions[ci].start;

            let condition = match (m.concept.as_str(), upper) {
                ("BETWEEN", Some(high)) => Condition::between(column, value, high),
                ("CONTAINS", _) => like(column, "%", &value, "%"),
                ("STARTS_WITH", _) => like(column, "", &value, "%"),
                ("ENDS_WITH", _) => like(column, "%", &value, ""),
                (concept, _) => {
                    let op = Operator::from_concept(concept)
                        .ok_or_else(|| Nl2SqlError::Internal(format!("comparador desconocido {}", concept)))?;
                    Condition::new(column, op, value)
                }
            };
            // "edad no mayor a 30" and "que no tengan edad mayor a 30"
            let condition = if column_start < m.start && !self.negated_before(m.start) {
                self.apply_negation(condition, column_start)?
            } else {
                self.apply_negation(condition, m.start)?
            };
            conditions.push(condition);
        }

        Ok(conditions)
    }

    /// `column value` pairs ("con categoría ropa o hogar"), plus a number
    /// right before a unit column ("con 30 años").
    pub fn equality_conditions(&mut self, ctx: &HandlerContext<'_>, table: &str) -> Result<Vec<Condition>> {
        let mut conditions = Vec::new();

        for mi in self.of_kind(MentionKind::Column) {
            if self.is_used(mi) {
                continue;
            }
            let m = self.mentions[mi].clone();
            let span = self.next_value(m.end, false).or_else(|| {
                m.start
                    .checked_sub(1)
                    .filter(|&j| self.is_value(j) && number_value(&self.doc.tokens[j]).is_some())
                    .map(|j| (j, j + 1))
            });

            if let Some((start, end)) = span {
                self.mark_used(mi);
                let mut values = vec![self.take(start, end)];
                if start >= m.end {
                    values.extend(self.chained_values(end, false).0);
                }
                let column = ctx.resolve_column(table, &m.concept);
                let condition = Condition::any_of(column, values);
                conditions.push(self.apply_negation(condition, m.start.min(start))?);
            }
        }

        Ok(conditions)
    }

    /// Proper nouns and quoted literals left over filter the label column
    /// ("el registro de Luis", "excepto Ana o Luis").
    pub fn label_conditions(&mut self, ctx: &HandlerContext<'_>, table: &str) -> Result<Vec<Condition>> {
        let mut conditions = Vec::new();
        let label = ctx.resolve_column(table, &ctx.label_column(table));

        let mut j = 0;
        while j < self.doc.len() {
            if self.is_entity(j) {
                let end = self.value_end(j);
                let mut values = vec![self.take(j, end)];
                let (more, last) = self.chained_values(end, true);
                values.extend(more);
                let condition = Condition::any_of(label.clone(), values);
                conditions.push(self.apply_negation(condition, j)?);
                j = last;
            } else {
                j += 1;
            }
        }

        Ok(conditions)
    }

    /// Comparator, equality and label filters, in that order.
    pub fn filters(&mut self, ctx: &HandlerContext<'_>, table: &str) -> Result<Vec<Condition>> {
        let mut conditions = self.comparator_conditions(ctx, table)?;
        conditions.extend(self.equality_conditions(ctx, table)?);
        conditions.extend(self.label_conditions(ctx, table)?);
        self.check_disjunction(&conditions)?;
        Ok(conditions)
    }

    /// Filters are joined with AND; a loose "o" between two of them is
    /// rejected. Same-column alternatives were already folded into IN.
    pub fn check_disjunction(&self, conditions: &[Condition]) -> Result<()> {
        if conditions.len() < 2 {
            return Ok(());
        }
        let loose = self.doc.iter().any(|t| {
            lexicon::is_disjunction(&t.lower)
                && self.owner(t.idx).is_none()
                && !self.used_tokens.contains(&t.idx)
        });
        if loose {
            return Err(Nl2SqlError::AmbiguousCondition(format!(
                "disyunción entre filtros distintos: {}",
                conditions.iter().map(|c| c.to_string()).join(" o ")
            )));
        }
        Ok(())
    }

    /// Words nothing consumed that could belong to a filter: numbers,
    /// names, content words and unused filter mentions.
    pub fn unparsed_filter(&self) -> Option<String> {
        let mut words = Vec::new();
        let mut j = 0;
        while j < self.doc.len() {
            if let Some(mi) = self.owner(j) {
                let m = &self.mentions[mi];
                let structural = matches!(
                    m.kind,
                    MentionKind::Action | MentionKind::Table | MentionKind::Keyword | MentionKind::Group
                );
                if !structural && !self.is_used(mi) {
                    words.push(m.text.clone());
                }
                j = m.end.max(j + 1);
                continue;
            }
            let t = &self.doc.tokens[j];
            let filler = t.is_punct || (t.is_stop && !t.like_num) || t.pos == PosTag::Verb;
            if !filler && !self.used_tokens.contains(&j) {
                words.push(t.text.clone());
            }
            j += 1;
        }
        (!words.is_empty()).then(|| words.join(" "))
    }

    /// `por <columna>` after an aggregation.
    pub fn group_by(&mut self, ctx: &HandlerContext<'_>, table: &str) -> Vec<String> {
        let mut columns = Vec::new();
        for mi in self.of_kind(MentionKind::Group) {
            let end = self.mentions[mi].end;
            if let Some(ci) = self.column_after(end) {
                self.mark_used(mi);
                self.mark_used(ci);
                columns.push(ctx.resolve_column(table, &self.mentions[ci].concept));
            }
        }
        columns.into_iter().unique().collect()
    }

    /// `ordenado por <columna>` with an optional direction after it.
    pub fn order_by(&mut self, ctx: &HandlerContext<'_>, table: &str) -> Vec<OrderBy> {
        let mut order = Vec::new();
        for mi in self.of_kind(MentionKind::Order) {
            let end = self.mentions[mi].end;
            let Some(ci) = self.column_after(end) else {
                continue;
            };
            self.mark_used(mi);
            self.mark_used(ci);

            let direction = self
                .mentions
                .iter()
                .enumerate()
                .find(|(di, d)| {
                    d.kind == MentionKind::Direction && d.start >= end && !self.is_used(*di)
                })
                .map(|(di, d)| (di, d.concept == "DESC"));
            let descending = match direction {
                Some((di, desc)) => {
                    self.mark_used(di);
                    desc
                }
                None => false,
            };

            order.push(OrderBy {
                column: ctx.resolve_column(table, &self.mentions[ci].concept),
                descending,
            });
        }
        order
    }

    /// Column mentions nothing else consumed.
    pub fn projection(&mut self, ctx: &HandlerContext<'_>, table: &str) -> Vec<String> {
        let mut columns = Vec::new();
        for mi in self.of_kind(MentionKind::Column) {
            if self.is_used(mi) {
                continue;
            }
            self.mark_used(mi);
            columns.push(ctx.resolve_column(table, &self.mentions[mi].concept));
        }
        columns.into_iter().unique().collect()
    }
}

fn like(column: String, prefix: &str, value: &SqlValue, suffix: &str) -> Condition {
    let raw = match value {
        SqlValue::Text(s) => s.clone(),
        other => other.to_string(),
    };
    Condition::new(
        column,
        Operator::Like,
        SqlValue::Text(format!("{}{}{}", prefix, SqlValue::like_literal(&raw), suffix)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nlp::Nlp;
    use crate::ontology::Ontology;
    use crate::token::ReductionMode;

    struct Fixture {
        nlp: Nlp,
        doc: Doc,
        toks: Vec<Token>,
        mentions: Vec<Mention>,
    }

    fn fixture(text: &str) -> Fixture {
        let nlp = Nlp::new(Ontology::load_default().unwrap());
        let doc = nlp.doc(text);
        let mentions = nlp.mentions(&doc);
        let toks = nlp.to_tokens(&doc, &mentions, ReductionMode::Protected);
        Fixture { nlp, doc, toks, mentions }
    }

    #[test]
    fn test_between() {
        let f = fixture("Mostrar productos con precio entre 10 y 20");
        let ctx = HandlerContext::new(&f.nlp.ontology, None);
        let mut clauses = Clauses::new(&f.doc, &f.toks, &f.mentions);
        let conds = clauses.comparator_conditions(&ctx, "productos").unwrap();
        assert_eq!(
            conds,
            vec![Condition::between("precio", SqlValue::Integer(10), SqlValue::Integer(20))]
        );
    }

    #[test]
    fn test_like_patterns() {
        let f = fixture("Mostrar usuarios cuyo nombre empieza por \"An\"");
        let ctx = HandlerContext::new(&f.nlp.ontology, None);
        let mut clauses = Clauses::new(&f.doc, &f.toks, &f.mentions);
        let conds = clauses.filters(&ctx, "usuarios").unwrap();
        assert_eq!(conds.len(), 1);
        assert_eq!(conds[0].to_string(), "nombre LIKE 'An%'");
    }

    #[test]
    fn test_comparator_without_column_is_ambiguous() {
        let f = fixture("Mostrar usuarios con más de 50");
        let ctx = HandlerContext::new(&f.nlp.ontology, None);
        let mut clauses = Clauses::new(&f.doc, &f.toks, &f.mentions);
        let err = clauses.comparator_conditions(&ctx, "usuarios").unwrap_err();
        assert!(matches!(err, Nl2SqlError::AmbiguousCondition(_)));
    }

    #[test]
    fn test_label_joins_proper_nouns() {
        let f = fixture("Borrar el usuario Ana María");
        let ctx = HandlerContext::new(&f.nlp.ontology, None);
        let mut clauses = Clauses::new(&f.doc, &f.toks, &f.mentions);
        let conds = clauses.label_conditions(&ctx, "usuarios").unwrap();
        assert_eq!(conds, vec![Condition::eq("nombre", SqlValue::Text("Ana María".into()))]);
    }

    #[test]
    fn test_limit_before_keyword() {
        let f = fixture("Listar los 3 primeros productos");
        let mut clauses = Clauses::new(&f.doc, &f.toks, &f.mentions);
        assert_eq!(clauses.limit(), Some(3));
    }

    #[test]
    fn test_count_binds_forward_only() {
        let f = fixture("Contar usuarios por ciudad");
        let ctx = HandlerContext::new(&f.nlp.ontology, None);
        let mut clauses = Clauses::new(&f.doc, &f.toks, &f.mentions);
        let aggs = clauses.aggregations(&ctx, "usuarios").unwrap();
        assert_eq!(aggs, vec![Aggregation { func: AggFunc::Count, column: None }]);
        assert_eq!(clauses.group_by(&ctx, "usuarios"), vec!["ciudad"]);
    }

    fn filters_of(text: &str, table: &str) -> Result<Vec<Condition>> {
        let f = fixture(text);
        let ctx = HandlerContext::new(&f.nlp.ontology, None);
        let mut clauses = Clauses::new(&f.doc, &f.toks, &f.mentions);
        clauses.filters(&ctx, table)
    }

    #[test]
    fn test_negated_equality() {
        for text in [
            "Borrar los usuarios que no tienen edad 30",
            "Eliminar los usuarios sin edad 30",
        ] {
            let conds = filters_of(text, "usuarios").unwrap();
            assert_eq!(
                conds,
                vec![Condition::new("edad", Operator::Ne, SqlValue::Integer(30))],
                "{}",
                text
            );
        }
    }

    #[test]
    fn test_negated_label() {
        let conds = filters_of("Borrar todos los usuarios excepto Ana", "usuarios").unwrap();
        assert_eq!(conds, vec![Condition::new("nombre", Operator::Ne, SqlValue::Text("Ana".into()))]);

        let conds = filters_of("Borrar todos los usuarios salvo Ana y Luis", "usuarios").unwrap();
        assert_eq!(conds.len(), 1);
        assert_eq!(conds[0].to_string(), "nombre NOT IN ('Ana', 'Luis')");
    }

    #[test]
    fn test_negated_comparators() {
        let conds = filters_of("Mostrar usuarios cuyo nombre no empieza por \"An\"", "usuarios").unwrap();
        assert_eq!(conds[0].to_string(), "nombre NOT LIKE 'An%'");

        let conds = filters_of("Borrar los productos con precio no mayor a 10", "productos").unwrap();
        assert_eq!(conds, vec![Condition::new("precio", Operator::Le, SqlValue::Integer(10))]);

        let err = filters_of("Borrar los productos con precio no entre 10 y 20", "productos").unwrap_err();
        assert!(matches!(err, Nl2SqlError::AmbiguousCondition(_)));
    }

    #[test]
    fn test_negation_does_not_leak_into_next_filter() {
        let conds = filters_of("Borrar los usuarios sin edad 30 y con ciudad Lima", "usuarios").unwrap();
        let rendered: Vec<String> = conds.iter().map(|c| c.to_string()).collect();
        assert_eq!(rendered, vec!["edad != 30", "ciudad = 'Lima'"]);
    }

    #[test]
    fn test_alternatives_become_in_list() {
        let conds = filters_of("Borrar el usuario Ana o Luis", "usuarios").unwrap();
        assert_eq!(conds.len(), 1);
        assert_eq!(conds[0].to_string(), "nombre IN ('Ana', 'Luis')");

        let conds = filters_of("Mostrar productos con categoría ropa, hogar o jardín", "productos").unwrap();
        assert_eq!(conds[0].to_string(), "categoria IN ('ropa', 'hogar', 'jardín')");
    }

    #[test]
    fn test_disjunction_between_filters_is_rejected() {
        let err = filters_of("Mostrar productos con categoría ropa o precio menor a 10", "productos").unwrap_err();
        assert!(matches!(err, Nl2SqlError::AmbiguousCondition(_)));
    }

    #[test]
    fn test_unparsed_filter_words() {
        let f = fixture("Borrar todos los usuarios mayores de 30");
        let ctx = HandlerContext::new(&f.nlp.ontology, None);
        let mut clauses = Clauses::new(&f.doc, &f.toks, &f.mentions);
        assert!(clauses.filters(&ctx, "usuarios").unwrap().is_empty());
        let rest = clauses.unparsed_filter().unwrap();
        assert!(rest.contains("30"), "{}", rest);

        let f = fixture("Borrar el registro de Luis de la tabla usuarios");
        let ctx = HandlerContext::new(&f.nlp.ontology, None);
        let mut clauses = Clauses::new(&f.doc, &f.toks, &f.mentions);
        clauses.table(&ctx).unwrap();
        clauses.filters(&ctx, "usuarios").unwrap();
        assert_eq!(clauses.unparsed_filter(), None);
    }

    #[test]
    fn test_limit_zero_is_kept() {
        let f = fixture("Listar los primeros 0 productos");
        let mut clauses = Clauses::new(&f.doc, &f.toks, &f.mentions);
        assert_eq!(clauses.limit(), Some(0));
    }

    #[test]
    fn test_like_escapes_wildcards_in_value() {
        let conds = filters_of("Mostrar usuarios cuyo nombre contiene \"a%b\"", "usuarios").unwrap();
        assert_eq!(conds[0].to_string(), "nombre LIKE '%a!%b%' ESCAPE '!'");
    }

    #[test]
    fn test_integer_overflow_stays_text() {
        let doc = Nlp::new(Ontology::load_default().unwrap()).doc("99999999999999999999999");
        assert_eq!(
            number_value(&doc.tokens[0]),
            None
        );
        assert_eq!(
            literal(&[&doc.tokens[0]]),
            SqlValue::Text("99999999999999999999999".into())
        );
        let doc = Nlp::new(Ontology::load_default().unwrap()).doc("12.5 y 42");
        assert_eq!(number_value(&doc.tokens[0]), Some(SqlValue::Real(12.5)));
        assert_eq!(number_value(&doc.tokens[2]), Some(SqlValue::Integer(42)));
    }
}
