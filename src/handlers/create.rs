use super::common::Clauses;
use super::{action_score, HandlerContext, IntentHandler};
use crate::error::{Nl2SqlError, Result};
use crate::intent::{Action, ColumnDef, Intent};
use crate::nlp::analyzer::Doc;
use crate::nlp::lexicon;
use crate::ontology::{Mention, MentionKind};
use crate::sql;
use crate::token::Token;
use tracing::debug;

/// `CREATE TABLE IF NOT EXISTS`.
pub struct CreateHandler;

/// A column word inside a comma group.
struct ColumnWord {
    name: String,
    data_type: Option<&'static str>,
}

impl CreateHandler {
    fn table_name(&self, clauses: &Clauses<'_>) -> Result<(String, usize)> {
        let doc = clauses.doc();
        let from = clauses
            .of_kind(MentionKind::Keyword)
            .into_iter()
            .map(|mi| clauses.mention(mi))
            .find(|m| m.concept == "table")
            .or_else(|| clauses.first(MentionKind::Action))
            .map(|m| m.end)
            .unwrap_or(0);

        let mut i = from;
        while i < doc.len() && (doc.tokens[i].is_stop || doc.tokens[i].is_punct) {
            i += 1;
        }
        let token = doc
            .get(i)
            .ok_or_else(|| Nl2SqlError::MissingTable(doc.text.clone()))?;

        if let Some(mi) = clauses.owner(i) {
            let m = clauses.mention(mi);
            if m.kind == MentionKind::Table {
                return Ok((m.concept.clone(), m.end));
            }
        }
        let name = sql::ident(&token.text);
        if name.is_empty() {
            return Err(Nl2SqlError::MissingTable(doc.text.clone()));
        }
        Ok((name, i + 1))
    }

    /// Column list start: after "columnas"/"campos", or after "con".
    fn columns_start(&self, clauses: &Clauses<'_>, table_end: usize) -> Option<usize> {
        let keyword = clauses
            .of_kind(MentionKind::Keyword)
            .into_iter()
            .map(|mi| clauses.mention(mi))
            .find(|m| m.concept == "columns" && m.start >= table_end);
        if let Some(m) = keyword {
            return Some(m.end);
        }
        clauses
            .doc()
            .iter()
            .skip(table_end)
            .find(|t| t.lower == "con")
            .map(|t| t.idx + 1)
    }

    fn parse_group(&self, clauses: &Clauses<'_>, group: &[usize]) -> Vec<ColumnWord> {
        let doc = clauses.doc();
        let mut words: Vec<ColumnWord> = Vec::new();
        let mut joined = false;

        let mut k = 0;
        while k < group.len() {
            let idx = group[k];
            let t = &doc.tokens[idx];
            let next_is_type = group
                .get(k + 1)
                .map(|&n| lexicon::type_word(&doc.tokens[n].lower).is_some())
                .unwrap_or(false);

            if t.lower == "tipo" && next_is_type {
                k += 1;
                continue;
            }
            if let Some(ty) = lexicon::type_word(&t.lower).filter(|_| !words.is_empty()) {
                if let Some(last) = words.last_mut() {
                    last.data_type = Some(ty);
                }
                k += 1;
                continue;
            }
            if t.lower == "de" || t.lower == "del" {
                joined |= !words.is_empty();
                k += 1;
                continue;
            }

            match clauses.owner(idx).map(|mi| clauses.mention(mi)) {
                Some(m) if m.kind == MentionKind::Column => {
                    words.push(ColumnWord { name: m.concept.clone(), data_type: None });
                    while k < group.len() && group[k] < m.end {
                        k += 1;
                    }
                    continue;
                }
                _ if t.is_stop => {}
                _ => {
                    let name = sql::ident(&t.text);
                    if !name.is_empty() {
                        words.push(ColumnWord { name, data_type: None });
                    }
                }
            }
            k += 1;
        }

        if joined && words.len() > 1 {
            let data_type = words.iter().rev().find_map(|w| w.data_type);
            let name = words.iter().map(|w| w.name.as_str()).collect::<Vec<_>>().join("_");
            return vec![ColumnWord { name, data_type }];
        }
        words
    }

    fn column_words(&self, clauses: &Clauses<'_>, start: usize) -> Vec<ColumnWord> {
        let doc = clauses.doc();
        let mut groups: Vec<Vec<usize>> = vec![Vec::new()];
        for t in doc.iter().skip(start) {
            let separator = (t.is_punct && matches!(t.text.as_str(), "," | ";" | ":"))
                || t.lower == "y"
                || t.lower == "e";
            if separator {
                groups.push(Vec::new());
            } else if !t.is_punct {
                if let Some(g) = groups.last_mut() {
                    g.push(t.idx);
                }
            }
        }

        groups
            .iter()
            .filter(|g| !g.is_empty())
            .flat_map(|g| self.parse_group(clauses, g))
            .collect()
    }
}

impl IntentHandler for CreateHandler {
    fn action(&self) -> Action {
        Action::Create
    }

    /// Without the word "tabla" a create verb is a weak signal.
    fn score(&self, doc: &Doc, mentions: &[Mention]) -> f32 {
        let score = action_score(Action::Create, doc, mentions);
        let has_table_word = mentions
            .iter()
            .any(|m| m.kind == MentionKind::Keyword && m.concept == "table");
        if score > 0.0 && !has_table_word {
            0.4
        } else {
            score
        }
    }

    fn extract(
        &self,
        ctx: &HandlerContext<'_>,
        doc: &Doc,
        toks: &[Token],
        mentions: &[Mention],
    ) -> Result<Intent> {
        let clauses = Clauses::new(doc, toks, mentions);
        let (table, table_end) = self.table_name(&clauses)?;
        let mut intent = Intent::new(Action::Create, table.clone());

        let words = self
            .columns_start(&clauses, table_end)
            .map(|start| self.column_words(&clauses, start))
            .unwrap_or_default();

        for word in words {
            if intent.column_defs.iter().any(|c| c.name == word.name) {
                continue;
            }
            let data_type = word
                .data_type
                .map(str::to_string)
                .or_else(|| ctx.column_type(&word.name))
                .unwrap_or_else(|| sql::infer_type(&word.name).to_string());
            intent.columns.push(word.name.clone());
            intent.column_defs.push(ColumnDef { name: word.name, data_type });
        }

        if intent.column_defs.is_empty() {
            let known = ctx.ontology.table_columns(&table);
            if known.is_empty() {
                return Err(Nl2SqlError::MissingColumns(table));
            }
            debug!("no columns given, using ontology columns for {}", table);
            for name in known {
                let data_type = ctx
                    .column_type(&name)
                    .unwrap_or_else(|| sql::infer_type(&name).to_string());
                intent.columns.push(name.clone());
                intent.column_defs.push(ColumnDef { name, data_type });
            }
        }

        Ok(intent)
    }

    fn generate_sql(&self, intent: &Intent) -> Result<String> {
        sql::create_table(intent)
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
        let intent = CreateHandler.extract(&ctx, &doc, &toks, &mentions)?;
        CreateHandler.generate_sql(&intent)
    }

    #[test]
    fn test_explicit_types_and_joined_names() {
        let sql = compile("Crear una tabla clientes con id, nombre texto, fecha de alta y saldo decimal").unwrap();
        assert_eq!(
            sql,
            "CREATE TABLE IF NOT EXISTS clientes (id INTEGER PRIMARY KEY, nombre TEXT, fecha_alta DATE, saldo REAL);"
        );
    }

    #[test]
    fn test_type_after_tipo() {
        let sql = compile("Crear la tabla pedidos con las columnas cantidad de tipo texto, total").unwrap();
        assert_eq!(sql, "CREATE TABLE IF NOT EXISTS pedidos (cantidad TEXT, total REAL);");
    }

    #[test]
    fn test_known_table_without_columns() {
        let sql = compile("Crear la tabla productos").unwrap();
        assert_eq!(
            sql,
            "CREATE TABLE IF NOT EXISTS productos (id INTEGER PRIMARY KEY, nombre TEXT, categoria TEXT, precio REAL);"
        );
    }

    #[test]
    fn test_unknown_table_without_columns() {
        assert!(matches!(compile("Crear la tabla facturas"), Err(Nl2SqlError::MissingColumns(_))));
    }
}
