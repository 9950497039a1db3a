//! Rule-based Spanish analyzer.
//!
//! Produces a [`Doc`]: tokens with lemma, coarse part-of-speech tag, a shallow
//! dependency label and the lexical flags the handlers rely on (stopword,
//! number, email, quoted literal).

use super::lexicon;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

lazy_static! {
    static ref TOKEN_RE: Regex = Regex::new(
        r#"(?P<date>\d{4}-\d{2}-\d{2})|(?P<email>[\w.+-]+@[\w-]+(?:\.[\w-]+)+)|"(?P<dq>[^"]*)"|'(?P<sq>[^']*)'|(?P<num>\d+(?:\.\d+)?)|(?P<word>[\p{L}\p{N}_]+(?:'[\p{L}\p{N}_]+)*)|(?P<punct>\S)"#
    )
    .unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PosTag {
    Noun,
    Propn,
    Verb,
    Adj,
    Adp,
    Det,
    Pron,
    Cconj,
    Num,
    Punct,
    X,
}

impl fmt::Display for PosTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            PosTag::Noun => "NOUN",
            PosTag::Propn => "PROPN",
            PosTag::Verb => "VERB",
            PosTag::Adj => "ADJ",
            PosTag::Adp => "ADP",
            PosTag::Det => "DET",
            PosTag::Pron => "PRON",
            PosTag::Cconj => "CCONJ",
            PosTag::Num => "NUM",
            PosTag::Punct => "PUNCT",
            PosTag::X => "X",
        };
        f.write_str(tag)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocToken {
    /// Surface text (quotes removed for quoted literals)
    pub text: String,
    /// Lowercase, accent-folded text
    pub lower: String,
    pub lemma: String,
    pub pos: PosTag,
    pub dep: String,
    pub is_stop: bool,
    pub is_punct: bool,
    pub like_num: bool,
    pub like_email: bool,
    pub is_quoted: bool,
    pub idx: usize,
}

impl DocToken {
    pub fn is_propn(&self) -> bool {
        self.pos == PosTag::Propn
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Doc {
    pub text: String,
    pub tokens: Vec<DocToken>,
}

impl Doc {
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&DocToken> {
        self.tokens.get(idx)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DocToken> {
        self.tokens.iter()
    }

    /// Position of the first token whose folded text equals `word`.
    pub fn position(&self, word: &str) -> Option<usize> {
        self.tokens.iter().position(|t| t.lower == word)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Date,
    Email,
    Quoted,
    Number,
    Word,
    Punct,
}

#[derive(Debug, Default, Clone)]
pub struct Analyzer;

impl Analyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, text: &str) -> Doc {
        let mut tokens = Vec::new();

        for caps in TOKEN_RE.captures_iter(text) {
            let (surface, shape) = if let Some(m) = caps.name("date") {
                (m.as_str(), Shape::Date)
            } else if let Some(m) = caps.name("email") {
                (m.as_str(), Shape::Email)
            } else if let Some(m) = caps.name("dq").or_else(|| caps.name("sq")) {
                (m.as_str(), Shape::Quoted)
            } else if let Some(m) = caps.name("num") {
                (m.as_str(), Shape::Number)
            } else if let Some(m) = caps.name("word") {
                (m.as_str(), Shape::Word)
            } else if let Some(m) = caps.name("punct") {
                (m.as_str(), Shape::Punct)
            } else {
                continue;
            };

            let idx = tokens.len();
            tokens.push(self.make_token(surface, shape, idx));
        }

        assign_dependencies(&mut tokens);

        Doc {
            text: text.to_string(),
            tokens,
        }
    }

    fn make_token(&self, surface: &str, shape: Shape, idx: usize) -> DocToken {
        let lower = lexicon::fold(surface);
        let is_punct = shape == Shape::Punct;
        let like_num = shape == Shape::Number || (shape == Shape::Word && lexicon::number_word(&lower).is_some());
        let like_email = shape == Shape::Email;
        let is_quoted = shape == Shape::Quoted;
        let is_stop = shape == Shape::Word && lexicon::is_stopword(&lower);

        let pos = match shape {
            Shape::Punct => PosTag::Punct,
            Shape::Number => PosTag::Num,
            Shape::Date | Shape::Email | Shape::Quoted => PosTag::X,
            Shape::Word => tag_word(surface, &lower, idx),
        };

        let lemma = match pos {
            PosTag::Propn | PosTag::X | PosTag::Num | PosTag::Punct => lower.clone(),
            _ => lexicon::lemmatize(&lower),
        };

        DocToken {
            text: surface.to_string(),
            lower,
            lemma,
            pos,
            dep: String::new(),
            is_stop,
            is_punct,
            like_num,
            like_email,
            is_quoted,
            idx,
        }
    }
}

fn tag_word(surface: &str, lower: &str, idx: usize) -> PosTag {
    if lexicon::number_word(lower).is_some() {
        PosTag::Num
    } else if lexicon::VERB_LEMMAS.contains_key(lower) {
        PosTag::Verb
    } else if lexicon::DETERMINERS.contains(lower) {
        PosTag::Det
    } else if lexicon::ADPOSITIONS.contains(lower) {
        PosTag::Adp
    } else if lexicon::CONJUNCTIONS.contains(lower) {
        PosTag::Cconj
    } else if lexicon::PRONOUNS.contains(lower) {
        PosTag::Pron
    } else if lexicon::ADJECTIVES.contains(lower) {
        PosTag::Adj
    } else if idx > 0 && surface.chars().any(char::is_uppercase) {
        PosTag::Propn
    } else {
        PosTag::Noun
    }
}

fn assign_dependencies(tokens: &mut [DocToken]) {
    let root = tokens
        .iter()
        .position(|t| t.pos == PosTag::Verb)
        .unwrap_or(0);

    for i in 0..tokens.len() {
        let dep = if i == root {
            "ROOT"
        } else {
            match tokens[i].pos {
                PosTag::Det => "det",
                PosTag::Adp => "case",
                PosTag::Cconj => "cc",
                PosTag::Punct => "punct",
                PosTag::Num => "nummod",
                PosTag::Adj => "amod",
                PosTag::Verb | PosTag::Pron => "dep",
                PosTag::Noun | PosTag::Propn | PosTag::X => {
                    let governed_by_de = tokens[..i]
                        .iter()
                        .rev()
                        .find(|t| t.pos != PosTag::Det)
                        .map(|t| t.lower == "de" || t.lower == "del")
                        .unwrap_or(false);
                    if governed_by_de {
                        "nmod"
                    } else {
                        "obj"
                    }
                }
            }
        };
        tokens[i].dep = dep.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyze(text: &str) -> Doc {
        Analyzer::new().analyze(text)
    }

    #[test]
    fn test_email_and_number_tokens() {
        let doc = analyze("Insertar en la tabla usuarios a Ana con edad 30 y email ana@mail.com");
        let email = doc.tokens.last().unwrap();
        assert!(email.like_email);
        assert_eq!(email.text, "ana@mail.com");

        let num = doc.iter().find(|t| t.text == "30").unwrap();
        assert!(num.like_num);
        assert_eq!(num.pos, PosTag::Num);
    }

    #[test]
    fn test_proper_nouns_are_not_sentence_initial() {
        let doc = analyze("Modificar el precio del producto iPhone a 999");
        assert_eq!(doc.tokens[0].pos, PosTag::Verb);
        assert_eq!(doc.tokens[0].dep, "ROOT");
        let iphone = doc.iter().find(|t| t.text == "iPhone").unwrap();
        assert!(iphone.is_propn());
        assert_eq!(iphone.dep, "obj");
    }

    #[test]
    fn test_enclitic_imperative_lemma() {
        let doc = analyze("Muéstrame el precio máximo");
        assert_eq!(doc.tokens[0].lemma, "mostrar");
        assert_eq!(doc.tokens[0].pos, PosTag::Verb);
        assert_eq!(doc.tokens[3].lemma, "maximo");
        assert_eq!(doc.tokens[3].pos, PosTag::Adj);
    }

    #[test]
    fn test_quoted_literal_is_single_token() {
        let doc = analyze("Mostrar usuarios con nombre \"Ana María\"");
        let quoted = doc.tokens.last().unwrap();
        assert!(quoted.is_quoted);
        assert_eq!(quoted.text, "Ana María");
    }

    #[test]
    fn test_apostrophe_inside_a_name() {
        let doc = analyze("Mostrar usuarios con nombre O'Brien");
        assert_eq!(doc.len(), 5);
        let name = doc.tokens.last().unwrap();
        assert_eq!(name.text, "O'Brien");
        assert!(name.is_propn());
        assert!(!name.is_quoted);

        let doc = analyze("Mostrar usuarios con nombre 'Ana'");
        assert_eq!(doc.tokens.last().unwrap().text, "Ana");
        assert!(doc.tokens.last().unwrap().is_quoted);
    }

    #[test]
    fn test_nmod_after_de() {
        let doc = analyze("Borrar el registro de Luis");
        let luis = doc.tokens.last().unwrap();
        assert_eq!(luis.dep, "nmod");
        assert!(luis.is_propn());
    }

    #[test]
    fn test_punctuation_flags() {
        let doc = analyze("id, nombre");
        assert!(doc.tokens[1].is_punct);
        assert_eq!(doc.tokens[1].pos, PosTag::Punct);
    }
}
