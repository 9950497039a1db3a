//! Reduced token view handed to the intent handlers.

use crate::error::Nl2SqlError;
use crate::nlp::analyzer::{Doc, PosTag};
use crate::nlp::lexicon;
use crate::nlp::synonyms::SynonymMap;
use crate::ontology::Mention;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    /// Lemma after synonym normalisation
    pub lemma: String,
    pub pos: PosTag,
    pub is_stop: bool,
    pub dep: String,
    /// Index of the source token in the [`Doc`]
    pub idx: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReductionMode {
    None,
    Stopword,
    #[default]
    Protected,
}

impl FromStr for ReductionMode {
    type Err = Nl2SqlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(ReductionMode::None),
            "stopword" => Ok(ReductionMode::Stopword),
            "protected" => Ok(ReductionMode::Protected),
            other => Err(Nl2SqlError::UnknownReductionMode(other.to_string())),
        }
    }
}

impl fmt::Display for ReductionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReductionMode::None => "none",
            ReductionMode::Stopword => "stopword",
            ReductionMode::Protected => "protected",
        };
        f.write_str(s)
    }
}

pub fn to_tokens(doc: &Doc, mentions: &[Mention], mode: ReductionMode, syn: &SynonymMap) -> Vec<Token> {
    doc.iter()
        .filter(|t| match mode {
            ReductionMode::None => true,
            ReductionMode::Stopword => !t.is_stop && !t.is_punct,
            ReductionMode::Protected => {
                let protected = mentions.iter().any(|m| m.contains(t.idx))
                    || t.like_num
                    || lexicon::PROTECTED_LEMMAS.contains(t.lower.as_str());
                protected || (!t.is_stop && !t.is_punct)
            }
        })
        .map(|t| Token {
            text: t.text.clone(),
            lemma: syn.normalize(&t.lemma),
            pos: t.pos,
            is_stop: t.is_stop,
            dep: t.dep.clone(),
            idx: t.idx,
        })
        .collect()
}
