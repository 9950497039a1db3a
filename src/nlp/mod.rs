//! Linguistic front-end: preprocessing, analysis and synonym normalisation.

pub mod analyzer;
pub mod lexicon;
pub mod preprocess;
pub mod synonyms;

use crate::error::Result;
use crate::ontology::{Mention, Ontology};
use crate::token::{self, ReductionMode, Token};
use analyzer::{Analyzer, Doc};
use synonyms::SynonymMap;

/// Bundles the analyzer with the ontology and synonyms it is tuned to.
#[derive(Debug, Clone)]
pub struct Nlp {
    analyzer: Analyzer,
    pub ontology: Ontology,
    pub syn: SynonymMap,
}

impl Nlp {
    pub fn new(ontology: Ontology) -> Self {
        let syn = SynonymMap::from_ontology(&ontology);
        Self {
            analyzer: Analyzer::new(),
            ontology,
            syn,
        }
    }

    pub fn preprocess(&self, text: &str) -> Result<String> {
        preprocess::preprocess(text)
    }

    pub fn doc(&self, text: &str) -> Doc {
        self.analyzer.analyze(text)
    }

    pub fn mentions(&self, doc: &Doc) -> Vec<Mention> {
        self.ontology.mentions(doc)
    }

    pub fn to_tokens(&self, doc: &Doc, mentions: &[Mention], mode: ReductionMode) -> Vec<Token> {
        token::to_tokens(doc, mentions, mode, &self.syn)
    }
}
