use super::lexicon;
use crate::ontology::Ontology;
use std::collections::HashMap;

/// Maps single-word lemmas onto canonical concept names.
#[derive(Debug, Clone, Default)]
pub struct SynonymMap {
    map: HashMap<String, String>,
}

impl SynonymMap {
    pub fn new() -> Self {
        let map = lexicon::VERB_SYNONYMS
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self { map }
    }

    /// Verb synonyms plus every single-word table/column alias of the ontology.
    pub fn from_ontology(ontology: &Ontology) -> Self {
        let mut syn = Self::new();
        for table in ontology.tables() {
            syn.insert(&table.name, &table.name);
            for alias in &table.aliases {
                syn.insert(alias, &table.name);
            }
        }
        for column in ontology.columns() {
            for alias in column.aliases.iter().chain(column.units.iter()) {
                syn.insert(alias, &column.name);
            }
        }
        syn
    }

    pub fn insert(&mut self, alias: &str, canonical: &str) {
        let folded = lexicon::fold(alias);
        if folded.contains(' ') {
            return;
        }
        let lemma = lexicon::lemmatize(&folded);
        if lemma != canonical {
            self.map.insert(lemma, canonical.to_string());
        }
    }

    pub fn normalize(&self, lemma: &str) -> String {
        self.map
            .get(lemma)
            .cloned()
            .unwrap_or_else(|| lemma.to_string())
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verb_synonyms() {
        let syn = SynonymMap::new();
        assert_eq!(syn.normalize("anadir"), "insertar");
        assert_eq!(syn.normalize("listar"), "mostrar");
        assert_eq!(syn.normalize("tabla"), "tabla");
    }

    #[test]
    fn test_ontology_aliases() {
        let onto = Ontology::load_default().unwrap();
        let syn = SynonymMap::from_ontology(&onto);
        assert_eq!(syn.normalize("correo"), "email");
        assert_eq!(syn.normalize("articulo"), "productos");
        assert_eq!(syn.normalize("ano"), "edad");
    }
}
