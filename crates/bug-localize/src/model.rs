//! Core data model: the corpus of source documents and the bug reports
//! queried against it.

use std::collections::HashMap;

/// One indexed source file. Immutable once built; `tokens` and `embedding`
/// are derived from `raw_text` under a single, fixed normalizer
/// configuration for the lifetime of the indexes built over it.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Stable file path, relative to the corpus root.
    pub id: String,
    pub raw_text: String,
    pub tokens: Vec<String>,
    pub embedding: Vec<f32>,
}

/// An ordered sequence of [`Document`]s, addressed by a corpus position
/// `i in [0, N)` fixed for the lifetime of the indexes built over it. BM25
/// and dense indexes are both addressed by this same position, so their
/// scores can be combined positionally without a join.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Corpus {
    documents: Vec<Document>,
    position_by_id: HashMap<String, u32>,
}

impl Corpus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a document, assigning it the next corpus position.
    pub fn push(&mut self, document: Document) {
        let position = self.documents.len() as u32;
        self.position_by_id.insert(document.id.clone(), position);
        self.documents.push(document);
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn get(&self, position: u32) -> Option<&Document> {
        self.documents.get(position as usize)
    }

    pub fn position_of(&self, id: &str) -> Option<u32> {
        self.position_by_id.get(id).copied()
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.position_by_id.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.documents.iter().map(|d| d.id.as_str())
    }
}

/// One named way of turning a bug report into a retrieval query: a query
/// family (basic/keybert/reason) crossed with baseline/extended text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VariantDescriptor {
    /// e.g. `"basic-baseline"`, `"keybert-extended"`.
    pub name: String,
    /// Suffix used when naming the persisted ranked-result file for this variant.
    pub result_suffix: String,
}

impl VariantDescriptor {
    pub fn new(family: &str, extent: &str) -> Self {
        Self {
            name: format!("{}-{}", family, extent),
            result_suffix: format!("{}_{}_query_result", extent, family),
        }
    }

    /// The six variants named in spec.md §3: basic/keybert/reason crossed
    /// with baseline/extended.
    pub fn all() -> Vec<VariantDescriptor> {
        let mut out = Vec::with_capacity(6);
        for family in ["basic", "keybert", "reason"] {
            for extent in ["baseline", "extended"] {
                out.push(VariantDescriptor::new(family, extent));
            }
        }
        out
    }
}

/// A bug report: its raw text, the OCR-extended text, and the query-token
/// variants derived from it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BugReport {
    pub id: String,
    pub raw_text: String,
    pub extended_text: String,
    /// `variant name -> query tokens`, populated by the query builder.
    pub variants: HashMap<String, Vec<String>>,
}

impl BugReport {
    pub fn new(id: impl Into<String>, raw_text: impl Into<String>, extended_text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            raw_text: raw_text.into(),
            extended_text: extended_text.into(),
            variants: HashMap::new(),
        }
    }

    pub fn variant(&self, name: &str) -> Option<&[String]> {
        self.variants.get(name).map(|v| v.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corpus_assigns_sequential_positions() {
        let mut corpus = Corpus::new();
        corpus.push(Document { id: "a.py".into(), raw_text: "".into(), tokens: vec![], embedding: vec![] });
        corpus.push(Document { id: "b.py".into(), raw_text: "".into(), tokens: vec![], embedding: vec![] });

        assert_eq!(corpus.position_of("a.py"), Some(0));
        assert_eq!(corpus.position_of("b.py"), Some(1));
        assert_eq!(corpus.get(1).unwrap().id, "b.py");
    }

    #[test]
    fn variant_descriptor_names_and_suffixes_match_spec_naming() {
        let all = VariantDescriptor::all();
        assert_eq!(all.len(), 6);
        assert!(all.iter().any(|v| v.name == "basic-baseline"));
        assert!(all.iter().any(|v| v.name == "keybert-extended"));
        assert!(all.iter().any(|v| v.name == "reason-baseline"));
    }
}
