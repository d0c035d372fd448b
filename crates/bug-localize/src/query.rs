//! Turning a bug report's raw text into the six query variants named in
//! spec.md §3, through one orchestrator parameterized by a
//! [`VariantDescriptor`] rather than copy-pasted per-family pipelines.

use std::collections::HashSet;

use crate::collaborators::{KeywordExtractor, Reasoner};
use crate::error::BugLocalizeError;
use crate::model::{BugReport, VariantDescriptor};
use crate::text::{normalize, tokenize};

pub struct QueryBuilder<'a> {
    stopwords: &'a HashSet<String>,
    top_n_keywords: usize,
    keyword_extractor: &'a dyn KeywordExtractor,
    reasoner: &'a dyn Reasoner,
}

impl<'a> QueryBuilder<'a> {
    pub fn new(
        stopwords: &'a HashSet<String>,
        top_n_keywords: usize,
        keyword_extractor: &'a dyn KeywordExtractor,
        reasoner: &'a dyn Reasoner,
    ) -> Self {
        Self { stopwords, top_n_keywords, keyword_extractor, reasoner }
    }

    /// Populate every variant in [`VariantDescriptor::all`] on `bug`.
    ///
    /// A variant whose source text is empty (no bug text, no OCR content,
    /// no extractor/reasoner output) is stored as an empty token list, never
    /// an error: a later localize call on it yields an empty ranking.
    pub fn build_all(&self, bug: &mut BugReport) -> Result<(), BugLocalizeError> {
        for descriptor in VariantDescriptor::all() {
            let tokens = self.build_variant(&descriptor, bug)?;
            bug.variants.insert(descriptor.name, tokens);
        }
        Ok(())
    }

    fn source_text<'b>(&self, extent: &str, bug: &'b BugReport) -> &'b str {
        if extent == "extended" {
            &bug.extended_text
        } else {
            &bug.raw_text
        }
    }

    fn build_variant(&self, descriptor: &VariantDescriptor, bug: &BugReport) -> Result<Vec<String>, BugLocalizeError> {
        let (family, extent) = descriptor
            .name
            .split_once('-')
            .expect("VariantDescriptor::name is always \"<family>-<extent>\"");
        let raw = self.source_text(extent, bug);

        match family {
            "basic" => Ok(tokenize(&normalize(raw, self.stopwords))),
            "keybert" => {
                let normalized = normalize(raw, self.stopwords);
                if normalized.is_empty() {
                    return Ok(Vec::new());
                }
                self.keyword_extractor.extract(&normalized, self.top_n_keywords)
            }
            "reason" => {
                if raw.is_empty() {
                    return Ok(Vec::new());
                }
                let rewritten = self.reasoner.reason(raw)?;
                Ok(tokenize(&normalize(&rewritten, self.stopwords)))
            }
            other => unreachable!("unknown query variant family: {other}"),
        }
    }
}
