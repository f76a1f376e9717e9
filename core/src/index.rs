use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::tokenizer::{script_expand, tokenize};

pub type DocId = u32;

/// One addressable clause (or fallback chunk) of a statute. Created by
/// segmentation and immutable afterwards; rebuilt wholesale on reindex.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleRecord {
    pub id: String,
    /// Source category key, e.g. "mehnat" for the labor code.
    pub source: String,
    /// Clause numeral in string form; `None` for fallback chunks. Duplicate
    /// labels are legitimate (repealed-and-reissued clauses).
    pub clause_label: Option<String>,
    pub title: String,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    pub tf: u32,
}

/// Immutable query-side view: the document store (position = [`DocId`]),
/// inverted postings, and the derived IDF table. Safe to share across any
/// number of concurrent readers.
#[derive(Debug, Default)]
pub struct SearchIndex {
    pub sources: Vec<String>,
    pub docs: Vec<ArticleRecord>,
    pub postings: HashMap<String, Vec<Posting>>,
    pub idf: HashMap<String, f32>,
}

/// Single-pass batch builder. Records are appended in arrival order; term
/// frequencies are counted over the combined multiset of original tokens and
/// their cross-script variants so either spelling matches at query time.
#[derive(Default)]
pub struct IndexBuilder {
    sources: Vec<String>,
    docs: Vec<ArticleRecord>,
    postings: HashMap<String, Vec<Posting>>,
}

impl IndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_record(&mut self, record: ArticleRecord) {
        let doc_id = self.docs.len() as DocId;
        if !self.sources.iter().any(|s| s == &record.source) {
            self.sources.push(record.source.clone());
        }
        let mut counts: HashMap<String, u32> = HashMap::new();
        for tok in tokenize(&record.text) {
            for variant in script_expand(&tok) {
                *counts.entry(variant).or_insert(0) += 1;
            }
            *counts.entry(tok).or_insert(0) += 1;
        }
        for (term, tf) in counts {
            self.postings.entry(term).or_default().push(Posting { doc_id, tf });
        }
        self.docs.push(record);
    }

    /// Append one document's records, preserving their source order.
    pub fn add_records(&mut self, records: Vec<ArticleRecord>) {
        for rec in records {
            self.add_record(rec);
        }
    }

    /// Freeze the batch: sort posting lists and derive the IDF table from
    /// the final document-frequency counts.
    pub fn finish(mut self) -> SearchIndex {
        for plist in self.postings.values_mut() {
            plist.sort_by_key(|p| p.doc_id);
        }
        let idf = compute_idf(self.docs.len(), &self.postings);
        SearchIndex {
            sources: self.sources,
            docs: self.docs,
            postings: self.postings,
            idf,
        }
    }
}

// idf(t) = ln((N+1)/(df+1)) + 1: always positive, no division by zero even
// for an empty corpus.
pub(crate) fn compute_idf(
    num_docs: usize,
    postings: &HashMap<String, Vec<Posting>>,
) -> HashMap<String, f32> {
    let n = num_docs as f32;
    postings
        .iter()
        .map(|(term, plist)| {
            let df = plist.len() as f32;
            (term.clone(), ((n + 1.0) / (df + 1.0)).ln() + 1.0)
        })
        .collect()
}
