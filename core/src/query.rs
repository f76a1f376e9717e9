//! Ranked querying against a built [`SearchIndex`].

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::tokenizer::{script_expand, tokenize};
use crate::{DocId, SearchIndex};

lazy_static! {
    static ref RE_NUMERAL: Regex = Regex::new(r"\b[0-9]{1,4}\b").expect("valid regex");
}

pub const DEFAULT_LIMIT: usize = 20;

/// Query-side knobs. Snippet caps varied between 250 and 450 chars across
/// deployments, so the cap is configuration rather than a constant.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Snippet character cap before the truncation marker.
    pub snippet_len: usize,
    /// Fixed bonus added when a bare numeral in the query equals a record's
    /// clause label, so "14" surfaces clause 14 above incidental mentions.
    pub label_boost: f32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { snippet_len: 400, label_boost: 5.0 }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub doc_id: DocId,
    pub source: String,
    pub clause_label: Option<String>,
    pub title: String,
    pub snippet: String,
    pub score: f32,
}

impl SearchIndex {
    /// Rank the corpus against a free-text or clause-number query.
    /// Empty/whitespace queries, unmatched queries, and filters matching no
    /// document all yield an empty list, never an error.
    pub fn search(&self, query: &str, source_filter: Option<&str>, limit: usize) -> Vec<SearchHit> {
        self.search_with(query, source_filter, limit, &SearchConfig::default())
    }

    pub fn search_with(
        &self,
        query: &str,
        source_filter: Option<&str>,
        limit: usize,
        cfg: &SearchConfig,
    ) -> Vec<SearchHit> {
        if query.trim().is_empty() {
            return Vec::new();
        }

        // Match set: query tokens plus their cross-script variants, deduped.
        let mut terms: Vec<String> = Vec::new();
        for tok in tokenize(query) {
            for v in script_expand(&tok) {
                if !terms.contains(&v) {
                    terms.push(v);
                }
            }
            if !terms.contains(&tok) {
                terms.push(tok);
            }
        }

        let mut scores: HashMap<DocId, f32> = HashMap::new();
        for term in &terms {
            let Some(plist) = self.postings.get(term) else { continue };
            let idf = self.idf.get(term).copied().unwrap_or(1.0);
            for p in plist {
                if let Some(f) = source_filter {
                    if self.docs[p.doc_id as usize].source != f {
                        continue;
                    }
                }
                // sublinear tf scaling: repeats matter less and less
                *scores.entry(p.doc_id).or_insert(0.0) += (1.0 + (1.0 + p.tf as f32).ln()) * idf;
            }
        }

        // Exact clause-number boost. Inserted even when no token matched, so
        // a bare "14" always surfaces clause 14 within the filtered corpus.
        let numerals: HashSet<&str> = RE_NUMERAL.find_iter(query).map(|m| m.as_str()).collect();
        if !numerals.is_empty() {
            for (i, doc) in self.docs.iter().enumerate() {
                let Some(label) = doc.clause_label.as_deref() else { continue };
                if !numerals.contains(label) {
                    continue;
                }
                if let Some(f) = source_filter {
                    if doc.source != f {
                        continue;
                    }
                }
                *scores.entry(i as DocId).or_insert(0.0) += cfg.label_boost;
            }
        }

        let mut ranked: Vec<(DocId, f32)> = scores.into_iter().collect();
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        ranked.truncate(limit);

        ranked
            .into_iter()
            .map(|(doc_id, score)| {
                let doc = &self.docs[doc_id as usize];
                SearchHit {
                    doc_id,
                    source: doc.source.clone(),
                    clause_label: doc.clause_label.clone(),
                    title: doc.title.clone(),
                    snippet: make_snippet(&doc.text, &terms, cfg.snippet_len),
                    score,
                }
            })
            .collect()
    }
}

/// Length-capped excerpt of the body, centered on the first matched term
/// when one occurs literally, otherwise a plain prefix. Window arithmetic is
/// done over chars, not bytes, since the corpus is mostly multi-byte.
fn make_snippet(text: &str, terms: &[String], cap: usize) -> String {
    let flat: String = text.chars().map(|c| if c == '\n' { ' ' } else { c }).collect();
    let chars: Vec<char> = flat.chars().collect();
    if chars.len() <= cap {
        return flat;
    }

    let lower: String = chars
        .iter()
        .map(|c| c.to_lowercase().next().unwrap_or(*c))
        .collect();
    let mut first: Option<usize> = None;
    for t in terms {
        if let Some(byte_idx) = lower.find(t.as_str()) {
            let char_idx = lower[..byte_idx].chars().count();
            first = Some(first.map_or(char_idx, |f| f.min(char_idx)));
        }
    }

    let start = match first {
        Some(i) if i > cap / 2 => i - cap / 4,
        _ => 0,
    };
    let end = (start + cap).min(chars.len());
    let mut out = String::new();
    if start > 0 {
        out.push('…');
    }
    out.extend(&chars[start..end]);
    if end < chars.len() {
        out.push_str(" …");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_body_passes_through() {
        let s = make_snippet("иш ҳақи\nва таътил", &[], 400);
        assert_eq!(s, "иш ҳақи ва таътил");
    }

    #[test]
    fn long_body_truncated_with_marker() {
        let body = "а".repeat(500);
        let s = make_snippet(&body, &[], 100);
        assert_eq!(s.chars().count(), 102); // 100 + " …"
        assert!(s.ends_with(" …"));
    }

    #[test]
    fn snippet_centers_on_match() {
        let mut body = "х".repeat(300);
        body.push_str(" таътил ");
        body.push_str(&"у".repeat(300));
        let s = make_snippet(&body, &["таътил".to_string()], 100);
        assert!(s.contains("таътил"));
        assert!(s.starts_with('…'));
        assert!(s.ends_with(" …"));
    }
}
