//! Splitting one statute's raw text into addressable clause records.
//!
//! Heading detection is a per-line classifier, not a whole-text regex scan,
//! so a heading can never leak text from the following clause and the
//! heuristic stays unit-testable on single lines.

use lazy_static::lazy_static;
use regex::Regex;

use crate::ArticleRecord;

lazy_static! {
    // "14-модда. Title" / "14 – modda: Title"
    static ref RE_HEAD_NUM_FIRST: Regex =
        Regex::new(r"(?i)^\s*([0-9]{1,4})\s*[-–—]\s*(?:модда|modda)\b\s*[.:\-–—]?\s*(.*)$")
            .expect("valid regex");
    // "Модда 14. Title" / "modda 14 Title"; the boundary keeps a 5+ digit
    // run from being misread as a 4-digit label plus title
    static ref RE_HEAD_WORD_FIRST: Regex =
        Regex::new(r"(?i)^\s*(?:модда|modda)\s*([0-9]{1,4})\b\s*[.:\-–—]?\s*(.*)$")
            .expect("valid regex");
    static ref RE_HSPACE: Regex = Regex::new(r"[ \t\u{a0}]+").expect("valid regex");
    static ref RE_BLANKS: Regex = Regex::new(r"\n{3,}").expect("valid regex");
}

/// Thresholds for segmentation. The source corpora never settled on exact
/// values, so they are configuration rather than constants.
#[derive(Debug, Clone)]
pub struct SegmentConfig {
    /// Minimum clause body length in chars; shorter records are noise
    /// (stray headings, trailing fragments) and get dropped.
    pub min_article_len: usize,
    /// Minimum fallback-chunk length in chars.
    pub min_chunk_len: usize,
    /// Target chunk size in chars for documents without detectable clauses.
    /// Paragraphs are never split across chunks.
    pub chunk_target: usize,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            min_article_len: 40,
            min_chunk_len: 80,
            chunk_target: 2000,
        }
    }
}

/// What a single line means to the segmenter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    /// The line opens clause `label`, with whatever trailing text it carried.
    Heading { label: String, title: String },
    /// Continuation of the current clause (or preamble).
    Body,
}

/// Classify one line of normalized text.
pub fn classify_line(line: &str) -> LineKind {
    for re in [&*RE_HEAD_NUM_FIRST, &*RE_HEAD_WORD_FIRST] {
        if let Some(caps) = re.captures(line) {
            return LineKind::Heading {
                label: caps[1].to_string(),
                title: caps.get(2).map_or(String::new(), |m| m.as_str().trim().to_string()),
            };
        }
    }
    LineKind::Body
}

/// Normalize whitespace: CRLF/CR to LF, BOM stripped, horizontal runs
/// collapsed to one space, 3+ newlines collapsed to a blank line, trimmed.
pub fn normalize_spaces(raw: &str) -> String {
    let s = raw
        .trim_start_matches('\u{feff}')
        .replace("\r\n", "\n")
        .replace('\r', "\n");
    let s = RE_HSPACE.replace_all(&s, " ");
    let s = RE_BLANKS.replace_all(&s, "\n\n");
    s.trim().to_string()
}

/// Split one document into ordered clause records. Each detected heading
/// opens a record spanning up to the next heading; documents without any
/// heading fall back to paragraph-aligned chunks. Source order is kept as-is
/// (clause numerals need not be monotonic in the original text).
pub fn segment(source: &str, raw: &str, cfg: &SegmentConfig) -> Vec<ArticleRecord> {
    let text = normalize_spaces(raw);
    if text.is_empty() {
        return Vec::new();
    }
    let lines: Vec<&str> = text.lines().collect();
    let mut headings: Vec<(usize, String, String)> = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        if let LineKind::Heading { label, title } = classify_line(line) {
            headings.push((i, label, title));
        }
    }
    if headings.is_empty() {
        return chunk_fallback(source, &text, cfg);
    }

    let mut records = Vec::new();
    for (k, (start, label, title)) in headings.iter().enumerate() {
        let end = headings.get(k + 1).map_or(lines.len(), |h| h.0);
        let body = lines[*start..end].join("\n").trim().to_string();
        if body.chars().count() < cfg.min_article_len {
            continue;
        }
        records.push(ArticleRecord {
            id: format!("{source}:{label}"),
            source: source.to_string(),
            clause_label: Some(label.clone()),
            title: title.clone(),
            text: body,
        });
    }
    records
}

// Paragraph-aligned chunking for documents where no clause heading was
// found. Joining the chunk bodies with blank lines reproduces the
// normalized input exactly (before the minimum-length filter).
fn chunk_fallback(source: &str, text: &str, cfg: &SegmentConfig) -> Vec<ArticleRecord> {
    let mut chunks: Vec<String> = Vec::new();
    let mut buf = String::new();
    for para in text.split("\n\n") {
        if !buf.is_empty() && buf.chars().count() + para.chars().count() + 2 > cfg.chunk_target {
            chunks.push(std::mem::take(&mut buf));
        }
        if !buf.is_empty() {
            buf.push_str("\n\n");
        }
        buf.push_str(para);
    }
    if !buf.is_empty() {
        chunks.push(buf);
    }
    chunks
        .into_iter()
        .enumerate()
        .filter(|(_, c)| c.chars().count() >= cfg.min_chunk_len)
        .map(|(i, c)| ArticleRecord {
            id: format!("{source}:chunk{}", i + 1),
            source: source.to_string(),
            clause_label: None,
            title: String::new(),
            text: c,
        })
        .collect()
}
