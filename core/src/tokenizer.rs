//! Tokenization and cross-script expansion for Uzbek text.
//!
//! The corpus mixes Cyrillic and Latin spellings of the same language, so
//! every token can be approximated in the other script via a fixed digraph
//! table (`sh`⇄`ш`, `o'`⇄`ў`, ...). The mapping is intentionally lossy:
//! Cyrillic `х` and `ҳ` collapse onto `x`/`h`, word-initial `е` is mapped
//! plainly to `e`, and `ц` becomes `ts`. Expanded variants only widen
//! recall; they are never a correctness-critical transliteration.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    // Maximal runs over the two-script alphabet; the apostrophe continues a
    // run (oʻ/gʻ) but never starts one.
    static ref RE_TOKEN: Regex =
        Regex::new(r"[0-9a-zа-яёўқғҳ][0-9a-zа-яёўқғҳ']*").expect("valid regex");
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "ва", "ёки", "ҳам", "аммо", "учун", "билан", "бўйича", "тўғрисида",
            "мазкур", "ушбу", "шу", "бу", "ана", "у", "улар", "сиз", "биз", "мен", "сен",
            "қилади", "қилиш", "қилинган", "этилади", "этилган",
            "бўлса", "бўлади", "керак", "шарт", "мумкин", "эмас",
            "ҳақида", "асосида", "бўлган", "бўлгани", "бўлганда", "қилинса", "қилинг",
        ];
        words.iter().copied().collect()
    };
}

const LAT_TO_CYR_DIGRAPHS: &[(&str, &str)] = &[
    ("o'", "ў"),
    ("g'", "ғ"),
    ("sh", "ш"),
    ("ch", "ч"),
    ("yo", "ё"),
    ("yu", "ю"),
    ("ya", "я"),
];

const LAT_TO_CYR: &[(char, char)] = &[
    ('a', 'а'), ('b', 'б'), ('d', 'д'), ('e', 'е'), ('f', 'ф'), ('g', 'г'),
    ('h', 'ҳ'), ('i', 'и'), ('j', 'ж'), ('k', 'к'), ('l', 'л'), ('m', 'м'),
    ('n', 'н'), ('o', 'о'), ('p', 'п'), ('q', 'қ'), ('r', 'р'), ('s', 'с'),
    ('t', 'т'), ('u', 'у'), ('v', 'в'), ('x', 'х'), ('y', 'й'), ('z', 'з'),
];

const CYR_TO_LAT: &[(char, &str)] = &[
    ('ғ', "g'"), ('ў', "o'"), ('ш', "sh"), ('ч', "ch"), ('ё', "yo"),
    ('ю', "yu"), ('я', "ya"), ('ц', "ts"), ('щ', "sh"),
    ('ҳ', "h"), ('қ', "q"), ('х', "x"), ('ж', "j"),
    ('а', "a"), ('б', "b"), ('в', "v"), ('г', "g"), ('д', "d"), ('е', "e"),
    ('з', "z"), ('и', "i"), ('й', "y"), ('к', "k"), ('л', "l"), ('м', "m"),
    ('н', "n"), ('о', "o"), ('п', "p"), ('р', "r"), ('с', "s"), ('т', "t"),
    ('у', "u"), ('ф', "f"), ('ъ', "'"), ('ы', "i"), ('э', "e"),
];

fn is_stopword(token: &str) -> bool {
    STOPWORDS.contains(token)
        || script_expand(token).iter().any(|v| STOPWORDS.contains(v.as_str()))
}

/// Tokenize text into lowercase terms: NFKC normalization, apostrophe
/// unification, maximal alphabet runs, terms shorter than 2 chars dropped.
/// Never fails on mixed-script or punctuation-laden input.
pub fn tokenize(text: &str) -> Vec<String> {
    let normalized: String = text
        .nfkc()
        .collect::<String>()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'ʻ' | 'ʼ' | '’' | '‘' | '`' => '\'',
            c => c,
        })
        .collect();
    RE_TOKEN
        .find_iter(&normalized)
        .map(|m| trim_stray_apostrophe(m.as_str()).to_string())
        .filter(|t| t.chars().count() >= 2)
        .collect()
}

// A trailing apostrophe belongs to the token only after o/g (oʻ, gʻ);
// anything else is a stray closing quote, possibly doubled.
fn trim_stray_apostrophe(token: &str) -> &str {
    let mut tok = token;
    while let Some(rest) = tok.strip_suffix('\'') {
        if rest.ends_with('o') || rest.ends_with('g') {
            break;
        }
        tok = rest;
    }
    tok
}

fn to_cyrillic(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    let mut out = String::with_capacity(token.len());
    let mut i = 0;
    while i < chars.len() {
        if i + 1 < chars.len() {
            let pair: String = chars[i..i + 2].iter().collect();
            if let Some(&(_, cyr)) = LAT_TO_CYR_DIGRAPHS.iter().find(|(lat, _)| *lat == pair) {
                out.push_str(cyr);
                i += 2;
                continue;
            }
        }
        let c = chars[i];
        out.push(
            LAT_TO_CYR
                .iter()
                .find(|(lat, _)| *lat == c)
                .map(|&(_, cyr)| cyr)
                .unwrap_or(c),
        );
        i += 1;
    }
    out
}

fn to_latin(token: &str) -> String {
    let mut out = String::with_capacity(token.len());
    for c in token.chars() {
        match CYR_TO_LAT.iter().find(|(cyr, _)| *cyr == c) {
            Some(&(_, lat)) => out.push_str(lat),
            None => {
                // ь carries no segmental value in either script
                if c != 'ь' {
                    out.push(c);
                }
            }
        }
    }
    out
}

/// Approximate a token in the other script. Returns only variants that
/// differ from the input, so digit-only or unmappable tokens yield nothing.
pub fn script_expand(token: &str) -> Vec<String> {
    let mut variants = Vec::new();
    for v in [to_cyrillic(token), to_latin(token)] {
        if !v.is_empty() && v != token && !variants.contains(&v) {
            variants.push(v);
        }
    }
    variants
}

/// Pull the most frequent content words out of free text (an HR order, a
/// resolution draft) for use as search keywords. Words shorter than 3 chars,
/// bare numbers, and stopwords in either script are skipped; ties broken by
/// longer word first, then alphabetically.
pub fn extract_keywords(text: &str, max_keywords: usize) -> Vec<String> {
    let mut freq: HashMap<String, u32> = HashMap::new();
    for tok in tokenize(text) {
        if tok.chars().count() < 3 {
            continue;
        }
        if tok.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }
        if is_stopword(&tok) {
            continue;
        }
        *freq.entry(tok).or_insert(0) += 1;
    }
    let mut ranked: Vec<(String, u32)> = freq.into_iter().collect();
    ranked.sort_by(|a, b| {
        b.1.cmp(&a.1)
            .then(b.0.chars().count().cmp(&a.0.chars().count()))
            .then(a.0.cmp(&b.0))
    });
    ranked.into_iter().take(max_keywords).map(|(w, _)| w).collect()
}
