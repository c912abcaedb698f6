//! Title normalization shared by indexing and querying.
//!
//! [`normalize`] is pure and total: any string (including `""`) yields a value.
//! The same function tokenizes taxonomy labels for the lexical index and incoming
//! product titles, so both sides of a BM25 match see identical tokens.

#[cfg(test)]
mod tests;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Joins the words of a protected term so later passes see one word. Input never
/// carries it: punctuation, `_` included, is stripped first.
const PROTECT: char = '_';

/// Domain terms that must survive packaging/size stripping. Longest first.
const PROTECTED_TERMS: &[&str] = &[
    "sans sucres ajoutes",
    "sans sucre ajoute",
    "sans sucre",
    "sans gluten",
    "sans lactose",
    "sans sel",
    "pur beurre",
    "pur jus",
    "bio",
    "halal",
    "casher",
    "vegan",
];

static PROTECTED_RE: Lazy<Regex> = Lazy::new(|| {
    let alternation = PROTECTED_TERMS
        .iter()
        .map(|t| regex::escape(t))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"\b(?:{alternation})\b")).expect("invalid PROTECTED_RE")
});

/// Packaging and quantity patterns, applied in order.
static PACKAGING_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // 6x33cl, 4 x 125 g, 2x1.5l
        r"\b\d+\s*x\s*\d+(?:\.\d+)?\s*(?:cl|ml|dl|l|g|gr|kg|mg)?\b",
        // x12
        r"\bx\s*\d+\b",
        // 33cl, 1l, 250g, 1.5 l, 500 grammes
        r"\b\d+(?:\.\d+)?\s*(?:cl|ml|dl|l|litres?|g|gr|grammes?|kg|mg)\b",
        // pack de 6, lot, flacon, sachets
        r"\b(?:packs?|lots?|flacons?|sachets?)(?:\s+de)?(?:\s+\d+)?\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("invalid packaging pattern"))
    .collect()
});

static SIZE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:xxs|xs|s|m|l|xl|xxl|xxxl)\b").expect("invalid SIZE_RE")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Canonical form of one title.
pub struct NormalizedTitle {
    pub original: String,
    pub normalized: String,
    /// Distinct whitespace-separated words of `normalized`, first occurrence order.
    pub tokens: Vec<String>,
}

impl NormalizedTitle {
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Normalizes a product title or taxonomy label.
pub fn normalize(original: &str) -> NormalizedTitle {
    let lowered = original.to_lowercase();
    let folded = fold_diacritics(&lowered);

    let stripped = strip_punctuation(&folded);
    let mut text = PROTECTED_RE
        .replace_all(&stripped, |caps: &regex::Captures<'_>| {
            caps[0].replace(' ', &PROTECT.to_string())
        })
        .into_owned();

    // Removing one match can bring a quantity's parts together; repeat until stable.
    loop {
        let next = strip_packaging_and_sizes(&text);
        if next == text {
            break;
        }
        text = next;
    }
    let restored = text.replace(PROTECT, " ");

    let normalized = restored.split_whitespace().collect::<Vec<_>>().join(" ");
    let tokens = dedup_tokens(&normalized);

    NormalizedTitle {
        original: original.to_string(),
        normalized,
        tokens,
    }
}

/// Tokens of `text` after normalization.
pub fn tokenize(text: &str) -> Vec<String> {
    normalize(text).tokens
}

fn fold_diacritics(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.nfd().filter(|c| !is_combining_mark(*c)) {
        match c {
            'œ' => out.push_str("oe"),
            'æ' => out.push_str("ae"),
            'ß' => out.push_str("ss"),
            _ => out.push(c),
        }
    }
    out
}

fn strip_packaging_and_sizes(text: &str) -> String {
    let mut out = text.to_string();
    for re in PACKAGING_RES.iter().chain(std::iter::once(&*SIZE_RE)) {
        out = re.replace_all(&out, " ").into_owned();
    }
    out
}

/// Replaces every non-alphanumeric character (`_` included) with a space. A `.` or `,`
/// between two digits is kept (as `.`) so decimal quantities like `1,5l` stay intact for
/// the quantity patterns.
fn strip_punctuation(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    for (i, &c) in chars.iter().enumerate() {
        if c.is_alphanumeric() || c.is_whitespace() {
            out.push(c);
        } else if (c == '.' || c == ',')
            && i > 0
            && chars[i - 1].is_ascii_digit()
            && chars.get(i + 1).is_some_and(|n| n.is_ascii_digit())
        {
            out.push('.');
        } else {
            out.push(' ');
        }
    }
    out
}

fn dedup_tokens(normalized: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    normalized
        .split_whitespace()
        .filter(|t| seen.insert(*t))
        .map(str::to_string)
        .collect()
}
