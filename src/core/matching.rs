//! Company-name normalization and fuzzy candidate selection.
//!
//! LSEG and MSCI return a candidate list instead of a single best hit; these
//! helpers pick one candidate or none.

use std::collections::HashSet;

/// Legal-form tokens ignored when comparing names.
const LEGAL_TOKENS: &[&str] = &[
    "company",
    "corporation",
    "corp",
    "co",
    "inc",
    "incorporated",
    "limited",
    "ltd",
    "plc",
    "bhd",
    "berhad",
    "public",
    "sa",
];

/// LSEG candidates need this share of the query tokens before they are scored.
pub const LSEG_MIN_OVERLAP: f64 = 0.8;
/// Lowest accepted LSEG score (inclusive).
pub const LSEG_THRESHOLD: f64 = 0.6;
/// MSCI scores must be strictly above this.
pub const MSCI_THRESHOLD: f64 = 0.5;

/// Lower-cases, turns dashes into spaces, strips punctuation and drops legal-form tokens.
///
/// `"Coca-Cola Co."` -> `"coca cola"`
pub fn normalize_name(name: &str) -> String {
    name_tokens(name).join(" ")
}

/// The tokens of [`normalize_name`], in order.
pub fn name_tokens(name: &str) -> Vec<String> {
    let cleaned: String = name
        .to_lowercase()
        .chars()
        .filter_map(|c| match c {
            '-' => Some(' '),
            c if c.is_alphanumeric() || c == '_' || c.is_whitespace() => Some(c),
            _ => None,
        })
        .collect();
    cleaned
        .split_whitespace()
        .filter(|t| !LEGAL_TOKENS.contains(t))
        .map(str::to_string)
        .collect()
}

/// LSEG candidate score, or `None` when the candidate is not eligible.
///
/// Eligible candidates share at least 80% of the query tokens; the score is
/// `0.7 * overlap + 0.3 * length_similarity` on the raw lower-cased names.
pub fn lseg_score(query: &str, candidate: &str) -> Option<f64> {
    let query_tokens: HashSet<String> = name_tokens(query).into_iter().collect();
    if query_tokens.is_empty() {
        return None;
    }
    let candidate_tokens: HashSet<String> = name_tokens(candidate).into_iter().collect();
    let common = query_tokens.intersection(&candidate_tokens).count();
    let overlap = common as f64 / query_tokens.len() as f64;
    if overlap < LSEG_MIN_OVERLAP {
        return None;
    }

    let q_len = query.trim().to_lowercase().chars().count();
    let c_len = candidate.trim().to_lowercase().chars().count();
    let longest = q_len.max(c_len).max(1);
    let length_similarity = 1.0 - q_len.abs_diff(c_len) as f64 / longest as f64;
    Some(0.7 * overlap + 0.3 * length_similarity)
}

/// Picks the LSEG candidate for `query`.
///
/// A candidate whose lower-cased name equals the query wins outright.
/// Otherwise the highest [`lseg_score`] is taken if it reaches the threshold.
pub fn best_lseg_match<'a, T>(
    query: &str,
    candidates: &'a [T],
    name_of: impl Fn(&T) -> &str,
) -> Option<&'a T> {
    let wanted = query.trim().to_lowercase();
    if let Some(exact) = candidates
        .iter()
        .find(|c| name_of(c).trim().to_lowercase() == wanted)
    {
        return Some(exact);
    }

    let mut best: Option<(&T, f64)> = None;
    for c in candidates {
        let Some(score) = lseg_score(query, name_of(c)) else {
            continue;
        };
        if best.is_none_or(|(_, top)| score > top) {
            best = Some((c, score));
        }
    }
    best.filter(|(_, score)| *score >= LSEG_THRESHOLD)
        .map(|(c, _)| c)
}

/// MSCI score of two already-normalized names.
///
/// 1.0 on equality; otherwise 0.8 when one contains the other, plus
/// `0.7 * |common tokens| / max(|tokens|)`.
pub fn msci_score(query: &str, title: &str) -> f64 {
    if query == title {
        return 1.0;
    }
    let substring = if title.contains(query) || query.contains(title) {
        0.8
    } else {
        0.0
    };
    let q: HashSet<&str> = query.split_whitespace().collect();
    let t: HashSet<&str> = title.split_whitespace().collect();
    let longest = q.len().max(t.len());
    if longest == 0 {
        return substring;
    }
    substring + 0.7 * q.intersection(&t).count() as f64 / longest as f64
}

/// Picks the MSCI candidate for `query`.
///
/// Normalized equality wins outright. Empty titles are never considered.
pub fn best_msci_match<'a, T>(
    query: &str,
    candidates: &'a [T],
    title_of: impl Fn(&T) -> &str,
) -> Option<&'a T> {
    let wanted = normalize_name(query);
    if wanted.is_empty() {
        return None;
    }

    let mut best: Option<(&T, f64)> = None;
    for c in candidates {
        let title = normalize_name(title_of(c));
        if title.is_empty() {
            continue;
        }
        if title == wanted {
            return Some(c);
        }
        let score = msci_score(&wanted, &title);
        if best.is_none_or(|(_, top)| score > top) {
            best = Some((c, score));
        }
    }
    best.filter(|(_, score)| *score > MSCI_THRESHOLD)
        .map(|(c, _)| c)
}
