//! Primary-score extraction and tier banding.
//!
//! Everything here is pure: the same provider and input always produce the
//! same [`NormalizedScore`].

use serde_json::Value;

use crate::core::{Detail, NO_SCORE, NormalizedScore, Provider, ProviderOutcome, Severity, Tier};

/// Native keys holding the primary score, tried in order.
pub fn score_fields(provider: Provider) -> &'static [&'static str] {
    match provider {
        Provider::SnP | Provider::Sustainalytics => &["esg_score"],
        Provider::Iss => &["oekomRating"],
        Provider::Lseg => &["TR.TRESG", "TR.TRESG.Score"],
        Provider::Msci => &["ESG Rating", "Rating"],
        Provider::Cdp => &["Response Score Band"],
    }
}

/// Renders a field as a score, or `None` for null, blank, `-` and `N/A`.
fn score_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    if text.is_empty() || text == NO_SCORE || text.eq_ignore_ascii_case("n/a") {
        None
    } else {
        Some(text)
    }
}

/// The primary score of a detail bag, `"-"` when no field yields one.
///
/// Row-shaped details are read from their first row.
pub fn primary_score(provider: Provider, detail: &Detail) -> String {
    score_fields(provider)
        .iter()
        .find_map(|key| detail.get(key).and_then(score_text))
        .unwrap_or_else(|| NO_SCORE.to_string())
}

fn numeric_tier(score: f64, high: f64, medium: f64, lower_is_better: bool) -> Tier {
    let (is_high, is_medium) = if lower_is_better {
        (score <= high, score <= medium)
    } else {
        (score >= high, score >= medium)
    };
    if is_high {
        Tier::High
    } else if is_medium {
        Tier::Medium
    } else {
        Tier::Low
    }
}

fn letter_tier(grade: &str, high: &[&str], medium: &[&str], low: &[&str]) -> Tier {
    if high.contains(&grade) {
        Tier::High
    } else if medium.contains(&grade) {
        Tier::Medium
    } else if low.contains(&grade) {
        Tier::Low
    } else {
        Tier::None
    }
}

/// Band of `score` on `provider`'s scale.
///
/// Sustainalytics is a risk score, so lower is better. `"-"`, unparseable
/// scores and CDP always band as [`Tier::None`].
pub fn tier(provider: Provider, score: &str) -> Tier {
    let score = score.trim();
    if score.is_empty() || score == NO_SCORE {
        return Tier::None;
    }
    let numeric = || score.parse::<f64>().ok().filter(|v| v.is_finite());

    match provider {
        Provider::SnP => numeric().map_or(Tier::None, |v| numeric_tier(v, 70.0, 50.0, false)),
        Provider::Sustainalytics => {
            numeric().map_or(Tier::None, |v| numeric_tier(v, 10.0, 30.0, true))
        }
        Provider::Lseg => numeric().map_or(Tier::None, |v| numeric_tier(v, 75.0, 50.0, false)),
        Provider::Msci => letter_tier(
            &score.to_ascii_uppercase(),
            &["AAA", "AA"],
            &["A", "BBB"],
            &["BB", "B", "CCC"],
        ),
        Provider::Iss => letter_tier(
            &score.to_ascii_uppercase(),
            &["A+", "A", "A-"],
            &["B+", "B", "B-"],
            &["C+", "C", "C-", "D+", "D", "D-"],
        ),
        Provider::Cdp => Tier::None,
    }
}

/// Maps an adapter outcome to the canonical entry.
///
/// `NotFound` and benign failures become a plain `"-"` entry; serious
/// failures also carry the message in `error`.
pub fn normalize(provider: Provider, outcome: ProviderOutcome) -> NormalizedScore {
    match outcome {
        ProviderOutcome::Found(detail) => {
            // CDP detail is a list even when an adapter hands back one record
            let detail = match (provider, detail) {
                (Provider::Cdp, Detail::Record(m)) if m.is_empty() => Detail::Rows(Vec::new()),
                (Provider::Cdp, Detail::Record(m)) => Detail::Rows(vec![m]),
                (_, d) => d,
            };
            let primary_score = primary_score(provider, &detail);
            NormalizedScore {
                provider,
                tier: tier(provider, &primary_score),
                primary_score,
                detail,
                error: None,
            }
        }
        ProviderOutcome::NotFound
        | ProviderOutcome::TransientError {
            severity: Severity::Benign,
            ..
        } => NormalizedScore::missing(provider),
        ProviderOutcome::TransientError {
            message,
            severity: Severity::Serious,
        } => NormalizedScore::failed(provider, message),
    }
}
