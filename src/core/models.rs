//! Shared data model: providers, requests, outcomes and normalized scores.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::core::EsgError;

/// One external ESG rating organization.
///
/// Ordering follows declaration order, which is also the column order used in
/// batch summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Provider {
    /// S&P Global ESG scores (0-100, higher is better).
    #[serde(rename = "S&P")]
    SnP,
    /// Sustainalytics ESG risk rating (lower is better).
    #[serde(rename = "Sustainalytics")]
    Sustainalytics,
    /// ISS ESG corporate rating (letter grade).
    #[serde(rename = "ISS")]
    Iss,
    /// LSEG (Refinitiv) ESG score (0-100, higher is better).
    #[serde(rename = "LSEG")]
    Lseg,
    /// MSCI ESG rating (letter grade).
    #[serde(rename = "MSCI")]
    Msci,
    /// CDP disclosure responses, scoped by year.
    #[serde(rename = "CDP")]
    Cdp,
}

impl Provider {
    /// The five providers queried when a caller does not choose explicitly.
    pub const DEFAULT: [Self; 5] = [
        Self::SnP,
        Self::Sustainalytics,
        Self::Iss,
        Self::Lseg,
        Self::Msci,
    ];

    /// Every provider, CDP included.
    pub const ALL: [Self; 6] = [
        Self::SnP,
        Self::Sustainalytics,
        Self::Iss,
        Self::Lseg,
        Self::Msci,
        Self::Cdp,
    ];

    /// Display name, also used as the cache scope and in event payloads.
    pub const fn name(self) -> &'static str {
        match self {
            Self::SnP => "S&P",
            Self::Sustainalytics => "Sustainalytics",
            Self::Iss => "ISS",
            Self::Lseg => "LSEG",
            Self::Msci => "MSCI",
            Self::Cdp => "CDP",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Provider {
    type Err = EsgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "s&p" | "snp" | "sp" | "s&p global" => Ok(Self::SnP),
            "sustainalytics" => Ok(Self::Sustainalytics),
            "iss" => Ok(Self::Iss),
            "lseg" => Ok(Self::Lseg),
            "msci" => Ok(Self::Msci),
            "cdp" => Ok(Self::Cdp),
            _ => Err(EsgError::UnsupportedProvider(s.to_string())),
        }
    }
}

/// Input of one aggregation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupRequest {
    company_name: String,
    overrides: BTreeMap<Provider, String>,
    year: Option<String>,
}

impl LookupRequest {
    /// Creates a request for a company name.
    ///
    /// # Errors
    ///
    /// Returns `EsgError::InvalidParams` if the name is empty after trimming.
    pub fn new(company_name: impl Into<String>) -> Result<Self, EsgError> {
        let company_name = company_name.into().trim().to_string();
        if company_name.is_empty() {
            return Err(EsgError::InvalidParams(
                "company name must not be empty".into(),
            ));
        }
        Ok(Self {
            company_name,
            overrides: BTreeMap::new(),
            year: None,
        })
    }

    /// Uses a different name when querying one provider. Blank names are ignored.
    #[must_use]
    pub fn with_override(mut self, provider: Provider, name: impl Into<String>) -> Self {
        let name = name.into().trim().to_string();
        if !name.is_empty() {
            self.overrides.insert(provider, name);
        }
        self
    }

    /// Adds several overrides at once.
    #[must_use]
    pub fn with_overrides<I, S>(self, overrides: I) -> Self
    where
        I: IntoIterator<Item = (Provider, S)>,
        S: Into<String>,
    {
        overrides
            .into_iter()
            .fold(self, |req, (p, name)| req.with_override(p, name))
    }

    /// Sets the disclosure year (only used by CDP).
    #[must_use]
    pub fn with_year(mut self, year: impl Into<String>) -> Self {
        let year = year.into().trim().to_string();
        self.year = (!year.is_empty()).then_some(year);
        self
    }

    /// The company name as supplied by the caller.
    pub fn company_name(&self) -> &str {
        &self.company_name
    }

    /// The disclosure year, if any.
    pub fn year(&self) -> Option<&str> {
        self.year.as_deref()
    }

    /// The per-provider name overrides.
    pub fn overrides(&self) -> &BTreeMap<Provider, String> {
        &self.overrides
    }

    /// The name to send to `provider`: its override, or the company name.
    pub fn name_for(&self, provider: Provider) -> &str {
        self.overrides
            .get(&provider)
            .map_or(self.company_name.as_str(), String::as_str)
    }
}

/// A provider-native attribute bag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Detail {
    /// A single record (most providers).
    Record(Map<String, Value>),
    /// Zero or more records (CDP responses, raw ISS company data).
    Rows(Vec<Map<String, Value>>),
}

impl Detail {
    /// An empty record.
    pub fn empty_record() -> Self {
        Self::Record(Map::new())
    }

    /// The record a primary score is read from: the record itself, or the first row.
    pub fn primary_record(&self) -> Option<&Map<String, Value>> {
        match self {
            Self::Record(m) => Some(m),
            Self::Rows(rows) => rows.first(),
        }
    }

    /// Looks up a field on the primary record.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.primary_record().and_then(|m| m.get(key))
    }

    /// `true` if there is no record or the record has no fields.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Record(m) => m.is_empty(),
            Self::Rows(rows) => rows.is_empty(),
        }
    }
}

/// How bad a failed provider call was.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    /// HTTP >= 500, timeouts and network failures. Reported to the caller.
    Serious,
    /// Any other non-success or unparseable response. Shown as "no data".
    Benign,
}

/// Result of one adapter invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderOutcome {
    /// The provider matched a company and returned attributes.
    Found(Detail),
    /// The provider ran fine but has no matching company.
    NotFound,
    /// The lookup failed.
    TransientError {
        /// Human-readable reason.
        message: String,
        /// Whether the failure is surfaced or collapsed into "no data".
        severity: Severity,
    },
}

impl ProviderOutcome {
    /// A serious failure with the given message.
    pub fn serious(message: impl Into<String>) -> Self {
        Self::TransientError {
            message: message.into(),
            severity: Severity::Serious,
        }
    }

    /// A benign failure with the given message.
    pub fn benign(message: impl Into<String>) -> Self {
        Self::TransientError {
            message: message.into(),
            severity: Severity::Benign,
        }
    }
}

/// Coarse banding of a primary score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tier {
    /// Best band for the provider's scale.
    High,
    /// Middle band.
    Medium,
    /// Worst band.
    Low,
    /// No score, an unparseable score, or a provider without bands.
    None,
}

/// The placeholder shown for every missing score.
pub const NO_SCORE: &str = "-";

/// One provider's normalized entry in an aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedScore {
    /// The provider this entry belongs to.
    pub provider: Provider,
    /// Canonical score string, `"-"` when absent.
    pub primary_score: String,
    /// Band of `primary_score`.
    pub tier: Tier,
    /// The provider-native fields, kept for detail display.
    pub detail: Detail,
    /// Set only for serious failures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl NormalizedScore {
    /// An entry with no data for `provider`.
    pub fn missing(provider: Provider) -> Self {
        let detail = if provider == Provider::Cdp {
            Detail::Rows(Vec::new())
        } else {
            Detail::empty_record()
        };
        Self {
            provider,
            primary_score: NO_SCORE.to_string(),
            tier: Tier::None,
            detail,
            error: None,
        }
    }

    /// An entry for a serious failure. Record-shaped details also carry the message.
    pub fn failed(provider: Provider, message: impl Into<String>) -> Self {
        let message = message.into();
        let mut entry = Self::missing(provider);
        if let Detail::Record(m) = &mut entry.detail {
            m.insert("error".into(), Value::String(message.clone()));
            m.insert("source".into(), Value::String(provider.name().into()));
        }
        entry.error = Some(message);
        entry
    }

    /// `true` when a score was found.
    pub fn has_score(&self) -> bool {
        self.primary_score != NO_SCORE
    }
}

/// Normalized scores keyed by provider, one entry per requested provider.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AggregateResult {
    entries: BTreeMap<Provider, NormalizedScore>,
}

impl AggregateResult {
    pub(crate) fn insert(&mut self, score: NormalizedScore) {
        self.entries.insert(score.provider, score);
    }

    /// The entry for `provider`, if it was requested.
    pub fn get(&self, provider: Provider) -> Option<&NormalizedScore> {
        self.entries.get(&provider)
    }

    /// The primary score for `provider`, `"-"` when not requested.
    pub fn score(&self, provider: Provider) -> &str {
        self.get(provider)
            .map_or(NO_SCORE, |s| s.primary_score.as_str())
    }

    /// Provider → primary score, the shape shown in summary tables.
    pub fn scores(&self) -> BTreeMap<Provider, &str> {
        self.entries
            .iter()
            .map(|(p, s)| (*p, s.primary_score.as_str()))
            .collect()
    }

    /// Iterates entries in provider order.
    pub fn iter(&self) -> impl Iterator<Item = (&Provider, &NormalizedScore)> {
        self.entries.iter()
    }

    /// The providers present in this result.
    pub fn providers(&self) -> impl Iterator<Item = Provider> + '_ {
        self.entries.keys().copied()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when no provider was requested.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `true` when any entry carries a serious failure.
    pub fn has_errors(&self) -> bool {
        self.entries.values().any(|s| s.error.is_some())
    }
}
