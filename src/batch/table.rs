use std::collections::BTreeMap;

use crate::core::{EsgError, Provider};

/// One company of a batch, with optional per-provider names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchItem {
    /// The company name used for every provider without an override.
    pub company_name: String,
    /// Provider-specific names.
    pub overrides: BTreeMap<Provider, String>,
}

impl BatchItem {
    /// An item without overrides.
    pub fn new(company_name: impl Into<String>) -> Self {
        Self {
            company_name: company_name.into(),
            overrides: BTreeMap::new(),
        }
    }

    /// Adds a provider-specific name. Blank names are ignored.
    #[must_use]
    pub fn with_override(mut self, provider: Provider, name: impl Into<String>) -> Self {
        let name = name.into().trim().to_string();
        if !name.is_empty() {
            self.overrides.insert(provider, name);
        }
        self
    }

    /// Reads items from a header row plus data rows (e.g. a parsed spreadsheet).
    ///
    /// The company column is the first header containing both "company" and
    /// "name" but no provider keyword, else `Company Name`, else the first
    /// column. A header naming a provider together with "name" or "company"
    /// (e.g. `MSCI Name`) supplies that provider's override. Rows with a blank
    /// company cell are skipped.
    ///
    /// # Errors
    ///
    /// Returns `EsgError::InvalidParams` if there are no headers.
    pub fn from_table<H, C>(headers: &[H], rows: &[Vec<C>]) -> Result<Vec<Self>, EsgError>
    where
        H: AsRef<str>,
        C: AsRef<str>,
    {
        if headers.is_empty() {
            return Err(EsgError::InvalidParams("table has no header row".into()));
        }
        let lower: Vec<String> = headers
            .iter()
            .map(|h| h.as_ref().trim().to_lowercase())
            .collect();

        let keyword = |p: Provider| p.name().to_lowercase();
        let mentions_provider =
            |h: &str| Provider::DEFAULT.iter().any(|&p| h.contains(&keyword(p)));

        let company_col = lower
            .iter()
            .position(|h| h.contains("company") && h.contains("name") && !mentions_provider(h))
            .or_else(|| headers.iter().position(|h| h.as_ref().trim() == "Company Name"))
            .unwrap_or_else(|| {
                tracing::warn!(
                    column = headers[0].as_ref(),
                    "no company name column; using the first column"
                );
                0
            });

        let mut provider_cols: BTreeMap<Provider, usize> = BTreeMap::new();
        for (idx, h) in lower.iter().enumerate() {
            if idx == company_col || !(h.contains("name") || h.contains("company")) {
                continue;
            }
            if let Some(&p) = Provider::DEFAULT.iter().find(|&&p| h.contains(&keyword(p))) {
                provider_cols.entry(p).or_insert(idx);
            }
        }

        let cell = |row: &[C], idx: usize| {
            row.get(idx)
                .map(|c| c.as_ref().trim().to_string())
                .unwrap_or_default()
        };

        Ok(rows
            .iter()
            .filter_map(|row| {
                let name = cell(row, company_col);
                if name.is_empty() {
                    return None;
                }
                Some(
                    provider_cols
                        .iter()
                        .fold(Self::new(name), |item, (&p, &idx)| {
                            item.with_override(p, cell(row, idx))
                        }),
                )
            })
            .collect())
    }
}
