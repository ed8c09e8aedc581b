use serde_json::{Map, Value};

use super::BatchReport;
use crate::core::{NormalizedScore, Provider};

/// A rectangular table of strings, ready for a spreadsheet writer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Sheet {
    /// Column titles.
    pub headers: Vec<String>,
    /// One row per company, each as long as `headers`.
    pub rows: Vec<Vec<String>>,
}

const MISSING: &str = "N/A";

fn cell(value: Option<&Value>) -> String {
    match value {
        None => MISSING.to_string(),
        Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// The record shown for an entry, or `None` when it has nothing worth a row.
fn usable_record(score: &NormalizedScore) -> Option<&Map<String, Value>> {
    if score.error.is_some() {
        return None;
    }
    let record = score.detail.primary_record()?;
    let only_bookkeeping = record.keys().all(|k| k == "error" || k == "source");
    (!record.is_empty() && !only_bookkeeping).then_some(record)
}

impl BatchReport {
    /// `Company Name` plus one primary-score column per default provider.
    pub fn summary_sheet(&self) -> Sheet {
        let mut headers = vec!["Company Name".to_string()];
        headers.extend(Provider::DEFAULT.iter().map(|p| p.name().to_string()));

        let rows = self
            .results
            .iter()
            .map(|(company, result)| {
                let mut row = vec![company.clone()];
                row.extend(
                    Provider::DEFAULT
                        .iter()
                        .map(|&p| result.score(p).to_string()),
                );
                row
            })
            .collect();
        Sheet { headers, rows }
    }

    /// Raw fields of `provider`, one row per company that has a usable record.
    ///
    /// Columns follow the first usable record; later records missing a column
    /// get `N/A`, and fields not in the header are dropped.
    pub fn detail_sheet(&self, provider: Provider) -> Sheet {
        let records: Vec<(&String, &Map<String, Value>)> = self
            .results
            .iter()
            .filter_map(|(company, result)| {
                let record = result.get(provider).and_then(usable_record)?;
                Some((company, record))
            })
            .collect();

        let Some((_, first)) = records.first() else {
            return Sheet {
                headers: vec!["Company Name".to_string()],
                rows: Vec::new(),
            };
        };
        let fields: Vec<String> = first.keys().cloned().collect();

        let mut headers = vec!["Company Name".to_string()];
        headers.extend(fields.iter().cloned());
        let rows = records
            .iter()
            .map(|(company, record)| {
                let mut row = vec![(*company).clone()];
                row.extend(fields.iter().map(|f| cell(record.get(f))));
                row
            })
            .collect();
        Sheet { headers, rows }
    }
}
