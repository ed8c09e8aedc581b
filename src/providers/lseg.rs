use reqwest::Method;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::{OutcomeFuture, ProviderAdapter, fetch_text, record};
use crate::core::{Detail, EsgClient, EsgError, Provider, classify, matching};

const PROVIDER: Provider = Provider::Lseg;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Suggestion {
    #[serde(default)]
    company_name: Option<String>,
    #[serde(default)]
    ric_code: Option<String>,
}

impl Suggestion {
    fn name(&self) -> &str {
        self.company_name.as_deref().unwrap_or("")
    }
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct IndustryComparison {
    industry_type: Option<Value>,
    score_year: Option<Value>,
    rank: Option<Value>,
    total_industries: Option<Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScoreResult {
    #[serde(default)]
    industry_comparison: Option<IndustryComparison>,
    #[serde(default)]
    esg_score: Option<Map<String, Value>>,
}

pub(crate) struct LsegAdapter {
    client: EsgClient,
}

impl LsegAdapter {
    pub(crate) fn new(client: EsgClient) -> Self {
        Self { client }
    }

    async fn suggestions(&self, company: &str) -> Result<Vec<Suggestion>, EsgError> {
        let req = self.client.request(
            Method::GET,
            PROVIDER,
            self.client.endpoints().lseg_suggestions.clone(),
            "application/json, */*",
        );
        let body = fetch_text(&self.client, req, "lseg_suggestions", company, "json").await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn lookup(&self, company: &str) -> Result<Option<Detail>, EsgError> {
        let mut candidates = self.suggestions(company).await?;
        candidates.retain(|s| !s.name().trim().is_empty());
        let Some(hit) = matching::best_lseg_match(company, &candidates, Suggestion::name) else {
            return Ok(None);
        };
        let Some(ric_code) = hit.ric_code.as_deref().filter(|r| !r.trim().is_empty()) else {
            return Ok(None);
        };

        let mut url = self.client.endpoints().lseg_detail.clone();
        url.query_pairs_mut().append_pair("ricCode", ric_code);
        let req = self
            .client
            .request(Method::GET, PROVIDER, url, "application/json, */*");
        let body = fetch_text(&self.client, req, "lseg_detail", company, "json").await?;
        let result: ScoreResult = serde_json::from_str(&body)?;

        let mut rec = record(
            PROVIDER,
            [
                ("Company Name", Value::String(hit.name().to_string())),
                ("Ric Code", Value::String(ric_code.to_string())),
            ],
        );
        let ic = result.industry_comparison.unwrap_or_default();
        let na = || Value::String("N/A".into());
        rec.insert("Industry Type".into(), ic.industry_type.unwrap_or_else(na));
        rec.insert("Score Year".into(), ic.score_year.unwrap_or_else(na));
        rec.insert(
            "Rank".into(),
            Value::String(format!(
                "{} out of {}",
                display(ic.rank.as_ref()),
                display(ic.total_industries.as_ref())
            )),
        );
        for (key, value) in result.esg_score.unwrap_or_default() {
            let score = value.get("score").cloned().unwrap_or_else(na);
            rec.insert(key, score);
        }
        Ok(Some(Detail::Record(rec)))
    }
}

fn display(v: Option<&Value>) -> String {
    match v {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => "N/A".into(),
        Some(other) => other.to_string(),
    }
}

impl ProviderAdapter for LsegAdapter {
    fn provider(&self) -> Provider {
        PROVIDER
    }

    fn fetch<'a>(&'a self, company: &'a str, _year: Option<&'a str>) -> OutcomeFuture<'a> {
        Box::pin(async move { classify::settle(PROVIDER, company, self.lookup(company).await) })
    }
}
