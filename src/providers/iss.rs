use reqwest::Method;
use serde::Deserialize;
use serde_json::{Map, Value, json};

use super::{OutcomeFuture, ProviderAdapter, fetch_text};
use crate::core::{Detail, EsgClient, EsgError, Provider, classify};

const PROVIDER: Provider = Provider::Iss;

/* ---------------- wire ---------------- */

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchEntity {
    entity_id: Option<Value>,
    entity_name: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DetailsEnvelope {
    #[serde(default)]
    company_data: Value,
}

/* ---------------- adapter ---------------- */

pub(crate) struct IssAdapter {
    client: EsgClient,
}

impl IssAdapter {
    pub(crate) fn new(client: EsgClient) -> Self {
        Self { client }
    }

    async fn entity_id(&self, company: &str) -> Result<Option<String>, EsgError> {
        let req = self
            .client
            .request(
                Method::POST,
                PROVIDER,
                self.client.endpoints().iss_search.clone(),
                "application/json, text/plain, */*",
            )
            .json(&json!({ "searchTerm": company }));
        let body = fetch_text(&self.client, req, "iss_search", company, "json").await?;
        let entities: Vec<SearchEntity> = serde_json::from_str(&body)?;

        let Some(first) = entities.into_iter().next() else {
            return Ok(None);
        };
        tracing::debug!(
            provider = %PROVIDER,
            company,
            matched = first.entity_name.as_deref().unwrap_or("-"),
            "resolved entity"
        );
        Ok(match first.entity_id {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        })
    }

    async fn lookup(&self, company: &str) -> Result<Option<Detail>, EsgError> {
        let Some(id) = self.entity_id(company).await? else {
            return Ok(None);
        };
        let url = self.client.endpoints().iss_detail.join(&id)?;
        let req = self
            .client
            .request(
                Method::POST,
                PROVIDER,
                url,
                "application/json, text/plain, */*",
            )
            .json(&json!({}));
        let body = fetch_text(&self.client, req, "iss_detail", company, "json").await?;
        let env: DetailsEnvelope = serde_json::from_str(&body)?;

        let rows = company_rows(env.company_data);
        Ok((!rows.is_empty()).then_some(Detail::Rows(rows)))
    }
}

/// `companyData` arrives as a list of records; a bare record is wrapped.
fn company_rows(data: Value) -> Vec<Map<String, Value>> {
    let records = match data {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|v| match v {
                Value::Object(m) => Some(m),
                _ => None,
            })
            .collect(),
        Value::Object(m) => vec![m],
        _ => Vec::new(),
    };
    records
        .into_iter()
        .filter(|m| !m.is_empty())
        .map(|mut m| {
            m.insert("source".into(), Value::String(PROVIDER.name().into()));
            m
        })
        .collect()
}

impl ProviderAdapter for IssAdapter {
    fn provider(&self) -> Provider {
        PROVIDER
    }

    fn fetch<'a>(&'a self, company: &'a str, _year: Option<&'a str>) -> OutcomeFuture<'a> {
        Box::pin(async move { classify::settle(PROVIDER, company, self.lookup(company).await) })
    }
}
