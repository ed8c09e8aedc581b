use reqwest::Method;
use serde::Deserialize;
use serde_json::Value;

use super::{OutcomeFuture, ProviderAdapter, fetch_text, opt_value, record};
use crate::core::{Detail, EsgClient, EsgError, Provider, classify, scrape};

const PROVIDER: Provider = Provider::SnP;

#[derive(Deserialize)]
struct SearchHit {
    id: Option<Value>,
}

const DIMENSIONS: [(&str, &str); 3] = [
    ("environmental", "dimentions-score-env"),
    ("social", "dimentions-score-social"),
    ("governance", "dimentions-score-govecon"),
];

pub(crate) struct SnpAdapter {
    client: EsgClient,
}

impl SnpAdapter {
    pub(crate) fn new(client: EsgClient) -> Self {
        Self { client }
    }

    async fn company_id(&self, company: &str) -> Result<Option<String>, EsgError> {
        let mut url = self.client.endpoints().snp_search.clone();
        url.query_pairs_mut().append_pair("comp-name", company);

        let req = self
            .client
            .request(
                Method::GET,
                PROVIDER,
                url,
                "application/json, text/javascript, */*; q=0.01",
            )
            .header("x-requested-with", "XMLHttpRequest");
        let body = fetch_text(&self.client, req, "snp_search", company, "json").await?;
        let hits: Vec<SearchHit> = serde_json::from_str(&body)?;

        Ok(hits.into_iter().next().and_then(|h| match h.id? {
            Value::String(s) if !s.trim().is_empty() => Some(s),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }))
    }

    async fn lookup(&self, company: &str) -> Result<Option<Detail>, EsgError> {
        let Some(id) = self.company_id(company).await? else {
            return Ok(None);
        };

        let mut url = self.client.endpoints().snp_detail.clone();
        url.query_pairs_mut().append_pair("cid", &id);
        let req = self
            .client
            .request(Method::GET, PROVIDER, url.clone(), "text/html,*/*;q=0.8");
        let html = fetch_text(&self.client, req, "snp_detail", company, "html").await?;

        Ok(parse_detail(&html, url.as_str()).map(Detail::Record))
    }
}

fn parse_detail(html: &str, url: &str) -> Option<serde_json::Map<String, Value>> {
    let data = scrape::by_id(html, "company-data")?;
    let get = |name: &str| opt_value(data.attr(name));

    let ticker = data
        .attr("data-company-ticker")
        .map(|t| scrape::text(&t.replace("<b>Ticker:</b>", "")));

    let mut rec = record(
        PROVIDER,
        [
            ("company_id", get("data-company-id")),
            ("long_name", get("data-long-name")),
            ("short_name", get("data-short-name")),
            ("country", get("data-country")),
            ("rank", get("data-company-rank")),
            ("rank_out_of", get("data-company-rank-out-of")),
            ("datetime_modified", get("data-datetime-modified")),
            ("yoy_change", get("data-yoy-change")),
            ("esg_score", get("data-yoy-score")),
            ("industry", get("data-industry")),
            ("year", get("data-year")),
            ("ticker", opt_value(ticker)),
            ("availability_level", get("data-availabilitylevel")),
            ("url", Value::String(url.to_string())),
        ],
    );

    for (dimension, id) in DIMENSIONS {
        let Some(el) = scrape::by_id(html, id) else {
            continue;
        };
        for (suffix, attr) in [
            ("score", "data-score"),
            ("avg", "data-avg"),
            ("max", "data-max"),
            ("rank", "data-rank"),
            ("rank_out_of", "data-rank-out-of"),
        ] {
            rec.insert(format!("{dimension}_{suffix}"), opt_value(el.attr(attr)));
        }
    }
    Some(rec)
}

impl ProviderAdapter for SnpAdapter {
    fn provider(&self) -> Provider {
        PROVIDER
    }

    fn fetch<'a>(&'a self, company: &'a str, _year: Option<&'a str>) -> OutcomeFuture<'a> {
        Box::pin(async move { classify::settle(PROVIDER, company, self.lookup(company).await) })
    }
}
