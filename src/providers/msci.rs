use reqwest::Method;
use serde::Deserialize;
use serde_json::{Map, Value};
use url::Url;

use super::{OutcomeFuture, ProviderAdapter, fetch_text, record};
use crate::core::{Detail, EsgClient, EsgError, Provider, classify, matching, scrape};

const PROVIDER: Provider = Provider::Msci;

const SEARCH_RESOURCE: &str = "searchEsgRatingsProfiles";
const PROFILE_RESOURCE: &str = "showEsgRatingsProfile";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    encoded_title: Option<String>,
    /// The issuer id.
    #[serde(default)]
    url: Option<String>,
}

pub(crate) struct MsciAdapter {
    client: EsgClient,
}

impl MsciAdapter {
    pub(crate) fn new(client: EsgClient) -> Self {
        Self { client }
    }

    fn resource_url(&self, resource: &str, param: (&str, &str)) -> Url {
        let mut url = self.client.endpoints().msci_tool.clone();
        url.query_pairs_mut()
            .append_pair("p_p_id", "esgratingsprofile")
            .append_pair("p_p_lifecycle", "2")
            .append_pair("p_p_state", "normal")
            .append_pair("p_p_mode", "view")
            .append_pair("p_p_resource_id", resource)
            .append_pair("p_p_cacheability", "cacheLevelPage")
            .append_pair(param.0, param.1);
        url
    }

    async fn lookup(&self, company: &str) -> Result<Option<Detail>, EsgError> {
        let url = self.resource_url(SEARCH_RESOURCE, ("_esgratingsprofile_keywords", company));
        let req = self
            .client
            .request(Method::GET, PROVIDER, url, "*/*")
            .header("x-requested-with", "XMLHttpRequest");
        let body = fetch_text(&self.client, req, "msci_search", company, "json").await?;
        let candidates: Vec<Candidate> = serde_json::from_str(&body)?;

        let Some(hit) = matching::best_msci_match(company, &candidates, |c| {
            c.title.as_deref().unwrap_or("")
        }) else {
            return Ok(None);
        };
        let Some(issuer_id) = hit.url.as_deref().filter(|u| !u.trim().is_empty()) else {
            return Ok(None);
        };
        tracing::debug!(
            provider = %PROVIDER,
            company,
            matched = hit.title.as_deref().unwrap_or("-"),
            encoded_title = hit.encoded_title.as_deref().unwrap_or("-"),
            "resolved issuer"
        );

        let url = self.resource_url(PROFILE_RESOURCE, ("_esgratingsprofile_issuerId", issuer_id));
        let req = self
            .client
            .request(Method::GET, PROVIDER, url, "*/*")
            .header("x-requested-with", "XMLHttpRequest");
        let html = fetch_text(&self.client, req, "msci_profile", company, "html").await?;
        Ok(parse_profile(&html).map(Detail::Record))
    }
}

/// `esg-rating-circle-aa` -> `AA`
fn rating_from_class(class: &str) -> Option<String> {
    class
        .split_whitespace()
        .last()?
        .split("esg-rating-circle-")
        .nth(1)
        .filter(|g| !g.is_empty())
        .map(str::to_uppercase)
}

fn parse_profile(html: &str) -> Option<Map<String, Value>> {
    let text_or_na = |class: &str, strip: &str| {
        scrape::text_by_class(html, class)
            .map(|t| t.replace(strip, "").trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "N/A".into())
    };

    let title = scrape::text_by_class(html, "header-company-title");
    let rating = scrape::by_class(html, "ratingdata-company-rating")
        .and_then(|e| e.attr("class"))
        .and_then(|c| rating_from_class(&c));
    if title.is_none() && rating.is_none() {
        return None;
    }

    let ticker = scrape::text_by_class(html, "header-company-ticker")
        .map(|t| {
            t.trim_matches(|c: char| c == '(' || c == ')' || c.is_whitespace())
                .to_string()
        })
        .unwrap_or_else(|| "N/A".into());

    Some(record(
        PROVIDER,
        [
            (
                "Company Name",
                Value::String(title.unwrap_or_else(|| "N/A".into())),
            ),
            ("Ticker", Value::String(ticker)),
            (
                "Industry",
                Value::String(text_or_na("header-esg-industry", "Industry:")),
            ),
            (
                "Country/Region",
                Value::String(text_or_na("header-country", "Country/Region:")),
            ),
            (
                "ESG Rating",
                Value::String(rating.unwrap_or_else(|| "N/A".into())),
            ),
        ],
    ))
}

impl ProviderAdapter for MsciAdapter {
    fn provider(&self) -> Provider {
        PROVIDER
    }

    fn fetch<'a>(&'a self, company: &'a str, _year: Option<&'a str>) -> OutcomeFuture<'a> {
        Box::pin(async move { classify::settle(PROVIDER, company, self.lookup(company).await) })
    }
}
