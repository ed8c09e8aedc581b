use reqwest::Method;
use serde_json::Value;
use url::Url;

use super::{OutcomeFuture, ProviderAdapter, fetch_text, opt_value, record};
use crate::core::{Detail, EsgClient, EsgError, Provider, classify, scrape};

const PROVIDER: Provider = Provider::Sustainalytics;

pub(crate) struct SustainalyticsAdapter {
    client: EsgClient,
}

impl SustainalyticsAdapter {
    pub(crate) fn new(client: EsgClient) -> Self {
        Self { client }
    }

    async fn rating_page(&self, company: &str) -> Result<Option<Url>, EsgError> {
        let req = self
            .client
            .request(
                Method::POST,
                PROVIDER,
                self.client.endpoints().sustainalytics_search.clone(),
                "*/*",
            )
            .header("x-requested-with", "XMLHttpRequest")
            .form(&[
                ("industry", ""),
                ("rating", ""),
                ("filter", company),
                ("page", "1"),
                ("pageSize", "10"),
                ("resourcePackage", "Sustainalytics"),
            ]);
        let html = fetch_text(&self.client, req, "sustainalytics_search", company, "html").await?;

        let Some(href) = scrape::by_class(&html, "search-link").and_then(|a| a.attr("data-href"))
        else {
            return Ok(None);
        };
        let href = href.trim();
        if href.is_empty() {
            return Ok(None);
        }
        let base = self.client.endpoints().sustainalytics_rating.as_str();
        Ok(Some(Url::parse(&format!(
            "{}{href}",
            base.trim_end_matches('/')
        ))?))
    }

    async fn lookup(&self, company: &str) -> Result<Option<Detail>, EsgError> {
        let Some(url) = self.rating_page(company).await? else {
            return Ok(None);
        };
        let req = self
            .client
            .request(Method::GET, PROVIDER, url.clone(), "text/html,*/*;q=0.8");
        let html = fetch_text(&self.client, req, "sustainalytics_rating", company, "html").await?;
        Ok(parse_detail(&html, url.as_str()).map(Detail::Record))
    }
}

/// Text of the first `tag` inside the first element with `class`.
fn nested_text(html: &str, class: &str, tag: &str) -> Option<String> {
    scrape::by_class(html, class)?.child(tag).map(|e| e.text())
}

fn ranking(html: &str, position: &str, total: &str) -> Option<String> {
    let position = scrape::text_by_class(html, position)?;
    let total = scrape::text_by_class(html, total)?;
    Some(format!("{position} out of {total}"))
}

fn parse_detail(html: &str, url: &str) -> Option<serde_json::Map<String, Value>> {
    let company_name = nested_text(html, "company-name", "h2");
    let esg_score = nested_text(html, "risk-rating-score", "span");
    if company_name.is_none() && esg_score.is_none() {
        return None;
    }

    let description = scrape::by_class(html, "company-description-text")
        .and_then(|d| d.find(|e| e.has_class("collapse")))
        .map(|e| e.text());

    let mut rec = record(
        PROVIDER,
        [
            ("company_name", opt_value(company_name)),
            (
                "industry_group",
                opt_value(scrape::text_by_class(html, "industry-group")),
            ),
            ("country", opt_value(scrape::text_by_class(html, "country"))),
            (
                "identifier",
                opt_value(scrape::text_by_class(html, "identifier")),
            ),
            ("description", opt_value(description)),
            ("esg_score", opt_value(esg_score)),
            (
                "esg_risk_rating_assessment",
                opt_value(nested_text(html, "risk-rating-assessment", "span")),
            ),
            (
                "last_full_update",
                opt_value(nested_text(html, "update-date", "strong")),
            ),
            ("url", Value::String(url.to_string())),
        ],
    );
    if let Some(r) = ranking(
        html,
        "industry-group-position",
        "industry-group-positions-total",
    ) {
        rec.insert("industry_ranking".into(), Value::String(r));
    }
    if let Some(r) = ranking(html, "universe-position", "universe-positions-total") {
        rec.insert("universe_ranking".into(), Value::String(r));
    }
    Some(rec)
}

impl ProviderAdapter for SustainalyticsAdapter {
    fn provider(&self) -> Provider {
        PROVIDER
    }

    fn fetch<'a>(&'a self, company: &'a str, _year: Option<&'a str>) -> OutcomeFuture<'a> {
        Box::pin(async move { classify::settle(PROVIDER, company, self.lookup(company).await) })
    }
}
