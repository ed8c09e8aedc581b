use reqwest::Method;
use serde_json::{Map, Value};

use super::{OutcomeFuture, ProviderAdapter, fetch_text, record};
use crate::core::{Detail, EsgClient, EsgError, Provider, classify, scrape};

const PROVIDER: Provider = Provider::Cdp;

const SCORE_BAND_CLASS: &str = "investor-program__score_band_single";

pub(crate) struct CdpAdapter {
    client: EsgClient,
}

impl CdpAdapter {
    pub(crate) fn new(client: EsgClient) -> Self {
        Self { client }
    }

    /// Always `Some(Rows)` on success; a company may have several responses per year.
    async fn lookup(&self, company: &str, year: Option<&str>) -> Result<Option<Detail>, EsgError> {
        let mut url = self.client.endpoints().cdp_responses.clone();
        url.query_pairs_mut()
            .append_pair("page", "1")
            .append_pair("per_page", "20")
            .append_pair("sort_by", "project_year")
            .append_pair("sort_dir", "desc")
            .append_pair("queries[name]", company);
        let req = self
            .client
            .request(Method::GET, PROVIDER, url, "text/html,*/*;q=0.8");
        let html = fetch_text(&self.client, req, "cdp_responses", company, "html").await?;

        Ok(Some(Detail::Rows(parse_rows(&html, year))))
    }
}

fn parse_rows(html: &str, year: Option<&str>) -> Vec<Map<String, Value>> {
    scrape::table_rows(html, "sortable_table")
        .into_iter()
        .filter(|cells| cells.len() >= 5)
        .filter_map(|cells| {
            let project_year = cells[2].text();
            if year.is_some_and(|y| y.trim() != project_year) {
                return None;
            }
            let band: String = scrape::find_all(cells[4].inner, |e| e.has_class(SCORE_BAND_CLASS))
                .iter()
                .map(|e| e.text())
                .collect();
            Some(record(
                PROVIDER,
                [
                    ("Company Name", Value::String(cells[0].text())),
                    ("Response Name", Value::String(cells[1].text())),
                    ("Project Year", Value::String(project_year)),
                    ("Response Status", Value::String(cells[3].text())),
                    ("Response Score Band", Value::String(band)),
                ],
            ))
        })
        .collect()
}

impl ProviderAdapter for CdpAdapter {
    fn provider(&self) -> Provider {
        PROVIDER
    }

    fn fetch<'a>(&'a self, company: &'a str, year: Option<&'a str>) -> OutcomeFuture<'a> {
        Box::pin(async move {
            classify::settle(PROVIDER, company, self.lookup(company, year).await)
        })
    }
}
