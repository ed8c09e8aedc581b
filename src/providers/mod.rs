//! Provider adapters.
//!
//! Every adapter runs a resolve step (company name to provider id) followed by a
//! detail step, and settles the result into a [`ProviderOutcome`]. Adapters
//! never return errors and never panic on provider input.

mod cdp;
mod iss;
mod lseg;
mod msci;
mod snp;
mod sustainalytics;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use reqwest::RequestBuilder;
use serde_json::{Map, Value};

use crate::core::{EsgClient, EsgError, Provider, ProviderOutcome, net};

pub(crate) use cdp::CdpAdapter;
pub(crate) use iss::IssAdapter;
pub(crate) use lseg::LsegAdapter;
pub(crate) use msci::MsciAdapter;
pub(crate) use snp::SnpAdapter;
pub(crate) use sustainalytics::SustainalyticsAdapter;

/// Boxed future returned by [`ProviderAdapter::fetch`].
pub type OutcomeFuture<'a> = Pin<Box<dyn Future<Output = ProviderOutcome> + Send + 'a>>;

/// One provider's two-step lookup.
///
/// Implementations must turn every failure into a [`ProviderOutcome`]. A custom
/// adapter can replace a built-in one through
/// [`EsgClientBuilder::adapter`](crate::EsgClientBuilder::adapter).
pub trait ProviderAdapter: Send + Sync {
    /// The provider this adapter talks to.
    fn provider(&self) -> Provider;

    /// Looks up `company`. `year` is only meaningful for CDP.
    fn fetch<'a>(&'a self, company: &'a str, year: Option<&'a str>) -> OutcomeFuture<'a>;
}

/// The adapter used for `provider`: the client's override, or the built-in one.
pub(crate) fn adapter_for(client: &EsgClient, provider: Provider) -> Arc<dyn ProviderAdapter> {
    if let Some(adapter) = client.adapter_override(provider) {
        return adapter;
    }
    let client = client.clone();
    match provider {
        Provider::SnP => Arc::new(SnpAdapter::new(client)),
        Provider::Sustainalytics => Arc::new(SustainalyticsAdapter::new(client)),
        Provider::Iss => Arc::new(IssAdapter::new(client)),
        Provider::Lseg => Arc::new(LsegAdapter::new(client)),
        Provider::Msci => Arc::new(MsciAdapter::new(client)),
        Provider::Cdp => Arc::new(CdpAdapter::new(client)),
    }
}

/// Sends `req` with retries and reads the body, mapping unsuccessful statuses to errors.
pub(crate) async fn fetch_text(
    client: &EsgClient,
    req: RequestBuilder,
    endpoint: &str,
    company: &str,
    ext: &str,
) -> Result<String, EsgError> {
    let resp = client.send_with_retry(req, None).await?;
    net::get_text(resp, endpoint, company, ext).await
}

/// `Some(s)` as a JSON string, `None` as null.
pub(crate) fn opt_value(v: Option<String>) -> Value {
    v.map_or(Value::Null, Value::String)
}

/// Builds a record tagged with its `source`.
pub(crate) fn record<I, K>(provider: Provider, fields: I) -> Map<String, Value>
where
    I: IntoIterator<Item = (K, Value)>,
    K: Into<String>,
{
    let mut m: Map<String, Value> = fields.into_iter().map(|(k, v)| (k.into(), v)).collect();
    m.insert("source".into(), Value::String(provider.name().into()));
    m
}
