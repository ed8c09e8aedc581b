#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use esg_scores::{
    Detail, Endpoints, EsgClient, EsgClientBuilder, OutcomeFuture, Provider, ProviderAdapter,
    ProviderOutcome, RetryConfig,
};
use httpmock::MockServer;
use serde_json::Value;

pub fn fixture(endpoint: &str, company: &str, ext: &str) -> String {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures");
    let filename = format!("{endpoint}_{company}.{ext}");
    let path = dir.join(&filename);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("failed to read fixture {}: {}", path.display(), e))
}

pub fn no_retry() -> RetryConfig {
    RetryConfig {
        enabled: false,
        ..RetryConfig::default()
    }
}

/// A client whose endpoints all point at `server`.
pub fn server_client(server: &MockServer) -> EsgClient {
    EsgClient::builder()
        .endpoints(Endpoints::rooted_at(&server.base_url()).unwrap())
        .retry_config(no_retry())
        .build()
        .unwrap()
}

/// A builder with every listed adapter installed and no reachable network.
pub fn mock_builder(adapters: &[Arc<dyn ProviderAdapter>]) -> EsgClientBuilder {
    adapters.iter().fold(
        EsgClient::builder()
            .endpoints(Endpoints::rooted_at("http://127.0.0.1:9").unwrap())
            .retry_config(no_retry()),
        |b, a| b.adapter(a.clone()),
    )
}

pub fn mock_client(adapters: &[Arc<dyn ProviderAdapter>]) -> EsgClient {
    mock_builder(adapters).build().unwrap()
}

pub fn record(v: Value) -> Detail {
    match v {
        Value::Object(m) => Detail::Record(m),
        other => panic!("expected a JSON object, got {other}"),
    }
}

/// Adapter returning a canned outcome after an optional delay, counting calls.
pub struct MockAdapter {
    provider: Provider,
    outcome: ProviderOutcome,
    delay: Duration,
    calls: Arc<AtomicUsize>,
    seen: Arc<Mutex<Vec<String>>>,
}

impl MockAdapter {
    pub fn new(provider: Provider, outcome: ProviderOutcome) -> Self {
        Self {
            provider,
            outcome,
            delay: Duration::ZERO,
            calls: Arc::new(AtomicUsize::new(0)),
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Found with a single record carrying `field = score`.
    pub fn scored(provider: Provider, field: &str, score: &str) -> Self {
        let mut m = serde_json::Map::new();
        m.insert(field.to_string(), Value::String(score.to_string()));
        m.insert("source".into(), Value::String(provider.name().into()));
        Self::new(provider, ProviderOutcome::Found(Detail::Record(m)))
    }

    pub fn not_found(provider: Provider) -> Self {
        Self::new(provider, ProviderOutcome::NotFound)
    }

    pub fn delay(mut self, d: Duration) -> Self {
        self.delay = d;
        self
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }

    pub fn seen(&self) -> Arc<Mutex<Vec<String>>> {
        self.seen.clone()
    }

    pub fn shared(self) -> Arc<dyn ProviderAdapter> {
        Arc::new(self)
    }
}

impl ProviderAdapter for MockAdapter {
    fn provider(&self) -> Provider {
        self.provider
    }

    fn fetch<'a>(&'a self, company: &'a str, _year: Option<&'a str>) -> OutcomeFuture<'a> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(company.to_string());
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.outcome.clone()
        })
    }
}

/// Adapter whose lookup panics.
pub struct PanicAdapter(pub Provider);

impl ProviderAdapter for PanicAdapter {
    fn provider(&self) -> Provider {
        self.0
    }

    fn fetch<'a>(&'a self, _company: &'a str, _year: Option<&'a str>) -> OutcomeFuture<'a> {
        Box::pin(async move { explode() })
    }
}

fn explode() -> ProviderOutcome {
    panic!("adapter blew up")
}

/// The primary-score field each provider's mock uses.
pub fn score_field(provider: Provider) -> &'static str {
    match provider {
        Provider::SnP | Provider::Sustainalytics => "esg_score",
        Provider::Iss => "oekomRating",
        Provider::Lseg => "TR.TRESG",
        Provider::Msci => "ESG Rating",
        Provider::Cdp => "Response Score Band",
    }
}

/// One scored mock per default provider; returns the adapters and their call counters.
pub fn default_mocks(scores: [&str; 5]) -> (Vec<Arc<dyn ProviderAdapter>>, Vec<Arc<AtomicUsize>>) {
    let mut adapters = Vec::new();
    let mut counters = Vec::new();
    for (p, s) in Provider::DEFAULT.into_iter().zip(scores) {
        let m = MockAdapter::scored(p, score_field(p), s);
        counters.push(m.calls());
        adapters.push(m.shared());
    }
    (adapters, counters)
}

pub fn total_calls(counters: &[Arc<AtomicUsize>]) -> usize {
    counters.iter().map(|c| c.load(Ordering::SeqCst)).sum()
}
