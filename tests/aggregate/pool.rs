use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use esg_scores::{
    AggregateBuilder, CacheMode, Detail, LookupRequest, OutcomeFuture, Provider, ProviderAdapter,
    ProviderOutcome,
};

use crate::common::mock_builder;

/// Tracks how many lookups run at the same time.
struct GaugeAdapter {
    provider: Provider,
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl ProviderAdapter for GaugeAdapter {
    fn provider(&self) -> Provider {
        self.provider
    }

    fn fetch<'a>(&'a self, _company: &'a str, _year: Option<&'a str>) -> OutcomeFuture<'a> {
        Box::pin(async move {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(30)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            ProviderOutcome::Found(Detail::empty_record())
        })
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_lookups_never_exceed_max_workers() {
    let in_flight = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let adapters: Vec<Arc<dyn ProviderAdapter>> = Provider::ALL
        .into_iter()
        .map(|provider| {
            Arc::new(GaugeAdapter {
                provider,
                in_flight: in_flight.clone(),
                peak: peak.clone(),
            }) as Arc<dyn ProviderAdapter>
        })
        .collect();
    let client = mock_builder(&adapters).max_workers(2).build().unwrap();

    let companies = ["Rio Tinto", "Anglo American", "Vale"];
    let runs = companies.iter().map(|name| {
        AggregateBuilder::new(&client, LookupRequest::new(*name).unwrap())
            .providers(Provider::ALL)
            .cache_mode(CacheMode::Bypass)
            .fetch()
    });
    let results = futures::future::join_all(runs).await;

    assert!(results.iter().all(|r| r.len() == 6));
    assert!(peak.load(Ordering::SeqCst) <= 2, "peak {}", peak.load(Ordering::SeqCst));
    assert!(peak.load(Ordering::SeqCst) >= 1);
}
