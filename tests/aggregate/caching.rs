use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use esg_scores::{
    AggregateBuilder, CacheKey, CacheMode, LookupRequest, ManualClock, Provider, ProviderOutcome,
    ResultCache,
};

use crate::common::{MockAdapter, default_mocks, mock_builder, mock_client, total_calls};

#[tokio::test]
async fn repeated_aggregate_is_served_from_cache() {
    let (adapters, counters) = default_mocks(["78", "13.7", "B", "82", "AAA"]);
    let client = mock_client(&adapters);
    let request = LookupRequest::new("Microsoft").unwrap();

    let first = client.aggregate(&request).await;
    assert_eq!(total_calls(&counters), 5);

    let second = client.aggregate(&request).await;
    assert_eq!(total_calls(&counters), 5);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );

    let key = CacheKey::aggregate("MICROSOFT", &Provider::DEFAULT, None);
    assert!(client.cache().get(&key).await.is_some());
}

#[tokio::test]
async fn entries_expire_with_the_injected_clock() {
    let clock = Arc::new(ManualClock::new());
    let cache = Arc::new(ResultCache::with_clock(Duration::from_secs(300), clock.clone()));
    let (adapters, counters) = default_mocks(["60", "20", "C", "55", "BB"]);
    let client = mock_builder(&adapters).cache(cache).build().unwrap();
    let request = LookupRequest::new("Nestle").unwrap();

    client.aggregate(&request).await;
    clock.advance(Duration::from_secs(299));
    client.aggregate(&request).await;
    assert_eq!(total_calls(&counters), 5);

    clock.advance(Duration::from_secs(2));
    client.aggregate(&request).await;
    assert_eq!(total_calls(&counters), 10);
}

#[tokio::test]
async fn serious_failures_are_never_cached() {
    let failing = MockAdapter::new(
        Provider::Msci,
        ProviderOutcome::serious("MSCI error: Server error 500"),
    );
    let missing = MockAdapter::not_found(Provider::Iss);
    let failing_calls = failing.calls();
    let missing_calls = missing.calls();
    let client = mock_client(&[failing.shared(), missing.shared()]);

    for _ in 0..2 {
        AggregateBuilder::new(&client, LookupRequest::new("Glencore").unwrap())
            .providers([Provider::Msci, Provider::Iss])
            .fetch()
            .await;
    }

    assert_eq!(failing_calls.load(Ordering::SeqCst), 2);
    // "no data" is a valid answer and is cached
    assert_eq!(missing_calls.load(Ordering::SeqCst), 1);

    let agg = CacheKey::aggregate("Glencore", &[Provider::Msci, Provider::Iss], None);
    assert!(client.cache().get(&agg).await.is_none());
}

#[tokio::test]
async fn refresh_refetches_and_bypass_leaves_cache_untouched() {
    let msci = MockAdapter::scored(Provider::Msci, "ESG Rating", "A");
    let calls = msci.calls();
    let client = mock_client(&[msci.shared()]);
    let run = |mode: CacheMode| {
        AggregateBuilder::new(&client, LookupRequest::new("BHP").unwrap())
            .providers([Provider::Msci])
            .cache_mode(mode)
            .fetch()
    };

    run(CacheMode::Bypass).await;
    assert_eq!(client.cache().stats().await.total, 0);

    run(CacheMode::Use).await;
    run(CacheMode::Use).await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    run(CacheMode::Refresh).await;
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn overridden_requests_skip_the_aggregate_entry() {
    let msci = MockAdapter::scored(Provider::Msci, "ESG Rating", "AA");
    let lseg = MockAdapter::scored(Provider::Lseg, "TR.TRESG", "70");
    let client = mock_client(&[msci.shared(), lseg.shared()]);

    let request = LookupRequest::new("Alphabet")
        .unwrap()
        .with_override(Provider::Msci, "ALPHABET INC.");
    AggregateBuilder::new(&client, request)
        .providers([Provider::Msci, Provider::Lseg])
        .fetch()
        .await;

    let agg = CacheKey::aggregate("Alphabet", &[Provider::Msci, Provider::Lseg], None);
    assert_eq!(agg.to_string(), "alphabet|LSEG+MSCI|current");
    assert!(client.cache().get(&agg).await.is_none());

    let msci_key = CacheKey::provider("ALPHABET INC.", Provider::Msci, None);
    let lseg_key = CacheKey::provider("Alphabet", Provider::Lseg, None);
    assert!(client.cache().get(&msci_key).await.is_some());
    assert!(client.cache().get(&lseg_key).await.is_some());
}
