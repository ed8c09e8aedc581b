//! Concurrent fan-out over providers.
//!
//! Each provider runs on its own spawned task and waits for a permit from the
//! client's shared pool, so a panic or a slow provider only affects its own
//! entry.

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::task::{JoinError, JoinHandle};

use crate::core::client::CacheMode;
use crate::core::{
    AggregateResult, CacheKey, CachedValue, EsgClient, EsgError, LookupRequest, NormalizedScore,
    Provider,
};
use crate::normalize::normalize;
use crate::providers::adapter_for;

/// Looks up one provider: cache, then pool permit, adapter and normalizer.
async fn run_provider(
    client: EsgClient,
    provider: Provider,
    company: String,
    year: Option<String>,
    cache_mode: CacheMode,
) -> NormalizedScore {
    let key = CacheKey::provider(&company, provider, year.as_deref());
    if cache_mode == CacheMode::Use
        && let Some(hit) = client.cache().get_score(&key).await
    {
        tracing::debug!(provider = %provider, company = %company, "cache hit");
        return hit;
    }

    // the pool is never closed, so a failed acquire only means running unbounded
    let _permit = client.pool().clone().acquire_owned().await.ok();
    let adapter = adapter_for(&client, provider);
    let outcome = adapter.fetch(&company, year.as_deref()).await;
    let score = normalize(provider, outcome);

    if cache_mode != CacheMode::Bypass && score.error.is_none() {
        client
            .cache()
            .insert(&key, CachedValue::Score(score.clone()))
            .await;
    }
    score
}

pub(crate) fn spawn_provider(
    client: &EsgClient,
    provider: Provider,
    request: &LookupRequest,
    cache_mode: CacheMode,
) -> JoinHandle<NormalizedScore> {
    tokio::spawn(run_provider(
        client.clone(),
        provider,
        request.name_for(provider).to_string(),
        request.year().map(str::to_string),
        cache_mode,
    ))
}

/// A task that died (panic or abort) becomes a failed entry for its provider.
pub(crate) fn settle_join(
    provider: Provider,
    joined: Result<NormalizedScore, JoinError>,
) -> NormalizedScore {
    joined.unwrap_or_else(|e| {
        tracing::error!(provider = %provider, error = %e, "provider task failed");
        NormalizedScore::failed(provider, format!("{provider} task failed: {e}"))
    })
}

/// Keeps first occurrences, in order.
pub(crate) fn dedup_providers(providers: impl IntoIterator<Item = Provider>) -> Vec<Provider> {
    let mut out: Vec<Provider> = Vec::new();
    for p in providers {
        if !out.contains(&p) {
            out.push(p);
        }
    }
    out
}

/* ---------------- Public API ---------------- */

/// A builder for one aggregation over several providers.
///
/// Defaults to the five non-CDP providers and [`CacheMode::Use`].
#[derive(Debug)]
pub struct AggregateBuilder {
    client: EsgClient,
    request: LookupRequest,
    providers: Vec<Provider>,
    cache_mode: CacheMode,
}

impl AggregateBuilder {
    /// Creates a builder for `request`.
    pub fn new(client: &EsgClient, request: LookupRequest) -> Self {
        Self {
            client: client.clone(),
            request,
            providers: Provider::DEFAULT.to_vec(),
            cache_mode: CacheMode::Use,
        }
    }

    /// Replaces the set of providers to query. Duplicates are ignored.
    #[must_use]
    pub fn providers(mut self, providers: impl IntoIterator<Item = Provider>) -> Self {
        self.providers = dedup_providers(providers);
        self
    }

    /// Sets the cache mode for this call.
    #[must_use]
    pub const fn cache_mode(mut self, mode: CacheMode) -> Self {
        self.cache_mode = mode;
        self
    }

    /// Runs every provider and waits for all of them.
    ///
    /// Never fails: each requested provider gets an entry, `"-"` when it had
    /// nothing to report.
    #[tracing::instrument(
        name = "aggregate",
        skip(self),
        fields(company = %self.request.company_name(), providers = self.providers.len())
    )]
    pub async fn fetch(self) -> AggregateResult {
        // overridden names are not part of the key, and a single provider is
        // already covered by its own entry
        let agg_key = (self.request.overrides().is_empty() && self.providers.len() > 1).then(|| {
            CacheKey::aggregate(
                self.request.company_name(),
                &self.providers,
                self.request.year(),
            )
        });

        if self.cache_mode == CacheMode::Use
            && let Some(key) = &agg_key
            && let Some(hit) = self.client.cache().get_aggregate(key).await
        {
            tracing::debug!(key = %key, "aggregate cache hit");
            return hit;
        }

        let mut tasks: FuturesUnordered<_> = self
            .providers
            .iter()
            .map(|&provider| {
                let handle = spawn_provider(&self.client, provider, &self.request, self.cache_mode);
                async move { (provider, handle.await) }
            })
            .collect();

        let mut result = AggregateResult::default();
        while let Some((provider, joined)) = tasks.next().await {
            result.insert(settle_join(provider, joined));
        }

        if self.cache_mode != CacheMode::Bypass
            && !result.has_errors()
            && let Some(key) = &agg_key
        {
            self.client
                .cache()
                .insert(key, CachedValue::Aggregate(result.clone()))
                .await;
        }
        result
    }
}

/// A builder for a single provider's entry, used for detail drill-downs.
#[derive(Debug)]
pub struct ProviderBuilder {
    client: EsgClient,
    provider: Provider,
    company: String,
    year: Option<String>,
    cache_mode: CacheMode,
}

impl ProviderBuilder {
    /// Creates a builder for `company` on `provider`.
    pub fn new(client: &EsgClient, provider: Provider, company: impl Into<String>) -> Self {
        Self {
            client: client.clone(),
            provider,
            company: company.into(),
            year: None,
            cache_mode: CacheMode::Use,
        }
    }

    /// Sets the disclosure year (CDP only).
    #[must_use]
    pub fn year(mut self, year: impl Into<String>) -> Self {
        self.year = Some(year.into());
        self
    }

    /// Sets the cache mode for this call.
    #[must_use]
    pub const fn cache_mode(mut self, mode: CacheMode) -> Self {
        self.cache_mode = mode;
        self
    }

    /// Fetches the provider's entry.
    ///
    /// # Errors
    ///
    /// Returns `EsgError::InvalidParams` if the company name is blank. Provider
    /// failures are reported inside the returned entry.
    #[tracing::instrument(
        name = "fetch_one",
        skip(self),
        fields(provider = %self.provider, company = %self.company)
    )]
    pub async fn fetch(self) -> Result<NormalizedScore, EsgError> {
        let mut request = LookupRequest::new(self.company)?;
        if let Some(year) = self.year {
            request = request.with_year(year);
        }
        let handle = spawn_provider(&self.client, self.provider, &request, self.cache_mode);
        Ok(settle_join(self.provider, handle.await))
    }
}

impl EsgClient {
    /// Aggregates the five default providers for `request`.
    ///
    /// Shorthand for [`AggregateBuilder::new`] followed by `fetch`.
    pub async fn aggregate(&self, request: &LookupRequest) -> AggregateResult {
        AggregateBuilder::new(self, request.clone()).fetch().await
    }

    /// Fetches a single provider's entry.
    ///
    /// # Errors
    ///
    /// Returns `EsgError::InvalidParams` if `company` is blank.
    pub async fn fetch_one(
        &self,
        provider: Provider,
        company: &str,
        year: Option<&str>,
    ) -> Result<NormalizedScore, EsgError> {
        let mut builder = ProviderBuilder::new(self, provider, company);
        if let Some(year) = year {
            builder = builder.year(year);
        }
        builder.fetch().await
    }
}
