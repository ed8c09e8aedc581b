//! Public client surface + builder.
//! Internals are split into `constants` (UA + defaults) and `retry` (retry policy + cache modes).

mod constants;
mod retry;

pub use retry::{Backoff, CacheMode, RetryConfig};

use crate::core::{EsgError, Provider, ResultCache};
use crate::providers::ProviderAdapter;
use constants::{
    DEFAULT_CACHE_TTL_SECS, DEFAULT_CDP_RESPONSES, DEFAULT_ISS_DETAIL, DEFAULT_ISS_SEARCH,
    DEFAULT_LSEG_DETAIL, DEFAULT_LSEG_SUGGESTIONS, DEFAULT_MAX_WORKERS, DEFAULT_MSCI_TOOL,
    DEFAULT_SNP_DETAIL, DEFAULT_SNP_SEARCH, DEFAULT_SUSTAINALYTICS_RATING,
    DEFAULT_SUSTAINALYTICS_SEARCH, DEFAULT_TIMEOUT_SECS, USER_AGENT,
};
use reqwest::{Client, Method, RequestBuilder};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use url::Url;

/// Endpoint URLs for every provider.
///
/// All fields default to the public provider sites. Tests point them at a
/// mock server with [`Endpoints::rooted_at`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// S&P Global company autocomplete.
    pub snp_search: Url,
    /// S&P Global results page.
    pub snp_detail: Url,
    /// Sustainalytics dropdown search.
    pub sustainalytics_search: Url,
    /// Sustainalytics rating page root.
    pub sustainalytics_rating: Url,
    /// ISS company search.
    pub iss_search: Url,
    /// ISS company details root (must end with `/`).
    pub iss_detail: Url,
    /// LSEG suggestion list.
    pub lseg_suggestions: Url,
    /// LSEG score result.
    pub lseg_detail: Url,
    /// MSCI search tool page.
    pub msci_tool: Url,
    /// CDP responses table.
    pub cdp_responses: Url,
}

impl Endpoints {
    /// The public provider endpoints.
    ///
    /// # Errors
    ///
    /// Fails only if a built-in constant is not a valid URL.
    pub fn public() -> Result<Self, EsgError> {
        Ok(Self {
            snp_search: Url::parse(DEFAULT_SNP_SEARCH)?,
            snp_detail: Url::parse(DEFAULT_SNP_DETAIL)?,
            sustainalytics_search: Url::parse(DEFAULT_SUSTAINALYTICS_SEARCH)?,
            sustainalytics_rating: Url::parse(DEFAULT_SUSTAINALYTICS_RATING)?,
            iss_search: Url::parse(DEFAULT_ISS_SEARCH)?,
            iss_detail: Url::parse(DEFAULT_ISS_DETAIL)?,
            lseg_suggestions: Url::parse(DEFAULT_LSEG_SUGGESTIONS)?,
            lseg_detail: Url::parse(DEFAULT_LSEG_DETAIL)?,
            msci_tool: Url::parse(DEFAULT_MSCI_TOOL)?,
            cdp_responses: Url::parse(DEFAULT_CDP_RESPONSES)?,
        })
    }

    /// The public endpoint paths re-rooted at `origin` (e.g. `http://127.0.0.1:5000`).
    ///
    /// # Errors
    ///
    /// Returns `EsgError::Url` if `origin` is not a valid base URL.
    pub fn rooted_at(origin: &str) -> Result<Self, EsgError> {
        let origin = Url::parse(origin)?;
        let public = Self::public()?;
        let reroot = |u: &Url| origin.join(u.path());
        Ok(Self {
            snp_search: reroot(&public.snp_search)?,
            snp_detail: reroot(&public.snp_detail)?,
            sustainalytics_search: reroot(&public.sustainalytics_search)?,
            sustainalytics_rating: reroot(&public.sustainalytics_rating)?,
            iss_search: reroot(&public.iss_search)?,
            iss_detail: reroot(&public.iss_detail)?,
            lseg_suggestions: reroot(&public.lseg_suggestions)?,
            lseg_detail: reroot(&public.lseg_detail)?,
            msci_tool: reroot(&public.msci_tool)?,
            cdp_responses: reroot(&public.cdp_responses)?,
        })
    }
}

/// Cloneable handle holding the HTTP client, provider endpoints, the result
/// cache and the shared worker pool. Clones share the cache and the pool.
#[derive(Clone)]
pub struct EsgClient {
    http: Client,
    endpoints: Arc<Endpoints>,
    cookies: Arc<HashMap<Provider, String>>,
    retry: RetryConfig,
    cache: Arc<ResultCache>,
    pool: Arc<Semaphore>,
    max_workers: usize,
    adapters: Arc<HashMap<Provider, Arc<dyn ProviderAdapter>>>,
}

impl fmt::Debug for EsgClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EsgClient")
            .field("endpoints", &self.endpoints)
            .field("cookies", &self.cookies.keys().collect::<Vec<_>>())
            .field("retry", &self.retry)
            .field("cache", &self.cache)
            .field("max_workers", &self.max_workers)
            .field("adapter_overrides", &self.adapters.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl Default for EsgClient {
    fn default() -> Self {
        Self::builder().build().expect("default client")
    }
}

impl EsgClient {
    /// Create a new builder.
    pub fn builder() -> EsgClientBuilder {
        EsgClientBuilder::default()
    }

    /// The shared result cache.
    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }

    /// Maximum number of provider lookups running at once across all clones.
    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// The configured provider endpoints.
    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /* -------- internal getters used by other modules -------- */

    pub(crate) fn pool(&self) -> &Arc<Semaphore> {
        &self.pool
    }

    pub(crate) fn adapter_override(&self, provider: Provider) -> Option<Arc<dyn ProviderAdapter>> {
        self.adapters.get(&provider).cloned()
    }

    /// A request carrying the provider's session cookie and browser-like accept headers.
    pub(crate) fn request(
        &self,
        method: Method,
        provider: Provider,
        url: Url,
        accept: &str,
    ) -> RequestBuilder {
        let mut req = self
            .http
            .request(method, url)
            .header("accept", accept)
            .header("accept-language", "en-US,en;q=0.9");
        if let Some(cookie) = self.cookies.get(&provider) {
            req = req.header("cookie", cookie);
        }
        req
    }
}

/* ----------------------- Builder ----------------------- */

/// Builder for [`EsgClient`].
#[derive(Default)]
pub struct EsgClientBuilder {
    user_agent: Option<String>,
    endpoints: Option<Endpoints>,
    cookies: HashMap<Provider, String>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    retry: Option<RetryConfig>,
    cache_ttl: Option<Duration>,
    cache: Option<Arc<ResultCache>>,
    max_workers: Option<usize>,
    adapters: HashMap<Provider, Arc<dyn ProviderAdapter>>,
}

impl EsgClientBuilder {
    /// A builder pre-populated from `ESG_*` environment variables.
    ///
    /// Recognized: `ESG_USER_AGENT`, `ESG_TIMEOUT_SECS`, `ESG_CACHE_TTL_SECS`,
    /// `ESG_MAX_WORKERS`, `ESG_RETRY_ENABLED` and `ESG_COOKIE_<PROVIDER>`
    /// (`SNP`, `SUSTAINALYTICS`, `ISS`, `LSEG`, `MSCI`, `CDP`). Unparseable
    /// values are ignored with a warning.
    #[must_use]
    pub fn from_env() -> Self {
        fn var(name: &str) -> Option<String> {
            std::env::var(name).ok().filter(|v| !v.trim().is_empty())
        }
        fn parsed<T: std::str::FromStr>(name: &str) -> Option<T> {
            let raw = var(name)?;
            let v = raw.trim().parse().ok();
            if v.is_none() {
                tracing::warn!(var = name, value = %raw, "ignoring unparseable setting");
            }
            v
        }

        let mut b = Self::default();
        if let Some(ua) = var("ESG_USER_AGENT") {
            b = b.user_agent(ua);
        }
        if let Some(secs) = parsed::<u64>("ESG_TIMEOUT_SECS") {
            b = b.timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = parsed::<u64>("ESG_CACHE_TTL_SECS") {
            b = b.cache_ttl(Duration::from_secs(secs));
        }
        if let Some(n) = parsed::<usize>("ESG_MAX_WORKERS") {
            b = b.max_workers(n);
        }
        if let Some(on) = parsed::<bool>("ESG_RETRY_ENABLED") {
            b = b.retry_enabled(on);
        }
        for (suffix, provider) in [
            ("SNP", Provider::SnP),
            ("SUSTAINALYTICS", Provider::Sustainalytics),
            ("ISS", Provider::Iss),
            ("LSEG", Provider::Lseg),
            ("MSCI", Provider::Msci),
            ("CDP", Provider::Cdp),
        ] {
            if let Some(cookie) = var(&format!("ESG_COOKIE_{suffix}")) {
                b = b.session_cookie(provider, cookie);
            }
        }
        b
    }

    /// Override the User-Agent.
    #[must_use]
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Override all provider endpoints.
    #[must_use]
    pub fn endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = Some(endpoints);
        self
    }

    /// Send this `cookie` header value with every request to `provider`.
    #[must_use]
    pub fn session_cookie(mut self, provider: Provider, cookie: impl Into<String>) -> Self {
        self.cookies.insert(provider, cookie.into());
        self
    }

    /// Set the per-request timeout. Default: 10 seconds.
    #[must_use]
    pub fn timeout(mut self, dur: Duration) -> Self {
        self.timeout = Some(dur);
        self
    }

    /// Set a connect timeout. Default: none.
    #[must_use]
    pub fn connect_timeout(mut self, dur: Duration) -> Self {
        self.connect_timeout = Some(dur);
        self
    }

    /// Replace the retry policy.
    #[must_use]
    pub fn retry_config(mut self, cfg: RetryConfig) -> Self {
        self.retry = Some(cfg);
        self
    }

    /// Enable or disable retries while keeping the rest of the policy.
    #[must_use]
    pub fn retry_enabled(mut self, enabled: bool) -> Self {
        let mut cfg = self.retry.take().unwrap_or_default();
        cfg.enabled = enabled;
        self.retry = Some(cfg);
        self
    }

    /// Default TTL for a freshly created cache. Default: 300 seconds.
    /// Ignored when [`cache`](Self::cache) supplies one.
    #[must_use]
    pub fn cache_ttl(mut self, dur: Duration) -> Self {
        self.cache_ttl = Some(dur);
        self
    }

    /// Share an existing cache (for example one built with a manual clock).
    #[must_use]
    pub fn cache(mut self, cache: Arc<ResultCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Size of the shared worker pool. Values below 1 are raised to 1.
    #[must_use]
    pub fn max_workers(mut self, n: usize) -> Self {
        self.max_workers = Some(n);
        self
    }

    /// Replace the built-in adapter for `adapter.provider()`.
    #[must_use]
    pub fn adapter(mut self, adapter: Arc<dyn ProviderAdapter>) -> Self {
        self.adapters.insert(adapter.provider(), adapter);
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn build(self) -> Result<EsgClient, EsgError> {
        let endpoints = match self.endpoints {
            Some(e) => e,
            None => Endpoints::public()?,
        };

        let mut httpb = reqwest::Client::builder()
            .user_agent(self.user_agent.as_deref().unwrap_or(USER_AGENT))
            .cookie_store(true)
            .timeout(
                self.timeout
                    .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            );
        if let Some(ct) = self.connect_timeout {
            httpb = httpb.connect_timeout(ct);
        }
        let http = httpb.build()?;

        let cache = self.cache.unwrap_or_else(|| {
            Arc::new(ResultCache::new(
                self.cache_ttl
                    .unwrap_or(Duration::from_secs(DEFAULT_CACHE_TTL_SECS)),
            ))
        });
        let max_workers = self.max_workers.unwrap_or(DEFAULT_MAX_WORKERS).max(1);

        Ok(EsgClient {
            http,
            endpoints: Arc::new(endpoints),
            cookies: Arc::new(self.cookies),
            retry: self.retry.unwrap_or_default(),
            cache,
            pool: Arc::new(Semaphore::new(max_workers)),
            max_workers,
            adapters: Arc::new(self.adapters),
        })
    }
}
