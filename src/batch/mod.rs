//! Sequential scoring of many companies.
//!
//! Each company runs a full aggregation; progress is reported through a
//! callback, and cancellation is honoured between companies.

mod sheet;
mod table;

pub use sheet::Sheet;
pub use table::BatchItem;

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::aggregate::{AggregateBuilder, dedup_providers};
use crate::core::client::CacheMode;
use crate::core::{AggregateResult, EsgClient, LookupRequest, Provider};

/// Default number of processed companies between forced cache clears.
pub const DEFAULT_CLEAR_CACHE_EVERY: usize = 50;

/// Progress after one company has been processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchProgress {
    /// 1-based index of the company just processed.
    pub current: usize,
    /// Number of items in the batch.
    pub total: usize,
    /// The company just processed.
    pub company: String,
    /// `current / total` as a whole percentage.
    pub percent: u8,
}

/// Progress callback.
pub type ProgressFn = Arc<dyn Fn(BatchProgress) + Send + Sync>;

/// Shared cancellation flag, checked before each company.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// A flag that is not set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// `true` once [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Results of a batch run, in input order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchReport {
    /// `(company name, aggregate)` for every processed item.
    pub results: Vec<(String, AggregateResult)>,
    /// `true` if the run stopped early because of the cancel flag.
    pub cancelled: bool,
}

/// A builder for a batch run.
pub struct BatchBuilder {
    client: EsgClient,
    items: Vec<BatchItem>,
    providers: Vec<Provider>,
    on_progress: Option<ProgressFn>,
    cancel: CancelFlag,
    clear_cache_every: usize,
    cache_mode: CacheMode,
}

impl fmt::Debug for BatchBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchBuilder")
            .field("items", &self.items.len())
            .field("providers", &self.providers)
            .field("on_progress", &self.on_progress.is_some())
            .field("cancel", &self.cancel)
            .field("clear_cache_every", &self.clear_cache_every)
            .field("cache_mode", &self.cache_mode)
            .finish_non_exhaustive()
    }
}

impl BatchBuilder {
    /// Start from an existing client (cloned internally).
    pub fn new(client: &EsgClient) -> Self {
        Self {
            client: client.clone(),
            items: Vec::new(),
            providers: Provider::DEFAULT.to_vec(),
            on_progress: None,
            cancel: CancelFlag::new(),
            clear_cache_every: DEFAULT_CLEAR_CACHE_EVERY,
            cache_mode: CacheMode::Use,
        }
    }

    /// Companies to process (replaces).
    #[must_use]
    pub fn items(mut self, items: impl IntoIterator<Item = BatchItem>) -> Self {
        self.items = items.into_iter().collect();
        self
    }

    /// Add a single company.
    #[must_use]
    pub fn add_item(mut self, item: BatchItem) -> Self {
        self.items.push(item);
        self
    }

    /// Providers queried for each company. Default: the five non-CDP providers.
    #[must_use]
    pub fn providers(mut self, providers: impl IntoIterator<Item = Provider>) -> Self {
        self.providers = dedup_providers(providers);
        self
    }

    /// Called once per processed company.
    #[must_use]
    pub fn on_progress(mut self, f: ProgressFn) -> Self {
        self.on_progress = Some(f);
        self
    }

    /// Use a caller-owned cancellation flag.
    #[must_use]
    pub fn cancel_flag(mut self, flag: CancelFlag) -> Self {
        self.cancel = flag;
        self
    }

    /// Clear the whole result cache after every `n` processed companies.
    /// `0` disables. Default: 50.
    #[must_use]
    pub const fn clear_cache_every(mut self, n: usize) -> Self {
        self.clear_cache_every = n;
        self
    }

    /// Sets the cache mode for each aggregation.
    #[must_use]
    pub const fn cache_mode(mut self, mode: CacheMode) -> Self {
        self.cache_mode = mode;
        self
    }

    /// Processes the items in order.
    ///
    /// Items with a blank company name are skipped with a warning. The run
    /// stops before the next item once the cancel flag is set; a company
    /// already in flight always finishes.
    #[tracing::instrument(name = "batch", skip(self), fields(items = self.items.len()))]
    pub async fn run(self) -> BatchReport {
        let total = self.items.len();
        let mut report = BatchReport::default();

        for (idx, item) in self.items.into_iter().enumerate() {
            if self.cancel.is_cancelled() {
                tracing::info!(processed = idx, total, "batch cancelled");
                report.cancelled = true;
                break;
            }

            let request = match LookupRequest::new(&item.company_name) {
                Ok(req) => req.with_overrides(item.overrides.clone()),
                Err(e) => {
                    tracing::warn!(index = idx, error = %e, "skipping batch item");
                    continue;
                }
            };
            let result = AggregateBuilder::new(&self.client, request)
                .providers(self.providers.iter().copied())
                .cache_mode(self.cache_mode)
                .fetch()
                .await;
            let company = item.company_name.trim().to_string();
            report.results.push((company.clone(), result));

            let current = idx + 1;
            if let Some(cb) = &self.on_progress {
                let percent = u8::try_from(current * 100 / total.max(1)).unwrap_or(100);
                cb(BatchProgress {
                    current,
                    total,
                    company,
                    percent,
                });
            }

            if self.clear_cache_every > 0 && current % self.clear_cache_every == 0 {
                tracing::debug!(processed = current, "clearing result cache");
                self.client.cache().clear().await;
            }
        }
        report
    }
}
