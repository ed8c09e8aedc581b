//! esg-scores: concurrent multi-provider ESG score lookup.
//!
//! One [`EsgClient`] queries S&P Global, Sustainalytics, ISS, LSEG and MSCI
//! (plus the year-scoped CDP responses) in parallel, normalizes every answer
//! into a [`NormalizedScore`], and caches the results.
//!
//! ```no_run
//! # async fn run() -> Result<(), esg_scores::EsgError> {
//! use esg_scores::{EsgClient, LookupRequest, Provider};
//!
//! let client = EsgClient::builder().build()?;
//! let request = LookupRequest::new("Microsoft Corporation")?;
//! let result = client.aggregate(&request).await;
//! println!("MSCI: {}", result.score(Provider::Msci));
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod batch;
pub mod core;
pub mod normalize;
pub mod providers;
pub mod stream;

pub use crate::core::client::{Backoff, CacheMode, RetryConfig};
pub use crate::core::{
    AggregateResult, CacheKey, CacheStats, CachedValue, Clock, Detail, Endpoints, EsgClient,
    EsgClientBuilder, EsgError, LookupRequest, ManualClock, NO_SCORE, NormalizedScore, Provider,
    PURGE_EVERY, ProviderOutcome, ResultCache, Scope, Severity, SystemClock, Tier,
};
pub use aggregate::{AggregateBuilder, ProviderBuilder};
pub use batch::{BatchBuilder, BatchItem, BatchProgress, BatchReport, CancelFlag, Sheet};
pub use normalize::{normalize, primary_score, tier};
pub use providers::{OutcomeFuture, ProviderAdapter};
pub use stream::{EventStatus, ProviderEvent, ScoreStreamBuilder, StreamHandle};

/// Installs a compact `fmt` subscriber filtered by `ESG_LOG` (default `info`).
///
/// # Errors
///
/// Fails if `ESG_LOG` is not a valid filter or a global subscriber is already set.
#[cfg(feature = "tracing-subscriber")]
pub fn init_tracing() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    use tracing_subscriber::EnvFilter;

    let filter = match std::env::var("ESG_LOG") {
        Ok(value) => EnvFilter::try_new(value)?,
        Err(_) => EnvFilter::new("info"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .try_init()
}
