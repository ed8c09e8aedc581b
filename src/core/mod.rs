//! Core components of the `esg-scores` engine.
//!
//! This module contains the foundational building blocks of the library, including:
//! - The main [`EsgClient`] and its builder.
//! - The primary [`EsgError`] type.
//! - Shared data models like [`Provider`], [`NormalizedScore`] and [`AggregateResult`].
//! - The TTL result cache and its clock.

/// The time-bounded result cache (`ResultCache`) and its clock abstraction.
pub mod cache;
/// The main client (`EsgClient`), builder, endpoints and retry configuration.
pub mod client;
/// The primary error type (`EsgError`) for the crate.
pub mod error;
/// Shared data models used across the engine.
pub mod models;

pub(crate) mod classify;
/// Company-name normalization and fuzzy candidate selection.
pub mod matching;
pub(crate) mod net;
pub(crate) mod scrape;

#[cfg(feature = "debug-dumps")]
pub(crate) mod fixtures;

// convenient re-exports so most code can just `use crate::core::EsgClient`
pub use cache::{
    CacheKey, CacheStats, CachedValue, Clock, ManualClock, PURGE_EVERY, ResultCache, Scope,
    SystemClock,
};
pub use client::{EsgClient, EsgClientBuilder, Endpoints};
pub use error::EsgError;
pub use models::{
    AggregateResult, Detail, LookupRequest, NO_SCORE, NormalizedScore, Provider, ProviderOutcome,
    Severity, Tier,
};
