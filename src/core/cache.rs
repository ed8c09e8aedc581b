use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

use crate::core::{AggregateResult, NormalizedScore, Provider};

/// Writes between sweeps of expired entries.
pub const PURGE_EVERY: u64 = 64;

/// Source of "now" for cache expiry.
pub trait Clock: fmt::Debug + Send + Sync {
    /// The current instant.
    fn now(&self) -> Instant;
}

/// The monotonic system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to. Useful for exercising TTL expiry.
#[derive(Debug)]
pub struct ManualClock {
    base: Instant,
    offset_nanos: AtomicU64,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    /// A clock frozen at the current instant.
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset_nanos: AtomicU64::new(0),
        }
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: Duration) {
        let nanos = u64::try_from(by.as_nanos()).unwrap_or(u64::MAX);
        self.offset_nanos.fetch_add(nanos, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + Duration::from_nanos(self.offset_nanos.load(Ordering::SeqCst))
    }
}

/// Which providers a cache entry covers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    /// The five default providers.
    All,
    /// A single provider.
    Provider(Provider),
    /// Any other provider set, sorted and deduplicated.
    Set(Vec<Provider>),
}

impl Scope {
    /// The scope covering exactly `providers`.
    pub fn of(providers: &[Provider]) -> Self {
        let mut set = providers.to_vec();
        set.sort_unstable();
        set.dedup();
        if set == Provider::DEFAULT {
            Self::All
        } else if let [one] = set.as_slice() {
            Self::Provider(*one)
        } else {
            Self::Set(set)
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("ALL"),
            Self::Provider(p) => f.write_str(p.name()),
            Self::Set(set) => {
                let names: Vec<&str> = set.iter().map(|p| p.name()).collect();
                f.write_str(&names.join("+"))
            }
        }
    }
}

/// Deterministic cache key: `company|scope|year`.
///
/// The company part is trimmed and lower-cased, and a missing year renders as
/// `current`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    company: String,
    scope: Scope,
    year: Option<String>,
}

impl CacheKey {
    /// A key for an arbitrary scope.
    pub fn new(company: &str, scope: Scope, year: Option<&str>) -> Self {
        Self {
            company: Self::company_part(company),
            scope,
            year: year
                .map(str::trim)
                .filter(|y| !y.is_empty())
                .map(str::to_string),
        }
    }

    /// The key of an aggregate over `providers`.
    pub fn aggregate(company: &str, providers: &[Provider], year: Option<&str>) -> Self {
        Self::new(company, Scope::of(providers), year)
    }

    /// The key of one provider's normalized score.
    pub fn provider(company: &str, provider: Provider, year: Option<&str>) -> Self {
        Self::new(company, Scope::Provider(provider), year)
    }

    /// The prefix shared by every key of `company`, for [`ResultCache::clear_matching`].
    pub fn company_prefix(company: &str) -> String {
        format!("{}|", Self::company_part(company))
    }

    fn company_part(company: &str) -> String {
        company.trim().to_lowercase()
    }

    /// The scope component.
    pub fn scope(&self) -> &Scope {
        &self.scope
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}|{}|{}",
            self.company,
            self.scope,
            self.year.as_deref().unwrap_or("current")
        )
    }
}

/// A cached value.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedValue {
    /// A full aggregate.
    Aggregate(AggregateResult),
    /// One provider's entry.
    Score(NormalizedScore),
}

/// Entry counts reported by [`ResultCache::stats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    /// All stored entries.
    pub total: usize,
    /// Entries still within their TTL.
    pub live: usize,
    /// Entries past their TTL that have not been replaced or purged yet.
    pub expired: usize,
}

#[derive(Debug)]
struct CacheEntry {
    value: CachedValue,
    stored_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_live(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.stored_at) < self.ttl
    }
}

/// In-process TTL cache for aggregates and per-provider scores.
///
/// Entries are replaced wholesale on write. Expired entries read as misses;
/// every [`PURGE_EVERY`] writes they are swept from the map.
#[derive(Debug)]
pub struct ResultCache {
    map: RwLock<HashMap<String, CacheEntry>>,
    default_ttl: Duration,
    clock: Arc<dyn Clock>,
    writes: AtomicU64,
}

impl ResultCache {
    /// A cache on the system clock.
    pub fn new(default_ttl: Duration) -> Self {
        Self::with_clock(default_ttl, Arc::new(SystemClock))
    }

    /// A cache on a caller-supplied clock.
    pub fn with_clock(default_ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            map: RwLock::new(HashMap::new()),
            default_ttl,
            clock,
            writes: AtomicU64::new(0),
        }
    }

    /// TTL used by [`insert`](Self::insert).
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// The live value under `key`, if any.
    pub async fn get(&self, key: &CacheKey) -> Option<CachedValue> {
        let now = self.clock.now();
        let guard = self.map.read().await;
        guard
            .get(&key.to_string())
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.value.clone())
    }

    pub(crate) async fn get_aggregate(&self, key: &CacheKey) -> Option<AggregateResult> {
        match self.get(key).await? {
            CachedValue::Aggregate(agg) => Some(agg),
            CachedValue::Score(_) => None,
        }
    }

    pub(crate) async fn get_score(&self, key: &CacheKey) -> Option<NormalizedScore> {
        match self.get(key).await? {
            CachedValue::Score(score) => Some(score),
            CachedValue::Aggregate(_) => None,
        }
    }

    /// Stores `value` under `key` for `ttl`, replacing any previous entry.
    pub async fn set(&self, key: &CacheKey, value: CachedValue, ttl: Duration) {
        let entry = CacheEntry {
            value,
            stored_at: self.clock.now(),
            ttl,
        };
        let now = entry.stored_at;
        let mut guard = self.map.write().await;
        guard.insert(key.to_string(), entry);

        if (self.writes.fetch_add(1, Ordering::Relaxed) + 1) % PURGE_EVERY == 0 {
            let removed = Self::sweep(&mut guard, now);
            if removed > 0 {
                tracing::debug!(removed, "swept expired cache entries on write");
            }
        }
    }

    /// Stores `value` under `key` with the default TTL.
    pub async fn insert(&self, key: &CacheKey, value: CachedValue) {
        self.set(key, value, self.default_ttl).await;
    }

    /// Drops every entry.
    pub async fn clear(&self) {
        self.map.write().await.clear();
    }

    /// Drops the entries whose rendered key starts with `prefix`; returns how many.
    pub async fn clear_matching(&self, prefix: &str) -> usize {
        let mut guard = self.map.write().await;
        let before = guard.len();
        guard.retain(|k, _| !k.starts_with(prefix));
        before - guard.len()
    }

    /// Drops expired entries; returns how many.
    pub async fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut guard = self.map.write().await;
        let removed = Self::sweep(&mut guard, now);
        if removed > 0 {
            tracing::debug!(removed, "purged expired cache entries");
        }
        removed
    }

    fn sweep(map: &mut HashMap<String, CacheEntry>, now: Instant) -> usize {
        let before = map.len();
        map.retain(|_, entry| entry.is_live(now));
        before - map.len()
    }

    /// Current entry counts.
    pub async fn stats(&self) -> CacheStats {
        let now = self.clock.now();
        let guard = self.map.read().await;
        let live = guard.values().filter(|e| e.is_live(now)).count();
        CacheStats {
            total: guard.len(),
            live,
            expired: guard.len() - live,
        }
    }
}
