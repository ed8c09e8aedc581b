use chrono::{DateTime, Utc};
use futures::stream::{FuturesUnordered, StreamExt};
use serde::Serialize;
use tokio::{
    select,
    sync::{mpsc, oneshot},
    task::{AbortHandle, JoinHandle},
};

use crate::aggregate::{dedup_providers, settle_join, spawn_provider};
use crate::core::client::CacheMode;
use crate::core::{EsgClient, EsgError, LookupRequest, NormalizedScore, Provider, Tier};

/* ---------------- Public API ---------------- */

/// Progress of one provider within a stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum EventStatus {
    /// The lookup has been queued.
    Fetching {
        /// Human-readable progress text.
        message: String,
    },
    /// The lookup finished; `score` is `"-"` when there was nothing to report.
    Success {
        /// Primary score.
        score: String,
        /// Band of `score`.
        tier: Tier,
    },
    /// The lookup failed seriously (upstream 5xx, network failure or a crashed task).
    Error {
        /// What went wrong.
        message: String,
    },
}

impl EventStatus {
    /// `true` for `Success` and `Error`.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Fetching { .. })
    }
}

/// One event of a score stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderEvent {
    /// Company as supplied by the caller.
    pub company: String,
    /// Provider this event is about.
    #[serde(rename = "source")]
    pub provider: Provider,
    /// What happened.
    #[serde(flatten)]
    pub status: EventStatus,
    /// When the event was produced.
    pub timestamp: DateTime<Utc>,
}

impl ProviderEvent {
    fn new(company: &str, provider: Provider, status: EventStatus) -> Self {
        Self {
            company: company.to_string(),
            provider,
            status,
            timestamp: Utc::now(),
        }
    }

    fn finished(company: &str, score: NormalizedScore) -> Self {
        let status = match score.error {
            Some(message) => EventStatus::Error { message },
            None => EventStatus::Success {
                score: score.primary_score,
                tier: score.tier,
            },
        };
        Self::new(company, score.provider, status)
    }

    /// The event as a server-sent-events frame: `data: {json}\n\n`.
    ///
    /// # Errors
    ///
    /// Returns `EsgError::Json` if the event cannot be serialized.
    pub fn to_sse_frame(&self) -> Result<String, EsgError> {
        Ok(format!("data: {}\n\n", serde_json::to_string(self)?))
    }
}

/// A handle for a running stream task.
pub struct StreamHandle {
    join: JoinHandle<()>,
    stop_tx: Option<oneshot::Sender<()>>,
}

impl StreamHandle {
    /// Ask the stream to stop, cancel outstanding lookups, and wait for it to finish.
    pub async fn stop(mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        let _ = self.join.await;
    }

    /// Immediately abort the driver task (no more events will be sent).
    pub fn abort(self) {
        self.join.abort();
    }
}

/// Builder to start a completion-ordered stream of provider events.
#[derive(Debug)]
pub struct ScoreStreamBuilder {
    client: EsgClient,
    request: LookupRequest,
    providers: Vec<Provider>,
    cache_mode: CacheMode,
    buffer: usize,
}

impl ScoreStreamBuilder {
    /// Start from an existing client (cloned internally).
    pub fn new(client: &EsgClient, request: LookupRequest) -> Self {
        Self {
            client: client.clone(),
            request,
            providers: Provider::DEFAULT.to_vec(),
            cache_mode: CacheMode::Use,
            buffer: 64,
        }
    }

    /// Stream these providers (replaces the default five).
    #[must_use]
    pub fn providers(mut self, providers: impl IntoIterator<Item = Provider>) -> Self {
        self.providers = dedup_providers(providers);
        self
    }

    /// Sets the cache mode for the lookups.
    #[must_use]
    pub const fn cache_mode(mut self, mode: CacheMode) -> Self {
        self.cache_mode = mode;
        self
    }

    /// Channel capacity. Default: 64.
    #[must_use]
    pub fn buffer(mut self, n: usize) -> Self {
        self.buffer = n.max(1);
        self
    }

    /// Spawns the stream.
    ///
    /// One `Fetching` event is sent per provider right away; then each
    /// provider's terminal event follows as soon as it completes. The receiver
    /// yields `None` once every provider has reported.
    ///
    /// # Errors
    ///
    /// Returns `EsgError::InvalidParams` if no provider was selected.
    pub fn start(self) -> Result<(StreamHandle, mpsc::Receiver<ProviderEvent>), EsgError> {
        if self.providers.is_empty() {
            return Err(EsgError::InvalidParams(
                "stream: at least one provider required".into(),
            ));
        }

        let (tx, rx) = mpsc::channel::<ProviderEvent>(self.buffer);
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

        let client = self.client;
        let request = self.request;
        let providers = self.providers;
        let cache_mode = self.cache_mode;

        let join = tokio::spawn(async move {
            let company = request.company_name().to_string();
            tracing::debug!(company = %company, providers = providers.len(), "score stream started");

            for &provider in &providers {
                let msg = format!("Fetching {provider} score...");
                let ev = ProviderEvent::new(&company, provider, EventStatus::Fetching { message: msg });
                if tx.send(ev).await.is_err() {
                    return;
                }
            }

            let mut aborts: Vec<AbortHandle> = Vec::with_capacity(providers.len());
            let mut pending: FuturesUnordered<_> = providers
                .iter()
                .map(|&provider| {
                    let handle = spawn_provider(&client, provider, &request, cache_mode);
                    aborts.push(handle.abort_handle());
                    async move { (provider, handle.await) }
                })
                .collect();

            // a dropped handle is not a stop request
            let mut stop_armed = true;
            loop {
                select! {
                    next = pending.next() => {
                        let Some((provider, joined)) = next else {
                            break;
                        };
                        let ev = ProviderEvent::finished(&company, settle_join(provider, joined));
                        if tx.send(ev).await.is_err() {
                            break;
                        }
                    }
                    res = &mut stop_rx, if stop_armed => {
                        if res.is_ok() {
                            tracing::debug!(company = %company, "score stream stopped");
                            break;
                        }
                        stop_armed = false;
                    }
                }
            }
            aborts.iter().for_each(AbortHandle::abort);
        });

        Ok((
            StreamHandle {
                join,
                stop_tx: Some(stop_tx),
            },
            rx,
        ))
    }
}

impl EsgClient {
    /// Streams the five default providers for `request`.
    ///
    /// # Errors
    ///
    /// See [`ScoreStreamBuilder::start`].
    pub fn stream(
        &self,
        request: &LookupRequest,
    ) -> Result<(StreamHandle, mpsc::Receiver<ProviderEvent>), EsgError> {
        ScoreStreamBuilder::new(self, request.clone()).start()
    }
}
