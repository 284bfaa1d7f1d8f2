//! Rate-limited send queue for a single provider.
//!
//! One drain loop per limiter pulls requests off the queue as tokens and
//! concurrency slots allow, and spawns a dispatch task per request. Retryable
//! failures back off and re-enter at the head of the queue.

use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::{Notify, oneshot};
use uuid::Uuid;

use outbound_core::DispatchError;
use outbound_core::domain::{
    LimiterStatus, Progress, ProviderId, RateLimitProfile, SendParams, SendRecord, SendResult,
    SenderConfig,
};
use outbound_core::ports::{ProviderAdapter, ProviderError, RetryableErrorKind, SendHistory};

use super::bucket::TokenBucket;

/// Fallback re-check interval while every concurrency slot is taken.
const SLOT_POLL_INTERVAL: Duration = Duration::from_millis(50);
/// Floor on the token wait so the loop never spins.
const MIN_TOKEN_WAIT: Duration = Duration::from_millis(10);
pub(super) const HISTORY_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Whole milliseconds for log fields, saturating at `u64::MAX`.
pub(super) fn saturating_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Callback invoked on every queue state transition.
pub type ProgressObserver = Arc<dyn Fn(Progress) + Send + Sync>;

type Reply = Result<SendResult, DispatchError>;

/// Handle to a queued send. Resolves once the request completes.
#[must_use = "a send handle does nothing unless awaited"]
pub struct SendHandle {
    id: Uuid,
    rx: oneshot::Receiver<Reply>,
}

impl SendHandle {
    /// Request id, as logged by the limiter.
    pub fn id(&self) -> Uuid {
        self.id
    }
}

impl Future for SendHandle {
    type Output = Reply;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|reply| reply.unwrap_or(Err(DispatchError::Dropped)))
    }
}

struct QueuedRequest {
    id: Uuid,
    config: SenderConfig,
    params: SendParams,
    responder: oneshot::Sender<Reply>,
    retry_count: u32,
}

impl QueuedRequest {
    fn resolve(self, result: SendResult) {
        if self.responder.send(Ok(result)).is_err() {
            tracing::debug!(request_id = %self.id, "Caller dropped send handle before completion");
        }
    }

    fn reject(self, error: DispatchError) {
        let _ = self.responder.send(Err(error));
    }
}

/// Batch-scoped state. Cleared by `reset`; the bucket lives outside it.
#[derive(Default)]
struct BatchState {
    queue: VecDeque<QueuedRequest>,
    in_flight: usize,
    completed: usize,
    total: usize,
    aborted: bool,
    is_processing: bool,
    generation: u64,
}

impl BatchState {
    fn progress(&self) -> Progress {
        Progress {
            queued: self.queue.len(),
            in_flight: self.in_flight,
            completed: self.completed,
            total: self.total,
        }
    }

    /// Mark the drain loop as running. Returns the generation to run it for,
    /// or `None` if a loop is already active.
    fn claim_drain(&mut self) -> Option<u64> {
        if self.is_processing {
            None
        } else {
            self.is_processing = true;
            Some(self.generation)
        }
    }
}

/// What the drain loop should do next, decided under the batch lock.
enum Step {
    Idle,
    WaitForSlot,
    WaitForToken(Duration),
    Dispatch(QueuedRequest, Progress),
}

/// Adapter outcome after retry classification.
enum Classified {
    Done(SendResult),
    Retry {
        kind: RetryableErrorKind,
        detail: String,
        retry_after: Option<Duration>,
    },
}

fn classify(outcome: Result<SendResult, ProviderError>) -> Classified {
    match outcome {
        Ok(result) if result.looks_rate_limited() => Classified::Retry {
            kind: RetryableErrorKind::RateLimited,
            detail: result.detail.unwrap_or_default(),
            retry_after: None,
        },
        Ok(result) => Classified::Done(result),
        Err(err) => match err.retry_kind() {
            Some(kind) => Classified::Retry {
                kind,
                retry_after: err.retry_after(),
                detail: err.to_string(),
            },
            None => Classified::Done(SendResult::needs_attention(err.to_string())),
        },
    }
}

struct Inner {
    adapter: Arc<dyn ProviderAdapter>,
    profile: RateLimitProfile,
    bucket: Mutex<TokenBucket>,
    batch: Mutex<BatchState>,
    slot_released: Notify,
    observer: Mutex<Option<ProgressObserver>>,
    history: Option<Arc<dyn SendHistory>>,
}

/// Rate-limited, retrying send queue in front of one provider adapter.
///
/// Cloning shares the same queue and bucket. Obtain instances from
/// `LimiterRegistry`.
#[derive(Clone)]
pub struct RateLimiter {
    inner: Arc<Inner>,
}

impl fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimiter")
            .field("provider", &self.provider())
            .field("profile", &self.inner.profile)
            .finish_non_exhaustive()
    }
}

impl RateLimiter {
    pub(crate) fn new(
        adapter: Arc<dyn ProviderAdapter>,
        profile: RateLimitProfile,
        history: Option<Arc<dyn SendHistory>>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                bucket: Mutex::new(TokenBucket::from_profile(&profile)),
                adapter,
                profile,
                batch: Mutex::new(BatchState::default()),
                slot_released: Notify::new(),
                observer: Mutex::new(None),
                history,
            }),
        }
    }

    pub fn provider(&self) -> ProviderId {
        self.inner.adapter.id()
    }

    pub fn profile(&self) -> &RateLimitProfile {
        &self.inner.profile
    }

    pub fn adapter(&self) -> Arc<dyn ProviderAdapter> {
        Arc::clone(&self.inner.adapter)
    }

    /// Queue a send and return immediately.
    ///
    /// The handle resolves with the provider outcome, or rejects if the batch
    /// is aborted or reset before the request is dispatched. Must be called
    /// from within a tokio runtime.
    pub fn enqueue(&self, config: SenderConfig, params: SendParams) -> SendHandle {
        let (responder, rx) = oneshot::channel();
        let request = QueuedRequest {
            id: Uuid::new_v4(),
            config,
            params,
            responder,
            retry_count: 0,
        };
        let handle = SendHandle { id: request.id, rx };
        let validation = self
            .inner
            .adapter
            .validate_config(&request.config)
            .map_err(|e| e.to_string())
            .and_then(|()| request.params.validate().map_err(|e| e.to_string()));

        let mut batch = self.inner.batch();
        if batch.aborted {
            drop(batch);
            request.reject(DispatchError::Aborted);
            return handle;
        }

        if let Err(e) = validation {
            batch.total += 1;
            batch.completed += 1;
            let progress = batch.progress();
            drop(batch);

            tracing::warn!(
                provider = %self.provider(),
                request_id = %request.id,
                error = %e,
                "Send rejected before queueing"
            );
            self.inner.emit(progress);
            request.resolve(SendResult::needs_attention(e));
            return handle;
        }

        tracing::debug!(
            provider = %self.provider(),
            request_id = %request.id,
            "Send enqueued"
        );
        batch.queue.push_back(request);
        batch.total += 1;
        let progress = batch.progress();
        let start = batch.claim_drain();
        drop(batch);

        self.inner.emit(progress);
        if let Some(generation) = start {
            self.inner.spawn_drain(generation);
        }
        handle
    }

    /// Clear the batch: queue, counters and the aborted flag.
    ///
    /// Queued requests are rejected with `BatchReset`. The token bucket is
    /// untouched; it tracks provider capacity, not batch progress.
    pub fn reset(&self) {
        let drained = {
            let mut batch = self.inner.batch();
            let generation = batch.generation.wrapping_add(1);
            let drained = std::mem::take(&mut batch.queue);
            *batch = BatchState {
                generation,
                ..Default::default()
            };
            drained
        };

        tracing::info!(
            provider = %self.provider(),
            rejected = drained.len(),
            "Limiter batch reset"
        );
        for request in drained {
            request.reject(DispatchError::BatchReset);
        }
        self.inner.emit(Progress::default());
    }

    /// Reject everything still queued. In-flight sends run to completion.
    pub fn abort(&self) {
        let (drained, progress) = {
            let mut batch = self.inner.batch();
            batch.aborted = true;
            let drained = std::mem::take(&mut batch.queue);
            (drained, batch.progress())
        };

        tracing::warn!(
            provider = %self.provider(),
            rejected = drained.len(),
            in_flight = progress.in_flight,
            "Limiter aborted"
        );
        for request in drained {
            request.reject(DispatchError::Aborted);
        }
        self.inner.emit(progress);
    }

    pub fn set_progress_observer<F>(&self, observer: F)
    where
        F: Fn(Progress) + Send + Sync + 'static,
    {
        *self.inner.observer() = Some(Arc::new(observer));
    }

    pub fn clear_progress_observer(&self) {
        *self.inner.observer() = None;
    }

    pub fn progress(&self) -> Progress {
        self.inner.batch().progress()
    }

    pub fn status(&self) -> LimiterStatus {
        let (tokens, max_tokens) = self.inner.bucket().status();
        let batch = self.inner.batch();
        LimiterStatus {
            tokens,
            max_tokens,
            queue_length: batch.queue.len(),
            in_flight: batch.in_flight,
        }
    }
}

impl Inner {
    fn batch(&self) -> MutexGuard<'_, BatchState> {
        self.batch.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn bucket(&self) -> MutexGuard<'_, TokenBucket> {
        self.bucket.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn observer(&self) -> MutexGuard<'_, Option<ProgressObserver>> {
        self.observer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn provider(&self) -> ProviderId {
        self.adapter.id()
    }

    /// Notify the observer. Never called with a lock held.
    fn emit(&self, progress: Progress) {
        let observer = self.observer().clone();
        if let Some(observer) = observer {
            // A panicking observer must not unwind through the drain loop
            if std::panic::catch_unwind(AssertUnwindSafe(|| observer(progress))).is_err() {
                tracing::error!(provider = %self.provider(), "Progress observer panicked");
            }
        }
    }

    fn spawn_drain(self: &Arc<Self>, generation: u64) {
        tokio::spawn(Arc::clone(self).drain(generation));
    }

    fn next_step(&self, generation: u64) -> Option<Step> {
        let mut batch = self.batch();
        if batch.generation != generation {
            // reset() already released the processing flag for this loop
            return None;
        }
        if batch.aborted || batch.queue.is_empty() {
            batch.is_processing = false;
            return Some(Step::Idle);
        }
        if batch.in_flight >= self.profile.max_concurrency.max(1) {
            return Some(Step::WaitForSlot);
        }

        let mut bucket = self.bucket();
        if !bucket.try_consume() {
            let wait = bucket.time_until_next_token().max(MIN_TOKEN_WAIT);
            return Some(Step::WaitForToken(wait));
        }
        match batch.queue.pop_front() {
            Some(request) => {
                batch.in_flight += 1;
                let progress = batch.progress();
                Some(Step::Dispatch(request, progress))
            }
            None => {
                batch.is_processing = false;
                Some(Step::Idle)
            }
        }
    }

    async fn drain(self: Arc<Self>, generation: u64) {
        tracing::debug!(provider = %self.provider(), generation, "Drain loop started");

        while let Some(step) = self.next_step(generation) {
            match step {
                Step::Idle => {
                    tracing::debug!(provider = %self.provider(), "Drain loop idle");
                    return;
                }
                Step::WaitForSlot => {
                    let _ =
                        tokio::time::timeout(SLOT_POLL_INTERVAL, self.slot_released.notified())
                            .await;
                }
                Step::WaitForToken(wait) => {
                    tracing::trace!(
                        provider = %self.provider(),
                        wait_ms = saturating_millis(wait),
                        "Waiting for token"
                    );
                    tokio::time::sleep(wait).await;
                }
                Step::Dispatch(request, progress) => {
                    self.emit(progress);
                    tokio::spawn(Arc::clone(&self).dispatch(generation, request));
                }
            }
        }
    }

    async fn call_adapter(&self, request: &QueuedRequest) -> Result<SendResult, ProviderError> {
        let call = AssertUnwindSafe(self.adapter.send_lead(&request.config, &request.params))
            .catch_unwind();

        let outcome = match self.profile.request_timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(outcome) => outcome,
                Err(_) => return Err(ProviderError::Timeout(limit)),
            },
            None => call.await,
        };

        outcome.unwrap_or_else(|_| {
            tracing::error!(
                provider = %self.provider(),
                request_id = %request.id,
                "Provider adapter panicked"
            );
            Err(ProviderError::Transport("provider adapter panicked".to_string()))
        })
    }

    async fn dispatch(self: Arc<Self>, generation: u64, request: QueuedRequest) {
        tracing::debug!(
            provider = %self.provider(),
            request_id = %request.id,
            attempt = request.retry_count + 1,
            "Dispatching send"
        );

        let outcome = self.call_adapter(&request).await;
        match classify(outcome) {
            Classified::Done(result) => self.complete(generation, request, result),
            Classified::Retry {
                kind,
                detail,
                retry_after,
            } => {
                self.retry(generation, request, kind, detail, retry_after)
                    .await
            }
        }
    }

    fn complete(&self, generation: u64, request: QueuedRequest, result: SendResult) {
        let progress = {
            let mut batch = self.batch();
            if batch.generation == generation {
                batch.in_flight = batch.in_flight.saturating_sub(1);
                batch.completed += 1;
                Some(batch.progress())
            } else {
                None
            }
        };
        self.slot_released.notify_one();
        if let Some(progress) = progress {
            self.emit(progress);
        }

        tracing::info!(
            provider = %self.provider(),
            request_id = %request.id,
            success = result.success,
            status = ?result.status,
            retries = request.retry_count,
            "Send completed"
        );

        let record = result.success.then(|| {
            SendRecord::new(
                request.id,
                self.provider(),
                request.params.email.clone(),
                request.config.campaign_id.clone(),
                result.clone(),
                request.retry_count + 1,
            )
        });
        request.resolve(result);
        if let Some(record) = record {
            self.record_history(record);
        }
    }

    async fn retry(
        self: &Arc<Self>,
        generation: u64,
        mut request: QueuedRequest,
        kind: RetryableErrorKind,
        detail: String,
        retry_after: Option<Duration>,
    ) {
        if kind == RetryableErrorKind::RateLimited {
            self.bucket().pause();
            tracing::warn!(
                provider = %self.provider(),
                request_id = %request.id,
                "Provider reported rate limit, pausing bucket"
            );
        }

        if request.retry_count >= self.profile.max_retries {
            tracing::warn!(
                provider = %self.provider(),
                request_id = %request.id,
                retries = request.retry_count,
                error = %detail,
                "Send failed after exhausting retries"
            );
            let result = SendResult::needs_attention(format!(
                "failed after {} retries: {}",
                request.retry_count, detail
            ));
            self.complete(generation, request, result);
            return;
        }

        request.retry_count += 1;
        let mut delay = self.profile.backoff_for(request.retry_count);
        if let Some(hint) = retry_after {
            delay = delay.max(hint.min(self.profile.max_backoff));
        }

        tracing::warn!(
            provider = %self.provider(),
            request_id = %request.id,
            retry_count = request.retry_count,
            delay_ms = saturating_millis(delay),
            kind = ?kind,
            error = %detail,
            "Send failed, backing off"
        );

        let progress = {
            let mut batch = self.batch();
            if batch.generation == generation {
                batch.in_flight = batch.in_flight.saturating_sub(1);
                Some(batch.progress())
            } else {
                None
            }
        };
        self.slot_released.notify_one();
        if let Some(progress) = progress {
            self.emit(progress);
        }

        tokio::time::sleep(delay).await;
        self.readmit(generation, request);
    }

    /// Put a backed-off request back at the head of the queue.
    fn readmit(self: &Arc<Self>, generation: u64, request: QueuedRequest) {
        let mut batch = self.batch();
        let rejection = if batch.generation != generation {
            Some(DispatchError::BatchReset)
        } else if batch.aborted {
            Some(DispatchError::Aborted)
        } else {
            None
        };
        if let Some(error) = rejection {
            drop(batch);
            tracing::debug!(request_id = %request.id, error = %error, "Retry dropped");
            request.reject(error);
            return;
        }

        batch.queue.push_front(request);
        let progress = batch.progress();
        let start = batch.claim_drain();
        drop(batch);

        self.emit(progress);
        if let Some(generation) = start {
            self.spawn_drain(generation);
        }
    }

    fn record_history(&self, record: SendRecord) {
        let Some(history) = self.history.clone() else {
            return;
        };

        tokio::spawn(async move {
            if let Err(e) = history.record(record.clone()).await {
                tracing::warn!(
                    request_id = %record.id,
                    error = %e,
                    "Failed to record send history, retrying once"
                );
                tokio::time::sleep(HISTORY_RETRY_DELAY).await;
                if let Err(e) = history.record(record.clone()).await {
                    tracing::error!(
                        request_id = %record.id,
                        error = %e,
                        "Send history lost"
                    );
                }
            }
        });
    }
}
