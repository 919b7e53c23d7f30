//! Request/response orchestration over a background worker.
//!
//! A [`Dispatcher`] owns at most one worker. Each `format` call gets a fresh id,
//! a pending-table entry and a timeout; worker responses are routed back by id.
//! When no worker could be started, parsing runs in-process instead.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::WorkerSettings;
use crate::error::{LingoError, Result};
use crate::models::segment::Segment;
use crate::parser;
use crate::worker::{self, WorkerChannel, WorkerRequest, WorkerResponse, INVALID_CONTENT};

/// Receives each batch of segments as it is delivered.
pub type ProgressFn = Box<dyn FnMut(&[Segment]) + Send + 'static>;

/// One item of a [`Dispatcher::format_stream`] sequence.
#[derive(Debug)]
pub enum FormatEvent {
    /// Segments in document order.
    Batch(Vec<Segment>),
    /// Terminal: every segment of the message.
    Done(Vec<Segment>),
    /// Terminal: the request failed.
    Failed(LingoError),
}

struct PendingRequest {
    reply: oneshot::Sender<Result<Vec<Segment>>>,
    on_progress: Option<Arc<Mutex<ProgressFn>>>,
    delivered: Vec<Segment>,
}

type PendingTable = Arc<Mutex<HashMap<u64, PendingRequest>>>;

struct WorkerLink {
    requests: mpsc::UnboundedSender<WorkerRequest>,
    router: JoinHandle<()>,
}

enum Posted {
    Sent {
        id: u64,
        receiver: oneshot::Receiver<Result<Vec<Segment>>>,
    },
    NoWorker(Option<ProgressFn>),
    Failed(LingoError),
}

/// Removes a request's pending entry when its `format` future ends, however it ends.
struct PendingGuard<'a> {
    table: &'a PendingTable,
    id: u64,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        lock(self.table).remove(&self.id);
    }
}

pub struct Dispatcher {
    worker: Mutex<Option<WorkerLink>>,
    pending: PendingTable,
    next_id: AtomicU64,
    timeout: Duration,
    init_failed: bool,
}

impl Dispatcher {
    /// Start a background worker per `settings`.
    ///
    /// If the worker is disabled, no Tokio runtime is running, or the worker
    /// thread cannot be spawned, the dispatcher parses in-process for its whole
    /// lifetime. There is no retry.
    #[must_use]
    pub fn new(settings: &WorkerSettings) -> Self {
        if !settings.enabled {
            info!("background worker disabled, parsing in-process");
            return Self::detached(settings);
        }
        if tokio::runtime::Handle::try_current().is_err() {
            warn!("no tokio runtime, parsing in-process");
            return Self::detached(settings);
        }
        match worker::spawn_worker(settings.effective_batch_size()) {
            Ok(channel) => Self::with_channel(settings, channel),
            Err(e) => {
                warn!(error = %e, "failed to start background worker, parsing in-process");
                Self::detached(settings)
            }
        }
    }

    /// Attach an already running worker reachable through `channel`.
    ///
    /// Must be called from within a Tokio runtime: a routing task is spawned to
    /// read the worker's responses.
    #[must_use]
    pub fn with_channel(settings: &WorkerSettings, channel: WorkerChannel) -> Self {
        let pending: PendingTable = Arc::new(Mutex::new(HashMap::new()));
        let router = tokio::spawn(route_responses(channel.responses, Arc::clone(&pending)));
        Self {
            worker: Mutex::new(Some(WorkerLink {
                requests: channel.requests,
                router,
            })),
            pending,
            next_id: AtomicU64::new(1),
            timeout: settings.timeout(),
            init_failed: false,
        }
    }

    fn detached(settings: &WorkerSettings) -> Self {
        Self {
            worker: Mutex::new(None),
            pending: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(1),
            timeout: settings.timeout(),
            init_failed: true,
        }
    }

    /// Whether worker startup was skipped or failed.
    #[must_use]
    pub fn init_failed(&self) -> bool {
        self.init_failed
    }

    /// Whether requests currently go to a background worker.
    #[must_use]
    pub fn has_worker(&self) -> bool {
        lock(&self.worker).is_some()
    }

    /// Number of requests waiting on the worker.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        lock(&self.pending).len()
    }

    /// Segment `content`, reporting batches to `on_progress` as they arrive.
    ///
    /// Resolves with every segment of the message on both paths. With a worker,
    /// `on_progress` sees the segments in document order across one or more
    /// calls; without one it is called once with the full list. Panics raised
    /// by `on_progress` are caught and logged.
    ///
    /// Dropping the returned future abandons the request and frees its entry.
    pub async fn format(
        &self,
        content: &str,
        on_progress: Option<ProgressFn>,
    ) -> Result<Vec<Segment>> {
        let (id, receiver) = match self.post(content, on_progress) {
            Posted::Sent { id, receiver } => (id, receiver),
            Posted::NoWorker(on_progress) => return Ok(format_in_process(content, on_progress)),
            Posted::Failed(e) => return Err(e),
        };
        let _guard = PendingGuard {
            table: &self.pending,
            id,
        };

        match tokio::time::timeout(self.timeout, receiver).await {
            Ok(Ok(result)) => result,
            // reply sender dropped without an answer
            Ok(Err(_)) => Err(LingoError::Terminated),
            Err(_) => {
                warn!(id, timeout_ms = self.timeout.as_millis() as u64, "format timed out");
                Err(LingoError::Timeout)
            }
        }
    }

    /// Segment `content` as an async sequence: zero or more `Batch` events, then
    /// exactly one `Done` or `Failed`.
    ///
    /// Dropping the receiver cancels the request. Must be called from within a
    /// Tokio runtime.
    pub fn format_stream(self: &Arc<Self>, content: String) -> mpsc::UnboundedReceiver<FormatEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        let dispatcher = Arc::clone(self);
        tokio::spawn(async move {
            let progress_tx = tx.clone();
            let on_progress: ProgressFn = Box::new(move |batch: &[Segment]| {
                let _ = progress_tx.send(FormatEvent::Batch(batch.to_vec()));
            });
            let event = tokio::select! {
                result = dispatcher.format(&content, Some(on_progress)) => match result {
                    Ok(segments) => FormatEvent::Done(segments),
                    Err(e) => FormatEvent::Failed(e),
                },
                () = tx.closed() => {
                    debug!("stream receiver dropped, abandoning request");
                    return;
                }
            };
            let _ = tx.send(event);
        });
        rx
    }

    /// Stop the worker and reject every pending request with `worker_terminated`.
    ///
    /// Later `format` calls parse in-process. Responses the worker still emits
    /// for old ids are discarded.
    pub fn terminate(&self) {
        let Some(link) = lock(&self.worker).take() else {
            return;
        };
        link.router.abort();
        drop(link.requests);

        let drained: Vec<PendingRequest> = lock(&self.pending).drain().map(|(_, p)| p).collect();
        info!(rejected = drained.len(), "worker terminated");
        for entry in drained {
            let _ = entry.reply.send(Err(LingoError::Terminated));
        }
    }

    fn post(&self, content: &str, on_progress: Option<ProgressFn>) -> Posted {
        // Holding the worker lock orders registration against `terminate`.
        let worker = lock(&self.worker);
        let Some(link) = worker.as_ref() else {
            return Posted::NoWorker(on_progress);
        };

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (reply, receiver) = oneshot::channel();
        lock(&self.pending).insert(
            id,
            PendingRequest {
                reply,
                on_progress: on_progress.map(|f| Arc::new(Mutex::new(f))),
                delivered: Vec::new(),
            },
        );

        if let Err(e) = link.requests.send(WorkerRequest::new(id, content)) {
            lock(&self.pending).remove(&id);
            warn!(id, error = %e, "failed to post request to worker");
            return Posted::Failed(LingoError::PostFailed(e.to_string()));
        }
        debug!(id, bytes = content.len(), "posted request");
        Posted::Sent { id, receiver }
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        self.terminate();
    }
}

fn format_in_process(content: &str, on_progress: Option<ProgressFn>) -> Vec<Segment> {
    let segments = parser::parse(content);
    if let Some(mut callback) = on_progress {
        notify(&mut callback, &segments);
    }
    segments
}

async fn route_responses(
    mut responses: mpsc::UnboundedReceiver<WorkerResponse>,
    pending: PendingTable,
) {
    while let Some(response) = responses.recv().await {
        route(&pending, response);
    }

    let drained: Vec<PendingRequest> = lock(&pending).drain().map(|(_, p)| p).collect();
    if !drained.is_empty() {
        warn!(rejected = drained.len(), "worker channel closed with requests in flight");
    }
    for entry in drained {
        let _ = entry.reply.send(Err(LingoError::Terminated));
    }
}

fn route(pending: &PendingTable, response: WorkerResponse) {
    let Some(id) = response.id() else {
        debug!("dropping worker response without id");
        return;
    };

    match response {
        WorkerResponse::Error { error, .. } => {
            let Some(entry) = lock(pending).remove(&id) else {
                debug!(id, "no pending request for error, ignoring");
                return;
            };
            let err = if error == INVALID_CONTENT {
                LingoError::InvalidContent
            } else {
                LingoError::Worker(error)
            };
            let _ = entry.reply.send(Err(err));
        }
        WorkerResponse::Batch { segments, .. } => {
            if segments.is_empty() {
                return;
            }
            let callback = {
                let mut table = lock(pending);
                let Some(entry) = table.get_mut(&id) else {
                    debug!(id, "no pending request for batch, ignoring");
                    return;
                };
                entry.delivered.extend(segments.iter().cloned());
                entry.on_progress.clone()
            };
            if let Some(callback) = callback {
                notify(&mut lock(&callback), &segments);
            }
        }
        WorkerResponse::Done { done: false, .. } => {
            debug!(id, "ignoring done=false");
        }
        WorkerResponse::Done { done: true, .. } => {
            let Some(entry) = lock(pending).remove(&id) else {
                debug!(id, "no pending request for done, ignoring");
                return;
            };
            debug!(id, segments = entry.delivered.len(), "request done");
            let _ = entry.reply.send(Ok(entry.delivered));
        }
    }
}

fn notify(callback: &mut ProgressFn, segments: &[Segment]) {
    if panic::catch_unwind(AssertUnwindSafe(|| callback(segments))).is_err() {
        warn!("progress callback panicked");
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
