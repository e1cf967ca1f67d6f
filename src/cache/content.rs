use std::collections::{HashMap, HashSet};
use std::fmt;
use std::mem;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::oneshot;
use tracing::{debug, error, info};
use url::Url;

use crate::cache::UrlSet;
use crate::cache::key::ContentKey;
use crate::cache::store::{CacheRoot, ContentStore};
use crate::cache::transport::{ContentTransport, HttpTransport};
use crate::cache::worker::{FetchTask, FetchWorker};
use crate::config::CacheConfig;
use crate::error::{CardError, Result};

/// Read-side view of the cache used while constructing assets: resolve a
/// URL to its cached file, if the bytes are on disk right now.
#[async_trait]
pub trait CachedContent: Send + Sync {
    async fn cached_file(&self, url: &Url) -> Option<PathBuf>;
}

/// Outcome of one cache request.
#[derive(Debug, Clone)]
pub struct CacheReport {
    /// Every URL the request named.
    pub requested: UrlSet,
    /// The subset whose fetch failed; their content is absent on disk.
    pub failed: Vec<Url>,
}

impl CacheReport {
    pub fn fully_cached(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Completion handle for one [`ContentCache::cache`] call. Resolves
/// exactly once, after every URL in the request has been fetched or has
/// failed.
#[derive(Debug)]
pub struct CacheTicket {
    rx: oneshot::Receiver<CacheReport>,
}

impl CacheTicket {
    /// Wait for the request to settle. Returns `CardError::Cancelled`
    /// when the cache was stopped before the request completed, or when
    /// the request was made against a stopped cache.
    pub async fn ready(self) -> Result<CacheReport> {
        self.rx.await.map_err(|_| {
            CardError::Cancelled(
                "content cache stopped before the request completed".into(),
            )
        })
    }

    /// Probe without waiting. Observable immediately after
    /// [`ContentCache::cache`] returns exactly when the whole request was
    /// already warm.
    pub fn try_ready(&mut self) -> Option<CacheReport> {
        self.rx.try_recv().ok()
    }
}

type RequestId = u64;

/// One in-flight download and the requests attached to it, in attach
/// order.
struct FetchOperation {
    interested: Vec<RequestId>,
}

struct PendingRequest {
    outstanding: usize,
    requested: UrlSet,
    failed: Vec<Url>,
    tx: oneshot::Sender<CacheReport>,
}

#[derive(Default)]
struct CoordinatorState {
    /// Keys believed present on disk. Seeded from a directory listing at
    /// construction, then maintained incrementally as fetches land and
    /// clears happen. Out-of-band file manipulation is not tracked.
    cached: HashSet<ContentKey>,
    operations: HashMap<ContentKey, FetchOperation>,
    requests: HashMap<RequestId, PendingRequest>,
    next_request: RequestId,
    stopped: bool,
}

/// Coordinates payload-level cache requests over the disk store and the
/// fetch worker.
///
/// All bookkeeping sits behind one mutex with short, await-free critical
/// sections, so [`ContentCache::cache`] is callable from sync and async
/// contexts alike. Each URL has at most one in-flight fetch regardless of
/// how many concurrent requests name it; later requests attach to the
/// existing operation and are woken by the same completion.
pub struct ContentCache {
    store: ContentStore,
    worker: FetchWorker,
    state: Arc<Mutex<CoordinatorState>>,
}

impl fmt::Debug for ContentCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (warm, in_flight, pending, stopped) = self
            .state
            .lock()
            .ok()
            .map(|state| {
                (
                    state.cached.len(),
                    state.operations.len(),
                    state.requests.len(),
                    state.stopped,
                )
            })
            .unwrap_or((0, 0, 0, true));

        f.debug_struct("ContentCache")
            .field("root", &self.store.root())
            .field("warm_keys", &warm)
            .field("in_flight", &in_flight)
            .field("pending_requests", &pending)
            .field("stopped", &stopped)
            .finish()
    }
}

impl ContentCache {
    /// Open the store, seed the warm-key set from its contents, and start
    /// the fetch worker. Must be called from within a Tokio runtime.
    pub fn new(
        config: &CacheConfig,
        transport: Arc<dyn ContentTransport>,
    ) -> Result<Self> {
        let store = ContentStore::open(CacheRoot::new(config.root.clone()))?;
        let cached: HashSet<ContentKey> =
            store.list_keys()?.into_iter().collect();
        info!(
            root = %store.root().as_path().display(),
            warm_keys = cached.len(),
            "content cache opened"
        );

        let worker = FetchWorker::spawn(store.clone(), transport);

        Ok(Self {
            store,
            worker,
            state: Arc::new(Mutex::new(CoordinatorState {
                cached,
                ..CoordinatorState::default()
            })),
        })
    }

    /// Open with the plain HTTP transport.
    pub fn open(config: &CacheConfig) -> Result<Self> {
        Self::new(config, Arc::new(HttpTransport::new()))
    }

    /// Request that every URL in `urls` be present on disk.
    ///
    /// Synchronous: inspects state, queues whatever is missing, and
    /// returns a ticket that settles once every named URL has been
    /// fetched or has failed. URLs already warm or already being fetched
    /// schedule no new work. A fully warm set resolves the ticket before
    /// this method returns.
    pub fn cache(&self, urls: UrlSet) -> CacheTicket {
        let (tx, rx) = oneshot::channel();
        let ticket = CacheTicket { rx };

        let Ok(mut state) = self.state.lock() else {
            return ticket;
        };

        if state.stopped {
            debug!("cache request against a stopped cache");
            return ticket;
        }

        let id = state.next_request;
        state.next_request += 1;

        let mut outstanding = 0usize;
        let mut submissions: Vec<(Url, ContentKey)> = Vec::new();

        for url in &urls {
            let key = ContentKey::for_url(url);
            if state.cached.contains(&key) {
                continue;
            }
            if let Some(op) = state.operations.get_mut(&key) {
                op.interested.push(id);
                outstanding += 1;
                continue;
            }
            state
                .operations
                .insert(key.clone(), FetchOperation { interested: vec![id] });
            submissions.push((url.clone(), key));
            outstanding += 1;
        }

        if outstanding == 0 {
            let _ = tx.send(CacheReport {
                requested: urls,
                failed: Vec::new(),
            });
            return ticket;
        }

        state.requests.insert(
            id,
            PendingRequest {
                outstanding,
                requested: urls,
                failed: Vec::new(),
                tx,
            },
        );

        for (url, key) in submissions {
            let state = Arc::clone(&self.state);
            let callback_key = key.clone();
            self.worker.submit(FetchTask {
                url,
                key,
                on_done: Box::new(move |url, outcome| {
                    resolve(&state, &callback_key, &url, outcome);
                }),
            });
        }

        ticket
    }

    /// Forget and delete the blobs for `urls`.
    ///
    /// In-flight fetches for these URLs are not cancelled; a racing
    /// download rewrites the file afterwards. Removal failures are
    /// logged, never surfaced.
    pub async fn clear(&self, urls: &UrlSet) {
        let keys: Vec<ContentKey> =
            urls.iter().map(ContentKey::for_url).collect();

        {
            let Ok(mut state) = self.state.lock() else {
                return;
            };
            for key in &keys {
                state.cached.remove(key);
            }
        }

        for key in &keys {
            self.store.remove(key).await;
        }
    }

    /// Shut down: abandon the in-flight fetch, discard queued work, and
    /// cancel every outstanding ticket. Requests made after this observe
    /// `CardError::Cancelled` through their tickets. Idempotent.
    pub async fn stop(&self) {
        let drained = {
            let Ok(mut state) = self.state.lock() else {
                return;
            };
            if state.stopped {
                HashMap::new()
            } else {
                state.stopped = true;
                state.operations.clear();
                mem::take(&mut state.requests)
            }
        };

        self.worker.stop().await;

        if !drained.is_empty() {
            info!(
                cancelled_requests = drained.len(),
                "content cache stopped with outstanding requests"
            );
        }
        // Dropping the drained senders resolves their tickets as
        // cancelled.
    }
}

#[async_trait]
impl CachedContent for ContentCache {
    async fn cached_file(&self, url: &Url) -> Option<PathBuf> {
        let key = ContentKey::for_url(url);
        if self.store.exists(&key).await {
            Some(self.store.path_for(&key))
        } else {
            None
        }
    }
}

/// Completion path, invoked from the worker task. Updates the warm set,
/// detaches the operation, and fulfils every request this fetch finished,
/// outside the lock.
fn resolve(
    state: &Mutex<CoordinatorState>,
    key: &ContentKey,
    url: &Url,
    outcome: Option<PathBuf>,
) {
    let finished = {
        let Ok(mut state) = state.lock() else {
            return;
        };

        let Some(op) = state.operations.remove(key) else {
            // The cache was stopped while this fetch was completing.
            debug!(key = %key, "fetch completed with no registered operation");
            return;
        };

        if outcome.is_some() {
            state.cached.insert(key.clone());
        }

        let mut finished = Vec::new();
        for id in op.interested {
            let settled = match state.requests.get_mut(&id) {
                Some(request) => {
                    if outcome.is_none() {
                        request.failed.push(url.clone());
                    }
                    request.outstanding -= 1;
                    request.outstanding == 0
                }
                None => {
                    error!(request = id, key = %key, "interest list points at a missing request");
                    debug_assert!(
                        false,
                        "interest list out of sync with request table"
                    );
                    false
                }
            };

            if settled && let Some(request) = state.requests.remove(&id) {
                finished.push(request);
            }
        }
        finished
    };

    for request in finished {
        let report = CacheReport {
            requested: request.requested,
            failed: request.failed,
        };
        let _ = request.tx.send(report);
    }
}
