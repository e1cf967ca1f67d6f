use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;
use uuid::Uuid;

use crate::cache::key::ContentKey;
use crate::cache::store::ContentStore;
use crate::cache::transport::ContentTransport;

/// Notification invoked when a fetch finishes. `None` means the content
/// is absent: any failure along the way resolves here, never as a
/// propagated error.
pub type FetchCallback = Box<dyn FnOnce(Url, Option<PathBuf>) + Send>;

/// One queued download.
pub struct FetchTask {
    pub url: Url,
    pub key: ContentKey,
    pub on_done: FetchCallback,
}

impl fmt::Debug for FetchTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchTask")
            .field("url", &self.url.as_str())
            .field("key", &self.key)
            .finish()
    }
}

/// Single background task that drains an unbounded FIFO of downloads,
/// strictly one at a time, in submission order.
///
/// Each task streams into `<key>.tmp-<uuid>` inside the store root and is
/// renamed over the final path only on success, so racing writers across
/// processes degrade to last-writer-wins and readers never observe a
/// partial file. Exactly one callback fires per task unless the worker is
/// stopped first, in which case the in-flight fetch is dropped at its
/// next await point and its callback never runs.
pub struct FetchWorker {
    queue: mpsc::UnboundedSender<FetchTask>,
    shutdown: CancellationToken,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl fmt::Debug for FetchWorker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let running = self
            .join
            .try_lock()
            .map(|guard| guard.is_some())
            .unwrap_or(false);

        f.debug_struct("FetchWorker")
            .field("queue_closed", &self.queue.is_closed())
            .field("shutdown_cancelled", &self.shutdown.is_cancelled())
            .field("running", &running)
            .finish()
    }
}

impl FetchWorker {
    /// Spawn the worker task. It runs until [`FetchWorker::stop`] or until
    /// every sender is gone.
    pub fn spawn(
        store: ContentStore,
        transport: Arc<dyn ContentTransport>,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(run(rx, store, transport, shutdown.clone()));

        Self {
            queue: tx,
            shutdown,
            join: Mutex::new(Some(handle)),
        }
    }

    /// Queue a download. Tasks submitted after [`FetchWorker::stop`] are
    /// dropped, callback and all.
    pub fn submit(&self, task: FetchTask) {
        if let Err(err) = self.queue.send(task) {
            debug!(task = ?err.0, "fetch worker stopped, dropping task");
        }
    }

    /// Cancel the worker and wait for it to exit. The in-flight fetch, if
    /// any, is abandoned and queued tasks are discarded. Idempotent; after
    /// the first call returns no callback can fire.
    pub async fn stop(&self) {
        self.shutdown.cancel();

        let handle = {
            let mut guard = self.join.lock().await;
            guard.take()
        };

        if let Some(handle) = handle
            && let Err(err) = handle.await
        {
            warn!("fetch worker task failed: {err}");
        }
    }
}

async fn run(
    mut rx: mpsc::UnboundedReceiver<FetchTask>,
    store: ContentStore,
    transport: Arc<dyn ContentTransport>,
    shutdown: CancellationToken,
) {
    loop {
        let task = tokio::select! {
            _ = shutdown.cancelled() => break,
            task = rx.recv() => match task {
                Some(task) => task,
                None => break,
            },
        };

        let FetchTask { url, key, on_done } = task;

        let outcome = tokio::select! {
            _ = shutdown.cancelled() => {
                debug!(key = %key, url = %url, "fetch interrupted by stop");
                break;
            }
            outcome = execute(&store, transport.as_ref(), &url, &key) => outcome,
        };

        on_done(url, outcome);
    }

    debug!("fetch worker exited");
}

/// Download one URL into the store. Every failure path resolves to
/// `None` with the temp file cleaned up best-effort.
async fn execute(
    store: &ContentStore,
    transport: &dyn ContentTransport,
    url: &Url,
    key: &ContentKey,
) -> Option<PathBuf> {
    let dest = store.path_for(key);
    let tmp = store
        .root()
        .as_path()
        .join(format!("{key}.tmp-{}", Uuid::new_v4().simple()));

    match transport.fetch(url, &tmp).await {
        Ok(()) => match tokio::fs::rename(&tmp, &dest).await {
            Ok(()) => {
                debug!(key = %key, url = %url, "cached content");
                Some(dest)
            }
            Err(err) => {
                warn!(key = %key, url = %url, error = %err, "failed to move content into place");
                let _ = tokio::fs::remove_file(&tmp).await;
                None
            }
        },
        Err(err) => {
            warn!(key = %key, url = %url, error = %err, "fetch failed");
            let _ = tokio::fs::remove_file(&tmp).await;
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::store::CacheRoot;
    use crate::error::{CardError, Result};
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;
    use tokio::sync::oneshot;
    use tokio::time;

    #[derive(Default)]
    struct TransportState {
        active: usize,
        max_active: usize,
        served: Vec<Url>,
    }

    /// Writes the URL string as the body, tracking fetch concurrency.
    struct RecordingTransport {
        state: StdMutex<TransportState>,
        delay: Duration,
    }

    impl RecordingTransport {
        fn new(delay: Duration) -> Self {
            Self {
                state: StdMutex::new(TransportState::default()),
                delay,
            }
        }

        fn served(&self) -> Vec<Url> {
            self.state.lock().unwrap().served.clone()
        }

        fn max_active(&self) -> usize {
            self.state.lock().unwrap().max_active
        }
    }

    #[async_trait]
    impl ContentTransport for RecordingTransport {
        async fn fetch(&self, url: &Url, dest: &Path) -> Result<()> {
            {
                let mut state = self.state.lock().unwrap();
                state.active += 1;
                state.max_active = state.max_active.max(state.active);
            }

            time::sleep(self.delay).await;
            tokio::fs::write(dest, url.as_str().as_bytes()).await?;

            let mut state = self.state.lock().unwrap();
            state.active -= 1;
            state.served.push(url.clone());
            Ok(())
        }
    }

    struct FailingTransport;

    #[async_trait]
    impl ContentTransport for FailingTransport {
        async fn fetch(&self, _url: &Url, dest: &Path) -> Result<()> {
            // Leave partial output behind to prove the worker cleans it up.
            tokio::fs::write(dest, b"partial").await?;
            Err(CardError::Fetch("HTTP 500".into()))
        }
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn open_store(dir: &tempfile::TempDir) -> ContentStore {
        ContentStore::open(CacheRoot::new(dir.path().to_path_buf())).unwrap()
    }

    fn task_with_result(
        url: Url,
    ) -> (FetchTask, oneshot::Receiver<Option<PathBuf>>) {
        let key = ContentKey::for_url(&url);
        let (tx, rx) = oneshot::channel();
        let task = FetchTask {
            url,
            key,
            on_done: Box::new(move |_url, outcome| {
                let _ = tx.send(outcome);
            }),
        };
        (task, rx)
    }

    #[tokio::test]
    async fn downloads_sequentially_in_submission_order() {
        let dir = tempfile::tempdir().unwrap();
        let transport =
            Arc::new(RecordingTransport::new(Duration::from_millis(5)));
        let worker = FetchWorker::spawn(open_store(&dir), transport.clone());

        let urls = [
            url("https://cdn.example.com/a.png"),
            url("https://cdn.example.com/b.png"),
            url("https://cdn.example.com/c.png"),
        ];

        let mut receivers = Vec::new();
        for u in &urls {
            let (task, rx) = task_with_result(u.clone());
            worker.submit(task);
            receivers.push(rx);
        }

        for rx in receivers {
            let outcome = time::timeout(Duration::from_secs(5), rx)
                .await
                .expect("fetch completed")
                .expect("callback fired");
            assert!(outcome.is_some());
        }

        assert_eq!(transport.served(), urls);
        assert_eq!(transport.max_active(), 1, "worker must not overlap fetches");

        worker.stop().await;
    }

    #[tokio::test]
    async fn success_renames_into_place() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);
        let transport =
            Arc::new(RecordingTransport::new(Duration::from_millis(0)));
        let worker = FetchWorker::spawn(store.clone(), transport);

        let u = url("https://cdn.example.com/hero.png");
        let (task, rx) = task_with_result(u.clone());
        let key = task.key.clone();
        worker.submit(task);

        let outcome = rx.await.expect("callback fired");
        assert_eq!(outcome, Some(store.path_for(&key)));
        let body = std::fs::read(store.path_for(&key)).unwrap();
        assert_eq!(body, u.as_str().as_bytes());

        worker.stop().await;
    }

    #[tokio::test]
    async fn failure_reports_absent_and_cleans_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);
        let worker = FetchWorker::spawn(store.clone(), Arc::new(FailingTransport));

        let (task, rx) = task_with_result(url("https://cdn.example.com/bad.png"));
        let key = task.key.clone();
        worker.submit(task);

        let outcome = rx.await.expect("callback fired");
        assert_eq!(outcome, None);
        assert!(!store.exists(&key).await);

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert!(leftovers.is_empty(), "temp files left behind: {leftovers:?}");

        worker.stop().await;
    }

    #[tokio::test]
    async fn stop_drops_in_flight_fetch_without_callback() {
        let dir = tempfile::tempdir().unwrap();
        let transport =
            Arc::new(RecordingTransport::new(Duration::from_secs(30)));
        let worker = FetchWorker::spawn(open_store(&dir), transport.clone());

        let (task, rx) = task_with_result(url("https://cdn.example.com/slow.png"));
        worker.submit(task);

        // Let the worker pick the task up before stopping.
        time::sleep(Duration::from_millis(20)).await;
        time::timeout(Duration::from_secs(1), worker.stop())
            .await
            .expect("stop must not wait for the slow fetch");

        // The callback was dropped, never invoked.
        assert!(rx.await.is_err());
        assert!(transport.served().is_empty());

        // Idempotent.
        worker.stop().await;
    }

    #[tokio::test]
    async fn submit_after_stop_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let transport =
            Arc::new(RecordingTransport::new(Duration::from_millis(0)));
        let worker = FetchWorker::spawn(open_store(&dir), transport.clone());

        worker.stop().await;

        let (task, rx) = task_with_result(url("https://cdn.example.com/late.png"));
        worker.submit(task);
        assert!(rx.await.is_err());
        assert!(transport.served().is_empty());
    }
}
