//! Background expansion queue
//!
//! Deferred subtree loads are queued here and drained in waves: at most
//! `parallel_limit` tasks run at once, and the next wave starts only when the
//! whole previous wave has finished. This keeps the number of open directory
//! handles bounded no matter how wide the tree is.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use futures::future::{BoxFuture, FutureExt, join_all};
use tokio::sync::watch;
use tracing::{debug, error};

pub type BackgroundTask = BoxFuture<'static, ()>;

#[derive(Default)]
struct QueueState {
    queue: VecDeque<BackgroundTask>,
    draining: bool,
}

struct Inner {
    state: Mutex<QueueState>,
    parallel_limit: usize,
    loading: watch::Sender<bool>,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Cloneable handle to a shared background queue.
#[derive(Clone)]
pub struct BackgroundScheduler {
    inner: Arc<Inner>,
}

impl BackgroundScheduler {
    pub fn new(parallel_limit: usize) -> Self {
        let (loading, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(QueueState::default()),
                parallel_limit: parallel_limit.max(1),
                loading,
            }),
        }
    }

    /// Queue a task and make sure a drain loop is running.
    ///
    /// Must be called from within a tokio runtime.
    pub fn enqueue(&self, task: impl Future<Output = ()> + Send + 'static) {
        let mut state = self.inner.lock();
        state.queue.push_back(task.boxed());
        if state.draining {
            return;
        }
        state.draining = true;
        self.inner.loading.send_replace(true);
        drop(state);

        tokio::spawn(drain(Arc::clone(&self.inner)));
    }

    /// True while queued or running tasks remain.
    pub fn is_loading(&self) -> bool {
        *self.inner.loading.borrow()
    }

    pub fn subscribe_loading(&self) -> watch::Receiver<bool> {
        self.inner.loading.subscribe()
    }

    /// Tasks queued but not yet started.
    pub fn pending(&self) -> usize {
        self.inner.lock().queue.len()
    }

    /// Wait until the queue is empty and the last wave has finished.
    pub async fn wait_idle(&self) {
        let mut loading = self.subscribe_loading();
        // The sender lives in `self`, so the channel cannot close here
        let _ = loading.wait_for(|busy| !*busy).await;
    }
}

async fn drain(inner: Arc<Inner>) {
    let mut completed = 0usize;
    let mut waves = 0usize;

    loop {
        let wave: Vec<BackgroundTask> = {
            let mut state = inner.lock();
            if state.queue.is_empty() {
                // Cleared under the lock so a concurrent enqueue either sees
                // the running loop or starts a new one
                state.draining = false;
                inner.loading.send_replace(false);
                break;
            }
            let take = state.queue.len().min(inner.parallel_limit);
            state.queue.drain(..take).collect()
        };

        waves += 1;
        let handles: Vec<_> = wave.into_iter().map(tokio::spawn).collect();
        for result in join_all(handles).await {
            match result {
                Ok(()) => completed += 1,
                Err(err) => error!(%err, "background task failed"),
            }
        }
    }

    debug!(waves, completed, "background queue drained");
}
