use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use tokio::{runtime::Handle, sync::Notify};

/// Counts spawned request tasks so a caller can wait for them to drain.
/// Task results are never collected.
#[derive(Clone, Default)]
pub struct InFlight {
    inner: Arc<InFlightInner>,
}

#[derive(Default)]
struct InFlightInner {
    count: AtomicUsize,
    spawned: AtomicUsize,
    idle: Notify,
}

struct Guard(Arc<InFlightInner>);

impl Drop for Guard {
    fn drop(&mut self) {
        if self.0.count.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.0.idle.notify_waiters();
        }
    }
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn<F>(&self, runtime: &Handle, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.inner.count.fetch_add(1, Ordering::SeqCst);
        self.inner.spawned.fetch_add(1, Ordering::SeqCst);
        // decrements on completion and on panic alike
        let guard = Guard(Arc::clone(&self.inner));
        runtime.spawn(async move {
            let _guard = guard;
            task.await;
        });
    }

    pub fn len(&self) -> usize {
        self.inner.count.load(Ordering::SeqCst)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every task ever spawned, finished or not.
    pub fn spawned_total(&self) -> usize {
        self.inner.spawned.load(Ordering::SeqCst)
    }

    pub async fn wait_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.is_empty() {
                return;
            }
            notified.await;
        }
    }
}
