use std::{future::Future, sync::Arc};

use futures_util::stream::{self, Stream};
use parking_lot::Mutex;
use tokio::{
    sync::broadcast::{self, error::RecvError},
    task::JoinHandle,
};

use super::{
    scheduler::{Immediate, Scheduler},
    LoadPolicy,
};
use crate::loaded::{LoadError, Loadable, LoadingState};

/// How many state changes a lagging subscriber may fall behind before skipping some.
const CHANGES_CAPACITY: usize = 64;

/// A [`Loadable`] shared between its owner and the tasks loading it.
///
/// Clones are handles to the same loadable. Every state write goes through the configured
/// [`Scheduler`] ([`Immediate`] by default), and once applied it is published to subscribers
/// (see [`subscribe`](Self::subscribe) and [`changes`](Self::changes)).
///
/// There is no ordering between concurrent loads: whichever completes last writes the final
/// state, even if it was started first.
///
/// # Examples
///
/// ```rust
/// use loadable::prelude::*;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let shared = SharedLoadable::new(Loadable::<String>::with_placeholder("...".to_owned()));
///
/// let handle = shared.load_detached(LoadPolicy::Reload, || async {
///     Err(LoadError::msg("service unavailable"))
/// });
/// handle.await.unwrap();
///
/// assert!(shared.state().is_error());
/// assert_eq!(shared.value_or_placeholder(), "...");
/// # }
/// ```
pub struct SharedLoadable<V, E = LoadError> {
    inner: Arc<Mutex<Loadable<V, E>>>,
    changes: broadcast::Sender<LoadingState<V, E>>,
    scheduler: Arc<dyn Scheduler>,
}

impl<V, E> Clone for SharedLoadable<V, E> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            changes: self.changes.clone(),
            scheduler: self.scheduler.clone(),
        }
    }
}

impl<V: core::fmt::Debug, E: core::fmt::Debug> core::fmt::Debug for SharedLoadable<V, E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("SharedLoadable").field(&*self.inner.lock()).finish()
    }
}

impl<V, E> SharedLoadable<V, E>
where
    V: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    pub fn new(loadable: Loadable<V, E>) -> Self {
        let (changes, _) = broadcast::channel(CHANGES_CAPACITY);
        Self {
            inner: Arc::new(Mutex::new(loadable)),
            changes,
            scheduler: Arc::new(Immediate),
        }
    }

    /// Marshals every subsequent state write through `scheduler`.
    pub fn with_scheduler<S: Scheduler + 'static>(mut self, scheduler: S) -> Self {
        self.scheduler = Arc::new(scheduler);
        self
    }

    /// Gives `f` a look at the current loadable.
    ///
    /// The lock is held while `f` runs, do not write to this holder from within it.
    pub fn with<R, F: FnOnce(&Loadable<V, E>) -> R>(&self, f: F) -> R {
        f(&self.inner.lock())
    }

    /// A copy of the current loadable.
    pub fn snapshot(&self) -> Loadable<V, E> {
        self.inner.lock().clone()
    }

    pub fn state(&self) -> LoadingState<V, E> {
        self.inner.lock().state().clone()
    }

    pub fn value(&self) -> Option<V> {
        self.inner.lock().value().cloned()
    }

    pub fn value_or_placeholder(&self) -> V {
        self.inner.lock().value_or_placeholder().clone()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.lock().is_loading()
    }

    /// Schedules a state write, see [`Loadable::set_state`].
    ///
    /// The write, including a persisted placeholder's store write, runs under the holder's lock on
    /// the scheduler's context. A [`FileStore`](crate::persistence::FileStore) write is blocking
    /// disk I/O, handed to `block_in_place` on a multi-thread runtime.
    pub fn set_state(&self, state: LoadingState<V, E>) {
        let inner = self.inner.clone();
        let changes = self.changes.clone();
        self.scheduler.schedule(Box::new(move || {
            let mut guard = inner.lock();
            guard.set_state(state.clone());
            // Published under the lock so subscribers see writes in the order they were applied.
            // No subscriber is not an error.
            let _ = changes.send(state);
        }));
    }

    /// Receives every state applied from now on, in order.
    ///
    /// The current state is not replayed. A receiver falling more than a few dozen changes
    /// behind gets a `Lagged` error and skips the oldest ones.
    pub fn subscribe(&self) -> broadcast::Receiver<LoadingState<V, E>> {
        self.changes.subscribe()
    }

    /// [`subscribe`](Self::subscribe) as a stream. Lagged changes are skipped with a warning.
    pub fn changes(&self) -> impl Stream<Item = LoadingState<V, E>> + Send + 'static {
        stream::unfold(self.subscribe(), |mut rx| async move {
            loop {
                match rx.recv().await {
                    Ok(state) => return Some((state, rx)),
                    Err(RecvError::Lagged(skipped)) => {
                        log::warn!(
                            "shared_loadable - change stream lagged, {skipped} states skipped"
                        )
                    }
                    Err(RecvError::Closed) => return None,
                }
            }
        })
    }

    /// Runs `producer` and records its outcome, see [`Loadable::load`].
    ///
    /// The state writes go through the scheduler, so with a deferring scheduler the returned
    /// value may be known before the state reflects it.
    pub async fn load<F, Fut>(&self, policy: LoadPolicy, producer: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if policy == LoadPolicy::SkipIfLoaded {
            let loaded = self.value();
            if let Some(v) = loaded {
                log::debug!("shared_loadable::load - already loaded, skipping");
                return Ok(v);
            }
        }

        log::debug!("shared_loadable::load - start");
        self.set_state(LoadingState::Loading);
        let outcome = producer().await;
        log::debug!("shared_loadable::load - finished (ok: {})", outcome.is_ok());
        match outcome {
            Ok(v) => {
                self.set_state(LoadingState::Loaded(v.clone()));
                Ok(v)
            }
            Err(e) => {
                self.set_state(LoadingState::Error(e.clone()));
                Err(e)
            }
        }
    }

    /// Spawns [`load`](Self::load) on the tokio runtime and forgets about its outcome.
    ///
    /// A failure is still recorded in the state, it is only not returned to anyone. The handle
    /// resolves once the load is over. Must be called from within a tokio runtime.
    pub fn load_detached<F, Fut>(&self, policy: LoadPolicy, producer: F) -> JoinHandle<()>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
        E: core::fmt::Debug,
    {
        let this = self.clone();
        tokio::spawn(async move {
            if let Err(e) = this.load(policy, producer).await {
                log::debug!("shared_loadable::load_detached - failure recorded in state: {e:?}");
            }
        })
    }
}

impl<V, E> From<Loadable<V, E>> for SharedLoadable<V, E>
where
    V: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    fn from(value: Loadable<V, E>) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };

    use futures_util::StreamExt;
    use tokio::sync::oneshot;

    use super::*;
    use crate::orchestration::scheduler;

    #[tokio::test]
    async fn records_the_transition_sequence() {
        let shared = SharedLoadable::new(Loadable::<u32>::with_placeholder(0));
        let mut changes = shared.subscribe();
        assert!(shared.state().is_initial());

        let value = shared
            .load(LoadPolicy::Reload, || async {
                tokio::time::sleep(Duration::from_millis(10)).await;
                Ok(42)
            })
            .await
            .unwrap();

        assert_eq!(value, 42);
        assert_eq!(changes.recv().await.unwrap(), LoadingState::Loading);
        assert_eq!(changes.recv().await.unwrap(), LoadingState::Loaded(42));
        assert_eq!(shared.value_or_placeholder(), 42);
    }

    #[tokio::test]
    async fn changes_stream_yields_applied_states() {
        let shared = SharedLoadable::new(Loadable::<u32>::with_placeholder(0));
        let changes = shared.changes();

        let error = LoadError::msg("boom");
        let returned = error.clone();
        let _ = shared
            .load(LoadPolicy::Reload, move || async move { Err(returned) })
            .await;
        drop(shared);

        let seen: Vec<_> = changes.collect().await;
        assert_eq!(seen, vec![LoadingState::Loading, LoadingState::Error(error)]);
    }

    #[tokio::test]
    async fn skip_if_loaded_reads_the_shared_value() {
        let calls = Arc::new(AtomicUsize::new(0));
        let shared = SharedLoadable::new(Loadable::<u32>::with_loaded_value(5));
        let mut changes = shared.subscribe();

        let c = calls.clone();
        let value = shared
            .load(LoadPolicy::SkipIfLoaded, move || {
                c.fetch_add(1, Ordering::SeqCst);
                async { Ok(6) }
            })
            .await
            .unwrap();
        assert_eq!(value, 5);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(changes.try_recv().is_err());
    }

    // Last write wins: a slow load started first overwrites a fast load started after it.
    #[tokio::test]
    async fn concurrent_loads_last_completion_wins() {
        let shared = SharedLoadable::new(Loadable::<u32>::with_placeholder(0));
        let (release_slow, slow_gate) = oneshot::channel::<u32>();

        let slow = shared.load_detached(LoadPolicy::Reload, move || async move {
            slow_gate.await.map_err(LoadError::msg)
        });
        while shared.state() != LoadingState::Loading {
            tokio::task::yield_now().await;
        }

        let fast = shared.load(LoadPolicy::Reload, || async { Ok(2) }).await;
        assert_eq!(fast, Ok(2));
        assert_eq!(shared.state(), LoadingState::Loaded(2));

        release_slow.send(1).unwrap();
        slow.await.unwrap();
        assert_eq!(shared.state(), LoadingState::Loaded(1));
        assert_eq!(shared.value_or_placeholder(), 1);
    }

    #[tokio::test]
    async fn queue_scheduler_defers_mutations() {
        let (scheduler, mut runner) = scheduler::queue();
        let shared =
            SharedLoadable::new(Loadable::<u32>::with_placeholder(0)).with_scheduler(scheduler);

        let value = shared
            .load(LoadPolicy::Reload, || async { Ok(9) })
            .await
            .unwrap();
        assert_eq!(value, 9);
        assert!(shared.state().is_initial());

        assert_eq!(runner.run_pending(), 2);
        assert_eq!(shared.state(), LoadingState::Loaded(9));
        assert_eq!(*shared.snapshot().placeholder(), 9);
    }

    #[tokio::test]
    async fn runner_task_applies_detached_loads() {
        let (scheduler, runner) = scheduler::queue();
        let shared =
            SharedLoadable::new(Loadable::<u32>::with_placeholder(0)).with_scheduler(scheduler);
        let mut changes = shared.subscribe();
        let runner = tokio::spawn(runner.run());

        shared
            .load_detached(LoadPolicy::Reload, || async { Ok(3) })
            .await
            .unwrap();

        assert_eq!(changes.recv().await.unwrap(), LoadingState::Loading);
        assert_eq!(changes.recv().await.unwrap(), LoadingState::Loaded(3));
        assert_eq!(shared.value(), Some(3));

        drop(shared);
        runner.await.unwrap();
    }

    #[test]
    fn concurrent_writes_are_published_in_applied_order() {
        const WRITERS: u32 = 8;

        for _ in 0..200 {
            let shared = SharedLoadable::new(Loadable::<u32>::with_placeholder(0));
            let mut changes = shared.subscribe();
            let barrier = Arc::new(std::sync::Barrier::new(WRITERS as usize));

            let writers: Vec<_> = (0..WRITERS)
                .map(|i| {
                    let shared = shared.clone();
                    let barrier = barrier.clone();
                    std::thread::spawn(move || {
                        barrier.wait();
                        shared.set_state(LoadingState::Loaded(i));
                    })
                })
                .collect();
            for writer in writers {
                writer.join().unwrap();
            }

            let mut last = None;
            let mut received = 0;
            while let Ok(state) = changes.try_recv() {
                last = Some(state);
                received += 1;
            }
            assert_eq!(received, WRITERS);
            assert_eq!(last, Some(shared.state()));
        }
    }

    #[tokio::test]
    async fn clones_share_the_loadable() {
        let shared = SharedLoadable::new(Loadable::<u32>::with_placeholder(0));
        let other = shared.clone();
        other.set_state(LoadingState::Loaded(8));
        assert_eq!(shared.value(), Some(8));
        assert!(!shared.is_loading());
        assert!(shared.with(|l| l.is_loaded()));
    }
}
