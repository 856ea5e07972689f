use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// A unit of work mutating a loadable.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Executes state mutations on a chosen execution context.
///
/// A UI layer that must observe mutations on its own thread provides a scheduler forwarding
/// the jobs there; see [`queue`]. Jobs must run in the order they are scheduled.
pub trait Scheduler: Send + Sync {
    fn schedule(&self, job: Job);
}

/// Runs every job inline, on whatever context scheduled it.
#[derive(Debug, Clone, Copy, Default)]
pub struct Immediate;
impl Scheduler for Immediate {
    #[inline(always)]
    fn schedule(&self, job: Job) {
        job()
    }
}

/// Creates a scheduler that queues jobs for a [`QueueRunner`].
///
/// The runner lives on the context owning the state (typically a UI thread or its event loop),
/// and applies queued mutations when it gets to them.
///
/// # Examples
///
/// ```rust
/// use loadable::prelude::*;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let (scheduler, mut runner) = scheduler::queue();
/// let shared =
///     SharedLoadable::new(Loadable::<u32>::with_placeholder(0)).with_scheduler(scheduler);
///
/// let value = shared.load(LoadPolicy::Reload, || async { Ok(42) }).await.unwrap();
/// assert_eq!(value, 42);
/// assert!(shared.state().is_initial());
///
/// assert_eq!(runner.run_pending(), 2);
/// assert_eq!(shared.state(), LoadingState::Loaded(42));
/// # }
/// ```
pub fn queue() -> (QueueScheduler, QueueRunner) {
    let (tx, rx) = mpsc::unbounded_channel();
    (QueueScheduler { tx }, QueueRunner { rx })
}

/// Sending half of [`queue`].
#[derive(Debug, Clone)]
pub struct QueueScheduler {
    tx: UnboundedSender<Job>,
}
impl Scheduler for QueueScheduler {
    fn schedule(&self, job: Job) {
        if self.tx.send(job).is_err() {
            log::warn!("queue_scheduler - runner is gone, discarding a state mutation");
        }
    }
}

/// Receiving half of [`queue`].
#[derive(Debug)]
pub struct QueueRunner {
    rx: UnboundedReceiver<Job>,
}
impl QueueRunner {
    /// Runs every job queued so far, returns how many ran.
    pub fn run_pending(&mut self) -> usize {
        let mut count = 0;
        while let Ok(job) = self.rx.try_recv() {
            job();
            count += 1;
        }
        count
    }

    /// Runs jobs as they arrive until every [`QueueScheduler`] is dropped.
    pub async fn run(mut self) {
        log::info!("queue_runner - start");
        while let Some(job) = self.rx.recv().await {
            job();
        }
        log::info!("queue_runner - all schedulers dropped, stopping");
    }
}
