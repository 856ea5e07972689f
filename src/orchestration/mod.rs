//! # Orchestration Module
//!
//! Drives a [`Loadable`] through its lifecycle from an asynchronous producer.
//!
//! A load sets the state to `Loading`, awaits the producer, then sets `Loaded(v)` or `Error(e)`.
//! Suspension happens only while awaiting the producer. There is no cancellation: an in-flight
//! load can only be superseded by a later state write, and when two loads race on the same
//! holder, the last one to complete wins.
//!
//! - [`Loadable::load`]: for a single owner holding the loadable mutably
//! - [`SharedLoadable`]: a shared holder, with optional [`Scheduler`](scheduler::Scheduler)
//!   marshalling and fire-and-forget loads

use std::future::Future;

use crate::loaded::{Loadable, LoadingState};

pub mod scheduler;
mod shared;

pub use shared::SharedLoadable;

/// Whether a load may reuse an already loaded value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadPolicy {
    /// Always run the producer
    #[default]
    Reload,
    /// Return the current value without running the producer if the state is `Loaded`
    SkipIfLoaded,
}

impl<V: Clone, E: Clone> Loadable<V, E> {
    /// Runs `producer` and records its outcome.
    ///
    /// With [`LoadPolicy::SkipIfLoaded`] and a `Loaded(v)` state, returns `v` without touching
    /// the state nor calling the producer. Otherwise the state goes to `Loading`, then to
    /// `Loaded(v)` (returning `v`) or `Error(e)` (returning `Err(e)`).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use loadable::prelude::*;
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() {
    /// let mut count = Loadable::<u32>::with_placeholder(0);
    ///
    /// let result = count
    ///     .load(LoadPolicy::Reload, || async { Err(LoadError::msg("offline")) })
    ///     .await;
    /// assert!(result.is_err());
    /// assert!(count.is_error());
    /// assert_eq!(*count.value_or_placeholder(), 0);
    /// # }
    /// ```
    pub async fn load<F, Fut>(&mut self, policy: LoadPolicy, producer: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if policy == LoadPolicy::SkipIfLoaded {
            if let Some(v) = self.value() {
                log::debug!("loadable::load - already loaded, skipping");
                return Ok(v.clone());
            }
        }

        log::debug!("loadable::load - start");
        self.set_state(LoadingState::Loading);
        let outcome = producer().await;
        log::debug!("loadable::load - finished (ok: {})", outcome.is_ok());
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
}

pub mod prelude {
    pub use super::scheduler::{self, Immediate, Scheduler};
    pub use super::shared::SharedLoadable;
    pub use super::LoadPolicy;
}
