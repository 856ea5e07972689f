//! # Loadable
//!
//! A small framework for tracking the lifecycle of an asynchronously produced value.
//!
//! A [`Loadable`](loaded::Loadable) couples the current [`LoadingState`](loaded::LoadingState)
//! (`Initial`, `Loading`, `Error` or `Loaded`) with a placeholder value, so that a consumer always
//! has something to display: the last loaded value, or a caller-supplied default before the first
//! successful load. The placeholder can optionally be persisted into a
//! [`KeyValueStore`](persistence::KeyValueStore) so that it survives restarts.
//!
//! ## Core Concepts
//!
//! - [`loaded`]: the state types and their derived accessors
//! - [`persistence`]: placeholder persistence and the key-value store collaborator
//! - [`orchestration`]: driving a loadable from an async producer, optionally marshalling the
//!   state mutations through a [`Scheduler`](orchestration::scheduler::Scheduler)
//!
//! ## Example Usage
//!
//! ```rust
//! use loadable::prelude::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let mut greeting = Loadable::<String>::with_placeholder("Loading...".to_owned());
//! assert!(greeting.is_initial());
//!
//! let value = greeting
//!     .load(LoadPolicy::Reload, || async { Ok("Hello".to_owned()) })
//!     .await
//!     .unwrap();
//! assert_eq!(value, "Hello");
//! assert_eq!(greeting.value_or_placeholder(), "Hello");
//! # }
//! ```

mod utils;

pub mod loaded;
pub mod orchestration;
pub mod persistence;

/// Prelude module that re-exports commonly used types and traits.
///
/// ```rust
/// use loadable::prelude::*;
/// ```
pub mod prelude {
    pub use super::loaded::prelude::*;
    pub use super::orchestration::prelude::*;
    pub use super::persistence::prelude::*;
}
