//! # Loaded Module
//!
//! State types describing an asynchronously produced value.
//!
//! ## Core Concepts
//!
//! - [`LoadingState`]: the lifecycle stage, `Initial`, `Loading`, `Error(e)` or `Loaded(v)`
//! - [`Loadable`]: a `LoadingState` plus a placeholder that always holds something displayable
//! - [`LoadError`]: the default, opaque error payload
//!
//! The lifecycle is `Initial → Loading → {Loaded | Error}`, and any state can go back to
//! `Loading` on reload. There is no terminal state.

mod error;
mod loadable;
mod state;

pub use error::LoadError;
pub use loadable::Loadable;
pub use state::LoadingState;

/// Prelude module that re-exports commonly used types.
pub mod prelude {
    pub use super::error::LoadError;
    pub use super::loadable::Loadable;
    pub use super::state::LoadingState;
}
