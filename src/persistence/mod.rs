//! # Persistence Module
//!
//! Optional persistence of a [`Loadable`](crate::loaded::Loadable) placeholder.
//!
//! Every time the placeholder of a persisted loadable changes, it is encoded as JSON and written
//! under its [`PersistenceKey`] into a [`KeyValueStore`]. When a persisted loadable is built, a
//! previously stored value replaces the supplied placeholder. Failures are logged, never raised.

mod codec;
mod file;
mod key;
mod store;

pub use codec::PersistenceError;
pub(crate) use codec::{JsonSink, PlaceholderSink};
pub use file::{FileStore, StoreConfig, DATADIR_ENV_VAR};
pub use key::PersistenceKey;
pub use store::{KeyValueStore, MemoryStore, StoreError};

pub mod prelude {
    pub use super::file::{FileStore, StoreConfig};
    pub use super::key::PersistenceKey;
    pub use super::store::{KeyValueStore, MemoryStore};
}
