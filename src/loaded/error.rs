use std::sync::Arc;

/// Opaque, cheaply clonable error carried by [`LoadingState::Error`](super::LoadingState::Error).
///
/// No classification is done on the failure: it is stored as produced. Equality is the identity
/// of the underlying error instance, so a `LoadError` equals its clones but two independently
/// built errors never compare equal, even when their messages match.
///
/// # Examples
///
/// ```rust
/// use loadable::prelude::*;
///
/// let error = LoadError::msg("network unreachable");
/// assert_eq!(error, error.clone());
/// assert_ne!(error, LoadError::msg("network unreachable"));
/// ```
#[derive(Clone)]
pub struct LoadError(Arc<dyn std::error::Error + Send + Sync + 'static>);

impl LoadError {
    pub fn new<E: std::error::Error + Send + Sync + 'static>(error: E) -> Self {
        Self(Arc::new(error))
    }

    /// Builds an error from a plain message.
    pub fn msg<M: core::fmt::Display>(message: M) -> Self {
        Self(Arc::new(Message(message.to_string())))
    }

    /// Returns the underlying error if it has type `E`.
    pub fn downcast_ref<E: std::error::Error + 'static>(&self) -> Option<&E> {
        self.0.downcast_ref::<E>()
    }
}

impl PartialEq for LoadError {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}
impl Eq for LoadError {}

impl core::fmt::Debug for LoadError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("LoadError").field(&self.0).finish()
    }
}

impl core::fmt::Display for LoadError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct Message(String);

impl From<String> for LoadError {
    fn from(value: String) -> Self {
        Self::msg(value)
    }
}
impl From<&str> for LoadError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}
impl From<std::io::Error> for LoadError {
    fn from(value: std::io::Error) -> Self {
        Self::new(value)
    }
}
impl From<serde_json::Error> for LoadError {
    fn from(value: serde_json::Error) -> Self {
        Self::new(value)
    }
}
