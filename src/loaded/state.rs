use super::error::LoadError;

/// Represents the lifecycle stage of an asynchronously produced value.
///
/// Exactly one variant holds at any time. Transitions replace the whole value,
/// there is no partial state.
///
/// # Type Parameters
///
/// * `V` - The type of the loaded value
/// * `E` - The error payload, an opaque [`LoadError`] by default
///
/// # Examples
///
/// ```rust
/// use loadable::prelude::*;
///
/// let state: LoadingState<u32> = LoadingState::Loaded(42);
/// assert_eq!(state.value(), Some(&42));
/// assert!(!state.is_loading());
///
/// let state: LoadingState<u32> = LoadingState::Loading;
/// assert!(state.is_loading());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadingState<V, E = LoadError> {
    /// Nothing was requested yet
    Initial,
    /// A load is in flight
    Loading,
    /// The last load failed
    Error(E),
    /// The last load succeeded
    Loaded(V),
}

impl<V, E> LoadingState<V, E> {
    /// Returns the loaded value, if the state is `Loaded`.
    pub fn value(&self) -> Option<&V> {
        match self {
            LoadingState::Loaded(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the error, if the state is `Error`.
    pub fn error(&self) -> Option<&E> {
        match self {
            LoadingState::Error(e) => Some(e),
            _ => None,
        }
    }

    /// `true` for `Initial` and `Loading`: no outcome is known yet.
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadingState::Initial | LoadingState::Loading)
    }

    pub fn is_initial(&self) -> bool {
        matches!(self, LoadingState::Initial)
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadingState::Loaded(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, LoadingState::Error(_))
    }

    /// Maps the loaded value using the provided function, keeping the variant.
    ///
    /// This is similar to `Option::map`: only a `Loaded` state calls `f`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use loadable::prelude::*;
    ///
    /// let state: LoadingState<&str> = LoadingState::Loaded("hello");
    /// assert_eq!(state.map(str::len), LoadingState::Loaded(5));
    /// ```
    pub fn map<U, F: FnOnce(V) -> U>(self, f: F) -> LoadingState<U, E> {
        match self {
            LoadingState::Initial => LoadingState::Initial,
            LoadingState::Loading => LoadingState::Loading,
            LoadingState::Error(e) => LoadingState::Error(e),
            LoadingState::Loaded(v) => LoadingState::Loaded(f(v)),
        }
    }

    /// Maps the error payload using the provided function, keeping the variant.
    pub fn map_err<F2, F: FnOnce(E) -> F2>(self, f: F) -> LoadingState<V, F2> {
        match self {
            LoadingState::Initial => LoadingState::Initial,
            LoadingState::Loading => LoadingState::Loading,
            LoadingState::Error(e) => LoadingState::Error(f(e)),
            LoadingState::Loaded(v) => LoadingState::Loaded(v),
        }
    }

    /// Creates a reference view of the state without taking ownership of the payload.
    pub fn as_ref(&self) -> LoadingState<&V, &E> {
        match self {
            LoadingState::Initial => LoadingState::Initial,
            LoadingState::Loading => LoadingState::Loading,
            LoadingState::Error(e) => LoadingState::Error(e),
            LoadingState::Loaded(v) => LoadingState::Loaded(v),
        }
    }

    /// Name of the variant, for logs.
    pub(crate) fn stage(&self) -> &'static str {
        match self {
            LoadingState::Initial => "Initial",
            LoadingState::Loading => "Loading",
            LoadingState::Error(_) => "Error",
            LoadingState::Loaded(_) => "Loaded",
        }
    }
}

// Manual impl: a derive would require `V: Default` and `E: Default`.
impl<V, E> Default for LoadingState<V, E> {
    fn default() -> Self {
        Self::Initial
    }
}

impl<V, E> From<Result<V, E>> for LoadingState<V, E> {
    fn from(value: Result<V, E>) -> Self {
        match value {
            Ok(v) => Self::Loaded(v),
            Err(e) => Self::Error(e),
        }
    }
}
