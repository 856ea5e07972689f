use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};

use super::{error::LoadError, state::LoadingState};
use crate::{
    persistence::{JsonSink, KeyValueStore, PersistenceKey, PlaceholderSink},
    utils::log_warn,
};

/// A [`LoadingState`] paired with a placeholder value.
///
/// The placeholder is what a consumer displays while no loaded value is available: the
/// caller-supplied default before the first success, then the most recently loaded value.
/// Setting the state to `Loaded(v)` synchronously updates the placeholder to `v`; any other
/// state leaves it untouched.
///
/// A loadable can be [`persisted`](Loadable::persisted): every placeholder update is then
/// written to a [`KeyValueStore`], and a later instance built with the same key starts from the
/// stored value.
///
/// # Examples
///
/// ```rust
/// use loadable::prelude::*;
///
/// let mut count = Loadable::<u32>::with_placeholder(0);
/// assert!(count.is_initial());
/// assert_eq!(count.value(), None);
/// assert_eq!(*count.value_or_placeholder(), 0);
///
/// count.set_state(LoadingState::Loaded(42));
/// assert_eq!(count.value(), Some(&42));
/// assert_eq!(*count.placeholder(), 42);
///
/// count.set_state(LoadingState::Error(LoadError::msg("offline")));
/// assert_eq!(count.value(), None);
/// assert_eq!(*count.value_or_placeholder(), 42);
/// ```
pub struct Loadable<V, E = LoadError> {
    state: LoadingState<V, E>,
    placeholder: V,
    persistence: Option<Arc<dyn PlaceholderSink<V>>>,
}

impl<V, E> Loadable<V, E> {
    /// Starts in the `Initial` state with `placeholder` as fallback value.
    pub fn with_placeholder(placeholder: V) -> Self {
        Self {
            state: LoadingState::Initial,
            placeholder,
            persistence: None,
        }
    }

    pub fn state(&self) -> &LoadingState<V, E> {
        &self.state
    }

    pub fn placeholder(&self) -> &V {
        &self.placeholder
    }

    /// The loaded value, `None` unless the state is `Loaded`.
    pub fn value(&self) -> Option<&V> {
        self.state.value()
    }

    pub fn error(&self) -> Option<&E> {
        self.state.error()
    }

    /// The loaded value if there is one, the placeholder otherwise.
    pub fn value_or_placeholder(&self) -> &V {
        self.value().unwrap_or(&self.placeholder)
    }

    pub fn is_loading(&self) -> bool {
        self.state.is_loading()
    }

    pub fn is_initial(&self) -> bool {
        self.state.is_initial()
    }

    pub fn is_loaded(&self) -> bool {
        self.state.is_loaded()
    }

    pub fn is_error(&self) -> bool {
        self.state.is_error()
    }

    /// The resolved store key, `None` when the placeholder is not persisted.
    pub fn persistence_key(&self) -> Option<&str> {
        self.persistence.as_ref().map(|sink| sink.key())
    }

    /// Replaces the placeholder, writing it to the store if persistence is enabled.
    pub fn set_placeholder(&mut self, placeholder: V) {
        self.placeholder = placeholder;
        self.persist_placeholder();
    }

    fn persist_placeholder(&self) {
        let Some(sink) = self.persistence.as_ref() else {
            return;
        };
        match sink.write(&self.placeholder) {
            Ok(()) => log::debug!("loadable - placeholder persisted under {}", sink.key()),
            Err(e) => log_warn("loadable", e),
        }
    }

    /// Passes the placeholder and, if any, the loaded value through `transform`.
    ///
    /// The lifecycle stage is preserved. The result is never persisted: a persistence key does
    /// not carry over to another value type.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use loadable::prelude::*;
    ///
    /// let loadable = Loadable::<u32>::with_loaded_value(21);
    /// let doubled = loadable.map(|v| v * 2);
    /// assert_eq!(doubled.state(), &LoadingState::Loaded(42));
    /// assert_eq!(*doubled.placeholder(), 42);
    /// ```
    pub fn map<U, F: FnMut(V) -> U>(self, mut transform: F) -> Loadable<U, E> {
        let placeholder = transform(self.placeholder);
        Loadable {
            state: self.state.map(transform),
            placeholder,
            persistence: None,
        }
    }

    /// Maps the error payload. The placeholder and its persistence carry over unchanged.
    pub fn map_err<F2, F: FnOnce(E) -> F2>(self, transform: F) -> Loadable<V, F2> {
        Loadable {
            state: self.state.map_err(transform),
            placeholder: self.placeholder,
            persistence: self.persistence,
        }
    }

    pub fn into_parts(self) -> (LoadingState<V, E>, V) {
        (self.state, self.placeholder)
    }
}

impl<V: Clone, E> Loadable<V, E> {
    /// Starts in the `Loaded` state, the value doubling as placeholder.
    pub fn with_loaded_value(value: V) -> Self {
        Self {
            state: LoadingState::Loaded(value.clone()),
            placeholder: value,
            persistence: None,
        }
    }

    /// Replaces the state. A `Loaded` state also becomes the new placeholder.
    pub fn set_state(&mut self, state: LoadingState<V, E>) {
        log::debug!("loadable - {} -> {}", self.state.stage(), state.stage());
        if let LoadingState::Loaded(v) = &state {
            self.set_placeholder(v.clone());
        }
        self.state = state;
    }
}

impl<V: Serialize + DeserializeOwned, E> Loadable<V, E> {
    /// Enables placeholder persistence into `store` under `key`.
    ///
    /// With [`PersistenceKey::None`] this is a no-op: nothing is read nor written. Otherwise, if
    /// the loadable starts `Initial` and a value is stored under the resolved key, it replaces the
    /// supplied placeholder. If it starts `Loaded`, the loaded value is the most recent one and is
    /// written to the store instead.
    ///
    /// A stored value that cannot be decoded is ignored with a warning.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use loadable::prelude::*;
    ///
    /// let store = MemoryStore::new();
    ///
    /// let mut first = Loadable::<String>::with_placeholder("default".to_owned())
    ///     .persisted(store.clone(), "greeting");
    /// first.set_state(LoadingState::Loaded("hello".to_owned()));
    ///
    /// let second = Loadable::<String>::with_placeholder("default".to_owned())
    ///     .persisted(store, "greeting");
    /// assert!(second.is_initial());
    /// assert_eq!(second.placeholder(), "hello");
    /// ```
    pub fn persisted<S, K>(mut self, store: S, key: K) -> Self
    where
        S: KeyValueStore + 'static,
        K: Into<PersistenceKey>,
    {
        let Some(key) = key.into().resolve::<V>() else {
            log::debug!("loadable - persistence disabled");
            self.persistence = None;
            return self;
        };
        let sink = JsonSink::new(key, store);

        if self.state.is_loaded() {
            self.persistence = Some(Arc::new(sink));
            self.persist_placeholder();
            return self;
        }

        match sink.read::<V>() {
            Ok(Some(stored)) => {
                log::debug!("loadable - placeholder restored from {}", sink.key());
                self.placeholder = stored;
            }
            Ok(None) => (),
            Err(e) => log_warn("loadable", e),
        }
        self.persistence = Some(Arc::new(sink));
        self
    }
}

impl<V: Clone, E: Clone> Clone for Loadable<V, E> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            placeholder: self.placeholder.clone(),
            persistence: self.persistence.clone(),
        }
    }
}

impl<V: Default, E> Default for Loadable<V, E> {
    fn default() -> Self {
        Self::with_placeholder(V::default())
    }
}

/// Compares state and placeholder. The persistence target is not part of the value.
impl<V: PartialEq, E: PartialEq> PartialEq for Loadable<V, E> {
    fn eq(&self, other: &Self) -> bool {
        self.state == other.state && self.placeholder == other.placeholder
    }
}

impl<V: core::fmt::Debug, E: core::fmt::Debug> core::fmt::Debug for Loadable<V, E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Loadable")
            .field("state", &self.state)
            .field("placeholder", &self.placeholder)
            .field("persistence_key", &self.persistence_key())
            .finish()
    }
}
