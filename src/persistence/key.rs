/// Selects under which key, if any, a placeholder is persisted.
///
/// # Examples
///
/// ```rust
/// use loadable::prelude::*;
///
/// assert_eq!(PersistenceKey::custom("user").resolve::<u32>().as_deref(), Some("user"));
/// assert_eq!(PersistenceKey::None.resolve::<u32>(), None);
/// assert_eq!(
///     PersistenceKey::Default.resolve::<u32>().as_deref(),
///     Some("loadable.placeholder.u32")
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum PersistenceKey {
    /// A key derived from the value's type name
    Default,
    /// Exactly this key
    Custom(String),
    /// Persistence disabled: no read at construction, no write on update
    #[default]
    None,
}

impl PersistenceKey {
    pub fn custom<S: Into<String>>(name: S) -> Self {
        Self::Custom(name.into())
    }

    /// Resolves the store key for values of type `V`.
    ///
    /// The default key is deterministic for a given type and compiler, it is derived from
    /// [`std::any::type_name`].
    pub fn resolve<V: ?Sized>(&self) -> Option<String> {
        match self {
            PersistenceKey::Default => Some(format!(
                "loadable.placeholder.{}",
                std::any::type_name::<V>()
            )),
            PersistenceKey::Custom(name) => Some(name.clone()),
            PersistenceKey::None => None,
        }
    }
}

impl From<&str> for PersistenceKey {
    fn from(value: &str) -> Self {
        Self::Custom(value.to_owned())
    }
}
impl From<String> for PersistenceKey {
    fn from(value: String) -> Self {
        Self::Custom(value)
    }
}
