use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::LazyLock,
};

use regex::Regex;
use tokio::runtime::{Handle, RuntimeFlavor};

use super::store::{KeyValueStore, StoreError};

/// Environment variable overriding [`StoreConfig::datadir`].
pub const DATADIR_ENV_VAR: &str = "LOADABLE_HOME";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub datadir: PathBuf,
}
impl Default for StoreConfig {
    fn default() -> Self {
        let mut datadir: PathBuf = dirs_next::home_dir().unwrap_or_default();
        datadir.push(".loadable");
        Self { datadir }
    }
}

impl StoreConfig {
    /// Default config, with the data directory taken from `LOADABLE_HOME` when set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(datadir) = std::env::var_os(DATADIR_ENV_VAR).filter(|s| !s.is_empty()) {
            config.datadir = PathBuf::from(datadir);
        }
        config
    }
}

static UNSAFE_FILENAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9._-]").expect("valid regex"));

/// A [`KeyValueStore`] keeping one file per key in a directory.
///
/// Keys are mapped to file names by replacing every character outside `[A-Za-z0-9._-]` with `_`,
/// so distinct keys differing only in those characters share a file. Writes go to a temporary
/// file first and are renamed into place.
///
/// All operations are blocking disk I/O. Inside a multi-thread tokio runtime they go through
/// [`tokio::task::block_in_place`]; on a current-thread runtime they block that thread.
#[derive(Debug, Clone)]
pub struct FileStore {
    datadir: PathBuf,
}

impl FileStore {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            datadir: config.datadir,
        }
    }

    /// Store rooted in the directory given by [`StoreConfig::from_env`].
    pub fn open_default() -> Self {
        Self::new(StoreConfig::from_env())
    }

    pub fn datadir(&self) -> &Path {
        &self.datadir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        let file_name = UNSAFE_FILENAME_CHARS.replace_all(key, "_");
        if file_name.is_empty() || file_name.chars().all(|c| c == '.') {
            return Err(StoreError::InvalidKey {
                key: key.to_owned(),
            });
        }
        Ok(self.datadir.join(format!("{file_name}.json")))
    }
}

/// Runs blocking file I/O, letting a multi-thread tokio runtime move its other tasks away first.
///
/// Writes stay synchronous so a placeholder update is on disk, in order, when `set` returns.
/// Outside a runtime, or on a current-thread one where that is not possible, `f` runs inline.
fn blocking_io<R>(f: impl FnOnce() -> R) -> R {
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(f)
        }
        _ => f(),
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_owned(),
        source,
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let path = self.path_for(key)?;
        match blocking_io(|| fs::read(&path)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(&path)(e)),
        }
    }

    fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        blocking_io(|| {
            fs::create_dir_all(&self.datadir).map_err(io_error(&self.datadir))?;

            let tmp_path = self
                .datadir
                .join(format!(".{}.tmp", uuid::Uuid::new_v4().simple()));
            fs::write(&tmp_path, value).map_err(io_error(&tmp_path))?;
            if let Err(e) = fs::rename(&tmp_path, &path) {
                let _ = fs::remove_file(&tmp_path);
                return Err(io_error(&path)(e));
            }
            log::debug!("file_store - wrote {}", path.display());
            Ok(())
        })
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        match blocking_io(|| fs::remove_file(&path)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(&path)(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> FileStore {
        FileStore::new(StoreConfig {
            datadir: dir.path().join("store"),
        })
    }

    #[test]
    fn missing_key_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        assert_eq!(store.get("nothing").unwrap(), None);
        assert!(store.remove("nothing").is_ok());
    }

    #[test]
    fn set_creates_the_directory_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        store.set("profile", b"\"first\"".to_vec()).unwrap();
        store.set("profile", b"\"second\"".to_vec()).unwrap();
        assert_eq!(store.get("profile").unwrap(), Some(b"\"second\"".to_vec()));

        let files: Vec<_> = fs::read_dir(store.datadir())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(files, vec!["profile.json".to_owned()]);

        store.remove("profile").unwrap();
        assert_eq!(store.get("profile").unwrap(), None);
    }

    #[test]
    fn keys_are_sanitized_into_file_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        store
            .set("loadable.placeholder.alloc::string::String", b"1".to_vec())
            .unwrap();
        assert!(store
            .datadir()
            .join("loadable.placeholder.alloc__string__String.json")
            .exists());

        store.set("../escape", b"1".to_vec()).unwrap();
        assert!(store.datadir().join(".._escape.json").exists());
    }

    #[test]
    fn degenerate_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        assert!(matches!(
            store.set("", b"1".to_vec()),
            Err(StoreError::InvalidKey { .. })
        ));
        assert!(matches!(
            store.get(".."),
            Err(StoreError::InvalidKey { .. })
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn works_from_a_multi_thread_runtime() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.set("profile", b"1".to_vec()).unwrap();
        assert_eq!(store.get("profile").unwrap(), Some(b"1".to_vec()));
        store.remove("profile").unwrap();
        assert_eq!(store.get("profile").unwrap(), None);
    }

    #[tokio::test]
    async fn works_from_a_current_thread_runtime() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.set("profile", b"2".to_vec()).unwrap();
        assert_eq!(store.get("profile").unwrap(), Some(b"2".to_vec()));
    }

    // Only test touching the variable; `from_env` is read nowhere else.
    #[test]
    fn datadir_env_var_overrides_the_default() {
        let dir = tempfile::tempdir().unwrap();

        std::env::set_var(DATADIR_ENV_VAR, dir.path());
        let config = StoreConfig::from_env();
        assert_eq!(config.datadir, dir.path());
        assert_eq!(FileStore::open_default().datadir(), dir.path());

        std::env::set_var(DATADIR_ENV_VAR, "");
        assert_eq!(StoreConfig::from_env(), StoreConfig::default());

        std::env::remove_var(DATADIR_ENV_VAR);
        assert_eq!(StoreConfig::from_env(), StoreConfig::default());
    }

    #[test]
    fn default_datadir_is_under_home() {
        let config = StoreConfig::default();
        assert!(config.datadir.ends_with(".loadable"));
    }
}
