//! Session storage confined to one directory through `cap-std`.
//!
//! Each key is stored as `<key>.json` inside the directory. Keys are
//! restricted to ASCII alphanumerics, `.`, `-` and `_` so they can never
//! name a path outside it.

use crate::workspace::ports::{SessionStorage, SessionStorageError, SessionStorageResult};
use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use std::sync::Arc;

/// Session storage persisted as files in a single directory.
#[derive(Debug, Clone)]
pub struct DirectorySessionStorage {
    root: Utf8PathBuf,
    dir: Arc<Dir>,
}

impl DirectorySessionStorage {
    /// Opens storage rooted at `path`, creating the directory when missing.
    ///
    /// # Errors
    ///
    /// Returns [`SessionStorageError::Persistence`] when the directory cannot
    /// be created or opened.
    pub fn open(path: &Utf8Path) -> SessionStorageResult<Self> {
        std::fs::create_dir_all(path).map_err(SessionStorageError::persistence)?;
        let dir = Dir::open_ambient_dir(path, ambient_authority())
            .map_err(SessionStorageError::persistence)?;
        Ok(Self {
            root: path.to_owned(),
            dir: Arc::new(dir),
        })
    }

    /// Returns the directory holding the stored keys.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    async fn run_blocking<F, T>(&self, f: F) -> SessionStorageResult<T>
    where
        F: FnOnce(&Dir) -> SessionStorageResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let dir = Arc::clone(&self.dir);
        tokio::task::spawn_blocking(move || f(&dir))
            .await
            .map_err(SessionStorageError::persistence)?
    }
}

fn file_name(key: &str) -> SessionStorageResult<String> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '.' | '-' | '_'));
    if valid {
        Ok(format!("{key}.json"))
    } else {
        Err(SessionStorageError::InvalidKey(key.to_owned()))
    }
}

#[async_trait]
impl SessionStorage for DirectorySessionStorage {
    async fn get(&self, key: &str) -> SessionStorageResult<Option<String>> {
        let name = file_name(key)?;
        self.run_blocking(move |dir| match dir.read_to_string(&name) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(SessionStorageError::persistence(err)),
        })
        .await
    }

    async fn set(&self, key: &str, value: &str) -> SessionStorageResult<()> {
        let name = file_name(key)?;
        let staging = format!("{name}.tmp");
        let contents = value.to_owned();
        self.run_blocking(move |dir| {
            dir.write(&staging, contents.as_bytes())
                .map_err(SessionStorageError::persistence)?;
            dir.rename(&staging, dir, &name)
                .map_err(SessionStorageError::persistence)
        })
        .await
    }

    async fn remove(&self, key: &str) -> SessionStorageResult<()> {
        let name = file_name(key)?;
        self.run_blocking(move |dir| match dir.remove_file(&name) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(SessionStorageError::persistence(err)),
        })
        .await
    }
}
