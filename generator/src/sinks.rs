use std::{
    collections::BTreeMap,
    fs::{self, Permissions},
    io::{self, Write},
    os::unix::fs::PermissionsExt,
    path::{Path, PathBuf},
    sync::Mutex,
};
use tempfile::NamedTempFile;
use tracing::debug;

/// mode of newly created scripts, overwrites keep the mode of the replaced file
pub const SCRIPT_MODE: u32 = 0o644;

/// Destination for persisted scripts
pub trait ScriptStore {
    /// Replace whatever is at `path` with `text`.
    ///
    /// Either the full text ends up at `path` or the previous content stays untouched.
    fn persist(&self, path: &Path, text: &str) -> io::Result<PathBuf>;

    /// create a directory and its parents if absent
    fn ensure_dir(&self, path: &Path) -> io::Result<()>;
}

/// Writes scripts below a root directory
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ScriptStore for FsStore {
    fn persist(&self, path: &Path, text: &str) -> io::Result<PathBuf> {
        let target = self.root.join(path);
        let dir = target.parent().unwrap_or(&self.root);

        // staging file lives next to the target so the rename never crosses filesystems
        let mut staging = NamedTempFile::new_in(dir)?;
        staging.write_all(text.as_bytes())?;
        // tempfile stages with 0600, which would make every script owner-only
        let mode = match fs::metadata(&target) {
            Ok(metadata) => metadata.permissions().mode() & 0o7777,
            Err(_) => SCRIPT_MODE,
        };
        staging.as_file().set_permissions(Permissions::from_mode(mode))?;
        staging.as_file().sync_all()?;
        debug!(staging = ?staging.path(), target = ?target, "Moving script into place");

        // a failed persist drops the staging file, which removes it again
        staging.persist(&target).map_err(|e| e.error)?;

        Ok(target)
    }

    fn ensure_dir(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(self.root.join(path))
    }
}

/// Keeps scripts in memory, mostly useful for tests and dry runs
#[derive(Debug, Default)]
pub struct MemoryStore {
    files: Mutex<BTreeMap<PathBuf, String>>,
    dirs: Mutex<Vec<PathBuf>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &Path) -> Option<String> {
        self.files
            .lock()
            .ok()
            .and_then(|files| files.get(path).cloned())
    }

    pub fn is_empty(&self) -> bool {
        self.files.lock().map(|files| files.is_empty()).unwrap_or(true)
            && self.dirs.lock().map(|dirs| dirs.is_empty()).unwrap_or(true)
    }

    pub fn dirs(&self) -> Vec<PathBuf> {
        self.dirs.lock().map(|dirs| dirs.clone()).unwrap_or_default()
    }
}

impl ScriptStore for MemoryStore {
    fn persist(&self, path: &Path, text: &str) -> io::Result<PathBuf> {
        let mut files = self
            .files
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "memory store poisoned"))?;
        files.insert(path.to_path_buf(), text.to_string());

        Ok(path.to_path_buf())
    }

    fn ensure_dir(&self, path: &Path) -> io::Result<()> {
        let mut dirs = self
            .dirs
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "memory store poisoned"))?;

        if !dirs.iter().any(|dir| dir == path) {
            dirs.push(path.to_path_buf());
        }

        Ok(())
    }
}

/// Where a generated script goes.
///
/// `console` receives the text when set, `store` only when the config asks for a shell file.
pub struct Sinks<'a> {
    pub console: Option<&'a mut dyn Write>,
    pub store: &'a dyn ScriptStore,
}

impl<'a> Sinks<'a> {
    pub fn new(console: Option<&'a mut dyn Write>, store: &'a dyn ScriptStore) -> Self {
        Self { console, store }
    }

    /// store only, nothing printed
    pub fn quiet(store: &'a dyn ScriptStore) -> Self {
        Self {
            console: None,
            store,
        }
    }
}
