//! Filesystem storage implementation for tagboard.

mod error;

pub use error::FsStoreError;

use std::fs;
use std::io::{ErrorKind, Write};
use std::num::NonZeroUsize;
use std::path::{Component, Path, PathBuf};
use std::sync::Mutex;
use std::time::SystemTime;

use anyhow::{Context, Result, anyhow};
use lru::LruCache;
use tagboard_app::FileStore;
use tagboard_app::config::CONFIG_DIR;
use tempfile::NamedTempFile;
use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

const CONTENT_CACHE_CAPACITY: usize = 512;
const SKIPPED_DIRS: [&str; 4] = [".git", "target", "node_modules", CONFIG_DIR];

/// Files larger than this are treated as holding no tasks.
pub const MAX_FILE_BYTES: u64 = 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Stamp {
    modified: Option<SystemTime>,
    len: u64,
}

impl Stamp {
    fn of(meta: &fs::Metadata) -> Self {
        Self {
            modified: meta.modified().ok(),
            len: meta.len(),
        }
    }
}

#[derive(Debug, Clone)]
enum Content {
    Text(String),
    Skipped,
}

impl Content {
    fn into_text(self) -> Option<String> {
        match self {
            Self::Text(text) => Some(text),
            Self::Skipped => None,
        }
    }
}

/// Store over a directory tree; paths are `/`-separated and relative to the root.
///
/// Reads are cached by modification time and length, so unchanged files are
/// not re-read when the board reloads.
pub struct FsStore {
    root: PathBuf,
    content_cache: Mutex<LruCache<String, (Stamp, Content)>>,
}

impl FsStore {
    /// Open the board rooted at `root`.
    ///
    /// # Errors
    /// Returns an error if `root` does not exist or is not a directory.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let root = root
            .canonicalize()
            .with_context(|| format!("Failed to open board root {}", root.display()))?;
        if !root.is_dir() {
            return Err(anyhow!("Board root is not a directory: {}", root.display()));
        }
        let capacity = NonZeroUsize::new(CONTENT_CACHE_CAPACITY)
            .ok_or_else(|| anyhow!("cache capacity must be non-zero"))?;
        info!(root = %root.display(), "Opened filesystem store");
        Ok(Self {
            root,
            content_cache: Mutex::new(LruCache::new(capacity)),
        })
    }

    /// Board root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, FsStoreError> {
        let relative = Path::new(path);
        let valid = !path.is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        if !valid {
            return Err(FsStoreError::InvalidPath(path.to_owned()));
        }
        Ok(self.root.join(relative))
    }

    fn relative_name(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let parts = relative
            .components()
            .map(|component| component.as_os_str().to_str())
            .collect::<Option<Vec<_>>>()?;
        Some(parts.join("/"))
    }

    fn cached(&self, path: &str, stamp: &Stamp) -> Option<Content> {
        let mut cache = self.content_cache.lock().ok()?;
        let (cached_stamp, content) = cache.get(path)?;
        (cached_stamp == stamp).then(|| content.clone())
    }

    fn remember(&self, path: &str, stamp: Stamp, content: Content) {
        if let Ok(mut cache) = self.content_cache.lock() {
            cache.put(path.to_owned(), (stamp, content));
        }
    }

    fn forget(&self, path: &str) {
        if let Ok(mut cache) = self.content_cache.lock() {
            cache.pop(path);
        }
    }
}

impl FileStore for FsStore {
    type Error = FsStoreError;

    fn list_files(&self) -> Result<Vec<String>, Self::Error> {
        let mut paths = Vec::new();
        let walker = WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !is_skipped(entry));
        for entry in walker {
            let entry = entry.map_err(|source| FsStoreError::Walk {
                root: self.root.clone(),
                source: Box::new(source),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            match self.relative_name(entry.path()) {
                Some(name) => paths.push(name),
                None => debug!(path = %entry.path().display(), "Skipping non UTF-8 path"),
            }
        }
        debug!(files = paths.len(), "Listed files");
        Ok(paths)
    }

    fn read_file(&self, path: &str) -> Result<Option<String>, Self::Error> {
        let full = self.resolve(path)?;
        let meta = match fs::metadata(&full) {
            Ok(meta) => meta,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(FsStoreError::Io { path: full, source }),
        };
        if !meta.is_file() {
            return Ok(None);
        }

        let stamp = Stamp::of(&meta);
        if let Some(content) = self.cached(path, &stamp) {
            return Ok(content.into_text());
        }

        let content = if meta.len() > MAX_FILE_BYTES {
            debug!(path, len = meta.len(), "Skipping large file");
            Content::Skipped
        } else {
            let bytes = fs::read(&full).map_err(io_error(&full))?;
            // Binary files hold no tasks.
            String::from_utf8(bytes).map_or(Content::Skipped, Content::Text)
        };
        self.remember(path, stamp, content.clone());
        Ok(content.into_text())
    }

    fn exists(&self, path: &str) -> Result<bool, Self::Error> {
        let full = self.resolve(path)?;
        match fs::symlink_metadata(&full) {
            Ok(_) => Ok(true),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(source) => Err(FsStoreError::Io { path: full, source }),
        }
    }

    fn write_file(&self, path: &str, text: &str) -> Result<(), Self::Error> {
        let full = self.resolve(path)?;
        let dir = full
            .parent()
            .map_or_else(|| self.root.clone(), Path::to_path_buf);
        fs::create_dir_all(&dir).map_err(io_error(&dir))?;

        let mut tmp = NamedTempFile::new_in(&dir).map_err(io_error(&dir))?;
        tmp.write_all(text.as_bytes()).map_err(io_error(&full))?;
        if let Ok(existing) = fs::metadata(&full) {
            tmp.as_file()
                .set_permissions(existing.permissions())
                .map_err(io_error(&full))?;
        }
        tmp.as_file().sync_all().map_err(io_error(&full))?;
        tmp.persist(&full)
            .map_err(|err| io_error(&full)(err.error))?;

        match fs::metadata(&full) {
            Ok(meta) => self.remember(path, Stamp::of(&meta), Content::Text(text.to_owned())),
            Err(_) => self.forget(path),
        }
        debug!(path, bytes = text.len(), "Wrote file");
        Ok(())
    }
}

fn is_skipped(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| SKIPPED_DIRS.contains(&name))
}

fn io_error(path: &Path) -> impl Fn(std::io::Error) -> FsStoreError + '_ {
    move |source| FsStoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn list_files_skips_tool_directories() -> Result<()> {
        let dir = tempdir()?;
        fs::create_dir_all(dir.path().join("src"))?;
        fs::create_dir_all(dir.path().join(".git"))?;
        fs::create_dir_all(dir.path().join("target/debug"))?;
        fs::create_dir_all(dir.path().join(CONFIG_DIR))?;
        fs::write(dir.path().join("TODO.md"), "#TODO a\n")?;
        fs::write(dir.path().join("src/lib.rs"), "// TODO: b\n")?;
        fs::write(dir.path().join(".git/HEAD"), "ref: refs/heads/main\n")?;
        fs::write(dir.path().join("target/debug/out.rs"), "// TODO: c\n")?;
        fs::write(dir.path().join(CONFIG_DIR).join("config.toml"), "")?;

        let store = FsStore::open(dir.path())?;
        assert_eq!(store.list_files()?, vec!["TODO.md".to_owned(), "src/lib.rs".to_owned()]);
        Ok(())
    }

    #[test]
    fn read_file_returns_none_for_missing_and_binary() -> Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("logo.png"), [0x89, 0x50, 0xff, 0xfe])?;
        let store = FsStore::open(dir.path())?;

        assert_eq!(store.read_file("missing.md")?, None);
        assert_eq!(store.read_file("logo.png")?, None);
        assert!(store.exists("logo.png")?);
        assert!(!store.exists("missing.md")?);
        Ok(())
    }

    #[test]
    fn write_file_creates_directories_and_updates_cache() -> Result<()> {
        let dir = tempdir()?;
        let store = FsStore::open(dir.path())?;

        store.write_file("notes/TODO.md", "#TODO a\n")?;
        assert_eq!(fs::read_to_string(dir.path().join("notes/TODO.md"))?, "#TODO a\n");
        assert_eq!(store.read_file("notes/TODO.md")?.as_deref(), Some("#TODO a\n"));

        fs::write(dir.path().join("notes/TODO.md"), "#DONE a longer\n")?;
        assert_eq!(
            store.read_file("notes/TODO.md")?.as_deref(),
            Some("#DONE a longer\n")
        );
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn write_file_keeps_permissions() -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir()?;
        let script = dir.path().join("run.sh");
        fs::write(&script, "# TODO: a\n")?;
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755))?;

        let store = FsStore::open(dir.path())?;
        store.write_file("run.sh", "# DONE: a\n")?;
        assert_eq!(fs::metadata(&script)?.permissions().mode() & 0o777, 0o755);
        Ok(())
    }

    #[test]
    fn paths_outside_the_root_are_rejected() -> Result<()> {
        let dir = tempdir()?;
        let store = FsStore::open(dir.path())?;

        for path in ["", "../escape.md", "/etc/passwd", "a/../../b.md"] {
            assert!(
                matches!(store.write_file(path, "x"), Err(FsStoreError::InvalidPath(_))),
                "{path}"
            );
        }
        Ok(())
    }
}
