//! Content store - lists and reads the files posts are loaded from

use std::io;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;
use walkdir::WalkDir;

/// A single item in a content store listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreEntry {
    /// File name, including extension
    pub name: String,
    /// Whether the entry is a directory
    pub is_dir: bool,
}

impl StoreEntry {
    /// Slug for a Markdown file entry; `None` for directories and other files
    pub fn markdown_slug(&self) -> Option<&str> {
        if self.is_dir {
            return None;
        }
        self.name.strip_suffix(".md").filter(|s| !s.is_empty())
    }
}

/// Backend that posts are read from.
///
/// Implementations must be thread-safe; listing order carries no meaning.
pub trait ContentStore: Send + Sync {
    /// Where the store lives, for diagnostics
    fn location(&self) -> &Path;

    /// List the top-level entries of the store
    fn entries(&self) -> io::Result<Vec<StoreEntry>>;

    /// Read an item by file name
    fn read(&self, name: &str) -> io::Result<Vec<u8>>;

    /// Last modification time of an item, if the backend knows it
    fn modified(&self, name: &str) -> Option<SystemTime>;
}

/// A flat directory of Markdown files
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    /// Create a store rooted at `root`
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    /// Resolve an item name to a path inside the root
    fn resolve(&self, name: &str) -> io::Result<PathBuf> {
        if !is_plain_file_name(name) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{:?} is not a plain file name", name),
            ));
        }
        Ok(self.root.join(name))
    }
}

impl ContentStore for DirStore {
    fn location(&self) -> &Path {
        &self.root
    }

    fn entries(&self) -> io::Result<Vec<StoreEntry>> {
        // WalkDir yields nothing for a plain file root, so check up front
        if !std::fs::metadata(&self.root)?.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{:?} is not a directory", self.root),
            ));
        }

        let mut entries = Vec::new();

        for entry in WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
        {
            let entry = match entry {
                Ok(entry) => entry,
                // An unreadable root fails the whole listing; a broken child does not
                Err(e) if e.depth() == 0 => return Err(e.into()),
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry in {:?}: {}", self.root, e);
                    continue;
                }
            };

            let Some(name) = entry.file_name().to_str() else {
                tracing::debug!("Skipping non UTF-8 file name {:?}", entry.file_name());
                continue;
            };

            entries.push(StoreEntry {
                name: name.to_string(),
                is_dir: entry.file_type().is_dir(),
            });
        }

        Ok(entries)
    }

    fn read(&self, name: &str) -> io::Result<Vec<u8>> {
        std::fs::read(self.resolve(name)?)
    }

    fn modified(&self, name: &str) -> Option<SystemTime> {
        let path = self.resolve(name).ok()?;
        std::fs::metadata(path).ok()?.modified().ok()
    }
}

/// Whether `name` is exactly one ordinary path component
///
/// Rejects separators, `.`/`..`, hidden names and NUL bytes, so a name can
/// never resolve outside the directory it is joined onto.
pub fn is_plain_file_name(name: &str) -> bool {
    if name.is_empty() || name.starts_with('.') || name.contains(['/', '\\', '\0']) {
        return false;
    }
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
