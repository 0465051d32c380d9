//! Symbol sources: the places a loader (or the host) reads entries from.
//!
//! An entry is a `/`-separated path inside a source, e.g.
//! `org/sonar/batch/Batch.class`.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};
use std::sync::Mutex;

use url::Url;

use crate::error::IsolationError;

/// Extension point for anything that can serve entries by path.
///
/// Implemented by directories, zip archives, in-memory tables and by
/// [`crate::IsolatedLoader`] itself, so a loader can act as another's host.
pub trait SymbolSource: Send + Sync + fmt::Debug {
    /// Where this source comes from, for diagnostics.
    fn location(&self) -> &str;

    /// Bytes of `entry`, or `None` when this source does not have it.
    fn read_entry(&self, entry: &str) -> Result<Option<Vec<u8>>, IsolationError>;
}

// ─── Directory ──────────────────────────────────────────────────────────────

/// A directory tree of entries, e.g. an exploded jar or a classes folder.
#[derive(Debug)]
pub struct DirectorySource {
    root: PathBuf,
    location: String,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let location = root.display().to_string();
        Self { root, location }
    }
}

impl SymbolSource for DirectorySource {
    fn location(&self) -> &str {
        &self.location
    }

    fn read_entry(&self, entry: &str) -> Result<Option<Vec<u8>>, IsolationError> {
        let relative = Path::new(entry.trim_start_matches('/'));
        // Entries never climb out of the root.
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Ok(None);
        }
        let path = self.root.join(relative);
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(_) if path.is_dir() => Ok(None),
            Err(source) => Err(IsolationError::SourceRead {
                location: self.location.clone(),
                entry: entry.to_string(),
                source,
            }),
        }
    }
}

// ─── Archive ────────────────────────────────────────────────────────────────

/// A zip archive (jar). The entry index is read once when the source is opened.
pub struct ArchiveSource {
    location: String,
    entries: HashSet<String>,
    archive: Mutex<zip::ZipArchive<File>>,
}

impl fmt::Debug for ArchiveSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArchiveSource")
            .field("location", &self.location)
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl ArchiveSource {
    pub fn open(path: &Path) -> Result<Self, IsolationError> {
        let location = path.display().to_string();
        let invalid = |reason: String| IsolationError::InvalidSource {
            location: location.clone(),
            reason,
        };
        let file = File::open(path).map_err(|e| invalid(format!("cannot open archive: {}", e)))?;
        let archive =
            zip::ZipArchive::new(file).map_err(|e| invalid(format!("not a zip archive: {}", e)))?;
        let entries = archive
            .file_names()
            .filter(|name| !name.ends_with('/'))
            .map(String::from)
            .collect();
        Ok(Self {
            location,
            entries,
            archive: Mutex::new(archive),
        })
    }
}

impl SymbolSource for ArchiveSource {
    fn location(&self) -> &str {
        &self.location
    }

    fn read_entry(&self, entry: &str) -> Result<Option<Vec<u8>>, IsolationError> {
        let entry = entry.trim_start_matches('/');
        if !self.entries.contains(entry) {
            return Ok(None);
        }
        let read_error = |source: io::Error| IsolationError::SourceRead {
            location: self.location.clone(),
            entry: entry.to_string(),
            source,
        };
        let mut archive = self.archive.lock().unwrap_or_else(|e| e.into_inner());
        let mut file = archive
            .by_name(entry)
            .map_err(|e| read_error(io::Error::new(io::ErrorKind::InvalidData, e)))?;
        let mut bytes = Vec::with_capacity(usize::try_from(file.size()).unwrap_or(0));
        file.read_to_end(&mut bytes).map_err(read_error)?;
        Ok(Some(bytes))
    }
}

// ─── In-memory table ────────────────────────────────────────────────────────

/// A named in-memory table of entries. Typically stands in for the host's
/// own resolution context.
#[derive(Debug, Default)]
pub struct SymbolTable {
    name: String,
    entries: HashMap<String, Vec<u8>>,
}

impl SymbolTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: HashMap::new(),
        }
    }

    pub fn insert(&mut self, entry: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.entries.insert(entry.into(), bytes.into());
    }

    pub fn with_entry(mut self, entry: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(entry, bytes);
        self
    }
}

impl SymbolSource for SymbolTable {
    fn location(&self) -> &str {
        &self.name
    }

    fn read_entry(&self, entry: &str) -> Result<Option<Vec<u8>>, IsolationError> {
        Ok(self.entries.get(entry.trim_start_matches('/')).cloned())
    }
}

// ─── Location parsing ───────────────────────────────────────────────────────

/// Turn a caller-supplied location (`file:` URL or filesystem path) into a source.
///
/// Directories become [`DirectorySource`], regular files [`ArchiveSource`].
pub fn source_from_location(location: &str) -> Result<Box<dyn SymbolSource>, IsolationError> {
    let path = location_to_path(location)?;
    source_at(&path, location)
}

/// Like [`source_from_location`] for a path that is already local.
pub fn source_from_path(path: &Path) -> Result<Box<dyn SymbolSource>, IsolationError> {
    source_at(path, &path.display().to_string())
}

fn location_to_path(location: &str) -> Result<PathBuf, IsolationError> {
    let invalid = |reason: String| IsolationError::InvalidSource {
        location: location.to_string(),
        reason,
    };
    let trimmed = location.trim();
    if trimmed.is_empty() {
        return Err(invalid("empty location".to_string()));
    }
    match Url::parse(trimmed) {
        Ok(url) if url.scheme() == "file" => url
            .to_file_path()
            .map_err(|_| invalid("file URL does not name a local path".to_string())),
        // `C:\lib\engine.jar` parses as a URL with scheme `c`.
        Ok(url) if url.scheme().len() == 1 => Ok(PathBuf::from(trimmed)),
        Ok(url) => Err(invalid(format!("unsupported scheme '{}'", url.scheme()))),
        Err(url::ParseError::RelativeUrlWithoutBase) => Ok(PathBuf::from(trimmed)),
        Err(e) => Err(invalid(e.to_string())),
    }
}

fn source_at(path: &Path, location: &str) -> Result<Box<dyn SymbolSource>, IsolationError> {
    let metadata = fs::metadata(path).map_err(|e| IsolationError::InvalidSource {
        location: location.to_string(),
        reason: format!("cannot access {}: {}", path.display(), e),
    })?;
    if metadata.is_dir() {
        Ok(Box::new(DirectorySource::new(path)))
    } else {
        Ok(Box::new(ArchiveSource::open(path)?))
    }
}
