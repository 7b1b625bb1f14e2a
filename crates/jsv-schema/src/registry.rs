//! # Schema Registry — Documents by Locator
//!
//! The registry maps document locators to [`SchemaContainer`]s. It is the
//! only place a validation run crosses from one document to another, and
//! the only place that performs I/O.
//!
//! ## Storage
//!
//! - Documents registered explicitly are pinned: they are never evicted,
//!   since there may be nowhere to fetch them from again.
//! - Documents fetched through the [`DocumentSource`] live in a bounded LRU
//!   cache. Losing one is harmless; it is fetched again on the next miss.
//! - Documents admitted for a single validation call (the schema handed to
//!   `validate`, a schema file) share that LRU. They stay addressable by
//!   id while they are recent, and a long-running validator fed a stream
//!   of distinct schemas keeps a bounded footprint.
//!
//! Fetches run outside the cache lock. Two threads missing on the same
//! locator may both fetch; the later insert wins and both containers are
//! equivalent.
//!
//! ## Sources
//!
//! | Source              | Serves                                          |
//! |---------------------|-------------------------------------------------|
//! | [`NoRemoteSource`]  | nothing; every cross-document `$ref` is fatal    |
//! | [`MapSource`]       | preloaded documents by URI                       |
//! | [`DirectorySource`] | every schema file in a directory, by id or name  |
//! | [`FileSource`]      | `file:` URLs                                     |
//! | [`ChainSource`]     | the first of several sources that succeeds       |

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use jsv_core::JsonRef;
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::bounded::BoundedCache;
use crate::container::{AddressingMode, SchemaContainer};
use crate::document::{is_yaml_path, load_document, parse_document};
use crate::error::{ResolutionError, SchemaValidationError, SourceError};

/// Fetches schema documents by absolute URI.
pub trait DocumentSource: Send + Sync + fmt::Debug {
    /// Fetch the document at `uri`. The URI never carries a fragment.
    fn fetch(&self, uri: &Url) -> Result<Value, SourceError>;
}

/// A source that serves nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRemoteSource;

impl DocumentSource for NoRemoteSource {
    fn fetch(&self, uri: &Url) -> Result<Value, SourceError> {
        Err(SourceError::NotFound {
            uri: uri.to_string(),
        })
    }
}

/// Preloaded documents, keyed by URI.
#[derive(Debug, Clone, Default)]
pub struct MapSource {
    documents: HashMap<String, Value>,
}

impl MapSource {
    /// An empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `document` at `uri`. Any fragment in `uri` is ignored.
    pub fn insert(&mut self, uri: &str, document: Value) {
        let key = uri.split_once('#').map_or(uri, |(loc, _)| loc);
        self.documents.insert(key.to_string(), document);
    }

    /// Builder form of [`MapSource::insert`].
    pub fn with(mut self, uri: &str, document: Value) -> Self {
        self.insert(uri, document);
        self
    }

    /// Number of documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Returns true if the source holds no documents.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl DocumentSource for MapSource {
    fn fetch(&self, uri: &Url) -> Result<Value, SourceError> {
        self.documents
            .get(uri.as_str())
            .cloned()
            .ok_or_else(|| SourceError::NotFound {
                uri: uri.to_string(),
            })
    }
}

/// Every schema file in one directory.
///
/// Files ending in `.json`, `.yaml` or `.yml` are loaded at construction
/// and indexed three ways: by their root `id`, by their `file:` URL, and by
/// bare filename. A request that matches none of these directly falls back
/// to the last path segment of the requested URI, so
/// `http://schemas.example.com/v1/address.json` is served by
/// `address.json` in the directory.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    dir: PathBuf,
    by_uri: HashMap<String, Value>,
    by_filename: HashMap<String, Value>,
}

impl DirectorySource {
    /// Load every schema file in `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaValidationError::SchemaLoadError`] if the directory
    /// cannot be read. Files that cannot be parsed are skipped with a
    /// warning, so one stray document does not block the others.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, SchemaValidationError> {
        let dir = dir.as_ref().to_path_buf();
        let entries = std::fs::read_dir(&dir).map_err(|e| SchemaValidationError::SchemaLoadError {
            path: dir.display().to_string(),
            reason: format!("cannot read schema directory: {e}"),
        })?;

        let mut by_uri = HashMap::new();
        let mut by_filename = HashMap::new();
        for entry in entries {
            let path = entry?.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
                continue;
            };
            if !(name.ends_with(".json") || is_yaml_path(&path)) {
                continue;
            }
            let value = match load_document(&path) {
                Ok(value) => value,
                Err(e) => {
                    tracing::warn!(file = %name, error = %e, "skipping unreadable schema file");
                    continue;
                }
            };

            if let Some(id) = value.get("id").and_then(Value::as_str) {
                let key = id.split_once('#').map_or(id, |(loc, _)| loc);
                if !key.is_empty() {
                    by_uri.insert(key.to_string(), value.clone());
                }
            }
            if let Some(file_url) = std::fs::canonicalize(&path)
                .ok()
                .and_then(|p| Url::from_file_path(p).ok())
            {
                by_uri.insert(file_url.to_string(), value.clone());
            }
            by_filename.insert(name, value);
        }

        tracing::debug!(
            dir = %dir.display(),
            documents = by_filename.len(),
            "loaded schema directory"
        );
        Ok(Self {
            dir,
            by_uri,
            by_filename,
        })
    }

    /// The directory the documents were loaded from.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of loaded documents.
    pub fn len(&self) -> usize {
        self.by_filename.len()
    }

    /// Returns true if no document was loaded.
    pub fn is_empty(&self) -> bool {
        self.by_filename.is_empty()
    }

    /// Names of all loaded files, sorted alphabetically.
    pub fn filenames(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.by_filename.keys().map(String::as_str).collect();
        names.sort();
        names
    }

    /// A loaded document by filename.
    pub fn get(&self, filename: &str) -> Option<&Value> {
        self.by_filename.get(filename)
    }
}

impl DocumentSource for DirectorySource {
    fn fetch(&self, uri: &Url) -> Result<Value, SourceError> {
        let uri_str = uri.as_str();
        if let Some(value) = self.by_uri.get(uri_str) {
            return Ok(value.clone());
        }
        let filename = uri.path().rsplit('/').next().unwrap_or(uri_str);
        self.by_filename
            .get(filename)
            .cloned()
            .ok_or_else(|| SourceError::NotFound {
                uri: uri_str.to_string(),
            })
    }
}

/// Reads `file:` URLs from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSource;

impl DocumentSource for FileSource {
    fn fetch(&self, uri: &Url) -> Result<Value, SourceError> {
        if uri.scheme() != "file" {
            return Err(SourceError::UnsupportedScheme {
                scheme: uri.scheme().to_string(),
            });
        }
        let path = uri.to_file_path().map_err(|()| SourceError::Read {
            uri: uri.to_string(),
            reason: "not a local file path".to_string(),
        })?;
        let content = std::fs::read_to_string(&path).map_err(|e| SourceError::Read {
            uri: uri.to_string(),
            reason: e.to_string(),
        })?;
        parse_document(&content, is_yaml_path(&path)).map_err(|reason| SourceError::Parse {
            uri: uri.to_string(),
            reason,
        })
    }
}

/// Tries several sources in order.
#[derive(Debug, Default)]
pub struct ChainSource {
    sources: Vec<Box<dyn DocumentSource>>,
}

impl ChainSource {
    /// An empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a source.
    pub fn with(mut self, source: impl DocumentSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }
}

impl DocumentSource for ChainSource {
    fn fetch(&self, uri: &Url) -> Result<Value, SourceError> {
        let mut last = SourceError::NotFound {
            uri: uri.to_string(),
        };
        for source in &self.sources {
            match source.fetch(uri) {
                Ok(value) => return Ok(value),
                Err(e) => last = e,
            }
        }
        Err(last)
    }
}

/// Registry counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RegistryStats {
    /// Lookups served from memory.
    pub hits: u64,
    /// Lookups that fetched a document.
    pub misses: u64,
    /// Explicitly registered documents.
    pub pinned: usize,
    /// Fetched and admitted documents currently cached.
    pub cached: usize,
}

/// Maps locators to schema containers.
#[derive(Debug)]
pub struct SchemaRegistry {
    source: Box<dyn DocumentSource>,
    mode: AddressingMode,
    pinned: RwLock<HashMap<JsonRef, Arc<SchemaContainer>>>,
    fetched: BoundedCache<JsonRef, Arc<SchemaContainer>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl SchemaRegistry {
    /// A registry fetching misses from `source`, caching at most
    /// `capacity` fetched documents.
    pub fn new(source: Box<dyn DocumentSource>, mode: AddressingMode, capacity: usize) -> Self {
        Self {
            source,
            mode,
            pinned: RwLock::new(HashMap::new()),
            fetched: BoundedCache::new(capacity),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Addressing mode applied to every container built here.
    pub fn mode(&self) -> AddressingMode {
        self.mode
    }

    fn build(
        &self,
        locator: Option<&JsonRef>,
        document: Value,
    ) -> Result<Arc<SchemaContainer>, ResolutionError> {
        let built = match locator {
            Some(locator) => SchemaContainer::with_locator(locator.clone(), document, self.mode),
            None => SchemaContainer::from_document(document, self.mode),
        };
        built.map(Arc::new).map_err(|e| ResolutionError::Canonicalization {
            locator: locator.map_or_else(|| "(anonymous)".to_string(), ToString::to_string),
            reason: e.to_string(),
        })
    }

    /// Build a container for `document`; pin it when it has a locator.
    ///
    /// # Errors
    ///
    /// [`ResolutionError::Canonicalization`] if the document digest cannot
    /// be computed.
    pub fn register(&self, document: Value) -> Result<Arc<SchemaContainer>, ResolutionError> {
        let container = self.build(None, document)?;
        if !container.is_anonymous() {
            self.pin(container.clone());
        }
        Ok(container)
    }

    /// Build a container for `document` under `locator` and pin it.
    ///
    /// # Errors
    ///
    /// As [`SchemaRegistry::register`].
    pub fn register_as(
        &self,
        locator: &JsonRef,
        document: Value,
    ) -> Result<Arc<SchemaContainer>, ResolutionError> {
        let container = self.build(Some(locator), document)?;
        if !container.is_anonymous() {
            self.pin(container.clone());
        }
        Ok(container)
    }

    /// Build a container for `document` and, when it has a locator, keep it
    /// in the bounded cache alongside fetched documents. A pinned document
    /// under the same locator still takes precedence in [`SchemaRegistry::get`].
    ///
    /// # Errors
    ///
    /// As [`SchemaRegistry::register`].
    pub fn admit(&self, document: Value) -> Result<Arc<SchemaContainer>, ResolutionError> {
        let container = self.build(None, document)?;
        self.remember(&container);
        Ok(container)
    }

    /// As [`SchemaRegistry::admit`], under an explicit locator.
    ///
    /// # Errors
    ///
    /// As [`SchemaRegistry::register`].
    pub fn admit_as(
        &self,
        locator: &JsonRef,
        document: Value,
    ) -> Result<Arc<SchemaContainer>, ResolutionError> {
        let container = self.build(Some(locator), document)?;
        self.remember(&container);
        Ok(container)
    }

    fn remember(&self, container: &Arc<SchemaContainer>) {
        if !container.is_anonymous() {
            self.fetched
                .put(container.locator().clone(), container.clone());
        }
    }

    fn pin(&self, container: Arc<SchemaContainer>) {
        tracing::debug!(locator = %container.locator(), "registered schema document");
        self.pinned
            .write()
            .insert(container.locator().clone(), container);
    }

    /// The container for `reference`'s locator, fetching it on a miss.
    ///
    /// # Errors
    ///
    /// [`ResolutionError::UnresolvableLocator`] when the locator is not an
    /// absolute URI, [`ResolutionError::Fetch`] when the source fails.
    pub fn get(&self, reference: &JsonRef) -> Result<Arc<SchemaContainer>, ResolutionError> {
        let key = reference.locator();
        if let Some(container) = self.pinned.read().get(&key).cloned() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(container);
        }
        if let Some(container) = self.fetched.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(locator = %key, "registry hit");
            return Ok(container);
        }

        let Some(url) = key.locator_url() else {
            return Err(ResolutionError::UnresolvableLocator {
                reference: reference.clone(),
            });
        };
        self.misses.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(uri = %url, "fetching schema document");
        let document = self.source.fetch(url).map_err(|source| ResolutionError::Fetch {
            uri: url.to_string(),
            source,
        })?;

        let container = self.build(Some(&key), document)?;
        self.fetched.put(key, container.clone());
        Ok(container)
    }

    /// Current counters.
    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            pinned: self.pinned.read().len(),
            cached: self.fetched.len(),
        }
    }
}
