use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::error::IsolationError;
use crate::source::{source_from_location, source_from_path, SymbolSource};
use crate::unmask::{resource_namespace, symbol_namespace, UnmaskSet};

/// File extension of the entry backing a dotted symbol name.
pub const DEFAULT_SYMBOL_EXTENSION: &str = "class";

/// Where a resolved symbol came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolOrigin {
    /// One of the loader's own sources (caller location or batch artifact).
    Own { location: String },
    /// The host, through an unmasked namespace.
    Parent,
}

/// A resolved symbol or resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub entry: String,
    pub origin: SymbolOrigin,
    pub bytes: Vec<u8>,
}

impl Symbol {
    pub fn is_own(&self) -> bool {
        matches!(self.origin, SymbolOrigin::Own { .. })
    }
}

/// Execution environment for downloaded engine artifacts.
///
/// Resolution is self-first: own sources are tried in order (caller locations,
/// then artifacts in manifest order). A miss is delegated to the host only
/// when the namespace is unmasked; otherwise it fails with
/// [`IsolationError::SymbolNotVisible`], even if the host has the symbol.
///
/// Symbols found in own sources are cached for the loader's lifetime. Host
/// symbols are not: the host owns them.
pub struct IsolatedLoader {
    sources: Vec<Box<dyn SymbolSource>>,
    parent: Arc<dyn SymbolSource>,
    unmasked: UnmaskSet,
    symbol_extension: String,
    label: String,
    resolved: Mutex<HashMap<String, Arc<Symbol>>>,
}

impl fmt::Debug for IsolatedLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IsolatedLoader")
            .field("sources", &self.locations())
            .field("parent", &self.parent.location())
            .field("unmasked", &self.unmasked)
            .finish()
    }
}

impl IsolatedLoader {
    /// Start building a loader on top of `parent`, seeing only `unmasked` host namespaces.
    pub fn builder(parent: Arc<dyn SymbolSource>, unmasked: UnmaskSet) -> IsolatedLoaderBuilder {
        IsolatedLoaderBuilder {
            parent,
            unmasked,
            locations: Vec::new(),
            artifacts: Vec::new(),
            symbol_extension: DEFAULT_SYMBOL_EXTENSION.to_string(),
        }
    }

    /// Own source locations in resolution order.
    pub fn locations(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.location()).collect()
    }

    pub fn unmask_set(&self) -> &UnmaskSet {
        &self.unmasked
    }

    /// Resolve a dotted symbol, e.g. `org.sonar.batch.Batch` →
    /// `org/sonar/batch/Batch.class`.
    pub fn resolve_symbol(&self, name: &str) -> Result<Arc<Symbol>, IsolationError> {
        let entry = format!("{}.{}", name.replace('.', "/"), self.symbol_extension);
        self.resolve(name, &entry, symbol_namespace(name))
    }

    /// Resolve a resource by path, e.g. `org/sonar/batch/version.txt`.
    /// The namespace is the dotted directory part of the path.
    pub fn resolve_resource(&self, path: &str) -> Result<Arc<Symbol>, IsolationError> {
        let entry = path.trim_start_matches('/');
        let namespace = resource_namespace(entry);
        self.resolve(path, entry, &namespace)
    }

    fn resolve(
        &self,
        name: &str,
        entry: &str,
        namespace: &str,
    ) -> Result<Arc<Symbol>, IsolationError> {
        if let Some(symbol) = self.cached(entry) {
            return Ok(symbol);
        }

        for source in &self.sources {
            if let Some(bytes) = source.read_entry(entry)? {
                let symbol = Arc::new(Symbol {
                    name: name.to_string(),
                    entry: entry.to_string(),
                    origin: SymbolOrigin::Own {
                        location: source.location().to_string(),
                    },
                    bytes,
                });
                return Ok(self.remember(entry, symbol));
            }
        }

        if !self.unmasked.is_unmasked(namespace) {
            tracing::trace!("{} is masked (namespace '{}')", name, namespace);
            return Err(IsolationError::SymbolNotVisible {
                name: name.to_string(),
            });
        }

        match self.parent.read_entry(entry)? {
            Some(bytes) => Ok(Arc::new(Symbol {
                name: name.to_string(),
                entry: entry.to_string(),
                origin: SymbolOrigin::Parent,
                bytes,
            })),
            None => Err(IsolationError::SymbolNotVisible {
                name: name.to_string(),
            }),
        }
    }

    fn cached(&self, entry: &str) -> Option<Arc<Symbol>> {
        let resolved = self.resolved.lock().unwrap_or_else(|e| e.into_inner());
        resolved.get(entry).cloned()
    }

    fn remember(&self, entry: &str, symbol: Arc<Symbol>) -> Arc<Symbol> {
        let mut resolved = self.resolved.lock().unwrap_or_else(|e| e.into_inner());
        resolved
            .entry(entry.to_string())
            .or_insert(symbol)
            .clone()
    }
}

impl SymbolSource for IsolatedLoader {
    fn location(&self) -> &str {
        &self.label
    }

    /// Entries as seen from inside the loader: masked host entries read as missing.
    fn read_entry(&self, entry: &str) -> Result<Option<Vec<u8>>, IsolationError> {
        match self.resolve_resource(entry) {
            Ok(symbol) => Ok(Some(symbol.bytes.clone())),
            Err(IsolationError::SymbolNotVisible { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Collects locations and artifacts, then opens them all at once in [`build`](Self::build).
pub struct IsolatedLoaderBuilder {
    parent: Arc<dyn SymbolSource>,
    unmasked: UnmaskSet,
    locations: Vec<String>,
    artifacts: Vec<PathBuf>,
    symbol_extension: String,
}

impl IsolatedLoaderBuilder {
    /// Add a caller location (`file:` URL or path). Caller locations resolve
    /// before every artifact, whatever order the builder calls are made in.
    pub fn add_location(mut self, location: impl Into<String>) -> Self {
        self.locations.push(location.into());
        self
    }

    pub fn add_locations<I, S>(mut self, locations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.locations.extend(locations.into_iter().map(Into::into));
        self
    }

    /// Add a downloaded artifact. Artifacts resolve in the order they are added.
    pub fn add_artifact(mut self, path: impl Into<PathBuf>) -> Self {
        self.artifacts.push(path.into());
        self
    }

    pub fn add_artifacts<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.artifacts.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Extension used by [`IsolatedLoader::resolve_symbol`]. Defaults to `class`.
    pub fn symbol_extension(mut self, extension: impl Into<String>) -> Self {
        self.symbol_extension = extension.into().trim_start_matches('.').to_string();
        self
    }

    /// Open every source. The first location that cannot be opened fails the
    /// whole build with [`IsolationError::InvalidSource`].
    pub fn build(self) -> Result<IsolatedLoader, IsolationError> {
        let mut sources = Vec::with_capacity(self.locations.len() + self.artifacts.len());
        for location in &self.locations {
            sources.push(source_from_location(location)?);
        }
        for artifact in &self.artifacts {
            sources.push(source_from_path(artifact)?);
        }

        tracing::debug!(
            "Isolated loader ready: {} source(s), unmasked {}",
            sources.len(),
            self.unmasked
        );
        let label = format!("isolated[{}]", sources.len());
        Ok(IsolatedLoader {
            sources,
            parent: self.parent,
            unmasked: self.unmasked,
            symbol_extension: self.symbol_extension,
            label,
            resolved: Mutex::new(HashMap::new()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SymbolTable;
    use std::fs::File;
    use std::io::Write;
    use std::path::Path;

    fn write_jar(path: &Path, entries: &[(&str, &[u8])]) {
        let mut writer = zip::ZipWriter::new(File::create(path).unwrap());
        for (name, bytes) in entries {
            writer
                .start_file(*name, zip::write::FileOptions::default())
                .unwrap();
            writer.write_all(bytes).unwrap();
        }
        writer.finish().unwrap();
    }

    fn host() -> Arc<dyn SymbolSource> {
        Arc::new(
            SymbolTable::new("host")
                .with_entry("org/slf4j/Logger.class", b"host slf4j".to_vec())
                .with_entry("org/myhost/Internal.class", b"host internal".to_vec())
                .with_entry("org/sonar/batch/Engine.class", b"host engine".to_vec())
                .with_entry("org/slf4j/impl/binder.txt", b"host binder".to_vec()),
        )
    }

    fn engine_jar(dir: &Path) -> PathBuf {
        let jar = dir.join("sonar-batch.jar");
        write_jar(
            &jar,
            &[
                ("org/sonar/batch/Engine.class", b"batch engine"),
                ("org/sonar/batch/version.txt", b"2.6"),
            ],
        );
        jar
    }

    #[test]
    fn test_unmasked_namespace_resolves_through_parent() {
        let dir = tempfile::tempdir().unwrap();
        let loader = IsolatedLoader::builder(host(), UnmaskSet::new(["org.slf4j"]))
            .add_artifact(engine_jar(dir.path()))
            .build()
            .unwrap();

        let logger = loader.resolve_symbol("org.slf4j.Logger").unwrap();
        assert_eq!(logger.origin, SymbolOrigin::Parent);
        assert_eq!(logger.bytes, b"host slf4j");

        let binder = loader.resolve_resource("org/slf4j/impl/binder.txt").unwrap();
        assert_eq!(binder.origin, SymbolOrigin::Parent);
    }

    #[test]
    fn test_masked_namespace_is_not_visible_even_if_host_has_it() {
        let dir = tempfile::tempdir().unwrap();
        let loader = IsolatedLoader::builder(host(), UnmaskSet::new(["org.slf4j"]))
            .add_artifact(engine_jar(dir.path()))
            .build()
            .unwrap();

        let err = loader.resolve_symbol("org.myhost.Internal").unwrap_err();
        assert!(
            matches!(err, IsolationError::SymbolNotVisible { ref name } if name == "org.myhost.Internal")
        );
    }

    #[test]
    fn test_own_source_wins_over_parent() {
        let dir = tempfile::tempdir().unwrap();
        for unmask in [
            UnmaskSet::empty(),
            UnmaskSet::new(["org.sonar"]),
            UnmaskSet::new(["org.sonar.batch"]),
        ] {
            let loader = IsolatedLoader::builder(host(), unmask)
                .add_artifact(engine_jar(dir.path()))
                .build()
                .unwrap();
            let engine = loader.resolve_symbol("org.sonar.batch.Engine").unwrap();
            assert!(engine.is_own());
            assert_eq!(engine.bytes, b"batch engine");
        }
    }

    #[test]
    fn test_empty_unmask_set_sees_nothing_from_host() {
        let loader = IsolatedLoader::builder(host(), UnmaskSet::empty())
            .build()
            .unwrap();
        for name in ["org.slf4j.Logger", "org.myhost.Internal"] {
            assert!(matches!(
                loader.resolve_symbol(name),
                Err(IsolationError::SymbolNotVisible { .. })
            ));
        }
    }

    #[test]
    fn test_unmasked_but_missing_on_host() {
        let loader = IsolatedLoader::builder(host(), UnmaskSet::new(["org.slf4j"]))
            .build()
            .unwrap();
        let err = loader.resolve_symbol("org.slf4j.LoggerFactory").unwrap_err();
        assert!(matches!(err, IsolationError::SymbolNotVisible { .. }));
    }

    #[test]
    fn test_caller_locations_precede_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let jar = engine_jar(dir.path());
        let overrides = dir.path().join("overrides");
        std::fs::create_dir_all(overrides.join("org/sonar/batch")).unwrap();
        std::fs::write(overrides.join("org/sonar/batch/Engine.class"), b"patched engine").unwrap();

        // Artifact added first on purpose: order between the two kinds is fixed.
        let loader = IsolatedLoader::builder(host(), UnmaskSet::empty())
            .add_artifact(&jar)
            .add_location(overrides.to_str().unwrap())
            .build()
            .unwrap();

        assert_eq!(
            loader.locations(),
            [
                overrides.display().to_string(),
                jar.display().to_string()
            ]
        );
        let engine = loader.resolve_symbol("org.sonar.batch.Engine").unwrap();
        assert_eq!(engine.bytes, b"patched engine");
        assert_eq!(
            engine.origin,
            SymbolOrigin::Own {
                location: overrides.display().to_string()
            }
        );
        // Entries the override lacks still come from the artifact.
        let version = loader.resolve_resource("org/sonar/batch/version.txt").unwrap();
        assert_eq!(version.bytes, b"2.6");
    }

    #[test]
    fn test_artifacts_keep_manifest_order() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("a.jar");
        let second = dir.path().join("b.jar");
        write_jar(&first, &[("shared/Api.class", b"from a")]);
        write_jar(&second, &[("shared/Api.class", b"from b")]);

        let loader = IsolatedLoader::builder(host(), UnmaskSet::empty())
            .add_artifacts([&first, &second])
            .build()
            .unwrap();
        assert_eq!(loader.resolve_symbol("shared.Api").unwrap().bytes, b"from a");
    }

    #[test]
    fn test_invalid_location_fails_build() {
        let dir = tempfile::tempdir().unwrap();
        let result = IsolatedLoader::builder(host(), UnmaskSet::empty())
            .add_artifact(engine_jar(dir.path()))
            .add_location("http://example.com/extra.jar")
            .build();
        assert!(matches!(
            result,
            Err(IsolationError::InvalidSource { ref location, .. }) if location == "http://example.com/extra.jar"
        ));

        let missing = IsolatedLoader::builder(host(), UnmaskSet::empty())
            .add_artifact(dir.path().join("missing.jar"))
            .build();
        assert!(matches!(missing, Err(IsolationError::InvalidSource { .. })));
    }

    #[test]
    fn test_own_symbols_are_cached() {
        let dir = tempfile::tempdir().unwrap();
        let classes = dir.path().join("classes");
        std::fs::create_dir_all(classes.join("org/sonar")).unwrap();
        std::fs::write(classes.join("org/sonar/Plugin.class"), b"v1").unwrap();

        let loader = IsolatedLoader::builder(host(), UnmaskSet::empty())
            .add_location(classes.to_str().unwrap())
            .build()
            .unwrap();
        let first = loader.resolve_symbol("org.sonar.Plugin").unwrap();
        std::fs::write(classes.join("org/sonar/Plugin.class"), b"v2").unwrap();
        let second = loader.resolve_symbol("org.sonar.Plugin").unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.bytes, b"v1");
    }

    #[test]
    fn test_custom_symbol_extension() {
        let dir = tempfile::tempdir().unwrap();
        let jar = dir.path().join("scripts.jar");
        write_jar(&jar, &[("rules/java/Checks.lua", b"return {}")]);

        let loader = IsolatedLoader::builder(host(), UnmaskSet::empty())
            .symbol_extension(".lua")
            .add_artifact(&jar)
            .build()
            .unwrap();
        assert_eq!(loader.resolve_symbol("rules.java.Checks").unwrap().bytes, b"return {}");
    }

    #[test]
    fn test_loader_as_parent_keeps_its_mask() {
        let dir = tempfile::tempdir().unwrap();
        let outer: Arc<dyn SymbolSource> = Arc::new(
            IsolatedLoader::builder(host(), UnmaskSet::new(["org.slf4j"]))
                .add_artifact(engine_jar(dir.path()))
                .build()
                .unwrap(),
        );
        let inner = IsolatedLoader::builder(outer, UnmaskSet::new(["org"]))
            .build()
            .unwrap();

        assert!(inner.resolve_symbol("org.sonar.batch.Engine").is_ok());
        assert!(inner.resolve_symbol("org.slf4j.Logger").is_ok());
        assert!(matches!(
            inner.resolve_symbol("org.myhost.Internal"),
            Err(IsolationError::SymbolNotVisible { .. })
        ));
    }
}
