/// Extension modules: named collaborators that annotate the document.
///
/// A module can hook two points of the pipeline:
///
/// - `scan`: once per scanned root, right after that root's walk.
/// - `load`: once per load, after the persisted document is read and
///   before it is indexed.
///
/// Modules run strictly in the order they were supplied. The first failure
/// aborts the whole pipeline.
pub mod file_types;
pub mod folder_sizes;

pub use file_types::{categorise_extension, FileCategory, FileTypes};
pub use folder_sizes::FolderSizes;

use crate::error::{CatalogError, ModuleError, Result};
use crate::model::CatalogDocument;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;
use tracing::debug;

pub trait ExtensionModule: Send + Sync {
    /// Registry name, e.g. `file-types`. Recorded in `catalogModules`.
    fn name(&self) -> &str;

    /// Mutate the freshly loaded document before it is indexed.
    fn load(&self, _document: &mut CatalogDocument) -> std::result::Result<(), ModuleError> {
        Ok(())
    }

    /// Annotate the document after `root` has been walked.
    fn scan(
        &self,
        _document: &mut CatalogDocument,
        _root: &Path,
    ) -> std::result::Result<(), ModuleError> {
        Ok(())
    }
}

type Factory = Box<dyn Fn() -> Box<dyn ExtensionModule> + Send + Sync>;

/// Name → constructor table used to turn configured module names into
/// module instances.
pub struct ModuleRegistry {
    factories: BTreeMap<String, Factory>,
}

impl ModuleRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// A registry holding the built-in modules.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(file_types::NAME, || Box::new(FileTypes));
        registry.register(folder_sizes::NAME, || Box::new(FolderSizes));
        registry
    }

    /// Add or replace a module constructor.
    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn() -> Box<dyn ExtensionModule> + Send + Sync + 'static,
    {
        self.factories.insert(name.to_owned(), Box::new(factory));
    }

    /// Registered names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Instantiate `names` in order. Blank names are ignored; an unknown
    /// name is an error.
    pub fn resolve<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<Box<dyn ExtensionModule>>> {
        names
            .iter()
            .map(|name| name.as_ref().trim())
            .filter(|name| !name.is_empty())
            .map(|name| match self.factories.get(name) {
                Some(factory) => Ok(factory()),
                None => Err(CatalogError::UnknownModule(name.to_owned())),
            })
            .collect()
    }
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

impl std::fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.factories.keys()).finish()
    }
}

/// Run every module's `load` hook in order.
pub fn run_load_hooks(
    modules: &[Box<dyn ExtensionModule>],
    document: &mut CatalogDocument,
) -> Result<()> {
    for module in modules {
        let started = Instant::now();
        module.load(document).map_err(|source| failed(&**module, source))?;
        debug!("Module {} load hook took {:.2?}", module.name(), started.elapsed());
    }
    Ok(())
}

/// Run every module's `scan` hook for `root` in order.
pub fn run_scan_hooks(
    modules: &[Box<dyn ExtensionModule>],
    document: &mut CatalogDocument,
    root: &Path,
) -> Result<()> {
    for module in modules {
        let started = Instant::now();
        module
            .scan(document, root)
            .map_err(|source| failed(&**module, source))?;
        debug!(
            "Module {} scan hook for {} took {:.2?}",
            module.name(),
            root.display(),
            started.elapsed()
        );
    }
    Ok(())
}

fn failed(module: &dyn ExtensionModule, source: ModuleError) -> CatalogError {
    CatalogError::Module {
        module: module.name().to_owned(),
        source,
    }
}
