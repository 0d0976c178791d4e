/// Scanner: walks root directories into a fresh catalog.
///
/// Each root is walked on the calling thread, then every extension module's
/// scan hook runs for it. Once all roots are done the provenance fields are
/// stamped and the document is indexed. Scans always start from a blank
/// document; there is no incremental re-scan.
pub mod summary;
mod walk;

pub use summary::ScanSummary;

use crate::catalog::Catalog;
use crate::config::CatalogConfig;
use crate::error::{Result, ScanError};
use crate::model::CatalogDocument;
use crate::modules::{self, ExtensionModule};
use crate::persist;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

/// What to do when a directory cannot be read or a file cannot be stat'ed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Abort the scan on the first error.
    #[default]
    FailFast,
    /// Log a warning, count the entry in the summary and leave it out.
    Skip,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanOptions {
    pub error_policy: ErrorPolicy,
}

/// Scan `roots` into an indexed catalog.
pub fn scan<P: AsRef<Path>>(
    roots: &[P],
    modules: &[Box<dyn ExtensionModule>],
    options: &ScanOptions,
) -> Result<Catalog> {
    let (document, _) = scan_document(roots, modules, options)?;
    Catalog::from_document(document)
}

/// Scan `roots`, index the result and save it to the configured data
/// directory. Nothing is written if the scan or indexing fails.
pub fn scan_and_save<P: AsRef<Path>>(
    roots: &[P],
    modules: &[Box<dyn ExtensionModule>],
    config: &CatalogConfig,
) -> Result<(Catalog, ScanSummary)> {
    let (document, summary) = scan_document(roots, modules, &config.scan_options())?;
    let catalog = Catalog::from_document(document)?;
    persist::save_document(catalog.document(), &config.data_dir, config.compress)?;
    Ok((catalog, summary))
}

/// Build the catalog document for `roots` without indexing it.
pub fn scan_document<P: AsRef<Path>>(
    roots: &[P],
    modules: &[Box<dyn ExtensionModule>],
    options: &ScanOptions,
) -> Result<(CatalogDocument, ScanSummary)> {
    let start = Instant::now();
    let roots = canonical_roots(roots)?;
    let mut document = CatalogDocument::blank();
    let mut summary = ScanSummary::default();

    for root in &roots {
        info!("Scanning {}", root.display());
        let walked = walk::walk_root(root, options.error_policy, &mut summary)?;
        document.root_contents_mut().extend(walked.entries);
        document.files.extend(walked.files);
        modules::run_scan_hooks(modules, &mut document, root)?;
        summary.roots += 1;
    }

    document.catalog_paths = roots
        .iter()
        .map(|root| root.to_string_lossy().into_owned())
        .collect();
    document.catalog_modules = modules.iter().map(|m| m.name().to_owned()).collect();
    document.scanned_at = Some(Utc::now());

    summary.duration = start.elapsed();
    info!("Scan complete: {summary}");
    Ok((document, summary))
}

/// Canonicalize each root, require a directory, drop repeats.
fn canonical_roots<P: AsRef<Path>>(roots: &[P]) -> std::result::Result<Vec<PathBuf>, ScanError> {
    let mut canonical: Vec<PathBuf> = Vec::with_capacity(roots.len());
    for root in roots {
        let root = root.as_ref();
        let path = std::fs::canonicalize(root).map_err(|source| ScanError::Root {
            path: root.to_path_buf(),
            source,
        })?;
        if !path.is_dir() {
            return Err(ScanError::NotADirectory(path));
        }
        if canonical.contains(&path) {
            warn!("{} listed more than once, scanning it once", path.display());
            continue;
        }
        canonical.push(path);
    }
    Ok(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CatalogError;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn repeated_roots_are_scanned_once() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), b"a").unwrap();
        let again = dir.path().join(".");

        let (document, summary) =
            scan_document(&[dir.path(), again.as_path()], &[], &ScanOptions::default()).unwrap();
        assert_eq!(summary.roots, 1);
        assert_eq!(document.files.len(), 1);
        assert_eq!(document.catalog_paths.len(), 1);
    }

    #[test]
    fn a_file_root_is_rejected() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("plain.txt");
        fs::write(&file, b"x").unwrap();
        assert!(matches!(
            scan(&[&file], &[], &ScanOptions::default()),
            Err(CatalogError::Scan(ScanError::NotADirectory(_)))
        ));
    }

    #[test]
    fn a_missing_root_is_rejected() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("gone");
        assert!(matches!(
            scan(&[&missing], &[], &ScanOptions::default()),
            Err(CatalogError::Scan(ScanError::Root { .. }))
        ));
    }

    #[test]
    fn provenance_is_stamped() {
        let dir = TempDir::new().unwrap();
        let modules = crate::modules::ModuleRegistry::with_builtin()
            .resolve(&["folder-sizes"])
            .unwrap();
        let (document, _) = scan_document(&[dir.path()], &modules, &ScanOptions::default()).unwrap();
        let root = fs::canonicalize(dir.path()).unwrap();
        assert_eq!(document.catalog_paths, vec![root.to_string_lossy().into_owned()]);
        assert_eq!(document.catalog_modules, vec!["folder-sizes"]);
        assert!(document.scanned_at.is_some());
    }
}
