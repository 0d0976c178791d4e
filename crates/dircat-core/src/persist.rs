/// Load and save of the catalog document.
///
/// The document lives in the data directory as either `catalog.json`
/// (pretty JSON) or `catalog.json.gz` (gzip of compact JSON). Saves go
/// through a temporary file in the same directory and a rename, so an
/// interrupted save leaves the previous catalog intact.
use crate::error::{CatalogError, Result};
use crate::model::CatalogDocument;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs;
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

pub const CATALOG_FILE: &str = "catalog.json";
pub const COMPRESSED_CATALOG_FILE: &str = "catalog.json.gz";

/// Path the document is saved to for the given compression setting.
pub fn catalog_path(data_dir: &Path, compress: bool) -> PathBuf {
    data_dir.join(if compress {
        COMPRESSED_CATALOG_FILE
    } else {
        CATALOG_FILE
    })
}

/// Read the persisted document.
///
/// `catalog.json` is tried first, then `catalog.json.gz`. A missing or
/// zero-length file yields the blank document; unreadable or corrupt
/// content is an error.
pub fn load_document(data_dir: &Path) -> Result<CatalogDocument> {
    for compressed in [false, true] {
        let path = catalog_path(data_dir, compressed);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => continue,
            Err(e) => return Err(CatalogError::io(path, e)),
        };
        if bytes.is_empty() {
            info!("{} is empty, starting from a blank catalog", path.display());
            return Ok(CatalogDocument::blank());
        }

        let decoded = if compressed {
            serde_json::from_reader(GzDecoder::new(bytes.as_slice()))
        } else {
            serde_json::from_slice(&bytes)
        };
        let document: CatalogDocument =
            decoded.map_err(|source| CatalogError::Json {
                path: path.clone(),
                source,
            })?;
        debug!(
            "Read {} ({} bytes, {} files)",
            path.display(),
            bytes.len(),
            document.files.len()
        );
        return Ok(document);
    }

    info!(
        "No catalog in {}, starting from a blank catalog",
        data_dir.display()
    );
    Ok(CatalogDocument::blank())
}

/// Write `document` into `data_dir`, creating the directory if needed.
///
/// After a successful write the file of the other format is removed so a
/// later load cannot pick up a stale catalog. Returns the written path.
pub fn save_document(
    document: &CatalogDocument,
    data_dir: &Path,
    compress: bool,
) -> Result<PathBuf> {
    fs::create_dir_all(data_dir).map_err(|e| CatalogError::io(data_dir, e))?;
    let target = catalog_path(data_dir, compress);

    let mut tmp = NamedTempFile::new_in(data_dir).map_err(|e| CatalogError::io(data_dir, e))?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        if compress {
            let mut encoder = GzEncoder::new(&mut writer, Compression::default());
            serde_json::to_writer(&mut encoder, document).map_err(CatalogError::Encode)?;
            encoder
                .finish()
                .map_err(|e| CatalogError::io(&target, e))?;
        } else {
            serde_json::to_writer_pretty(&mut writer, document).map_err(CatalogError::Encode)?;
        }
        writer.flush().map_err(|e| CatalogError::io(&target, e))?;
    }
    let stale = catalog_path(data_dir, !compress);
    carry_permissions(tmp.as_file(), &target, &stale)
        .map_err(|e| CatalogError::io(&target, e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| CatalogError::io(&target, e))?;
    tmp.persist(&target)
        .map_err(|e| CatalogError::io(&target, e.error))?;

    match fs::remove_file(&stale) {
        Ok(()) => debug!("Removed stale {}", stale.display()),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(CatalogError::io(stale, e)),
    }

    info!(
        "Catalog saved to {} ({} files)",
        target.display(),
        document.files.len()
    );
    Ok(target)
}

/// Give the temporary file the mode of the catalog it replaces, or 0644 for
/// a first save. `NamedTempFile` creates files owner-only.
#[cfg(unix)]
fn carry_permissions(tmp: &fs::File, target: &Path, stale: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let permissions = fs::metadata(target)
        .or_else(|_| fs::metadata(stale))
        .map(|metadata| metadata.permissions())
        .unwrap_or_else(|_| fs::Permissions::from_mode(0o644));
    tmp.set_permissions(permissions)
}

#[cfg(not(unix))]
fn carry_permissions(_tmp: &fs::File, _target: &Path, _stale: &Path) -> std::io::Result<()> {
    Ok(())
}
