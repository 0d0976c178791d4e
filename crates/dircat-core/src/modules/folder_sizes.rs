/// The `folder-sizes` module: aggregate file sizes up the folder tree.
///
/// Every folder, the synthetic root included, gets `totalSize` (sum of the
/// sizes of all descendant files) and `fileCount` (number of descendant
/// files). Totals are recomputed for the whole tree on every run, so folders
/// from earlier roots stay correct when further roots are scanned.
use super::ExtensionModule;
use crate::error::ModuleError;
use crate::model::{CatalogDocument, CatalogNode, ChildRef};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

pub const NAME: &str = "folder-sizes";

pub const TOTAL_SIZE: &str = "totalSize";
pub const FILE_COUNT: &str = "fileCount";

#[derive(Debug, Default, Clone, Copy)]
pub struct FolderSizes;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Totals {
    size: u64,
    files: u64,
}

impl std::ops::AddAssign for Totals {
    fn add_assign(&mut self, other: Self) {
        self.size += other.size;
        self.files += other.files;
    }
}

impl ExtensionModule for FolderSizes {
    fn name(&self) -> &str {
        NAME
    }

    fn scan(&self, document: &mut CatalogDocument, root: &Path) -> Result<(), ModuleError> {
        let sizes: HashMap<&str, u64> = document
            .files
            .iter()
            .filter_map(|file| Some((file.id.as_str(), file.file_meta()?.size)))
            .collect();

        let totals = aggregate(Arc::make_mut(&mut document.tree), &sizes);
        debug!(
            "Folder totals after {}: {} files, {} bytes",
            root.display(),
            totals.files,
            totals.size
        );
        Ok(())
    }
}

/// Post-order pass: a folder's totals are the sum of its referenced files
/// and its inline subfolders' totals. Dangling references count as nothing.
fn aggregate(folder: &mut CatalogNode, sizes: &HashMap<&str, u64>) -> Totals {
    let mut totals = Totals::default();
    if let Some(contents) = folder.contents_mut() {
        for child in contents.iter_mut() {
            match child {
                ChildRef::Reference(id) => {
                    if let Some(size) = sizes.get(id.as_str()) {
                        totals += Totals {
                            size: *size,
                            files: 1,
                        };
                    }
                }
                ChildRef::Inline(node) => {
                    let node = Arc::make_mut(node);
                    if node.is_folder() {
                        totals += aggregate(node, sizes);
                    }
                }
            }
        }
    }
    folder.set_attribute(TOTAL_SIZE, totals.size);
    folder.set_attribute(FILE_COUNT, totals.files);
    totals
}
