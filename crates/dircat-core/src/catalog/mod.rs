/// The query session: a frozen document plus its indexes.
///
/// A [`Catalog`] is built once, either by the scanner or by [`load`], and
/// is read-only afterwards. Lookups return reference-resolved [`Item`]
/// copies, so callers can never reach into the stored nodes.
pub mod index;
pub mod resolve;

pub use index::CatalogIndex;
pub use resolve::{resolve, Entry, Field, FieldRef, Item, Summary};

use crate::error::Result;
use crate::model::{CatalogDocument, CatalogNode};
use crate::modules::{self, ExtensionModule};
use crate::persist;
use crate::query::{self, Page, QueryOptions};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

#[derive(Debug)]
pub struct Catalog {
    document: CatalogDocument,
    index: CatalogIndex,
}

impl Catalog {
    /// Index `document` and freeze it.
    pub fn from_document(document: CatalogDocument) -> Result<Self> {
        let index = CatalogIndex::build(&document)?;
        Ok(Self { document, index })
    }

    /// Look a node up by id, or by absolute path when the argument starts
    /// with a path separator. Returns a resolved copy.
    pub fn get_object(&self, id_or_path: &str) -> Option<Item> {
        self.node(id_or_path).map(|node| resolve(node, &self.index))
    }

    /// Resolve every node of `collection`, then filter, sort and paginate.
    pub fn get_objects<'a, I>(&self, collection: I, options: &QueryOptions) -> Page
    where
        I: IntoIterator<Item = &'a CatalogNode>,
    {
        let items = collection
            .into_iter()
            .map(|node| resolve(node, &self.index))
            .collect();
        query::run(items, options)
    }

    /// Every file, in walk order.
    pub fn files(&self) -> impl Iterator<Item = &CatalogNode> {
        self.document.files.iter().map(|node| &**node)
    }

    /// A module-contributed collection; empty if it does not exist.
    pub fn collection(&self, name: &str) -> impl Iterator<Item = &CatalogNode> {
        self.document
            .collections
            .get(name)
            .into_iter()
            .flatten()
            .map(|node| &**node)
    }

    /// The nodes a folder's contents point at, in order. Dangling references
    /// are skipped. `None` if the argument is not a known folder.
    pub fn children_of(&self, id_or_path: &str) -> Option<Vec<&CatalogNode>> {
        let contents = self.node(id_or_path)?.contents()?;
        Some(
            contents
                .iter()
                .filter_map(|child| self.index.by_id(child.id().as_str()))
                .map(|node| &**node)
                .collect(),
        )
    }

    pub fn document(&self) -> &CatalogDocument {
        &self.document
    }

    pub fn index(&self) -> &CatalogIndex {
        &self.index
    }

    fn node(&self, id_or_path: &str) -> Option<&Arc<CatalogNode>> {
        if is_path(id_or_path) {
            self.index.by_path(id_or_path)
        } else {
            self.index.by_id(id_or_path)
        }
    }
}

fn is_path(id_or_path: &str) -> bool {
    id_or_path.starts_with('/') || id_or_path.starts_with(std::path::MAIN_SEPARATOR)
}

/// Read the persisted document from `data_dir` (blank if there is none),
/// run each module's load hook in order, then index.
pub fn load(data_dir: &Path, modules: &[Box<dyn ExtensionModule>]) -> Result<Catalog> {
    let started = Instant::now();
    let mut document = persist::load_document(data_dir)?;
    modules::run_load_hooks(modules, &mut document)?;
    let catalog = Catalog::from_document(document)?;
    info!(
        "Catalog loaded from {} in {:.2?}: {} nodes, {} files",
        data_dir.display(),
        started.elapsed(),
        catalog.index.len(),
        catalog.document.files.len()
    );
    Ok(catalog)
}
