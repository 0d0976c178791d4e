/// Id and path indexes over a catalog document.
///
/// Built once per query session by [`CatalogIndex::build`] and never
/// persisted. Every entry is an `Arc` clone of the stored node, so lookups
/// are O(1) and return the node itself rather than a copy.
use crate::error::{CatalogError, Result};
use crate::model::{CatalogDocument, CatalogNode, ChildRef, NodeId};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct CatalogIndex {
    by_id: HashMap<NodeId, Arc<CatalogNode>>,
    by_path: HashMap<String, Arc<CatalogNode>>,
}

impl CatalogIndex {
    /// Index the root, every inline descendant, every file and every
    /// collection entry in one pass.
    ///
    /// Two nodes with the same id are an error; the document would otherwise
    /// answer lookups ambiguously.
    pub fn build(document: &CatalogDocument) -> Result<Self> {
        let capacity = document.node_count();
        let mut index = Self {
            by_id: HashMap::with_capacity(capacity),
            by_path: HashMap::with_capacity(capacity),
        };

        // Explicit stack: folder nesting depth is bounded only by the
        // scanned filesystem.
        let mut pending: Vec<&Arc<CatalogNode>> = vec![&document.tree];
        while let Some(node) = pending.pop() {
            index.insert(node)?;
            for child in node.contents().unwrap_or_default() {
                if let ChildRef::Inline(inline) = child {
                    pending.push(inline);
                }
            }
        }

        for node in &document.files {
            index.insert(node)?;
        }
        for node in document.collections.values().flatten() {
            index.insert(node)?;
        }

        Ok(index)
    }

    fn insert(&mut self, node: &Arc<CatalogNode>) -> Result<()> {
        if self.by_id.contains_key(&node.id) {
            return Err(CatalogError::DuplicateId(node.id.clone()));
        }
        self.by_id.insert(node.id.clone(), Arc::clone(node));
        if let Some(path) = &node.path {
            self.by_path.insert(path.clone(), Arc::clone(node));
        }
        Ok(())
    }

    #[inline]
    pub fn by_id(&self, id: &str) -> Option<&Arc<CatalogNode>> {
        self.by_id.get(id)
    }

    #[inline]
    pub fn by_path(&self, path: &str) -> Option<&Arc<CatalogNode>> {
        self.by_path.get(path)
    }

    /// Number of indexed nodes.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Every indexed node, in no particular order.
    pub fn nodes(&self) -> impl Iterator<Item = &Arc<CatalogNode>> {
        self.by_id.values()
    }
}
