/// The persisted catalog aggregate.
///
/// A `CatalogDocument` is the only mutable form of a catalog: the scanner
/// fills it and extension modules annotate it. Once it is handed to
/// [`Catalog::from_document`](crate::catalog::Catalog::from_document) it is
/// frozen behind the query API.
use super::node::{deserialize_node, CatalogNode, ChildRef};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogDocument {
    /// Synthetic root folder; the entries of every scanned root hang off it.
    #[serde(default = "blank_root", deserialize_with = "deserialize_node")]
    pub tree: Arc<CatalogNode>,

    /// Every file node, in walk order. Folder contents reference these by id.
    #[serde(default)]
    pub files: Vec<Arc<CatalogNode>>,

    /// Root directories that were scanned.
    #[serde(default)]
    pub catalog_paths: Vec<String>,

    /// Extension modules applied during the scan, in order.
    #[serde(default)]
    pub catalog_modules: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scanned_at: Option<DateTime<Utc>>,

    /// Node collections contributed by extension modules (e.g. `tags`).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub collections: BTreeMap<String, Vec<Arc<CatalogNode>>>,

    /// Any other top-level fields, kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn blank_root() -> Arc<CatalogNode> {
    Arc::new(CatalogNode::new_root())
}

impl Default for CatalogDocument {
    fn default() -> Self {
        Self::blank()
    }
}

impl CatalogDocument {
    /// A document holding only the empty synthetic root.
    pub fn blank() -> Self {
        Self {
            tree: blank_root(),
            files: Vec::new(),
            catalog_paths: Vec::new(),
            catalog_modules: Vec::new(),
            scanned_at: None,
            collections: BTreeMap::new(),
            extra: Map::new(),
        }
    }

    /// Mutable access to the root node. Clones the root only if it is
    /// currently shared with an index.
    pub fn tree_mut(&mut self) -> &mut CatalogNode {
        Arc::make_mut(&mut self.tree)
    }

    /// Contents of the synthetic root.
    pub fn root_contents_mut(&mut self) -> &mut Vec<ChildRef> {
        match self.tree_mut().contents_mut() {
            Some(contents) => contents,
            // `tree` is only ever built from `new_root` or checked on decode.
            None => unreachable!("catalog tree root is always a folder"),
        }
    }

    /// Mutable iteration over the flat file list.
    pub fn files_mut(&mut self) -> impl Iterator<Item = &mut CatalogNode> {
        self.files.iter_mut().map(|node| Arc::make_mut(node))
    }

    /// Files whose path lies under `root`.
    pub fn files_under<'a>(&'a self, root: &'a Path) -> impl Iterator<Item = &'a CatalogNode> {
        self.files
            .iter()
            .map(|node| &**node)
            .filter(move |node| is_under(node, root))
    }

    /// Named collection, created empty on first use.
    pub fn collection_mut(&mut self, name: &str) -> &mut Vec<Arc<CatalogNode>> {
        self.collections.entry(name.to_owned()).or_default()
    }

    /// Total number of nodes a full index will hold.
    pub fn node_count(&self) -> usize {
        fn count_inline(node: &CatalogNode) -> usize {
            1 + node
                .contents()
                .unwrap_or_default()
                .iter()
                .map(|child| match child {
                    ChildRef::Inline(inline) => count_inline(inline),
                    ChildRef::Reference(_) => 0,
                })
                .sum::<usize>()
        }
        count_inline(&self.tree)
            + self.files.len()
            + self.collections.values().map(Vec::len).sum::<usize>()
    }
}

/// Whether a node's path lies under `root` (component-wise).
pub fn is_under(node: &CatalogNode, root: &Path) -> bool {
    node.path
        .as_deref()
        .is_some_and(|path| Path::new(path).starts_with(root))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::node::{FileMeta, NodeId};
    use compact_str::CompactString;
    use serde_json::json;

    fn file(path: &str, size: u64) -> CatalogNode {
        let name = path.rsplit('/').next().unwrap_or(path);
        CatalogNode::new_file(
            path.to_owned(),
            CompactString::new(name),
            FileMeta {
                size,
                extension: crate::model::extension_of(name),
                modified: None,
            },
        )
    }

    #[test]
    fn blank_document_has_empty_root() {
        let doc = CatalogDocument::blank();
        assert_eq!(doc.tree.id, NodeId::root());
        assert_eq!(doc.tree.contents().map(<[_]>::len), Some(0));
        assert_eq!(doc.node_count(), 1);
    }

    #[test]
    fn top_level_fields_use_camel_case_and_keep_extras() {
        let mut doc = CatalogDocument::blank();
        doc.catalog_paths.push("/srv".into());
        doc.extra.insert("library".into(), json!({"owner": "ops"}));

        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["catalogPaths"], json!(["/srv"]));
        assert_eq!(value["catalogModules"], json!([]));
        assert_eq!(value["library"], json!({"owner": "ops"}));
        assert!(value.get("collections").is_none());

        let back: CatalogDocument = serde_json::from_value(value).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn missing_tree_decodes_as_blank_root() {
        let doc: CatalogDocument = serde_json::from_value(json!({"files": []})).unwrap();
        assert_eq!(doc.tree.id, NodeId::root());
    }

    #[test]
    fn non_folder_tree_is_rejected() {
        let result: Result<CatalogDocument, _> = serde_json::from_value(json!({
            "tree": {"id": "file_/x", "type": "file", "name": "x", "size": 1}
        }));
        assert!(result.is_err());
    }

    #[test]
    fn files_under_is_component_wise() {
        let mut doc = CatalogDocument::blank();
        doc.files.push(Arc::new(file("/data/a.txt", 1)));
        doc.files.push(Arc::new(file("/database/b.txt", 2)));

        let under: Vec<_> = doc
            .files_under(Path::new("/data"))
            .map(|n| n.name.as_str())
            .collect();
        assert_eq!(under, vec!["a.txt"]);
    }

    #[test]
    fn node_count_covers_every_store() {
        let mut doc = CatalogDocument::blank();
        let mut folder = CatalogNode::new_folder("/d".into(), CompactString::new("d"));
        folder
            .contents_mut()
            .unwrap()
            .push(ChildRef::Reference(NodeId::for_file("/d/a")));
        doc.root_contents_mut().push(ChildRef::Inline(Arc::new(folder)));
        doc.files.push(Arc::new(file("/d/a", 1)));
        doc.collection_mut("tags")
            .push(Arc::new(CatalogNode::new_entity("tag", "x", "X")));

        assert_eq!(doc.node_count(), 4);
    }
}
