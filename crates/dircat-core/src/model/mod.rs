/// Data model for the dircat catalog.
///
/// Re-exports the node types, the persisted document and size formatting.
pub mod document;
pub mod node;
pub mod size;

pub use document::{is_under, CatalogDocument};
pub use node::{
    extension_of, Attribute, CatalogNode, ChildRef, FileMeta, ListItem, NodeBody, NodeId, NodeKind,
};
pub use size::{format_count, format_size, ByteSize};
