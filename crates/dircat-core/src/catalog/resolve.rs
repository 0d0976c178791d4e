/// Reference-resolved copies of stored nodes.
///
/// An [`Item`] is what queries return: an owned copy of a node in which
/// every array entry that points at another node has been replaced by a
/// [`Summary`] of that node. Expansion is exactly one level deep and reads
/// only the target's id, kind and name, so it never recurses and reference
/// cycles (including a node listing itself) cannot loop.
use super::index::CatalogIndex;
use crate::model::{Attribute, CatalogNode, ChildRef, ListItem, NodeBody, NodeId, NodeKind};
use chrono::SecondsFormat;
use compact_str::CompactString;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// `{id, type, name}` of a referenced node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub name: CompactString,
}

impl Summary {
    pub fn of(node: &CatalogNode) -> Self {
        Self {
            id: node.id.clone(),
            kind: node.kind(),
            name: node.name.clone(),
        }
    }
}

/// One element of a resolved array field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Entry {
    Summary(Summary),
    Value(Value),
}

impl Entry {
    /// The `name` an entry exposes to group filters, if any.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Summary(summary) => Some(summary.name.as_str()),
            Self::Value(Value::Object(object)) => object.get("name").and_then(Value::as_str),
            Self::Value(_) => None,
        }
    }

    /// Text used when an array field is sorted on.
    pub fn sort_text(&self) -> String {
        match self {
            Self::Summary(summary) => summary.name.to_string(),
            Self::Value(Value::String(text)) => text.clone(),
            Self::Value(other) => self.name().map_or_else(|| other.to_string(), str::to_owned),
        }
    }
}

/// A copied field of an item.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Field {
    Value(Value),
    List(Vec<Entry>),
}

/// Borrowed view of one field of an item, including the fixed ones.
#[derive(Debug, Clone, Copy)]
pub enum FieldRef<'a> {
    Text(&'a str),
    Field(&'a Field),
}

/// Reference-resolved copy of a catalog node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Item {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub name: CompactString,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Everything else: file metadata, folder contents, module attributes.
    #[serde(flatten)]
    pub fields: BTreeMap<String, Field>,
}

impl Item {
    /// Look up a field by its JSON name.
    pub fn get(&self, field: &str) -> Option<FieldRef<'_>> {
        match field {
            "id" => Some(FieldRef::Text(self.id.as_str())),
            "type" => Some(FieldRef::Text(self.kind.as_str())),
            "name" => Some(FieldRef::Text(self.name.as_str())),
            "path" => self.path.as_deref().map(FieldRef::Text),
            other => self.fields.get(other).map(FieldRef::Field),
        }
    }

    /// Entries of an array field; `None` if absent or scalar.
    pub fn list(&self, field: &str) -> Option<&[Entry]> {
        match self.fields.get(field) {
            Some(Field::List(entries)) => Some(entries),
            _ => None,
        }
    }
}

/// Copy `node`, expanding references through `index`.
pub fn resolve(node: &CatalogNode, index: &CatalogIndex) -> Item {
    let mut fields = BTreeMap::new();

    for (name, attribute) in &node.attributes {
        let field = match attribute {
            Attribute::Value(value) => Field::Value(value.clone()),
            Attribute::List(items) => Field::List(
                items
                    .iter()
                    .map(|item| match item {
                        ListItem::Reference(id) => expand(id, index),
                        ListItem::Value(value) => Entry::Value(value.clone()),
                    })
                    .collect(),
            ),
        };
        fields.insert(name.clone(), field);
    }

    // Kind-specific fields last so they always win over attributes.
    match &node.body {
        NodeBody::File(meta) => {
            fields.insert("size".into(), Field::Value(Value::from(meta.size)));
            fields.insert(
                "extension".into(),
                Field::Value(Value::from(meta.extension.as_str())),
            );
            if let Some(modified) = meta.modified {
                fields.insert(
                    "modified".into(),
                    Field::Value(Value::from(
                        modified.to_rfc3339_opts(SecondsFormat::AutoSi, true),
                    )),
                );
            }
        }
        NodeBody::Folder { contents } => {
            let entries = contents
                .iter()
                .map(|child| match child {
                    ChildRef::Reference(id) => expand(id, index),
                    ChildRef::Inline(inline) => Entry::Summary(Summary::of(inline)),
                })
                .collect();
            fields.insert("contents".into(), Field::List(entries));
        }
        NodeBody::Entity { .. } => {}
    }

    Item {
        id: node.id.clone(),
        kind: node.kind(),
        name: node.name.clone(),
        path: node.path.clone(),
        fields,
    }
}

/// A reference becomes a summary of its target. A dangling reference keeps
/// its id verbatim.
fn expand(id: &NodeId, index: &CatalogIndex) -> Entry {
    match index.by_id(id.as_str()) {
        Some(target) => Entry::Summary(Summary::of(target)),
        None => {
            tracing::debug!("Dangling reference {id} left unexpanded");
            Entry::Value(Value::from(id.as_str()))
        }
    }
}
