/// A single node of the catalog: a scanned file, a scanned folder, or an
/// entity contributed by an extension module.
///
/// Nodes are shared through `Arc` between the document that owns them and
/// the index built over them, so an index hit is the stored node itself.
///
/// The persisted JSON shape is flat (`{"id", "type", "name", "path", ...}`
/// plus any module attributes). Inside the process, everything that can
/// point at another node is a typed variant (`ChildRef::Reference`,
/// `ListItem::Reference`) rather than a string that happens to look like an
/// id.
use chrono::{DateTime, Utc};
use compact_str::CompactString;
use serde::de::{DeserializeOwned, Error as _};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Globally unique node identifier, `<prefix>_<key>`.
///
/// File and folder ids embed the absolute path (`file_/srv/a.txt`), so two
/// scans of the same tree produce the same ids.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Separates the id prefix from its key.
    pub const SEPARATOR: char = '_';

    /// Id of the synthetic catalog root. Contains no separator, so it can
    /// never collide with a path-derived id.
    pub const ROOT: &'static str = "root";

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn root() -> Self {
        Self(Self::ROOT.to_owned())
    }

    /// `<prefix>_<key>`.
    pub fn compose(prefix: &str, key: &str) -> Self {
        let mut id = String::with_capacity(prefix.len() + key.len() + 1);
        id.push_str(prefix);
        id.push(Self::SEPARATOR);
        id.push_str(key);
        Self(id)
    }

    pub fn for_file(path: &str) -> Self {
        Self::compose("file", path)
    }

    pub fn for_folder(path: &str) -> Self {
        Self::compose("folder", path)
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether a bare string in a persisted array attribute denotes a
    /// reference: a non-empty prefix, the separator, and a non-empty key.
    ///
    /// Only applied once, when a document is decoded.
    pub fn looks_like_reference(text: &str) -> bool {
        match text.split_once(Self::SEPARATOR) {
            Some((prefix, key)) => !prefix.is_empty() && !key.is_empty(),
            None => false,
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// The `type` tag of a node.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    File,
    Folder,
    /// Module-defined entity kind, e.g. `tag`.
    Entity(CompactString),
}

impl NodeKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::File => "file",
            Self::Folder => "folder",
            Self::Entity(kind) => kind.as_str(),
        }
    }

    pub fn parse(kind: &str) -> Self {
        match kind {
            "file" => Self::File,
            "folder" => Self::Folder,
            other => Self::Entity(CompactString::new(other)),
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for NodeKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for NodeKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let kind = CompactString::deserialize(deserializer)?;
        Ok(Self::parse(&kind))
    }
}

/// Stat-derived metadata of a scanned file.
#[derive(Clone, Debug, PartialEq)]
pub struct FileMeta {
    /// Byte length.
    pub size: u64,
    /// Lower-cased suffix after the last `.`; empty if none.
    pub extension: CompactString,
    pub modified: Option<DateTime<Utc>>,
}

/// One entry of a folder's `contents`.
///
/// Folders are stored inline; files are stored once in the flat file list
/// and referenced by id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChildRef {
    Reference(NodeId),
    Inline(Arc<CatalogNode>),
}

impl ChildRef {
    /// Id of the child, whichever way it is stored.
    pub fn id(&self) -> &NodeId {
        match self {
            Self::Reference(id) => id,
            Self::Inline(node) => &node.id,
        }
    }
}

/// Kind-specific part of a node.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeBody {
    File(FileMeta),
    Folder { contents: Vec<ChildRef> },
    Entity { kind: CompactString },
}

/// An element of an array attribute.
#[derive(Clone, Debug, PartialEq)]
pub enum ListItem {
    Reference(NodeId),
    Value(Value),
}

impl Serialize for ListItem {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Reference(id) => id.serialize(serializer),
            Self::Value(value) => value.serialize(serializer),
        }
    }
}

/// A module-contributed field: a scalar copied verbatim, or a list whose
/// elements may reference other nodes.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(from = "Value")]
pub enum Attribute {
    Value(Value),
    List(Vec<ListItem>),
}

impl Attribute {
    /// A list made only of references.
    pub fn references<I>(ids: I) -> Self
    where
        I: IntoIterator<Item = NodeId>,
    {
        Self::List(ids.into_iter().map(ListItem::Reference).collect())
    }

    /// Scalar value, or `None` for lists.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(value) => Some(value),
            Self::List(_) => None,
        }
    }
}

impl From<Value> for Attribute {
    fn from(value: Value) -> Self {
        match value {
            Value::Array(elements) => Self::List(
                elements
                    .into_iter()
                    .map(|element| match element {
                        Value::String(text) if NodeId::looks_like_reference(&text) => {
                            ListItem::Reference(NodeId::new(text))
                        }
                        other => ListItem::Value(other),
                    })
                    .collect(),
            ),
            scalar => Self::Value(scalar),
        }
    }
}

impl From<u64> for Attribute {
    fn from(value: u64) -> Self {
        Self::Value(Value::from(value))
    }
}

impl From<&str> for Attribute {
    fn from(value: &str) -> Self {
        Self::Value(Value::from(value))
    }
}

impl Serialize for Attribute {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Value(value) => value.serialize(serializer),
            Self::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}

/// Field names owned by the node itself; everything else is an attribute.
const RESERVED_FIELDS: [&str; 8] = [
    "id",
    "type",
    "name",
    "path",
    "size",
    "extension",
    "modified",
    "contents",
];

/// A single file, folder or entity in the catalog.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(try_from = "RawNode")]
pub struct CatalogNode {
    pub id: NodeId,
    /// Display name (basename for files and folders).
    pub name: CompactString,
    /// Absolute path. `None` for the synthetic root and module entities.
    pub path: Option<String>,
    pub body: NodeBody,
    /// Module-contributed fields, keyed by JSON field name.
    pub attributes: BTreeMap<String, Attribute>,
}

impl CatalogNode {
    /// Create a file node; the id is derived from `path`.
    pub fn new_file(path: String, name: CompactString, meta: FileMeta) -> Self {
        Self {
            id: NodeId::for_file(&path),
            name,
            path: Some(path),
            body: NodeBody::File(meta),
            attributes: BTreeMap::new(),
        }
    }

    /// Create an empty folder node; the id is derived from `path`.
    pub fn new_folder(path: String, name: CompactString) -> Self {
        Self {
            id: NodeId::for_folder(&path),
            name,
            path: Some(path),
            body: NodeBody::Folder {
                contents: Vec::new(),
            },
            attributes: BTreeMap::new(),
        }
    }

    /// The synthetic catalog root: id [`NodeId::ROOT`], name `/`, no path.
    pub fn new_root() -> Self {
        Self {
            id: NodeId::root(),
            name: CompactString::new("/"),
            path: None,
            body: NodeBody::Folder {
                contents: Vec::new(),
            },
            attributes: BTreeMap::new(),
        }
    }

    /// Create a module entity with id `<kind>_<key>`.
    pub fn new_entity(kind: &str, key: &str, name: &str) -> Self {
        Self {
            id: NodeId::compose(kind, key),
            name: CompactString::new(name),
            path: None,
            body: NodeBody::Entity {
                kind: CompactString::new(kind),
            },
            attributes: BTreeMap::new(),
        }
    }

    pub fn kind(&self) -> NodeKind {
        match &self.body {
            NodeBody::File(_) => NodeKind::File,
            NodeBody::Folder { .. } => NodeKind::Folder,
            NodeBody::Entity { kind } => NodeKind::Entity(kind.clone()),
        }
    }

    #[inline]
    pub fn is_folder(&self) -> bool {
        matches!(self.body, NodeBody::Folder { .. })
    }

    pub fn file_meta(&self) -> Option<&FileMeta> {
        match &self.body {
            NodeBody::File(meta) => Some(meta),
            _ => None,
        }
    }

    /// Folder contents; `None` for files and entities.
    pub fn contents(&self) -> Option<&[ChildRef]> {
        match &self.body {
            NodeBody::Folder { contents } => Some(contents),
            _ => None,
        }
    }

    pub fn contents_mut(&mut self) -> Option<&mut Vec<ChildRef>> {
        match &mut self.body {
            NodeBody::Folder { contents } => Some(contents),
            _ => None,
        }
    }

    /// Set a module attribute. Names owned by the node itself are rejected
    /// so an attribute can never shadow `id`, `size` and friends.
    pub fn set_attribute(&mut self, name: &str, value: impl Into<Attribute>) -> bool {
        if RESERVED_FIELDS.contains(&name) {
            return false;
        }
        self.attributes.insert(name.to_owned(), value.into());
        true
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }
}

impl Serialize for CatalogNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("id", &self.id)?;
        map.serialize_entry("type", self.kind().as_str())?;
        map.serialize_entry("name", &self.name)?;
        if let Some(path) = &self.path {
            map.serialize_entry("path", path)?;
        }
        match &self.body {
            NodeBody::File(meta) => {
                map.serialize_entry("size", &meta.size)?;
                map.serialize_entry("extension", &meta.extension)?;
                if let Some(modified) = &meta.modified {
                    map.serialize_entry("modified", modified)?;
                }
            }
            NodeBody::Folder { contents } => map.serialize_entry("contents", contents)?,
            NodeBody::Entity { .. } => {}
        }
        for (name, value) in &self.attributes {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Wire form of a node, before the kind-specific fields are checked.
#[derive(Deserialize)]
struct RawNode {
    id: NodeId,
    #[serde(rename = "type")]
    kind: CompactString,
    #[serde(default)]
    name: CompactString,
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    size: Option<Value>,
    #[serde(default)]
    extension: Option<Value>,
    #[serde(default)]
    modified: Option<Value>,
    #[serde(default)]
    contents: Option<Value>,
    #[serde(flatten)]
    attributes: BTreeMap<String, Attribute>,
}

/// Decode an optional field; `null` counts as absent.
fn decode<T: DeserializeOwned>(value: Option<Value>) -> Result<Option<T>, serde_json::Error> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value).map(Some),
    }
}

impl TryFrom<RawNode> for CatalogNode {
    type Error = String;

    /// Kind-specific fields that do not apply to the node's kind stay on it
    /// as plain attributes, so a load/save cycle writes them back unchanged.
    fn try_from(raw: RawNode) -> Result<Self, Self::Error> {
        let RawNode {
            id,
            kind,
            name,
            path,
            size,
            extension,
            modified,
            contents,
            mut attributes,
        } = raw;
        let invalid = |field: &str, err: serde_json::Error| format!("node {id}: invalid `{field}`: {err}");
        let mut keep = |field: &str, value: Option<Value>| {
            if let Some(value) = value.filter(|value| !value.is_null()) {
                attributes.insert(field.to_owned(), Attribute::from(value));
            }
        };

        let body = match NodeKind::parse(&kind) {
            NodeKind::File => {
                keep("contents", contents);
                // A timestamp that does not parse is kept verbatim rather
                // than failing the whole catalog.
                let modified = match decode::<DateTime<Utc>>(modified.clone()) {
                    Ok(parsed) => parsed,
                    Err(_) => {
                        keep("modified", modified);
                        None
                    }
                };
                NodeBody::File(FileMeta {
                    size: decode(size).map_err(|e| invalid("size", e))?.unwrap_or(0),
                    extension: decode(extension)
                        .map_err(|e| invalid("extension", e))?
                        .unwrap_or_default(),
                    modified,
                })
            }
            NodeKind::Folder => {
                keep("size", size);
                keep("extension", extension);
                keep("modified", modified);
                NodeBody::Folder {
                    contents: decode(contents)
                        .map_err(|e| invalid("contents", e))?
                        .unwrap_or_default(),
                }
            }
            NodeKind::Entity(kind) => {
                keep("size", size);
                keep("extension", extension);
                keep("modified", modified);
                keep("contents", contents);
                NodeBody::Entity { kind }
            }
        };
        Ok(Self {
            id,
            name,
            path,
            body,
            attributes,
        })
    }
}

/// Deserialize helper used by the document for its root field.
pub(crate) fn deserialize_node<'de, D>(deserializer: D) -> Result<Arc<CatalogNode>, D::Error>
where
    D: Deserializer<'de>,
{
    let node = CatalogNode::deserialize(deserializer)?;
    if !node.is_folder() {
        return Err(D::Error::custom("catalog tree root must be a folder"));
    }
    Ok(Arc::new(node))
}

/// Lower-cased suffix after the last `.` of a file name.
///
/// A leading dot alone (`.bashrc`) and a trailing dot (`notes.`) yield no
/// extension.
pub fn extension_of(name: &str) -> CompactString {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => {
            CompactString::new(ext.to_lowercase())
        }
        _ => CompactString::default(),
    }
}
