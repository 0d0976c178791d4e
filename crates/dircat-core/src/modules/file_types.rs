/// The `file-types` module: tag every file with its broad type category.
///
/// Each scanned file gets a `tags` list referencing one `tag` entity
/// (`tag_images`, `tag_code`, ...). The `tags` collection holds one entity
/// per category present in the catalog, with `fileCount` and `totalSize`,
/// largest category first. `tag=images` queries work out of the box.
use super::ExtensionModule;
use crate::error::ModuleError;
use crate::model::{
    is_under, Attribute, CatalogDocument, CatalogNode, ListItem, NodeBody, NodeId,
};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

pub const NAME: &str = "file-types";

/// Collection the tag entities live in.
pub const TAGS: &str = "tags";

/// Entity kind of a tag.
pub const TAG_KIND: &str = "tag";

/// Broad file type categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileCategory {
    Documents,
    Images,
    Video,
    Audio,
    Archives,
    Code,
    Executables,
    System,
    Other,
}

impl FileCategory {
    pub const ALL: [FileCategory; 9] = [
        Self::Documents,
        Self::Images,
        Self::Video,
        Self::Audio,
        Self::Archives,
        Self::Code,
        Self::Executables,
        Self::System,
        Self::Other,
    ];

    /// Display name, used as the tag entity's `name`.
    pub fn label(self) -> &'static str {
        match self {
            Self::Documents => "Documents",
            Self::Images => "Images",
            Self::Video => "Video",
            Self::Audio => "Audio",
            Self::Archives => "Archives",
            Self::Code => "Code",
            Self::Executables => "Executables",
            Self::System => "System",
            Self::Other => "Other",
        }
    }

    /// Key of the tag entity id, `tag_<key>`.
    pub fn key(self) -> &'static str {
        match self {
            Self::Documents => "documents",
            Self::Images => "images",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Archives => "archives",
            Self::Code => "code",
            Self::Executables => "executables",
            Self::System => "system",
            Self::Other => "other",
        }
    }

    pub fn tag_id(self) -> NodeId {
        NodeId::compose(TAG_KIND, self.key())
    }

    fn extensions(self) -> &'static [&'static str] {
        match self {
            Self::Documents => &[
                "doc", "docx", "pdf", "txt", "rtf", "odt", "xls", "xlsx", "ppt", "pptx", "csv",
                "md", "epub",
            ],
            Self::Images => &[
                "jpg", "jpeg", "png", "gif", "bmp", "svg", "webp", "ico", "tiff", "tif", "psd",
                "raw", "cr2", "nef", "heic", "heif",
            ],
            Self::Video => &[
                "mp4", "mkv", "avi", "mov", "wmv", "flv", "webm", "m4v", "mpg", "mpeg", "3gp",
            ],
            Self::Audio => &["mp3", "wav", "flac", "aac", "ogg", "wma", "m4a", "opus"],
            Self::Archives => &[
                "zip", "rar", "7z", "tar", "gz", "bz2", "xz", "zst", "cab", "iso", "dmg",
            ],
            Self::Code => &[
                "rs", "py", "js", "ts", "jsx", "tsx", "c", "cpp", "h", "hpp", "cs", "java", "go",
                "rb", "php", "swift", "kt", "scala", "html", "css", "scss", "json", "xml", "yaml",
                "yml", "toml", "sql", "sh", "bat", "ps1",
            ],
            Self::Executables => &["exe", "msi", "dll", "so", "dylib", "app", "com", "scr"],
            Self::System => &[
                "sys", "drv", "inf", "cat", "log", "etl", "dat", "reg", "tmp", "bak",
            ],
            Self::Other => &[],
        }
    }
}

/// Categorise a file extension, ignoring ASCII case.
pub fn categorise_extension(ext: &str) -> FileCategory {
    if ext.is_empty() {
        return FileCategory::Other;
    }
    FileCategory::ALL
        .into_iter()
        .find(|category| {
            category
                .extensions()
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(FileCategory::Other)
}

#[derive(Debug, Default, Clone, Copy)]
struct CategoryStats {
    total_size: u64,
    file_count: u64,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct FileTypes;

impl ExtensionModule for FileTypes {
    fn name(&self) -> &str {
        NAME
    }

    fn scan(&self, document: &mut CatalogDocument, root: &Path) -> Result<(), ModuleError> {
        let mut tagged = 0usize;
        for file in document.files.iter_mut() {
            if !is_under(file, root) {
                continue;
            }
            let file = Arc::make_mut(file);
            let Some(meta) = file.file_meta() else {
                continue;
            };
            let tag = ListItem::Reference(categorise_extension(&meta.extension).tag_id());
            add_tag(file, tag);
            tagged += 1;
        }

        let tags = tag_entities(document);
        let present = tags.len();
        let collection = document.collection_mut(TAGS);
        collection.retain(|node| !is_category_tag(&node.id));
        collection.extend(tags);
        debug!(
            "Tagged {tagged} files under {}; {present} categories present",
            root.display()
        );
        Ok(())
    }
}

/// Append `tag` to the file's `tags` list unless it is already there.
fn add_tag(file: &mut CatalogNode, tag: ListItem) {
    match file.attributes.get_mut(TAGS) {
        Some(Attribute::List(items)) => {
            if !items.contains(&tag) {
                items.push(tag);
            }
        }
        _ => {
            file.set_attribute(TAGS, Attribute::List(vec![tag]));
        }
    }
}

fn is_category_tag(id: &NodeId) -> bool {
    FileCategory::ALL
        .into_iter()
        .any(|category| category.tag_id() == *id)
}

/// One entity per category present among all files, largest first.
fn tag_entities(document: &CatalogDocument) -> Vec<Arc<CatalogNode>> {
    // There are exactly 9 categories.
    let mut stats: HashMap<FileCategory, CategoryStats> = HashMap::with_capacity(9);
    for file in &document.files {
        if let NodeBody::File(meta) = &file.body {
            let entry = stats.entry(categorise_extension(&meta.extension)).or_default();
            entry.total_size += meta.size;
            entry.file_count += 1;
        }
    }

    let mut stats: Vec<(FileCategory, CategoryStats)> = stats.into_iter().collect();
    stats.sort_by(|(a, x), (b, y)| {
        y.total_size
            .cmp(&x.total_size)
            .then_with(|| a.key().cmp(b.key()))
    });

    stats
        .into_iter()
        .map(|(category, stats)| {
            let mut tag = CatalogNode::new_entity(TAG_KIND, category.key(), category.label());
            tag.set_attribute("fileCount", stats.file_count);
            tag.set_attribute("totalSize", stats.total_size);
            Arc::new(tag)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{extension_of, FileMeta};
    use compact_str::CompactString;
    use serde_json::json;

    fn file(path: &str, size: u64) -> Arc<CatalogNode> {
        let name = path.rsplit('/').next().unwrap_or(path);
        Arc::new(CatalogNode::new_file(
            path.to_owned(),
            CompactString::new(name),
            FileMeta {
                size,
                extension: extension_of(name),
                modified: None,
            },
        ))
    }

    fn tag_names(document: &CatalogDocument) -> Vec<&str> {
        document.collections[TAGS]
            .iter()
            .map(|tag| tag.name.as_str())
            .collect()
    }

    // ── categorise_extension ─────────────────────────────────────────────

    #[test]
    fn categorise_known_extensions() {
        let cases = [
            (FileCategory::Images, ["jpg", "png", "heic"]),
            (FileCategory::Code, ["rs", "py", "toml"]),
            (FileCategory::Archives, ["zip", "7z", "iso"]),
            (FileCategory::Audio, ["mp3", "flac", "opus"]),
        ];
        for (expected, extensions) in cases {
            for ext in extensions {
                assert_eq!(categorise_extension(ext), expected, "expected {expected:?} for .{ext}");
            }
        }
    }

    #[test]
    fn categorise_unknown_extension_returns_other() {
        assert_eq!(categorise_extension("xyz"), FileCategory::Other);
        assert_eq!(categorise_extension(""), FileCategory::Other);
    }

    #[test]
    fn categorise_case_insensitive() {
        assert_eq!(categorise_extension("JPG"), FileCategory::Images);
        assert_eq!(categorise_extension("Rs"), FileCategory::Code);
    }

    // ── scan hook ────────────────────────────────────────────────────────

    #[test]
    fn files_under_the_root_are_tagged() {
        let mut doc = CatalogDocument::blank();
        doc.files.push(file("/srv/main.rs", 100));
        doc.files.push(file("/srv/logo.png", 50));
        doc.files.push(file("/elsewhere/notes.txt", 10));

        FileTypes.scan(&mut doc, Path::new("/srv")).unwrap();

        let tags = |i: usize| doc.files[i].attribute(TAGS).cloned();
        assert_eq!(tags(0), Some(Attribute::references([NodeId::new("tag_code")])));
        assert_eq!(tags(1), Some(Attribute::references([NodeId::new("tag_images")])));
        assert_eq!(tags(2), None);
    }

    #[test]
    fn tag_collection_is_sorted_by_size_descending() {
        let mut doc = CatalogDocument::blank();
        doc.files.push(file("/srv/small.rs", 10));
        doc.files.push(file("/srv/big.zip", 1_000));
        doc.files.push(file("/srv/lib.rs", 20));

        FileTypes.scan(&mut doc, Path::new("/srv")).unwrap();

        assert_eq!(tag_names(&doc), vec!["Archives", "Code"]);
        let code = &doc.collections[TAGS][1];
        assert_eq!(code.id.as_str(), "tag_code");
        assert_eq!(code.attribute("fileCount").and_then(Attribute::as_value), Some(&json!(2)));
        assert_eq!(code.attribute("totalSize").and_then(Attribute::as_value), Some(&json!(30)));
    }

    #[test]
    fn rescanning_does_not_duplicate_tags() {
        let mut doc = CatalogDocument::blank();
        doc.files.push(file("/srv/a.md", 1));
        let foreign = Arc::new(CatalogNode::new_entity(TAG_KIND, "favourite", "Favourite"));
        doc.collection_mut(TAGS).push(foreign);

        FileTypes.scan(&mut doc, Path::new("/srv")).unwrap();
        FileTypes.scan(&mut doc, Path::new("/srv")).unwrap();

        assert_eq!(tag_names(&doc), vec!["Favourite", "Documents"]);
        assert_eq!(
            doc.files[0].attribute(TAGS),
            Some(&Attribute::references([NodeId::new("tag_documents")]))
        );
    }

    #[test]
    fn empty_document_gets_an_empty_collection() {
        let mut doc = CatalogDocument::blank();
        FileTypes.scan(&mut doc, Path::new("/srv")).unwrap();
        assert!(doc.collections[TAGS].is_empty());
    }
}
