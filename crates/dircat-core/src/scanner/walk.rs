/// Depth-first walk of one scan root into catalog nodes.
///
/// `jwalk` yields entries in sorted pre-order. Folders are kept on an
/// explicit stack while their descendants stream past; an entry whose parent
/// is not the top of the stack closes every folder above that parent, which
/// moves the finished folder inline into its own parent's contents. No call
/// recursion, so nesting depth is bounded only by memory.
use super::{ErrorPolicy, ScanSummary};
use crate::error::ScanError;
use crate::model::{extension_of, CatalogNode, ChildRef, FileMeta};
use chrono::{DateTime, Utc};
use compact_str::CompactString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Output of walking one root.
#[derive(Debug, Default)]
pub(crate) struct WalkedRoot {
    /// Top-level entries of the root, in walk order.
    pub entries: Vec<ChildRef>,
    /// Every file found, in walk order.
    pub files: Vec<Arc<CatalogNode>>,
}

/// A folder whose contents are still being collected.
struct OpenFolder {
    path: PathBuf,
    node: CatalogNode,
}

struct Builder {
    walked: WalkedRoot,
    open: Vec<OpenFolder>,
}

impl Builder {
    /// Contents list new children are appended to.
    fn container(&mut self) -> &mut Vec<ChildRef> {
        match self.open.last_mut() {
            Some(folder) => folder
                .node
                .contents_mut()
                .unwrap_or_else(|| unreachable!("open entries are always folders")),
            None => &mut self.walked.entries,
        }
    }

    /// Close open folders until `parent` is on top (or the stack is empty,
    /// for entries directly under the root).
    fn close_until(&mut self, parent: &Path) {
        while self.open.last().is_some_and(|top| top.path != parent) {
            if let Some(done) = self.open.pop() {
                self.container().push(ChildRef::Inline(Arc::new(done.node)));
            }
        }
    }

    fn finish(mut self) -> WalkedRoot {
        while let Some(done) = self.open.pop() {
            self.container().push(ChildRef::Inline(Arc::new(done.node)));
        }
        self.walked
    }
}

/// Walk `root` (canonical, known to be a directory).
pub(crate) fn walk_root(
    root: &Path,
    policy: ErrorPolicy,
    summary: &mut ScanSummary,
) -> Result<WalkedRoot, ScanError> {
    let mut builder = Builder {
        walked: WalkedRoot::default(),
        open: Vec::new(),
    };
    // Directory whose whole subtree is being dropped.
    let mut skipped_dir: Option<PathBuf> = None;

    let walker = jwalk::WalkDir::new(root)
        .skip_hidden(false)
        .follow_links(false)
        .sort(true)
        .parallelism(jwalk::Parallelism::Serial);

    for entry_result in walker {
        let mut entry = match entry_result {
            Ok(entry) => entry,
            Err(err) => {
                let path = err.path().map_or_else(|| root.to_path_buf(), Path::to_path_buf);
                on_error(policy, summary, walk_error(path, &err))?;
                continue;
            }
        };

        let path = entry.path();
        if let Some(skipped) = &skipped_dir {
            if path.starts_with(skipped) {
                continue;
            }
            skipped_dir = None;
        }

        // jwalk reports a failed read_dir on the directory's own entry, which
        // is still yielded as `Ok`.
        if let Some(err) = entry.read_children_error.take() {
            on_error(policy, summary, walk_error(path.clone(), &err))?;
        }
        if path == root {
            continue;
        }

        let file_type = entry.file_type();
        if file_type.is_symlink() {
            debug!("Skipping symlink {}", path.display());
            summary.skipped_links += 1;
            continue;
        }

        // Ids embed the path; a lossy conversion could give two entries the
        // same id.
        let Some(path_text) = path.to_str().map(str::to_owned) else {
            on_error(policy, summary, ScanError::NonUtf8Path(path.clone()))?;
            if file_type.is_dir() {
                skipped_dir = Some(path);
            }
            continue;
        };

        builder.close_until(entry.parent_path());
        let name = CompactString::new(entry.file_name().to_string_lossy());

        if file_type.is_dir() {
            summary.folders += 1;
            builder.open.push(OpenFolder {
                node: CatalogNode::new_folder(path_text, name),
                path,
            });
        } else if file_type.is_file() {
            let metadata = match std::fs::symlink_metadata(&path) {
                Ok(metadata) => metadata,
                Err(source) => {
                    on_error(policy, summary, ScanError::Stat { path, source })?;
                    continue;
                }
            };
            let meta = FileMeta {
                size: metadata.len(),
                extension: extension_of(&name),
                modified: metadata.modified().ok().map(DateTime::<Utc>::from),
            };
            summary.files += 1;
            summary.bytes += meta.size;

            let file = CatalogNode::new_file(path_text, name, meta);
            builder.container().push(ChildRef::Reference(file.id.clone()));
            builder.walked.files.push(Arc::new(file));
        } else {
            debug!("Skipping special file {}", path.display());
        }
    }

    Ok(builder.finish())
}

fn walk_error(path: PathBuf, err: &jwalk::Error) -> ScanError {
    ScanError::Walk {
        path,
        message: err.to_string(),
    }
}

/// Abort with `error` under [`ErrorPolicy::FailFast`]; otherwise log it,
/// count it and let the walk go on.
fn on_error(
    policy: ErrorPolicy,
    summary: &mut ScanSummary,
    error: ScanError,
) -> Result<(), ScanError> {
    match policy {
        ErrorPolicy::FailFast => Err(error),
        ErrorPolicy::Skip => {
            warn!("Skipping entry: {error}");
            summary.skipped_errors += 1;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    // ── Helpers ──────────────────────────────────────────────────────────

    fn walk(root: &Path) -> (WalkedRoot, ScanSummary) {
        let mut summary = ScanSummary::default();
        let walked = walk_root(root, ErrorPolicy::FailFast, &mut summary).unwrap();
        (walked, summary)
    }

    fn names(entries: &[ChildRef]) -> Vec<String> {
        entries
            .iter()
            .map(|child| match child {
                ChildRef::Inline(node) => format!("{}/", node.name),
                ChildRef::Reference(id) => id.as_str().rsplit('/').next().unwrap_or("").to_owned(),
            })
            .collect()
    }

    // ── Tests ────────────────────────────────────────────────────────────

    #[test]
    fn nesting_follows_the_directory_tree() {
        let dir = TempDir::new().unwrap();
        let root = fs::canonicalize(dir.path()).unwrap();
        fs::create_dir_all(root.join("a/deep/deeper")).unwrap();
        fs::create_dir(root.join("b")).unwrap();
        fs::write(root.join("a/one.txt"), b"1").unwrap();
        fs::write(root.join("a/deep/deeper/two.txt"), b"22").unwrap();
        fs::write(root.join("b/three.txt"), b"333").unwrap();
        fs::write(root.join("top.md"), b"4444").unwrap();

        let (walked, summary) = walk(&root);

        assert_eq!(names(&walked.entries), vec!["a/", "b/", "top.md"]);
        let ChildRef::Inline(a) = &walked.entries[0] else {
            panic!("a should be inline");
        };
        assert_eq!(names(a.contents().unwrap()), vec!["deep/", "one.txt"]);
        let ChildRef::Inline(deep) = &a.contents().unwrap()[0] else {
            panic!("deep should be inline");
        };
        let ChildRef::Inline(deeper) = &deep.contents().unwrap()[0] else {
            panic!("deeper should be inline");
        };
        assert_eq!(names(deeper.contents().unwrap()), vec!["two.txt"]);

        assert_eq!(walked.files.len(), 4);
        assert_eq!(summary.files, 4);
        assert_eq!(summary.folders, 4);
        assert_eq!(summary.bytes, 10);
    }

    #[test]
    fn file_nodes_carry_stat_metadata() {
        let dir = TempDir::new().unwrap();
        let root = fs::canonicalize(dir.path()).unwrap();
        fs::write(root.join("Report.PDF"), vec![0u8; 1_500]).unwrap();

        let (walked, _) = walk(&root);
        let file = &walked.files[0];
        let meta = file.file_meta().unwrap();
        assert_eq!(meta.size, 1_500);
        assert_eq!(meta.extension, "pdf");
        assert!(meta.modified.is_some());
        assert_eq!(file.name, "Report.PDF");
        assert_eq!(file.path.as_deref(), Some(root.join("Report.PDF").to_str().unwrap()));
    }

    #[test]
    fn empty_root_yields_nothing() {
        let dir = TempDir::new().unwrap();
        let (walked, summary) = walk(dir.path());
        assert!(walked.entries.is_empty());
        assert!(walked.files.is_empty());
        assert_eq!(summary, ScanSummary::default());
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_are_counted_not_recorded() {
        let dir = TempDir::new().unwrap();
        let root = fs::canonicalize(dir.path()).unwrap();
        fs::write(root.join("real.txt"), b"x").unwrap();
        fs::create_dir(root.join("sub")).unwrap();
        std::os::unix::fs::symlink(root.join("real.txt"), root.join("link.txt")).unwrap();
        std::os::unix::fs::symlink(root.join("sub"), root.join("sub-link")).unwrap();

        let (walked, summary) = walk(&root);
        assert_eq!(names(&walked.entries), vec!["real.txt", "sub/"]);
        assert_eq!(summary.skipped_links, 2);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn non_utf8_names_follow_the_error_policy() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = TempDir::new().unwrap();
        let root = fs::canonicalize(dir.path()).unwrap();
        // Both would read back as "\u{fffd}.txt" through a lossy conversion.
        fs::write(root.join(OsStr::from_bytes(b"\xff.txt")), b"a").unwrap();
        fs::write(root.join(OsStr::from_bytes(b"\xfe.txt")), b"b").unwrap();
        let bad_dir = root.join(OsStr::from_bytes(b"\xfd"));
        fs::create_dir(&bad_dir).unwrap();
        fs::write(bad_dir.join("inner.txt"), b"c").unwrap();
        fs::write(root.join("ok.txt"), b"d").unwrap();

        let mut summary = ScanSummary::default();
        let err = walk_root(&root, ErrorPolicy::FailFast, &mut summary).unwrap_err();
        assert!(matches!(err, ScanError::NonUtf8Path(_)));

        let mut summary = ScanSummary::default();
        let walked = walk_root(&root, ErrorPolicy::Skip, &mut summary).unwrap();
        assert_eq!(names(&walked.entries), vec!["ok.txt"]);
        assert_eq!(walked.files.len(), 1);
        // One per bad entry; the folder's contents go with it.
        assert_eq!(summary.skipped_errors, 3);
        assert_eq!(summary.folders, 0);
    }
}
