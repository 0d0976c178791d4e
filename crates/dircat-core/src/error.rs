/// Error taxonomy for the catalog engine.
///
/// There is no "not found" variant: lookups return `Option`, and only the
/// API layer turns a miss into [`CatalogError::InvalidFile`].
use crate::model::NodeId;
use std::path::PathBuf;

/// Boxed error returned by extension modules.
pub type ModuleError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed catalog document {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode catalog document: {0}")]
    Encode(#[source] serde_json::Error),

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error("duplicate node id {0}")]
    DuplicateId(NodeId),

    #[error("extension module `{module}` failed: {source}")]
    Module {
        module: String,
        #[source]
        source: ModuleError,
    },

    #[error("unknown extension module `{0}`")]
    UnknownModule(String),

    #[error("invalid file id {0}")]
    InvalidFile(String),
}

impl CatalogError {
    /// Attach a path to a raw I/O error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Failures of the directory walk itself.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("scan root {0} is not a directory")]
    NotADirectory(PathBuf),

    #[error("cannot resolve scan root {path}: {source}")]
    Root {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot read {path}: {message}")]
    Walk { path: PathBuf, message: String },

    #[error("path is not valid UTF-8: {0}")]
    NonUtf8Path(PathBuf),

    #[error("cannot stat {path}: {source}")]
    Stat {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, CatalogError>;
