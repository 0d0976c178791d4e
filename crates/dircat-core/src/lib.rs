/// dircat core: catalog model, scanner and query engine.
///
/// This crate holds all catalog logic with no CLI dependencies.
///
/// # Modules
///
/// - [`model`]: nodes, typed references and the persisted document.
/// - [`scanner`]: depth-first directory walk into a fresh catalog.
/// - [`catalog`]: id/path indexes, reference resolution, lookups.
/// - [`query`]: filter, sort and paginate over resolved items.
/// - [`persist`]: `catalog.json` / `catalog.json.gz` load and save.
/// - [`modules`]: extension module trait, registry and built-ins.
/// - [`api`]: request-layer helpers.
/// - [`config`]: environment-driven configuration.
pub mod api;
pub mod catalog;
pub mod config;
pub mod error;
pub mod model;
pub mod modules;
pub mod persist;
pub mod query;
pub mod scanner;

pub use catalog::{load, Catalog, Item};
pub use config::CatalogConfig;
pub use error::{CatalogError, Result, ScanError};
pub use model::CatalogDocument;
pub use query::{Page, QueryOptions};
pub use scanner::{scan, scan_and_save, ErrorPolicy, ScanOptions, ScanSummary};
