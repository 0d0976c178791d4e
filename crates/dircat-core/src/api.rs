/// Request-layer helpers over a loaded [`Catalog`].
///
/// These are what a request handler calls: they turn a miss into an error
/// and pick the collection a listing runs over.
use crate::catalog::{Catalog, Item};
use crate::error::{CatalogError, Result};
use crate::query::{Page, QueryOptions};
use tracing::warn;

/// Fetch one object by id or path. An unknown id is
/// [`CatalogError::InvalidFile`].
pub fn files_get(catalog: &Catalog, id: &str) -> Result<Item> {
    catalog.get_object(id).ok_or_else(|| {
        warn!("Invalid file id {id:?}");
        CatalogError::InvalidFile(id.to_owned())
    })
}

/// Query the flat file list.
pub fn files_list(catalog: &Catalog, options: &QueryOptions) -> Page {
    catalog.get_objects(catalog.files(), options)
}
