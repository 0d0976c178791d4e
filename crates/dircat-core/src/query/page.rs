/// Offset/limit windowing of query results.
use crate::catalog::Item;
use serde::Serialize;

/// One window of a query result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    pub items: Vec<Item>,
    pub offset: usize,
    /// Requested page size; 0 means unlimited.
    pub limit: usize,
    /// Number of items that matched before windowing.
    pub total: usize,
}

impl Page {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether more matches follow this window.
    pub fn has_more(&self) -> bool {
        self.offset.saturating_add(self.items.len()) < self.total
    }
}

/// Skip `offset` items, then keep at most `limit` (all of them if 0).
pub fn paginate(items: Vec<Item>, offset: usize, limit: usize) -> Page {
    let total = items.len();
    let take = if limit == 0 { usize::MAX } else { limit };
    Page {
        items: items.into_iter().skip(offset).take(take).collect(),
        offset,
        limit,
        total,
    }
}
