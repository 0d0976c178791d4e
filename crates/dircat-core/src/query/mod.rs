/// The query pipeline: filter, then sort, then paginate.
///
/// Options are parsed once into [`QueryOptions`]; every stage works on
/// resolved [`Item`]s and never touches the stored nodes.
pub mod filter;
pub mod matching;
pub mod options;
pub mod page;
pub mod sort;

pub use matching::{normalize, MatchMode, Predicate};
pub use options::{GroupFilter, QueryOptions, SortDirection, SortSpec, DEFAULT_GROUP_FIELDS};
pub use page::{paginate, Page};

use crate::catalog::Item;

/// Run the full pipeline over already-resolved items.
pub fn run(items: Vec<Item>, options: &QueryOptions) -> Page {
    let items = filter::filter(items, options);
    let items = match &options.sort {
        Some(spec) => sort::sort(items, spec),
        None => items,
    };
    paginate(items, options.offset, options.limit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NodeId, NodeKind};
    use compact_str::CompactString;

    fn item(name: &str) -> Item {
        Item {
            id: NodeId::compose("word", name),
            kind: NodeKind::parse("word"),
            name: CompactString::new(name),
            path: None,
            fields: Default::default(),
        }
    }

    #[test]
    fn stages_apply_in_order() {
        let items = ["cobalt", "Catalog", "concat", "cat-file", "cattle", "dog"]
            .into_iter()
            .map(item)
            .collect();
        let options = QueryOptions::default()
            .with_keyword("cat", MatchMode::Prefix)
            .sorted_by("name", SortDirection::Asc)
            .page(2, 1);

        let page = run(items, &options);
        let names: Vec<_> = page.items.iter().map(|i| i.name.as_str()).collect();
        // Matches sorted by normalized name: "cat file", "catalog", "cattle".
        assert_eq!(names, vec!["Catalog", "cattle"]);
        assert_eq!(page.total, 3);
    }

    #[test]
    fn no_options_returns_input_unchanged() {
        let items: Vec<Item> = ["b", "a"].into_iter().map(item).collect();
        let page = run(items.clone(), &QueryOptions::default());
        assert_eq!(page.items, items);
    }
}
