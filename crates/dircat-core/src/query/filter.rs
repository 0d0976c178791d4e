/// Predicate filtering over resolved items.
use super::options::{GroupFilter, QueryOptions};
use crate::catalog::Item;

/// Keep the items that satisfy every predicate in `options` (logical AND).
/// Predicates that are absent are not applied.
pub fn filter(items: Vec<Item>, options: &QueryOptions) -> Vec<Item> {
    if options.groups.is_empty() && options.keyword.is_none() {
        return items;
    }
    items
        .into_iter()
        .filter(|item| retains(item, options))
        .collect()
}

fn retains(item: &Item, options: &QueryOptions) -> bool {
    if !options.groups.iter().all(|group| group_matches(item, group)) {
        return false;
    }
    match &options.keyword {
        Some(keyword) => keyword.matches(&item.name),
        None => true,
    }
}

/// The item needs a non-empty `<field>s` array with at least one entry whose
/// name matches. Entries without a name never match, in any mode.
fn group_matches(item: &Item, group: &GroupFilter) -> bool {
    let Some(entries) = item.list(&group.list_field()) else {
        return false;
    };
    entries
        .iter()
        .filter_map(|entry| entry.name())
        .any(|name| group.predicate.matches(name))
}
