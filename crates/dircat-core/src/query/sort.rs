/// Ordering of resolved items by a single field.
use super::matching::normalize;
use super::options::{SortDirection, SortSpec};
use crate::catalog::{Field, FieldRef, Item};
use serde_json::Value;
use std::cmp::Ordering;

/// Comparable form of one item's sort field.
#[derive(Debug, Clone, PartialEq)]
enum SortKey {
    Number(f64),
    Text(String),
}

impl SortKey {
    /// Numbers order before text.
    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Number(_), Self::Text(_)) => Ordering::Less,
            (Self::Text(_), Self::Number(_)) => Ordering::Greater,
        }
    }
}

/// Sort key of `item`; `None` when the field is absent, null or empty.
fn key_of(item: &Item, field: &str) -> Option<SortKey> {
    match item.get(field)? {
        FieldRef::Text(text) => text_key(text),
        FieldRef::Field(Field::Value(value)) => value_key(value),
        FieldRef::Field(Field::List(entries)) => {
            let joined = entries
                .iter()
                .map(|entry| entry.sort_text())
                .collect::<Vec<_>>()
                .join(",");
            text_key(&joined)
        }
    }
}

/// Text compares in normalized form; text that normalizes to nothing is
/// missing.
fn text_key(text: &str) -> Option<SortKey> {
    let normalized = normalize(text);
    (!normalized.is_empty()).then_some(SortKey::Text(normalized))
}

fn value_key(value: &Value) -> Option<SortKey> {
    match value {
        Value::Null => None,
        Value::Number(number) => number.as_f64().map(SortKey::Number),
        Value::String(text) => text_key(text),
        Value::Bool(flag) => text_key(&flag.to_string()),
        Value::Object(object) => match object.get("name").and_then(Value::as_str) {
            Some(name) => text_key(name),
            None => text_key(&value.to_string()),
        },
        Value::Array(_) => text_key(&value.to_string()),
    }
}

/// Stable sort of `items` by `spec`.
///
/// Items missing the field come first in ascending order and last in
/// descending order. Items with equal keys keep their relative order.
pub fn sort(items: Vec<Item>, spec: &SortSpec) -> Vec<Item> {
    let mut keyed: Vec<(Option<SortKey>, Item)> = items
        .into_iter()
        .map(|item| (key_of(&item, &spec.field), item))
        .collect();

    keyed.sort_by(|(a, _), (b, _)| {
        let ordering = match (a, b) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(a), Some(b)) => a.compare(b),
        };
        match spec.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });

    keyed.into_iter().map(|(_, item)| item).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Entry, Summary};
    use crate::model::{NodeId, NodeKind};
    use compact_str::CompactString;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn item(id: &str, name: &str, fields: &[(&str, Field)]) -> Item {
        Item {
            id: NodeId::new(id),
            kind: NodeKind::parse("track"),
            name: CompactString::new(name),
            path: None,
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    fn ids(items: &[Item]) -> Vec<&str> {
        items.iter().map(|i| i.id.as_str()).collect()
    }

    fn spec(field: &str, direction: SortDirection) -> SortSpec {
        SortSpec {
            field: field.to_owned(),
            direction,
        }
    }

    #[test]
    fn names_sort_case_insensitively_with_missing_first() {
        let items = vec![item("b", "B", &[]), item("a", "a", &[]), item("none", "", &[])];

        let asc = sort(items.clone(), &spec("name", SortDirection::Asc));
        assert_eq!(ids(&asc), vec!["none", "a", "b"]);

        let desc = sort(items, &spec("name", SortDirection::Desc));
        assert_eq!(ids(&desc), vec!["b", "a", "none"]);
    }

    #[test]
    fn numbers_compare_numerically_and_before_text() {
        let size = |v: Value| [("size", Field::Value(v))];
        let items = vec![
            item("ten", "x", &size(json!(10))),
            item("two", "x", &size(json!(2))),
            item("text", "x", &size(json!("big"))),
            item("half", "x", &size(json!(0.5))),
            item("null", "x", &size(Value::Null)),
        ];
        let items = sort(items, &spec("size", SortDirection::Asc));
        assert_eq!(ids(&items), vec!["null", "half", "two", "ten", "text"]);
    }

    #[test]
    fn equal_keys_keep_input_order() {
        let year = |y: u64| [("year", Field::Value(json!(y)))];
        let items = vec![
            item("first", "x", &year(1959)),
            item("second", "x", &year(1959)),
            item("third", "x", &year(1958)),
            item("fourth", "x", &year(1959)),
        ];
        let asc = sort(items.clone(), &spec("year", SortDirection::Asc));
        assert_eq!(ids(&asc), vec!["third", "first", "second", "fourth"]);
        let items = sort(items, &spec("year", SortDirection::Desc));
        assert_eq!(ids(&items), vec!["first", "second", "fourth", "third"]);
    }

    #[test]
    fn list_fields_sort_by_joined_names() {
        let artists = |names: &[&str]| {
            [(
                "artists",
                Field::List(
                    names
                        .iter()
                        .map(|name| {
                            Entry::Summary(Summary {
                                id: NodeId::compose("artist", name),
                                kind: NodeKind::parse("artist"),
                                name: CompactString::new(name),
                            })
                        })
                        .collect(),
                ),
            )]
        };
        let items = vec![
            item("z", "x", &artists(&["Zawinul"])),
            item("ab", "x", &artists(&["Adderley", "Bill Evans"])),
            item("empty", "x", &artists(&[])),
        ];
        let items = sort(items, &spec("artists", SortDirection::Asc));
        assert_eq!(ids(&items), vec!["empty", "ab", "z"]);
    }

    #[test]
    fn sorting_is_idempotent() {
        let items = vec![item("b", "B", &[]), item("a", "a", &[]), item("c", "C", &[])];
        let order = spec("name", SortDirection::Desc);
        let once = sort(items, &order);
        let twice = sort(once.clone(), &order);
        assert_eq!(once, twice);
    }
}
