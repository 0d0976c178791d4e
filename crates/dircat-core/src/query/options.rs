/// Every option a query recognizes, with its default.
///
/// Requests arrive as loose string pairs (`keyword=cat&keywordMatch=start`);
/// [`QueryOptions::from_params`] turns them into this structure once, and
/// the pipeline never looks at raw strings again. Unknown keys are ignored.
use super::matching::{MatchMode, Predicate};
use std::collections::HashMap;

/// Grouping fields recognized when none are configured.
pub const DEFAULT_GROUP_FIELDS: [&str; 4] = ["tag", "artist", "composer", "genre"];

/// A predicate on the array field `<field>s` of each item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupFilter {
    /// Singular group name, e.g. `artist`.
    pub field: String,
    pub predicate: Predicate,
}

impl GroupFilter {
    /// Name of the array field the filter inspects.
    pub fn list_field(&self) -> String {
        format!("{}s", self.field)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// `DESC` (any case) is descending; anything else ascending.
    pub fn parse(direction: &str) -> Self {
        if direction.trim().eq_ignore_ascii_case("desc") {
            Self::Desc
        } else {
            Self::Asc
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOptions {
    pub groups: Vec<GroupFilter>,
    /// Predicate on each item's own `name`.
    pub keyword: Option<Predicate>,
    pub sort: Option<SortSpec>,
    /// Page size; 0 means unlimited.
    pub limit: usize,
    pub offset: usize,
}

impl QueryOptions {
    /// Parse request parameters. Only `group_fields`, `keyword`, their
    /// `<field>Match` companions, `sort`, `sortDirection`, `limit` and
    /// `offset` are read. Empty values count as absent. A repeated key keeps
    /// its last value.
    pub fn from_params<I, K, V>(params: I, group_fields: &[String]) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let params: HashMap<String, String> = params
            .into_iter()
            .map(|(k, v)| (k.as_ref().to_owned(), v.as_ref().to_owned()))
            .collect();
        let value = |key: &str| {
            params
                .get(key)
                .map(String::as_str)
                .filter(|v| !v.is_empty())
        };
        let predicate = |key: &str| {
            value(key).map(|needle| {
                let mode = value(&format!("{key}Match")).map_or(MatchMode::Exact, MatchMode::parse);
                Predicate::new(needle, mode)
            })
        };

        let groups = group_fields
            .iter()
            .filter_map(|field| {
                predicate(field.as_str()).map(|predicate| GroupFilter {
                    field: field.clone(),
                    predicate,
                })
            })
            .collect();

        let sort = value("sort").map(|field| SortSpec {
            field: field.to_owned(),
            direction: value("sortDirection").map_or(SortDirection::Asc, SortDirection::parse),
        });

        Self {
            groups,
            keyword: predicate("keyword"),
            sort,
            limit: value("limit").map_or(0, parse_count),
            offset: value("offset").map_or(0, parse_count),
        }
    }

    pub fn with_keyword(mut self, value: &str, mode: MatchMode) -> Self {
        self.keyword = Some(Predicate::new(value, mode));
        self
    }

    pub fn with_group(mut self, field: &str, value: &str, mode: MatchMode) -> Self {
        self.groups.push(GroupFilter {
            field: field.to_owned(),
            predicate: Predicate::new(value, mode),
        });
        self
    }

    pub fn sorted_by(mut self, field: &str, direction: SortDirection) -> Self {
        self.sort = Some(SortSpec {
            field: field.to_owned(),
            direction,
        });
        self
    }

    pub fn page(mut self, limit: usize, offset: usize) -> Self {
        self.limit = limit;
        self.offset = offset;
        self
    }
}

/// Leading-integer parse: `"10"` and `"10abc"` are 10. Anything without
/// leading digits, including negatives, is 0.
fn parse_count(raw: &str) -> usize {
    let trimmed = raw.trim_start();
    let digits = trimmed
        .char_indices()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map_or(0, |(i, _)| i + 1);
    if digits == 0 {
        tracing::debug!("Ignoring non-numeric paging value {raw:?}");
        return 0;
    }
    trimmed[..digits].parse().unwrap_or(usize::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groups() -> Vec<String> {
        DEFAULT_GROUP_FIELDS.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn recognized_keys_are_parsed() {
        let options = QueryOptions::from_params(
            [
                ("artist", "Miles Davis"),
                ("artistMatch", "contains"),
                ("keyword", "blue"),
                ("sort", "size"),
                ("sortDirection", "desc"),
                ("limit", "20"),
                ("offset", "40"),
                ("unknown", "ignored"),
            ],
            &groups(),
        );

        assert_eq!(
            options.groups,
            vec![GroupFilter {
                field: "artist".into(),
                predicate: Predicate::new("Miles Davis", MatchMode::Contains),
            }]
        );
        assert_eq!(options.keyword, Some(Predicate::new("blue", MatchMode::Exact)));
        assert_eq!(
            options.sort,
            Some(SortSpec {
                field: "size".into(),
                direction: SortDirection::Desc
            })
        );
        assert_eq!((options.limit, options.offset), (20, 40));
    }

    #[test]
    fn empty_and_unknown_values_are_absent() {
        let options = QueryOptions::from_params(
            [("keyword", ""), ("genre", ""), ("shoe", "size")],
            &groups(),
        );
        assert_eq!(options, QueryOptions::default());
    }

    #[test]
    fn group_fields_are_configurable() {
        let params = [("label", "Blue Note")];
        assert!(QueryOptions::from_params(params, &groups()).groups.is_empty());

        let options = QueryOptions::from_params(params, &["label".to_string()]);
        assert_eq!(options.groups[0].list_field(), "labels");
    }

    #[test]
    fn paging_values_parse_leniently() {
        assert_eq!(parse_count("10"), 10);
        assert_eq!(parse_count(" 7items"), 7);
        assert_eq!(parse_count("-3"), 0);
        assert_eq!(parse_count("abc"), 0);
    }

    #[test]
    fn sort_direction_defaults_to_ascending() {
        assert_eq!(SortDirection::parse("DESC"), SortDirection::Desc);
        assert_eq!(SortDirection::parse("asc"), SortDirection::Asc);
        assert_eq!(SortDirection::parse("sideways"), SortDirection::Asc);
    }
}
