/// Text normalization and the match modes used by filters.
use serde::Serialize;

/// Lower-case, collapse every run of non-alphanumeric characters (and `_`)
/// into one space, trim.
///
/// `"Hello__World!!"` and `"hello world"` normalize to the same string.
/// Letters and digits of any script count as alphanumeric. Accents are kept
/// as written, so `é` never matches `e`.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;
    for ch in text.chars() {
        if ch.is_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.extend(ch.to_lowercase());
        } else {
            pending_space = true;
        }
    }
    out
}

/// How a filter value is compared with a candidate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    #[default]
    Exact,
    Prefix,
    Suffix,
    Contains,
    Excludes,
}

impl MatchMode {
    /// Parse a `<field>Match` option. The value is normalized first, so
    /// `"Starts"` and `" start "` both select [`MatchMode::Prefix`]. Anything
    /// unrecognized means exact equality.
    pub fn parse(mode: &str) -> Self {
        match normalize(mode).as_str() {
            "start" | "starts" => Self::Prefix,
            "end" | "ends" => Self::Suffix,
            "contain" | "contains" => Self::Contains,
            "exclude" | "excludes" => Self::Excludes,
            _ => Self::Exact,
        }
    }
}

/// A normalized filter value plus its match mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Predicate {
    needle: String,
    mode: MatchMode,
}

impl Predicate {
    pub fn new(value: &str, mode: MatchMode) -> Self {
        Self {
            needle: normalize(value),
            mode,
        }
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    /// The normalized filter value.
    pub fn needle(&self) -> &str {
        &self.needle
    }

    /// Normalize `candidate` and compare it with the needle.
    pub fn matches(&self, candidate: &str) -> bool {
        let candidate = normalize(candidate);
        let needle = self.needle.as_str();
        match self.mode {
            MatchMode::Exact => candidate == needle,
            MatchMode::Prefix => candidate.starts_with(needle),
            MatchMode::Suffix => candidate.ends_with(needle),
            MatchMode::Contains => candidate.contains(needle),
            MatchMode::Excludes => !candidate.contains(needle),
        }
    }
}
