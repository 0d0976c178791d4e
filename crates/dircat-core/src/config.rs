/// Runtime configuration read from environment-style variables.
use crate::error::Result;
use crate::modules::{ExtensionModule, ModuleRegistry};
use crate::query::DEFAULT_GROUP_FIELDS;
use crate::scanner::{ErrorPolicy, ScanOptions};
use std::path::PathBuf;

pub const DATA_PATH: &str = "DATA_PATH";
pub const GZIP: &str = "GZIP";
pub const CATALOG_MODULES: &str = "CATALOG_MODULES";
pub const CATALOG_GROUP_FIELDS: &str = "CATALOG_GROUP_FIELDS";
pub const SCAN_SKIP_ERRORS: &str = "SCAN_SKIP_ERRORS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    /// Directory holding `catalog.json` / `catalog.json.gz`.
    pub data_dir: PathBuf,
    /// Save as gzip.
    pub compress: bool,
    /// Extension module names, in run order.
    pub modules: Vec<String>,
    /// Singular names of the array fields queries can filter on.
    pub group_fields: Vec<String>,
    pub error_policy: ErrorPolicy,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            compress: false,
            modules: Vec::new(),
            group_fields: DEFAULT_GROUP_FIELDS.iter().map(|f| f.to_string()).collect(),
            error_policy: ErrorPolicy::default(),
        }
    }
}

impl CatalogConfig {
    /// Read the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key → value lookup. Unset keys keep their
    /// defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(dir) = lookup(DATA_PATH).filter(|dir| !dir.trim().is_empty()) {
            config.data_dir = PathBuf::from(dir);
        }
        config.compress = lookup(GZIP).is_some_and(|value| parse_flag(&value));
        if let Some(names) = lookup(CATALOG_MODULES) {
            config.modules = split_list(&names);
        }
        if let Some(fields) = lookup(CATALOG_GROUP_FIELDS) {
            let fields = split_list(&fields);
            if !fields.is_empty() {
                config.group_fields = fields;
            }
        }
        if lookup(SCAN_SKIP_ERRORS).is_some_and(|value| parse_flag(&value)) {
            config.error_policy = ErrorPolicy::Skip;
        }
        config
    }

    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            error_policy: self.error_policy,
        }
    }

    /// Instantiate the configured modules from `registry`.
    pub fn resolve_modules(&self, registry: &ModuleRegistry) -> Result<Vec<Box<dyn ExtensionModule>>> {
        registry.resolve(&self.modules)
    }
}

/// On unless empty or one of `false`, `0`, `no`, `off` (any case).
pub fn parse_flag(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty()
        && !["false", "0", "no", "off"]
            .iter()
            .any(|off| value.eq_ignore_ascii_case(off))
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_owned)
        .collect()
}
