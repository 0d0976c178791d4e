//! dircat: build a directory catalog, then query it.
//!
//! Thin binary entry point. All logic lives in the `dircat-core` crate; this
//! file only parses arguments and prints results.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use dircat_core::catalog::{Field, FieldRef, Item};
use dircat_core::config::{self, CatalogConfig};
use dircat_core::modules::ModuleRegistry;
use dircat_core::{api, Catalog, QueryOptions};
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::Level;

/// Scan folder trees into a JSON catalog and query it.
#[derive(Debug, Parser)]
#[command(name = "dircat", author, version, about, long_about = None)]
struct Cli {
    /// Directory holding catalog.json / catalog.json.gz.
    #[arg(long, global = true, env = config::DATA_PATH)]
    data_dir: Option<String>,

    /// Save the catalog gzip-compressed.
    #[arg(long, global = true, env = config::GZIP, num_args = 0..=1, default_missing_value = "true")]
    gzip: Option<String>,

    /// Comma-separated extension modules, run in order.
    #[arg(long, global = true, env = config::CATALOG_MODULES)]
    modules: Option<String>,

    /// Comma-separated fields queries can filter on.
    #[arg(long, global = true, env = config::CATALOG_GROUP_FIELDS)]
    group_fields: Option<String>,

    /// Skip unreadable entries instead of aborting the scan.
    #[arg(long, global = true, env = config::SCAN_SKIP_ERRORS, num_args = 0..=1, default_missing_value = "true")]
    skip_errors: Option<String>,

    /// More log output (-v debug, -vv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Scan root directories and save the catalog.
    Scan {
        #[arg(required = true)]
        roots: Vec<PathBuf>,
    },
    /// Print one object, references expanded.
    Get { id_or_path: String },
    /// Print a page of files, or of a folder's children.
    List {
        /// Folder id or path to list instead of all files.
        #[arg(long)]
        folder: Option<String>,
        /// Query option, e.g. `--param keyword=cat --param keywordMatch=start`.
        #[arg(long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },
    /// Print the whole catalog document.
    Dump,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Csv,
}

impl Cli {
    fn config(&self) -> CatalogConfig {
        CatalogConfig::from_lookup(|key| match key {
            config::DATA_PATH => self.data_dir.clone(),
            config::GZIP => self.gzip.clone(),
            config::CATALOG_MODULES => self.modules.clone(),
            config::CATALOG_GROUP_FIELDS => self.group_fields.clone(),
            config::SCAN_SKIP_ERRORS => self.skip_errors.clone(),
            _ => None,
        })
    }
}

fn parse_param(raw: &str) -> std::result::Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_owned(), value.to_owned())),
        _ => Err(format!("expected key=value, got {raw:?}")),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let config = cli.config();
    let registry = ModuleRegistry::with_builtin();
    let modules = config
        .resolve_modules(&registry)
        .context("resolving extension modules")?;

    match &cli.command {
        Command::Scan { roots } => {
            let (catalog, summary) = dircat_core::scan_and_save(roots.as_slice(), &modules, &config)
                .context("scan failed")?;
            println!("{summary}");
            println!(
                "{} nodes indexed, saved to {}",
                catalog.index().len(),
                config.data_dir.display()
            );
        }
        Command::Get { id_or_path } => {
            let catalog = load(&config, &modules)?;
            let item = api::files_get(&catalog, id_or_path)?;
            print_json(&item)?;
        }
        Command::List {
            folder,
            params,
            format,
        } => {
            let catalog = load(&config, &modules)?;
            let options = QueryOptions::from_params(params.iter().cloned(), &config.group_fields);
            let page = match folder {
                Some(folder) => {
                    let Some(children) = catalog.children_of(folder) else {
                        bail!("{folder} is not a known folder");
                    };
                    catalog.get_objects(children, &options)
                }
                None => api::files_list(&catalog, &options),
            };
            match format {
                OutputFormat::Json => print_json(&page)?,
                OutputFormat::Csv => print_csv(&page.items)?,
            }
        }
        Command::Dump => {
            let catalog = load(&config, &modules)?;
            print_json(catalog.document())?;
        }
    }

    Ok(())
}

fn load(
    config: &CatalogConfig,
    modules: &[Box<dyn dircat_core::modules::ExtensionModule>],
) -> Result<Catalog> {
    dircat_core::load(&config.data_dir, modules)
        .with_context(|| format!("loading catalog from {}", config.data_dir.display()))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let mut out = io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}

/// One CSV line per item: the fixed node fields only.
#[derive(Serialize)]
struct CsvRow<'a> {
    id: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
    name: &'a str,
    path: &'a str,
    size: Option<u64>,
    extension: &'a str,
    modified: &'a str,
}

fn print_csv(items: &[Item]) -> Result<()> {
    let text = |item: &Item, field: &str| -> String {
        match item.get(field) {
            Some(FieldRef::Text(text)) => text.to_owned(),
            Some(FieldRef::Field(Field::Value(value))) => {
                value.as_str().map_or_else(|| value.to_string(), str::to_owned)
            }
            _ => String::new(),
        }
    };

    let mut writer = csv::Writer::from_writer(io::stdout().lock());
    for item in items {
        let size = match item.get("size") {
            Some(FieldRef::Field(Field::Value(value))) => value.as_u64(),
            _ => None,
        };
        let (path, extension, modified) = (
            text(item, "path"),
            text(item, "extension"),
            text(item, "modified"),
        );
        writer.serialize(CsvRow {
            id: item.id.as_str(),
            kind: item.kind.as_str(),
            name: item.name.as_str(),
            path: &path,
            size,
            extension: &extension,
            modified: &modified,
        })?;
    }
    writer.flush()?;
    Ok(())
}
