use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::{Parser, Subcommand};
use heapdb_storage::{Config, Database, StatisticsRegistry, TableStatistics};
use heapdb_types::SqlValue;
use tracing::info;

mod convert;
mod predicate;

use predicate::Predicate;

#[derive(Parser, Debug)]
#[command(name = "heapdb")]
#[command(version)]
#[command(about = "Heap file and table statistics tools")]
#[command(long_about = "heapdb command-line tools

EXAMPLES:
  # Turn comma-separated rows into a heap file
  heapdb convert --input users.txt --types int,string --output users.dat

  # Compute statistics for every table in a catalog
  heapdb stats --catalog catalog.txt

  # Estimate predicate selectivity
  heapdb stats --catalog catalog.txt --estimate \"users.id > 100\"

LOGGING:
  Set RUST_LOG (e.g. RUST_LOG=heapdb_storage=debug) or logging.level in the
  configuration file.")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert comma-separated text rows into a heap file
    Convert {
        /// Text file with one comma-separated row per line
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Column types, e.g. int,string
        #[arg(short, long, value_name = "TYPES")]
        types: String,

        /// Heap file to write
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },

    /// Compute table statistics and print estimates
    Stats {
        /// Catalog schema file; table data lives next to it as <table>.dat
        #[arg(short, long, value_name = "FILE")]
        catalog: PathBuf,

        /// Configuration file (TOML)
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Only report this table
        #[arg(long, value_name = "NAME")]
        table: Option<String>,

        /// Predicate to estimate, e.g. "users.id > 100" (repeatable)
        #[arg(short, long, value_name = "PREDICATE")]
        estimate: Vec<Predicate>,
    },
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = match &args.command {
        Command::Stats { config: Some(path), .. } => Config::load_from(path)
            .with_context(|| format!("Failed to load config '{}'", path.display()))?,
        _ => Config::default(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(config.logging.level.to_lowercase())
            }),
        )
        .with_writer(std::io::stderr)
        .try_init()
        .ok();

    match args.command {
        Command::Convert { input, types, output } => {
            let types = convert::parse_types(&types)?;
            let (tuples, pages) = convert::convert(&input, &types, &output)?;
            println!("Wrote {} tuples in {} pages to '{}'", tuples, pages, output.display());
        }
        Command::Stats { catalog, table, estimate, .. } => {
            run_stats(&config, &catalog, table.as_deref(), &estimate)?;
        }
    }
    Ok(())
}

fn run_stats(
    config: &Config,
    catalog: &std::path::Path,
    only_table: Option<&str>,
    estimates: &[Predicate],
) -> anyhow::Result<()> {
    let db = Database::open_catalog(catalog, &config.storage)
        .with_context(|| format!("Failed to open catalog '{}'", catalog.display()))?;
    info!(tables = db.catalog().len(), "opened catalog");

    let registry = StatisticsRegistry::global();
    let report = registry.recompute_all(&db, &config.statistics)?;
    for (name, err) in &report.failed {
        eprintln!("{}: statistics unavailable: {}", name, err);
    }

    for stats in selected_tables(registry, only_table)? {
        print_summary(&stats);
    }

    for predicate in estimates {
        let stats = registry
            .lookup(&predicate.table)
            .with_context(|| format!("No statistics for table '{}'", predicate.table))?;
        let column = stats.schema().column_index(&predicate.column).with_context(|| {
            format!("Table '{}' has no column '{}'", predicate.table, predicate.column)
        })?;
        let data_type = stats.schema().columns[column].data_type;
        let literal = SqlValue::parse_as(&predicate.literal, &data_type).with_context(|| {
            format!("'{}' is not a valid {} literal", predicate.literal, data_type)
        })?;

        let selectivity = stats.estimate_selectivity(column, predicate.op, &literal)?;
        println!(
            "{}.{} {} {}: selectivity {:.4}, ~{} rows",
            predicate.table,
            predicate.column,
            predicate.op,
            literal,
            selectivity,
            stats.estimate_cardinality(selectivity)
        );
    }
    Ok(())
}

/// Statistics to report: just `only` when given, otherwise every table.
fn selected_tables(
    registry: &StatisticsRegistry,
    only: Option<&str>,
) -> anyhow::Result<Vec<Arc<TableStatistics>>> {
    match only {
        Some(name) => {
            let stats =
                registry.lookup(name).with_context(|| format!("No statistics for table '{}'", name))?;
            Ok(vec![stats])
        }
        None => Ok(registry.table_names().iter().filter_map(|name| registry.lookup(name)).collect()),
    }
}

fn print_summary(stats: &TableStatistics) {
    println!(
        "{}: {} pages, {} tuples, scan cost {:.0}",
        stats.table_name(),
        stats.page_count(),
        stats.tuple_count(),
        stats.estimate_scan_cost()
    );
}
