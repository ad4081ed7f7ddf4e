//! # mdbl - MDBL Interactive Shell
//!
//! A REPL for managing the tables of a flat-file MDBL database. Reads
//! commands from stdin, prints results to stdout, and logs to stderr.
//! Works interactively or with commands piped in.
//!
//! ## Commands
//!
//! ```text
//! CREATE name [field ...]   Create a table (no fields: enter them one per line, ':d' ends, ':q' aborts)
//! DELETE name [name ...]    Delete tables (registry line first, then folder)
//! LIST                      List tables in registry order
//! DESCRIBE name             Show one table
//! SETUP user pass confirm   Write credentials and database.mdb
//! EXIT / QUIT               Leave the shell
//! ```
//!
//! ## Configuration
//!
//! ```text
//! MDBL_ROOT            parent directory of databases   (default: ".")
//! MDBL_DATABASE        database name                   (default: "MDBL")
//! MDBL_REQUIRE_FIELDS  reject tables with zero fields  (default: "true")
//! MDBL_SYNC            fsync every registry write      (default: "true")
//! MDBL_LOG             log filter                      (default: "warn")
//! ```
//!
//! ## Exit Status
//!
//! `0` if every command succeeded, `1` if any printed `ERR`.
//!
//! ## Example
//!
//! ```text
//! $ cargo run -p mdbl-cli
//! MDBL started (database=./MDBL, tables=0)
//! > CREATE orders id total
//! OK orders (id, total) -> ./MDBL/tables/orders
//! > LIST
//! orders (id, total) -> ./MDBL/tables/orders
//! (1 tables)
//! > EXIT
//! bye
//! ```
mod shell;

use anyhow::{Context, Result};
use catalog::{CatalogOptions, TableCatalog};
use config::{Config, DEFAULT_LOG_FILTER};
use shell::Shell;
use std::io;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_logging(cfg: &Config) {
    let filter = EnvFilter::try_new(&cfg.log_filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(io::stderr)
                .with_level(true)
                .with_target(false),
        )
        .init();
}

fn main() -> Result<()> {
    let cfg = Config::from_env();
    init_logging(&cfg);

    let database_dir = cfg.database_dir();
    let catalog = TableCatalog::open(&database_dir, CatalogOptions::from(&cfg))
        .with_context(|| format!("failed to open database at {}", database_dir.display()))?;
    let table_count = catalog
        .list_tables()
        .context("failed to read table registry")?
        .tables
        .len();

    println!(
        "MDBL started (database={}, tables={})",
        database_dir.display(),
        table_count
    );
    println!("Type HELP for commands.");

    let mut shell = Shell::new(catalog, &cfg);
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    shell.run(stdin.lock(), &mut stdout)?;

    if shell.failures() > 0 {
        std::process::exit(1);
    }
    Ok(())
}
