//! # Catalog Browser CLI
//!
//! Loads a catalog snapshot and prints the derived view and statistics.
//!
//! ## Usage
//! ```bash
//! # Browse a snapshot, sorted by name (default)
//! cargo run -p appshelf-data --bin browse -- --snapshot ./fixtures/catalog.json
//!
//! # Search, filter and sort
//! cargo run -p appshelf-data --bin browse -- --snapshot ./catalog.json \
//!     --search notes --category productivity --type pro --sort downloads
//!
//! # Snapshot path from config / environment instead
//! APPSHELF_SNAPSHOT=./catalog.json cargo run -p appshelf-data --bin browse
//! ```
//!
//! Log verbosity follows `RUST_LOG` (default `info,appshelf=debug`).

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::error;
use tracing_subscriber::EnvFilter;

use appshelf_core::SortKey;
use appshelf_data::{Catalog, DataConfig, StaticIdentity};

struct Options {
    config: Option<PathBuf>,
    snapshot: Option<PathBuf>,
    search: Option<String>,
    category: Option<String>,
    app_type: Option<String>,
    sort: Option<SortKey>,
}

fn print_usage() {
    println!("AppShelf Catalog Browser");
    println!();
    println!("Usage: browse [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -s, --snapshot <PATH>   Catalog snapshot JSON file");
    println!("  -c, --config <PATH>     Config file (default: platform config dir)");
    println!("      --search <TERM>     Case-insensitive search term");
    println!("      --category <NAME>   Category filter (default: all)");
    println!("      --type <TYPE>       App type filter: open_source | pro | all");
    println!("      --sort <KEY>        name | downloads | updated | price");
    println!("  -h, --help              Show this help message");
}

fn parse_args() -> Option<Options> {
    let args: Vec<String> = env::args().collect();
    let mut options = Options {
        config: None,
        snapshot: None,
        search: None,
        category: None,
        app_type: None,
        sort: None,
    };

    let mut i = 1;
    while i < args.len() {
        let value = args.get(i + 1).cloned();
        match args[i].as_str() {
            "--snapshot" | "-s" => options.snapshot = value.map(PathBuf::from),
            "--config" | "-c" => options.config = value.map(PathBuf::from),
            "--search" => options.search = value,
            "--category" => options.category = value,
            "--type" => options.app_type = value,
            "--sort" => options.sort = value.as_deref().map(SortKey::parse),
            "--help" | "-h" => {
                print_usage();
                return None;
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                print_usage();
                return None;
            }
        }
        i += 2;
    }

    Some(options)
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,appshelf=debug")),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let Some(options) = parse_args() else {
        return Ok(());
    };

    let mut config = DataConfig::load(options.config)?;
    if options.snapshot.is_some() {
        config.source.snapshot_path = options.snapshot;
    }

    let catalog = Catalog::from_config(&config, Arc::new(StaticIdentity::anonymous()))?;
    let mut browser = catalog.browser();
    browser.load().await;

    let state = browser.state();
    if let Some(err) = state.error {
        error!(error = %err, "Failed to load applications");
        return Err(err.into());
    }

    if let Some(term) = options.search {
        browser.set_search_term(term);
    }
    if let Some(category) = options.category {
        browser.set_category(category);
    }
    if let Some(sort) = options.sort {
        browser.set_sort(sort);
    }
    browser.set_app_type_filter(options.app_type);

    let view = browser.view();
    println!("Query: {}", serde_json::to_string(browser.query_state())?);
    println!();
    for app in &view {
        println!(
            "  {:<32} {:<16} {:<12} {:>10}",
            app.name,
            app.category.as_deref().unwrap_or("-"),
            app.app_type.map(|t| t.as_str()).unwrap_or("-"),
            app.downloads()
        );
    }
    println!();
    println!("{} of {} applications", view.len(), browser.stats().total_apps);
    println!("Categories: {}", browser.categories().join(", "));

    let stats = browser.stats();
    println!();
    println!("Total downloads:  {}", stats.total_downloads);
    println!("Open source apps: {}", stats.open_source_apps);
    println!("Pro apps:         {}", stats.pro_apps);
    println!("Est. revenue:     {}", stats.total_revenue);

    Ok(())
}
