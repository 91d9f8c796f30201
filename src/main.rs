mod config;
mod export;
mod ledger;
mod logging;
mod models;
mod run;
mod store;
mod ui;

use anyhow::{Context, Result};

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let config = config::Config::load()?;
    if let Err(e) = logging::init(&config) {
        eprintln!("Warning: {e:#}");
    }

    let db = store::Database::open(&config.db_path)
        .with_context(|| format!("Failed to open {}", config.db_path.display()))?;
    let mut ledger = ledger::Ledger::open(db)?;

    match args.len() {
        1 => run::as_tui(&mut ledger, &config.currency),
        _ => run::as_cli(&args, &mut ledger, &config.currency),
    }
}
