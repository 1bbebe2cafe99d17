use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::commands::resolve_config;
use crate::store::DocumentStore;

pub fn run(args: StatusArgs) -> Result<()> {
    let config = resolve_config(&args.store)?;
    let db_path = &config.store.db_path;

    info!(db_path = %db_path.display(), "status requested");

    if !db_path.exists() {
        warn!(path = %db_path.display(), "document store missing");
        return Ok(());
    }

    let store = DocumentStore::open_read_only(db_path)
        .with_context(|| format!("failed to open {}", db_path.display()))?;
    let counts = store
        .collection_counts()
        .context("failed to count documents")?;

    for expected in [
        &config.store.reports_collection,
        &config.store.logs_collection,
        &config.store.forms_collection,
    ] {
        if !counts.iter().any(|(collection, _)| collection == expected) {
            warn!(collection = %expected, "configured collection is empty");
        }
    }

    for (collection, documents) in &counts {
        info!(collection = %collection, documents, "collection status");
    }

    Ok(())
}
