//! `staykey sync`: one-shot reconciliation over configured apartments.
//!
//! Loads the TOML config, mirrors its apartments into a fresh in-memory
//! store, pulls every feed once, and prints the sync report as JSON. A
//! dry-run probe: nothing persists beyond the process.

use std::path::Path;
use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use staykey_engine::{MemoryStore, ReconcileConfig, ReconcileEngine, Store};
use staykey_providers::{FeedFetcherConfig, HttpFeedSource};

use crate::config::CliConfig;
use crate::error::{CliError, CliResult};

/// Runs the sync and prints the report.
pub async fn run(config_path: &Path, apartment_filter: Option<&str>) -> CliResult<()> {
    let config = CliConfig::load_from(config_path)?;
    if config.apartments.is_empty() {
        return Err(CliError::Config("no apartments configured".into()));
    }

    let store = Arc::new(MemoryStore::new());
    let owner_id = Uuid::new_v4();

    let mut selected = None;
    for entry in &config.apartments {
        let apartment = store.insert_apartment(entry.to_apartment(owner_id))?;
        if apartment_filter.is_some_and(|name| name == apartment.name) {
            selected = Some(apartment.id);
        }
    }
    if let Some(name) = apartment_filter
        && selected.is_none()
    {
        return Err(CliError::Config(format!(
            "no apartment named \"{name}\" in the config"
        )));
    }

    let feeds = Arc::new(HttpFeedSource::new(FeedFetcherConfig::default())?);
    let mut reconcile_config = ReconcileConfig::default();
    if let Some(secret) = config.sync_secret {
        reconcile_config = reconcile_config.with_sync_secret(secret);
    }
    let engine = ReconcileEngine::new(store, feeds, reconcile_config);

    if let Some(apartment_id) = selected {
        info!(%apartment_id, "syncing one apartment");
        let report = engine.sync_apartment(apartment_id).await?;
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        let summary = engine.sync_all().await?;
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }
    Ok(())
}
