use std::{fs::File, sync::Arc};

use anyhow::{Context, Result};
use serde_json::Map;
use tracing::info;
use tracing_subscriber::EnvFilter;

use refpicker::{
    ReferencePicker, Startup, UiOptions,
    app::sample,
    binder::{CancelToken, DevHost, ExtensionHost, report_failure},
    domain::FieldConfig,
    initialize,
    notify::Notification,
    query::{ListingSource, MemorySource},
};

const LOG_FILE_VAR: &str = "REFPICKER_LOG";
const DEFAULT_LOG_FILE: &str = "refpicker.log";

fn main() -> Result<()> {
    init_tracing()?;

    let mut host = DevHost::from_env()?;
    if host.field_config().as_object().is_some_and(Map::is_empty) {
        info!("no REFPICKER_* configuration found; using the offline demo");
        host = sample::demo_host();
    }

    let cancel = CancelToken::new();
    let session = match initialize(|| Ok(host.clone()), &cancel) {
        Startup::Ready(session) => session,
        Startup::Failed(err) => {
            let mut stderr = |note: Notification| {
                eprintln!("{}: {}", note.title, note.description);
            };
            report_failure(&err, &mut stderr);
            return Err(err.into());
        }
        Startup::Cancelled => return Ok(()),
    };

    let source = listing_source(&session.config);
    let value = ReferencePicker::new(session, source)
        .with_options(UiOptions::default())
        .run()?;

    println!(
        "{}",
        serde_json::to_string_pretty(&value.to_stored()).context("failed to render the value")?
    );
    Ok(())
}

fn init_tracing() -> Result<()> {
    let path = std::env::var(LOG_FILE_VAR).unwrap_or_else(|_| DEFAULT_LOG_FILE.to_string());
    let file = File::create(&path).with_context(|| format!("failed to create log file {path}"))?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn listing_source(config: &FieldConfig) -> Arc<dyn ListingSource + Send + Sync> {
    if config.api_key == sample::DEMO_API_KEY {
        return Arc::new(MemorySource::new(sample::demo_entries()));
    }

    #[cfg(feature = "http")]
    {
        use refpicker::query::{DeliveryApi, HttpListingSource};
        let api = DeliveryApi::from_config(config);
        info!(host = api.host(), "listing entries from the delivery API");
        Arc::new(HttpListingSource::new(api))
    }

    #[cfg(not(feature = "http"))]
    {
        tracing::warn!("built without the `http` feature; listing the offline demo entries");
        Arc::new(MemorySource::new(sample::demo_entries()))
    }
}
