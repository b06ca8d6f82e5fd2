//! # irhubd — irhub daemon
//!
//! Composition root that wires all adapters together and starts the server.
//!
//! ## Responsibilities
//! - Load configuration (config file, env vars)
//! - Install the `tracing` subscriber
//! - Load the command document through the JSON file store
//! - Register code extraction strategies (Broadlink, then virtual)
//! - Build the axum router around the remote service
//! - Bind to a TCP port and serve until SIGINT/SIGTERM
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;

use std::sync::Arc;

use irhub_adapter_broadlink::BroadlinkExtractor;
use irhub_adapter_http_axum::state::AppState;
use irhub_adapter_storage_json::JsonFileStore;
use irhub_adapter_virtual::VirtualBlaster;
use irhub_app::services::command_store::CommandStore;
use irhub_app::services::extraction_registry::ExtractorRegistry;
use irhub_app::services::remote_service::RemoteService;
use tracing_subscriber::EnvFilter;

use crate::config::{BlasterKind, Config};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.logging.filter)?)
        .init();

    // Storage
    tracing::info!(path = %config.storage.path.display(), "opening command store");
    let store = CommandStore::load(JsonFileStore::new(&config.storage.path)).await?;

    // Blaster
    let blaster = match config.blaster.kind {
        BlasterKind::Virtual => Arc::new(virtual_blaster(&config)),
    };

    // Extraction
    let mut registry = ExtractorRegistry::new();
    if !config.broadlink.blasters.is_empty() {
        let mut broadlink = BroadlinkExtractor::new(&config.broadlink.storage_dir);
        for (blaster_ref, mac) in &config.broadlink.blasters {
            broadlink = broadlink.with_blaster(blaster_ref.as_str(), mac)?;
        }
        registry.register(Arc::new(broadlink));
    }
    registry.register(blaster.clone());

    // HTTP
    let state = AppState::new(RemoteService::new(store, blaster, registry));
    let app = irhub_adapter_http_axum::router::build(state);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "irhubd listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("irhubd stopped");
    Ok(())
}

fn virtual_blaster(config: &Config) -> VirtualBlaster {
    config.blaster.blasters.iter().fold(
        VirtualBlaster::new()
            .with_auto_code(config.blaster.auto_code)
            .with_capture_delay(config.blaster.capture_delay()),
        |blaster, reference| blaster.with_blaster(reference.as_str()),
    )
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
