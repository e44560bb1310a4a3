// src/main.rs
use std::sync::Arc;

use cabinet_configurator::catalog::InMemoryCatalog;
use cabinet_configurator::config::AppConfig;
use cabinet_configurator::scene::ProceduralAssetProvider;
use cabinet_configurator::{Configurator, api, init_tracing};

#[tokio::main]
async fn main() {
    let dotenv = dotenvy::dotenv();
    init_tracing();
    if let Err(err) = dotenv {
        if !matches!(err, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
        {
            tracing::warn!(error = %err, "could not load .env");
        }
    }

    let app_config = AppConfig::from_env();
    let catalog = match InMemoryCatalog::demo() {
        Ok(catalog) => catalog,
        Err(err) => {
            tracing::error!(error = %err, "built-in catalog is invalid");
            std::process::exit(1);
        }
    };
    let assets = ProceduralAssetProvider::new(app_config.mounting.rack_unit_height);
    let configurator = Configurator::new(Arc::new(catalog), Arc::new(assets), &app_config);

    tracing::info!("cabinet configurator starting");
    if let Err(err) = api::start_api_server(app_config.api.clone(), configurator).await {
        tracing::error!(error = %err, "API server terminated with an error");
        std::process::exit(1);
    }
}
