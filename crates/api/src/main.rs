//! API server entry point.

use std::error::Error;
use std::sync::Arc;

use api::AppState;
use api::config::{Config, LogFormat};
use catalog::{CatalogClient, CatalogSeed, HttpCatalogClient, InMemoryCatalog, TimeoutCatalog};
use event_store::{EventStore, InMemoryEventStore, PostgresEventStore};
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

type BoxError = Box<dyn Error + Send + Sync>;
type AppCatalog = TimeoutCatalog<Arc<dyn CatalogClient>>;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install SIGINT handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match config.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

/// Picks the catalog source: remote service, seed file, or the built-in seed.
async fn build_catalog(config: &Config) -> Result<AppCatalog, BoxError> {
    let inner: Arc<dyn CatalogClient> = if let Some(url) = &config.catalog_url {
        tracing::info!(%url, "using remote catalog");
        Arc::new(HttpCatalogClient::new(url.as_str())?)
    } else if let Some(path) = &config.catalog_file {
        tracing::info!(path = %path.display(), "loading catalog seed");
        Arc::new(InMemoryCatalog::from_json_file(path).await?)
    } else {
        tracing::info!("using built-in workshop catalog");
        Arc::new(InMemoryCatalog::with_seed(CatalogSeed::workshop()))
    };

    Ok(TimeoutCatalog::new(inner, config.catalog_timeout))
}

async fn serve<S>(
    config: &Config,
    event_store: S,
    catalog: AppCatalog,
    metrics_handle: PrometheusHandle,
) -> Result<(), BoxError>
where
    S: EventStore + Clone + 'static,
{
    let state = Arc::new(AppState::new(event_store, catalog));
    let app = api::create_app(state, metrics_handle);

    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server shut down gracefully");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let config = Config::from_env();
    init_tracing(&config);

    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder()?;
    let catalog = build_catalog(&config).await?;
    tracing::info!(
        timeout_ms = config.catalog_timeout.as_millis() as u64,
        "catalog calls bounded"
    );

    match &config.database_url {
        Some(url) => {
            let event_store = PostgresEventStore::connect(url).await?;
            event_store.run_migrations().await?;
            tracing::info!("using Postgres journal");
            serve(&config, event_store, catalog, metrics_handle).await
        }
        None => {
            tracing::info!("using in-memory journal");
            serve(&config, InMemoryEventStore::new(), catalog, metrics_handle).await
        }
    }
}
