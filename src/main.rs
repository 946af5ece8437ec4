// region:    --- Imports
use auction_board::auction::AuctionService;
use auction_board::config::{Config, StoreBackend};
use auction_board::database::DatabaseManager;
use auction_board::handlers;
use auction_board::store::{AuctionStore, InMemoryAuctionStore, PostgresAuctionStore};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};
// endregion: --- Imports

// region:    --- Main
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .without_time()
        .with_target(false)
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{:<12} --> Invalid configuration: {}", "Main", e);
            return Err(e.into());
        }
    };

    let store = open_store(&config).await?;
    let service = AuctionService::new(Arc::clone(&store));
    let routes_all = handlers::routes(service);

    let listener = TcpListener::bind(config.bind_addr()).await?;
    info!(
        "{:<12} --> Web Server: Listening on {}",
        "Main",
        listener.local_addr()?
    );

    let served = axum::serve(listener, routes_all.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await;
    if let Err(err) = &served {
        error!("{:<12} --> Server error: {}", "Main", err);
    }

    store.close().await;
    info!("{:<12} --> Shutdown complete", "Main");
    Ok(served?)
}

/// Opens the configured store; the handle lives until shutdown.
async fn open_store(config: &Config) -> Result<Arc<dyn AuctionStore>, Box<dyn std::error::Error>> {
    match config.backend {
        StoreBackend::Memory => {
            info!("{:<12} --> Using in-memory store", "Main");
            let store: Arc<dyn AuctionStore> = Arc::new(InMemoryAuctionStore::new());
            Ok(store)
        }
        StoreBackend::Postgres => {
            let db_manager = Arc::new(DatabaseManager::connect(config).await?);
            if let Err(e) = db_manager.initialize_database().await {
                error!("{:<12} --> Database initialization failed: {:?}", "Main", e);
                db_manager.close().await;
                return Err(e.into());
            }
            info!("{:<12} --> Database initialized", "Main");
            let store: Arc<dyn AuctionStore> = Arc::new(PostgresAuctionStore::new(db_manager));
            Ok(store)
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("{:<12} --> Failed to listen for Ctrl-C: {}", "Main", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("{:<12} --> Failed to listen for SIGTERM: {}", "Main", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("{:<12} --> Shutdown signal received", "Main");
}
// endregion: --- Main
