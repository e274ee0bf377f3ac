use nh_server::{
    CONNECTION_DRAIN_TIMEOUT, broker_options, build_app_state, build_router, drain_and_close,
    logger, open_pool,
};

use nh_db::TenantRepository;
use nh_ws::ShutdownCoordinator;

use std::error::Error;
use std::sync::Arc;

use log::{error, info, warn};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    if let Err(e) = dotenvy::dotenv()
        && !e.not_found()
    {
        eprintln!("Failed to read .env file: {e}");
    }

    // Load and validate configuration
    let config = nh_config::Config::load()?;
    config.validate()?;

    // Initialize logger (before any other logging)
    logger::initialize(
        config.logging.level,
        config.log_file_path()?,
        config.logging.colored,
    )?;

    info!("Starting nh-server v{}", env!("CARGO_PKG_VERSION"));
    config.log_summary();

    let pool = open_pool(&config.database_path()?).await?;
    let directory = Arc::new(
        TenantRepository::new(pool).with_owner_limit(config.gateway.max_tenants_per_owner),
    );

    info!("Connecting broker link...");
    let broker = nh_broker::connect(&config.broker.url, broker_options(&config)).await?;
    if !broker.is_connected() {
        warn!("Broker link not connected yet, subscriptions will wait for it");
    }

    let shutdown = ShutdownCoordinator::new();
    let app_state = build_app_state(&config, directory, broker.clone(), shutdown.clone());
    let connections = app_state.registry.clone();
    let app = build_router(app_state);

    let listener = TcpListener::bind(config.bind_addr()).await?;
    info!("Server listening on {}", listener.local_addr()?);

    // Spawn signal handler for graceful shutdown
    let shutdown_for_signal = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received SIGINT (Ctrl+C), initiating graceful shutdown");
                shutdown_for_signal.shutdown();
            }
            Err(e) => error!("Failed to listen for SIGINT: {}", e),
        }
    });

    info!("Server ready to accept connections");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.subscribe_guard().signalled())
        .await?;

    // Upgraded sockets outlive serve; their channel cleanup needs the broker
    drain_and_close(&connections, broker.as_ref(), CONNECTION_DRAIN_TIMEOUT).await;
    info!("Graceful shutdown complete");

    Ok(())
}
