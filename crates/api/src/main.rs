use std::net::SocketAddr;
use std::sync::Arc;

use linkshelf_core::cache::JsonFileCache;
use linkshelf_core::catalog::Catalog;
use linkshelf_core::export::ExportRegistry;
use linkshelf_core::store::RecordStore;
use linkshelf_db::PgRecordStore;
use tokio::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use linkshelf_api::config::ServerConfig;
use linkshelf_api::router::build_app_router;
use linkshelf_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "linkshelf_api=debug,linkshelf_core=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = linkshelf_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    linkshelf_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    linkshelf_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Catalog ---
    let store: Arc<dyn RecordStore> = Arc::new(PgRecordStore::new(pool));
    let cache = Arc::new(JsonFileCache::new(&config.local_cache_path));
    tracing::info!(path = %cache.path().display(), "Using local cache");

    let mut catalog = Catalog::new(Arc::clone(&store), cache);
    let report = catalog.start().await;
    tracing::info!(
        status = ?report.status,
        inserted = report.inserted,
        rejected = report.rejected,
        "Startup migration finished"
    );

    let export = Arc::new(ExportRegistry::new());
    catalog.mount_export(&export);
    let catalog = Arc::new(Mutex::new(catalog));

    // --- App state ---
    let state = AppState {
        catalog: Arc::clone(&catalog),
        store,
        config: Arc::new(config.clone()),
        export,
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    catalog.lock().await.unmount_export();
    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
