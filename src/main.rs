use anyhow::Context;
use rusty_library_loans::{
    adapters::{
        postgres::{PostgresBookCatalog, PostgresLoanStore, PostgresUserLookup},
        smtp::SmtpNotifier,
        system::{LogNotifier, SystemClock},
    },
    api::{handlers::AppState, router::create_router},
    application::loan::{OverdueScanner, ServiceDependencies},
    config::AppConfig,
    ports::{Clock, Notifier},
};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "rusty_library_loans={},tower_http=debug",
                    config.logging.level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting loan service v{}", env!("CARGO_PKG_VERSION"));

    // Initialize database connection pool
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await
        .context("Failed to connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    tracing::info!("Database migrations completed");

    // Initialize adapters
    let notifier: Arc<dyn Notifier> = if config.email.enabled {
        let smtp = SmtpNotifier::new(&config.email)
            .map_err(|e| anyhow::anyhow!("Failed to configure SMTP notifier: {}", e))?;
        Arc::new(smtp)
    } else {
        tracing::warn!("Email delivery disabled; notices will only be logged");
        Arc::new(LogNotifier)
    };
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // Create service dependencies
    let service_deps = ServiceDependencies {
        loan_store: Arc::new(PostgresLoanStore::new(pool.clone())),
        notifier,
        user_lookup: Arc::new(PostgresUserLookup::new(pool.clone())),
        book_catalog: Arc::new(PostgresBookCatalog::new(pool)),
        policy: config.loans.policy(),
    };

    // Start the due-date reminder job
    let scanner = if config.scanner.enabled {
        let settings = config
            .scanner
            .settings()
            .context("Invalid scanner configuration")?;
        let scanner = OverdueScanner::new(service_deps.clone(), clock.clone(), settings);
        Some(scanner.spawn())
    } else {
        None
    };

    let app_state = Arc::new(AppState {
        service_deps,
        clock,
    });
    let app = create_router(app_state);

    let host = config
        .server
        .host
        .parse()
        .with_context(|| format!("Invalid host address: {}", config.server.host))?;
    let addr = SocketAddr::new(host, config.server.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = scanner {
        handle.stop().await;
    }

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutdown signal received");
}
