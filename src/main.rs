use axum::{
    routing::{get, post},
    Router,
};
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use leadscout_api::config::Config;
use leadscout_api::db::Database;
use leadscout_api::handlers::{self, AppState};

/// Main entry point for the application.
///
/// Initializes logging, configuration, the database pool, the in-memory
/// caches, and the HTTP routes with their middleware (CORS, rate limiting,
/// body size limit), then starts the Axum server.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "leadscout_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!("Configuration loaded successfully");

    // Initialize database connection pool
    let db = Database::new(&config.database_url).await?;
    tracing::info!("Database connection pool established");

    // Guard cache against concurrent duplicate search runs per user.
    // 30 minute TTL outlives the longest provider poll ceiling.
    let running_searches_cache = Cache::builder()
        .time_to_live(Duration::from_secs(1800))
        .max_capacity(10_000)
        .build();
    tracing::info!("Run-guard cache initialized");

    // Company-profile cache (1 hour TTL) so repeated enrichment batches for
    // the same companies skip the provider round-trip.
    let company_profile_cache = Cache::builder()
        .time_to_live(Duration::from_secs(3600))
        .max_capacity(50_000)
        .build();
    tracing::info!("Company-profile cache initialized (1h TTL, 50k capacity)");

    // Build application state
    let app_state = Arc::new(AppState {
        db: db.pool.clone(),
        config: config.clone(),
        running_searches_cache,
        company_profile_cache,
    });

    // Configure rate limiter: 10 requests/second per IP, burst of 20
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(10)
            .burst_size(20)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .unwrap(),
    );

    // Build protected routes with security layers
    let protected_routes = Router::new()
        // Ingestion
        .route("/api/v1/searches/run", post(handlers::run_search))
        .route("/api/v1/searches/saved", post(handlers::save_search))
        // Enrichment & scoring
        .route("/api/v1/leads/enrich", post(handlers::enrich_leads))
        .route("/api/v1/leads/rescore", post(handlers::rescore_leads))
        // Run readback
        .route("/api/v1/runs/:id", get(handlers::get_run))
        .layer(
            ServiceBuilder::new()
                // Request size limit: 5MB max payload (prevents memory exhaustion)
                .layer(RequestBodyLimitLayer::new(5 * 1024 * 1024))
                // Rate limiting: 10 req/sec per IP, burst of 20
                .layer(GovernorLayer {
                    config: governor_conf,
                }),
        );

    // Build final app with health check (bypasses rate limiting)
    let app = Router::new()
        .route("/health", get(handlers::health))
        .merge(protected_routes)
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
