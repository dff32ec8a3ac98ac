//! Vigil Engine - Main entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vigil_engine::api;
use vigil_engine::app::App;
use vigil_engine::infrastructure::{
    board::{BoardPort, DisabledBoard, MemoryBoard},
    clock::SystemClock,
    config::EngineConfig,
    narrative::NarrativeClient,
    ports::ClockPort,
    resilient_narrative::{ResilientNarrativeClient, RetryConfig},
    sqlite,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment from the repo root when present.
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vigil_engine=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Vigil Engine");

    let config = EngineConfig::from_env();
    let clock: Arc<dyn ClockPort> = Arc::new(SystemClock::new());

    // Persistent store
    let pool = sqlite::connect(&config.db_path).await?;
    let runs = Arc::new(sqlite::SqliteRunRepo::new(pool.clone(), clock.clone()));
    let turns = Arc::new(sqlite::SqliteTurnRepo::new(pool, clock.clone()));

    // Narrative provider with bounded timeout + single retry
    let provider = Arc::new(NarrativeClient::new(
        &config.provider_base_url,
        &config.provider_model,
    ));
    let retry_config = RetryConfig::default();
    tracing::info!(
        max_retries = retry_config.max_retries,
        attempt_timeout_ms = retry_config.attempt_timeout_ms,
        model = config.provider_model,
        "Narrative provider configured"
    );
    let narrative = Arc::new(ResilientNarrativeClient::new(provider, retry_config));

    // Board layer (best-effort; the store stays authoritative either way)
    let board: Arc<dyn BoardPort> = if config.board_enabled {
        Arc::new(MemoryBoard::new(clock.clone()))
    } else {
        tracing::warn!("Board layer disabled; observers must poll the store");
        Arc::new(DisabledBoard)
    };

    let app = Arc::new(App::new(
        runs,
        turns,
        narrative,
        board,
        clock,
        config.game.clone(),
    ));

    // Warm the board from the store so observers see history immediately.
    if app.board.is_available() {
        match app.use_cases.board.reconciler.rebuild().await {
            Ok(count) => tracing::info!(snapshots = count, "Board warmed from store"),
            Err(e) => tracing::warn!(error = %e, "Board warm-up failed; continuing cold"),
        }
    }

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let router = api::routes()
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
