use time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer, cookie::Key};
use tracing_subscriber::EnvFilter;

// Import everything from the library crate (no duplicate module declarations)
use rc_garage_server::{AppState, config::Config, constants::*, router::api_router};

type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("rc_garage_server=info,tower_http=info")),
        )
        .init();

    // Load and validate configuration
    let config = Config::from_env().map_err(|e| format!("Configuration error: {}", e))?;
    tracing::debug!(?config, "configuration loaded");

    let app_state =
        AppState::new(&config).map_err(|e| format!("Failed to initialize stores: {}", e))?;

    // Create session store
    let store = MemoryStore::default();

    let session_key = Key::try_from(config.session_secret.as_bytes())
        .map_err(|e| format!("Invalid session secret: {}", e))?;

    let session_layer = SessionManagerLayer::new(store)
        .with_secure(config.production)
        .with_name(SESSION_NAME)
        .with_expiry(Expiry::OnInactivity(Duration::days(SESSION_EXPIRY_DAYS)))
        .with_signed(session_key);

    let frontend_origin_header = config
        .frontend_origin
        .parse::<axum::http::HeaderValue>()
        .map_err(|e| format!("Invalid FRONTEND_ORIGIN '{}': {}", config.frontend_origin, e))?;

    let cors = CorsLayer::new()
        .allow_origin(frontend_origin_header)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::DELETE,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
            axum::http::header::COOKIE,
        ])
        .allow_credentials(true);

    let app = api_router()
        .layer(cors)
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    let bind_address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .map_err(|e| format!("Failed to bind to {}: {}", bind_address, e))?;

    tracing::info!("Server running on http://{}", bind_address);

    axum::serve(listener, app)
        .await
        .map_err(|e| format!("Server error: {}", e))?;

    Ok(())
}
