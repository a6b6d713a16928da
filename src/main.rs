use saha_cfo_api::config::Config;
use saha_cfo_api::gemini_client::GeminiClient;
use saha_cfo_api::handlers::AppState;
use saha_cfo_api::routes;
use saha_cfo_api::speech::SpeechClient;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the application.
///
/// This function initializes the application, including:
/// - Logging and tracing.
/// - Configuration loading.
/// - Generator and speech clients.
/// - HTTP routes and middleware (CORS, Rate Limiting).
///
/// It then starts the Axum server.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "saha_cfo_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    let gemini = GeminiClient::from_config(&config)
        .map_err(|e| anyhow::anyhow!("Failed to initialize Gemini client: {}", e))?;
    tracing::info!("✓ Gemini client initialized: model {}", gemini.model());

    let speech = SpeechClient::from_config(&config)
        .map_err(|e| anyhow::anyhow!("Failed to initialize speech client: {}", e))?;
    tracing::info!("✓ Speech client initialized: {}", config.tts_base_url);

    let port = config.port;
    let max_upload_bytes = config.max_upload_bytes;

    // Build application state
    let app_state = Arc::new(AppState {
        config,
        gemini,
        speech,
    });

    // Configure rate limiter: 10 requests/second per IP, burst of 20
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(10)
            .burst_size(20)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .ok_or_else(|| anyhow::anyhow!("Invalid rate limiter configuration"))?,
    );

    // Every /api call costs an upstream request, so only those are rate limited
    let api_routes = routes::api_routes(max_upload_bytes).layer(ServiceBuilder::new().layer(
        GovernorLayer {
            config: governor_conf,
        },
    ));

    let app = routes::public_routes()
        .merge(api_routes)
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
