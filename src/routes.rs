use crate::docs;
use crate::handlers::{self, AppState};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

/// Routes that are always reachable and bypass rate limiting.
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(handlers::serve_ui))
        .route("/favicon.ico", get(handlers::favicon))
        .route("/health", get(handlers::health))
        // API Documentation
        .route("/docs", get(docs::serve_swagger_ui))
        .route("/api-docs/openapi.json", get(docs::serve_openapi_spec))
}

/// The `/api` endpoints, with the upload size cap applied.
pub fn api_routes(max_upload_bytes: usize) -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/chat", post(handlers::chat))
        .route("/api/analyze-image", post(handlers::analyze_image))
        .route("/api/analyze-receipt", post(handlers::analyze_receipt))
        .route(
            "/api/analyze-salary-document",
            post(handlers::analyze_salary_document),
        )
        .route("/api/explain-statement", post(handlers::explain_statement))
        .route("/api/detect-fraud", post(handlers::detect_fraud))
        .route("/api/goal-planner", post(handlers::goal_planner))
        .route("/api/financial-score", post(handlers::financial_score))
        .route("/api/voice-query", post(handlers::voice_query))
        .route("/api/speak", post(handlers::speak))
        // Multipart extractor has its own default cap; lift it to the configured one
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(RequestBodyLimitLayer::new(max_upload_bytes))
}

/// Full application without rate limiting.
///
/// `main` composes the same pieces with a per-IP governor on the API routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    let max_upload_bytes = state.config.max_upload_bytes;
    public_routes()
        .merge(api_routes(max_upload_bytes))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
