use crate::handlers;
use crate::models::*;
use crate::scoring::{FinancialMetrics, GoalPlan, RiskLevel};
use axum::{http::StatusCode, response::IntoResponse, Json};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "SahaAI CFO API",
        description = "Receipt, salary document, statement, fraud, goal and score endpoints"
    ),
    paths(
        handlers::health,
        handlers::chat,
        handlers::analyze_image,
        handlers::analyze_receipt,
        handlers::analyze_salary_document,
        handlers::explain_statement,
        handlers::detect_fraud,
        handlers::goal_planner,
        handlers::financial_score,
        handlers::voice_query,
        handlers::speak,
    ),
    components(schemas(
        ChatInput,
        StatementInput,
        FraudInput,
        ScoreInput,
        GoalInput,
        SpeakInput,
        UploadForm,
        ChatResponse,
        AnalysisResponse,
        ExpenseDetected,
        ImageAnalysisResponse,
        GoalPlanResponse,
        GoalErrorResponse,
        VoiceQueryResponse,
        HealthResponse,
        FinancialMetrics,
        GoalPlan,
        RiskLevel,
    )),
    tags(
        (name = "advisor", description = "Free-text and voice financial advice"),
        (name = "documents", description = "Receipt, image and salary document analysis"),
        (name = "planning", description = "Deterministic scoring and goal planning"),
        (name = "speech", description = "Text to speech"),
        (name = "system", description = "Service health")
    )
)]
pub struct ApiDoc;

/// Serves the generated OpenAPI document as JSON.
pub async fn serve_openapi_spec() -> impl IntoResponse {
    (StatusCode::OK, Json(ApiDoc::openapi()))
}

/// Serves the Swagger UI HTML page.
///
/// The page loads the document served by `serve_openapi_spec`.
pub async fn serve_swagger_ui() -> impl IntoResponse {
    let html = r#"
<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>SahaAI CFO API - Swagger UI</title>
    <link rel="stylesheet" type="text/css" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css">
    <style>
        body { margin: 0; padding: 0; }
    </style>
</head>
<body>
    <div id="swagger-ui"></div>
    <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
    <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-standalone-preset.js"></script>
    <script>
        window.onload = function() {
            window.ui = SwaggerUIBundle({
                url: "/api-docs/openapi.json",
                dom_id: '#swagger-ui',
                deepLinking: true,
                presets: [
                    SwaggerUIBundle.presets.apis,
                    SwaggerUIStandalonePreset
                ],
                layout: "StandaloneLayout"
            });
        };
    </script>
</body>
</html>
"#;
    (
        StatusCode::OK,
        [(axum::http::header::CONTENT_TYPE, "text/html; charset=utf-8")],
        html,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_every_endpoint() {
        let doc = ApiDoc::openapi();
        for path in [
            "/health",
            "/api/chat",
            "/api/analyze-image",
            "/api/analyze-receipt",
            "/api/analyze-salary-document",
            "/api/explain-statement",
            "/api/detect-fraud",
            "/api/goal-planner",
            "/api/financial-score",
            "/api/voice-query",
            "/api/speak",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
    }
}
