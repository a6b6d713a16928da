use crate::config::Config;
use crate::errors::{AppError, ResultExt};
use crate::extractor::{extract, extract_or_text, number_or_zero, string_or_default};
use crate::gemini_client::GeminiClient;
use crate::media::{
    resolve_mime, AUDIO_MIMES, DEFAULT_AUDIO_MIME, DEFAULT_IMAGE_MIME, DOCUMENT_MIMES,
    IMAGE_MIMES,
};
use crate::models::*;
use crate::prompts;
use crate::scoring::{
    plan_goal, score, FinancialInputs, FinancialMetrics, GoalInputs, ScoringPolicy,
};
use crate::speech::{normalize_for_speech, SpeechClient};
use axum::{
    extract::{Multipart, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Generator client (text, vision, audio).
    pub gemini: GeminiClient,
    /// Text-to-speech client.
    pub speech: SpeechClient,
}

/// A file received through a multipart `file` field.
#[derive(Debug)]
struct Upload {
    bytes: Vec<u8>,
    content_type: Option<String>,
}

/// Reads the `file` part of a multipart request.
///
/// Other parts are ignored. A missing or empty file is a bad request.
async fn read_upload(mut multipart: Multipart) -> Result<Upload, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Failed to read multipart field: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read file content: {}", e)))?;

        if bytes.is_empty() {
            return Err(AppError::BadRequest("Uploaded file is empty".to_string()));
        }

        tracing::debug!(
            "Received upload: {} bytes, declared type {:?}",
            bytes.len(),
            content_type
        );
        return Ok(Upload {
            bytes: bytes.to_vec(),
            content_type,
        });
    }

    Err(AppError::BadRequest(
        "Missing file in multipart request".to_string(),
    ))
}

fn require_text<'a>(value: &'a str, field: &str) -> Result<&'a str, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::BadRequest(format!("'{}' must not be empty", field)));
    }
    Ok(trimmed)
}

/// Health check endpoint.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = HealthResponse)),
    tag = "system"
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// GET /
///
/// Serves the dashboard from the static directory, or a JSON pointer to the
/// docs when no UI is installed. Any other read failure is a server fault.
pub async fn serve_ui(State(state): State<Arc<AppState>>) -> Result<Response, AppError> {
    let index = Path::new(&state.config.static_dir).join("index.html");
    match tokio::fs::read_to_string(&index).await {
        Ok(content) => Ok(Html(content).into_response()),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!("No UI at {}, returning API pointer", index.display());
            Ok(Json(missing_ui_message()).into_response())
        }
        Err(e) => Err(AppError::InternalError(format!(
            "Failed to read {}: {}",
            index.display(),
            e
        ))),
    }
}

pub async fn favicon() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// POST /api/chat
///
/// Asks the generator to pull income, expenses and EMI out of a free-text
/// message, then scores the figures in advisory mode.
#[utoipa::path(
    post,
    path = "/api/chat",
    request_body = ChatInput,
    responses(
        (status = 200, description = "Extracted figures and advisory metrics", body = ChatResponse),
        (status = 400, description = "Empty message"),
        (status = 422, description = "Extracted figures are negative or not finite"),
        (status = 502, description = "Generator unavailable or returned malformed JSON")
    ),
    tag = "advisor"
)]
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(input): Json<ChatInput>,
) -> Result<Json<ChatResponse>, AppError> {
    let message = require_text(&input.message, "message")?;
    tracing::info!("POST /chat - {} chars", message.len());

    let raw = state
        .gemini
        .generate_text(&prompts::chat_extraction(message))
        .await
        .context("chat extraction")?;
    let structured_data = extract(&raw)?;
    let inputs = FinancialInputs::from_mapping(&structured_data)?;
    let analysis = score(&inputs, ScoringPolicy::Advisory);

    tracing::info!(
        "Chat scored: savings {}, dti {}%",
        analysis.savings,
        analysis.dti_percent
    );

    Ok(Json(ChatResponse {
        structured_data,
        analysis,
    }))
}

/// POST /api/analyze-image
///
/// Describes an expense image and reads its total.
#[utoipa::path(
    post,
    path = "/api/analyze-image",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Description and detected expense", body = ImageAnalysisResponse),
        (status = 400, description = "Missing or empty file"),
        (status = 502, description = "Generator unavailable or returned malformed JSON")
    ),
    tag = "documents"
)]
pub async fn analyze_image(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<ImageAnalysisResponse>, AppError> {
    let upload = read_upload(multipart).await?;
    let mime = resolve_mime(
        upload.content_type.as_deref(),
        IMAGE_MIMES,
        DEFAULT_IMAGE_MIME,
    );
    tracing::info!("POST /analyze-image - {} bytes as {}", upload.bytes.len(), mime);

    let raw = state
        .gemini
        .generate_with_media(prompts::IMAGE_EXPENSE, &upload.bytes, &mime)
        .await
        .context("image analysis")?;
    let data = extract(&raw)?;

    Ok(Json(ImageAnalysisResponse {
        extracted_text: string_or_default(&data, "extracted_text", ""),
        expense_detected: ExpenseDetected {
            expense: number_or_zero(&data, "expense"),
        },
    }))
}

/// POST /api/analyze-receipt
#[utoipa::path(
    post,
    path = "/api/analyze-receipt",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Merchant, total, category and payment method", body = AnalysisResponse),
        (status = 400, description = "Missing or empty file"),
        (status = 502, description = "Generator unavailable")
    ),
    tag = "documents"
)]
pub async fn analyze_receipt(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<AnalysisResponse>, AppError> {
    let upload = read_upload(multipart).await?;
    let mime = resolve_mime(
        upload.content_type.as_deref(),
        IMAGE_MIMES,
        DEFAULT_IMAGE_MIME,
    );
    tracing::info!("POST /analyze-receipt - {} bytes as {}", upload.bytes.len(), mime);

    let raw = state
        .gemini
        .generate_with_media(prompts::RECEIPT, &upload.bytes, &mime)
        .await
        .context("receipt analysis")?;

    Ok(Json(AnalysisResponse {
        analysis: extract_or_text(raw),
    }))
}

/// POST /api/analyze-salary-document
///
/// Salary slip or Form 16, as an image or PDF.
#[utoipa::path(
    post,
    path = "/api/analyze-salary-document",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Salary slip or Form 16 fields", body = AnalysisResponse),
        (status = 400, description = "Missing or empty file"),
        (status = 502, description = "Generator unavailable")
    ),
    tag = "documents"
)]
pub async fn analyze_salary_document(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<AnalysisResponse>, AppError> {
    let upload = read_upload(multipart).await?;
    let mime = resolve_mime(
        upload.content_type.as_deref(),
        DOCUMENT_MIMES,
        DEFAULT_IMAGE_MIME,
    );
    tracing::info!(
        "POST /analyze-salary-document - {} bytes as {}",
        upload.bytes.len(),
        mime
    );

    let raw = state
        .gemini
        .generate_with_media(prompts::SALARY_DOCUMENT, &upload.bytes, &mime)
        .await
        .context("salary document analysis")?;

    Ok(Json(AnalysisResponse {
        analysis: extract_or_text(raw),
    }))
}

/// POST /api/explain-statement
#[utoipa::path(
    post,
    path = "/api/explain-statement",
    request_body = StatementInput,
    responses(
        (status = 200, description = "Income, expense, largest category, risk and advice", body = AnalysisResponse),
        (status = 400, description = "Empty statement text"),
        (status = 502, description = "Generator unavailable")
    ),
    tag = "advisor"
)]
pub async fn explain_statement(
    State(state): State<Arc<AppState>>,
    Json(input): Json<StatementInput>,
) -> Result<Json<AnalysisResponse>, AppError> {
    let text = require_text(&input.statement_text, "statement_text")?;
    tracing::info!("POST /explain-statement - {} chars", text.len());

    let raw = state
        .gemini
        .generate_text(&prompts::statement(text))
        .await
        .context("statement explanation")?;

    Ok(Json(AnalysisResponse {
        analysis: extract_or_text(raw),
    }))
}

/// POST /api/detect-fraud
#[utoipa::path(
    post,
    path = "/api/detect-fraud",
    request_body = FraudInput,
    responses(
        (status = 200, description = "Risk level, reasons and recommended action", body = AnalysisResponse),
        (status = 400, description = "Empty message"),
        (status = 502, description = "Generator unavailable")
    ),
    tag = "advisor"
)]
pub async fn detect_fraud(
    State(state): State<Arc<AppState>>,
    Json(input): Json<FraudInput>,
) -> Result<Json<AnalysisResponse>, AppError> {
    let message = require_text(&input.message, "message")?;
    tracing::info!("POST /detect-fraud - {} chars", message.len());

    let raw = state
        .gemini
        .generate_text(&prompts::fraud(message))
        .await
        .context("fraud screening")?;

    Ok(Json(AnalysisResponse {
        analysis: extract_or_text(raw),
    }))
}

/// POST /api/goal-planner
///
/// The plan arithmetic is deterministic; the generator only adds narrative.
/// When there is nothing left to save the outcome is reported in the body with
/// a 200 status and no generator call is made.
#[utoipa::path(
    post,
    path = "/api/goal-planner",
    request_body = GoalInput,
    responses(
        (status = 200, description = "Goal plan with narrative, or {error} when no savings are available", body = GoalPlanResponse),
        (status = 422, description = "Negative amounts or zero years"),
        (status = 502, description = "Generator unavailable")
    ),
    tag = "planning"
)]
pub async fn goal_planner(
    State(state): State<Arc<AppState>>,
    Json(input): Json<GoalInput>,
) -> Result<Json<GoalPlannerResponse>, AppError> {
    tracing::info!(
        "POST /goal-planner - goal {} over {} years",
        input.goal_amount,
        input.years
    );

    let inputs = FinancialInputs::new(input.income, input.expenses, input.emi)?;
    let goal = GoalInputs::new(inputs, input.goal_amount, input.years)?;

    let plan = match plan_goal(&goal) {
        Ok(plan) => plan,
        Err(e) => {
            tracing::info!("Goal planning unavailable: {}", e);
            return Ok(Json(GoalPlannerResponse::Unavailable(GoalErrorResponse {
                error: e.to_string(),
            })));
        }
    };

    let prompt = prompts::goal_advice(
        inputs.income(),
        plan.monthly_savings,
        goal.goal_amount(),
        goal.years(),
        plan.required_monthly_saving,
    );
    let raw = state
        .gemini
        .generate_text(&prompt)
        .await
        .context("goal narrative")?;

    Ok(Json(GoalPlannerResponse::Planned(GoalPlanResponse {
        plan,
        analysis: extract_or_text(raw),
    })))
}

/// POST /api/financial-score
///
/// Point-based health score. No upstream calls.
#[utoipa::path(
    post,
    path = "/api/financial-score",
    request_body = ScoreInput,
    responses(
        (status = 200, description = "Score, savings and DTI percentage", body = FinancialMetrics),
        (status = 422, description = "Negative or non-finite amounts")
    ),
    tag = "planning"
)]
pub async fn financial_score(
    Json(input): Json<ScoreInput>,
) -> Result<Json<FinancialMetrics>, AppError> {
    let inputs = FinancialInputs::new(input.income, input.expenses, input.emi)?;
    let metrics = score(&inputs, ScoringPolicy::PointScore);

    tracing::info!("POST /financial-score - score {:?}", metrics.score);
    Ok(Json(metrics))
}

/// POST /api/voice-query
///
/// Spoken version of `/api/chat`: the generator transcribes the audio and
/// extracts the figures in one call.
#[utoipa::path(
    post,
    path = "/api/voice-query",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Transcript, extracted figures and advisory metrics", body = VoiceQueryResponse),
        (status = 400, description = "Missing or empty file"),
        (status = 422, description = "Extracted figures are negative or not finite"),
        (status = 502, description = "Generator unavailable or returned malformed JSON")
    ),
    tag = "advisor"
)]
pub async fn voice_query(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<VoiceQueryResponse>, AppError> {
    let upload = read_upload(multipart).await?;
    let mime = resolve_mime(
        upload.content_type.as_deref(),
        AUDIO_MIMES,
        DEFAULT_AUDIO_MIME,
    );
    tracing::info!("POST /voice-query - {} bytes as {}", upload.bytes.len(), mime);

    let raw = state
        .gemini
        .generate_with_media(prompts::VOICE_QUERY, &upload.bytes, &mime)
        .await
        .context("voice query")?;
    let structured_data = extract(&raw)?;
    let inputs = FinancialInputs::from_mapping(&structured_data)?;

    Ok(Json(VoiceQueryResponse {
        transcript: string_or_default(&structured_data, "transcript", ""),
        analysis: score(&inputs, ScoringPolicy::Advisory),
        structured_data,
    }))
}

/// POST /api/speak
///
/// Reads text aloud; returns MP3 bytes.
#[utoipa::path(
    post,
    path = "/api/speak",
    request_body = SpeakInput,
    responses(
        (status = 200, description = "MP3 audio stream"),
        (status = 400, description = "Empty text, or only markdown formatting"),
        (status = 502, description = "Speech synthesis failed")
    ),
    tag = "speech"
)]
pub async fn speak(
    State(state): State<Arc<AppState>>,
    Json(input): Json<SpeakInput>,
) -> Result<Response, AppError> {
    let text = require_text(&input.text, "text")?;
    if normalize_for_speech(text).is_empty() {
        return Err(AppError::BadRequest(
            "'text' has nothing to read aloud once formatting is removed".to_string(),
        ));
    }
    tracing::info!("POST /speak - {} chars", text.len());

    let audio = state
        .speech
        .synthesize(text)
        .await
        .map_err(AppError::Speech)?;

    Ok(([(header::CONTENT_TYPE, "audio/mpeg")], audio).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_text_trims() {
        assert_eq!(require_text("  hi  ", "message").unwrap(), "hi");
    }

    #[test]
    fn test_require_text_rejects_blank() {
        let err = require_text(" \n ", "message").unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg.contains("message")));
    }

    #[tokio::test]
    async fn test_favicon_is_empty() {
        assert_eq!(favicon().await, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_financial_score_handler() {
        let Json(metrics) = financial_score(Json(ScoreInput {
            income: 50000.0,
            expenses: 30000.0,
            emi: 5000.0,
        }))
        .await
        .unwrap();

        assert_eq!(metrics.score, Some(100));
        assert_eq!(metrics.savings, 15000.0);
        assert_eq!(metrics.dti_percent, 10.0);
    }

    #[tokio::test]
    async fn test_financial_score_rejects_negative() {
        let result = financial_score(Json(ScoreInput {
            income: -1.0,
            expenses: 0.0,
            emi: 0.0,
        }))
        .await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }
}
