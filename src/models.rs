use crate::extractor::ModelMapping;
use crate::scoring::{FinancialMetrics, GoalPlan};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

// ============ Requests ============

/// Free-text message describing the user's finances.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ChatInput {
    pub message: String,
}

/// Pasted bank statement text.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct StatementInput {
    pub statement_text: String,
}

/// Message to screen for scam indicators.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct FraudInput {
    pub message: String,
}

/// Monthly figures for the health score. Absent fields count as zero.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ScoreInput {
    #[serde(default)]
    pub income: f64,
    #[serde(default)]
    pub expenses: f64,
    #[serde(default)]
    pub emi: f64,
}

/// Monthly figures plus a savings goal.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct GoalInput {
    #[serde(default)]
    pub income: f64,
    #[serde(default)]
    pub expenses: f64,
    #[serde(default)]
    pub emi: f64,
    pub goal_amount: f64,
    pub years: u32,
}

/// Text to read aloud.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SpeakInput {
    pub text: String,
}

/// Multipart form with a single `file` part.
#[derive(Debug, ToSchema)]
pub struct UploadForm {
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

// ============ Responses ============

/// Extracted figures and the advisory assessment derived from them.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ChatResponse {
    #[schema(value_type = Object)]
    pub structured_data: ModelMapping,
    pub analysis: FinancialMetrics,
}

/// Generator output for document and text analysis endpoints.
///
/// `analysis` is the JSON object the model produced, or its reply text when
/// it answered in prose.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AnalysisResponse {
    pub analysis: Value,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ExpenseDetected {
    pub expense: f64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ImageAnalysisResponse {
    pub extracted_text: String,
    pub expense_detected: ExpenseDetected,
}

/// Goal plan figures plus the generator's narrative.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GoalPlanResponse {
    #[serde(flatten)]
    pub plan: GoalPlan,
    /// Narrative as a JSON object, or plain text.
    pub analysis: Value,
}

/// Business-rule outcome reported with a 200 status.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GoalErrorResponse {
    pub error: String,
}

/// Either a plan or a reported business-rule failure.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum GoalPlannerResponse {
    Planned(GoalPlanResponse),
    Unavailable(GoalErrorResponse),
}

/// Spoken query: what was heard, what was extracted and how it scores.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct VoiceQueryResponse {
    pub transcript: String,
    #[schema(value_type = Object)]
    pub structured_data: ModelMapping,
    pub analysis: FinancialMetrics,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    #[schema(value_type = String, format = DateTime)]
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Raw JSON fallback for `/` when no UI is installed.
pub fn missing_ui_message() -> Value {
    serde_json::json!({
        "message": "SahaAI API. Add index.html to the static directory for the UI.",
        "docs": "/docs",
        "health": "/health",
    })
}
