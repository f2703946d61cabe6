pub mod render;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::render::RenderError;

/// Error response body: {"error": "message", "stage": ..., "details": ...}
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// API error type
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    stage: Option<&'static str>,
    details: Option<serde_json::Value>,
}

impl ApiError {
    fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
            stage: None,
            details: None,
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }

    pub fn unprocessable(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, msg)
    }

    /// Safety rejection: the request is fine but the output may not be sent
    pub fn policy_rejected(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::PRECONDITION_REQUIRED, msg)
    }

    pub fn with_stage(mut self, stage: &'static str) -> Self {
        self.stage = Some(stage);
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
                stage: self.stage,
                details: self.details,
            }),
        )
            .into_response()
    }
}

/// Maps pipeline failures to 400 (template defects), 422 (bad parameters)
/// and 428 (safety rejection)
impl From<RenderError> for ApiError {
    fn from(err: RenderError) -> Self {
        let stage = err.stage();
        let message = err.to_string();
        let api = match err {
            RenderError::MalformedSchema(_) => ApiError::bad_request(message),
            RenderError::TemplateRender(_) => ApiError::bad_request(message),
            RenderError::ParameterValidation(e) => ApiError::unprocessable(message)
                .with_details(serde_json::json!({ "issues": e.issues() })),
            RenderError::CommandPolicyViolation {
                rendered,
                violation,
            } => ApiError::policy_rejected(message).with_details(serde_json::json!({
                "rendered": rendered,
                "violations": violation.violations,
            })),
        };
        api.with_stage(stage)
    }
}

/// Healthcheck endpoint - returns 200 OK with status
pub async fn healthcheck() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "netcfg-render",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
