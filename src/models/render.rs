use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{DeviceView, Template};

/// Parameter set supplied by the caller for a render
pub type Params = serde_json::Map<String, serde_json::Value>;

/// DryRunRequest renders a template without touching any device
#[derive(Debug, Clone, Deserialize)]
pub struct DryRunRequest {
    pub template: Template,
    #[serde(default)]
    pub params: Params,
    #[serde(default)]
    pub device: Option<DeviceView>,
    /// Normalize and police the rendered commands
    #[serde(default)]
    pub check_safety: bool,
    /// Overrides the server's default strict mode
    #[serde(default)]
    pub strict: Option<bool>,
}

/// DryRunResponse carries the rendered text and, when requested, the verdict
#[derive(Debug, Clone, Serialize)]
pub struct DryRunResponse {
    pub render_id: String,
    pub rendered: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commands: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub safe: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    pub rendered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NormalizeRequest {
    pub rendered: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NormalizeResponse {
    pub commands: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommandCheckRequest {
    pub commands: Vec<String>,
    #[serde(default)]
    pub strict: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommandCheckResponse {
    pub safe: bool,
    pub checked: usize,
    pub strict: bool,
}
