use axum::{extract::State, Json};
use std::sync::Arc;

use crate::models::*;
use crate::render::{self, PolicyDocument, SafetyCheck};
use crate::AppState;

use super::ApiError;

/// Render a template version without sending anything to a device.
/// With `check_safety`, the rendered commands are also policed.
pub async fn dry_run(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DryRunRequest>,
) -> Result<Json<DryRunResponse>, ApiError> {
    let render_id = uuid::Uuid::new_v4().to_string();
    let template = &req.template;

    if !template.status.is_renderable() {
        return Err(ApiError::bad_request(format!(
            "template {} v{} is {} and cannot be rendered",
            template.id,
            template.version,
            template.status.as_str()
        )));
    }

    let mut warnings = Vec::new();
    if let Some(device) = &req.device {
        if template.vendor_mismatch(&device.vendor) {
            warnings.push(format!(
                "template targets [{}] but device {} is '{}'",
                template.vendors.join(", "),
                device.name,
                device.vendor
            ));
        }
    }

    let strict = req.strict.unwrap_or(state.config.strict_by_default);
    let check = if req.check_safety {
        SafetyCheck::Enforce {
            strict,
            policy: Some(&state.policy),
        }
    } else {
        SafetyCheck::Skip
    };

    tracing::info!(
        "Dry-run {} for template {} v{} (device={}, check_safety={}, strict={})",
        render_id,
        template.id,
        template.version,
        req.device.as_ref().map(|d| d.name.as_str()).unwrap_or("-"),
        req.check_safety,
        strict
    );

    let run = render::dry_run(template.view(), &req.params, req.device.as_ref(), check)
        .map_err(|e| {
            tracing::warn!("Dry-run {} failed at {}: {}", render_id, e.stage(), e);
            ApiError::from(e)
        })?;

    let safe = run.commands.as_ref().map(|_| true);
    Ok(Json(DryRunResponse {
        render_id,
        rendered: run.rendered,
        commands: run.commands,
        safe,
        warnings,
        rendered_at: chrono::Utc::now(),
    }))
}

/// Split rendered text into the command list that would be sent
pub async fn normalize_commands(
    Json(req): Json<NormalizeRequest>,
) -> Json<NormalizeResponse> {
    Json(NormalizeResponse {
        commands: render::normalize_rendered_config(&req.rendered),
    })
}

/// Police an explicit command list against the active policy
pub async fn check_commands(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CommandCheckRequest>,
) -> Result<Json<CommandCheckResponse>, ApiError> {
    let strict = req.strict.unwrap_or(state.config.strict_by_default);

    render::evaluate_command_safety(&req.commands, strict, Some(&state.policy)).map_err(|v| {
        tracing::warn!("Command check rejected: {}", v);
        ApiError::policy_rejected(v.to_string())
            .with_stage("policy")
            .with_details(serde_json::json!({ "violations": v.violations }))
    })?;

    Ok(Json(CommandCheckResponse {
        safe: true,
        checked: req.commands.len(),
        strict,
    }))
}

/// The active command policy
pub async fn get_policy(State(state): State<Arc<AppState>>) -> Json<PolicyDocument> {
    Json(state.policy.document())
}

/// Get available template variables
pub async fn get_template_variables() -> Json<Vec<TemplateVariable>> {
    Json(render::device_variables())
}
