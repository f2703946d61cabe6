//! Configuration render-and-safety pipeline.
//!
//! validate → render → (optionally) normalize → police. Every stage is a pure
//! function over in-memory data; nothing here talks to a device.

pub mod error;
mod normalize;
mod policy;
mod schema;
mod template;

pub use error::{
    CommandPolicyViolation, MalformedSchema, ParameterIssue, ParameterValidationError,
    RenderError, SchemaError, TemplateRenderError, Violation, ViolationReason,
};
pub use normalize::normalize_rendered_config;
pub use policy::{evaluate_command_safety, CommandPolicy, ForbiddenRule, PolicyDocument, PolicyError};
pub use schema::validate_params;
pub use template::{device_variables, render_template};

use crate::models::{DeviceView, Params, TemplateView};

/// Whether a dry-run polices its output, and how
#[derive(Debug, Clone, Copy, Default)]
pub enum SafetyCheck<'p> {
    /// Preview only
    #[default]
    Skip,
    /// Normalize and evaluate; `policy` falls back to the built-in one
    Enforce {
        strict: bool,
        policy: Option<&'p CommandPolicy>,
    },
}

/// Result of a successful dry-run
#[derive(Debug, Clone, PartialEq)]
pub struct DryRun {
    pub rendered: String,
    /// Present when a safety check ran (and passed)
    pub commands: Option<Vec<String>>,
}

/// Validate parameters then render. Rendering never happens with params
/// that fail the template's schema.
pub fn render_dry_run(
    template: TemplateView<'_>,
    params: &Params,
    device: Option<&DeviceView>,
) -> Result<String, RenderError> {
    validate_params(template.parameters, params)?;
    tracing::debug!("Parameters valid ({} keys)", params.len());

    let rendered = render_template(template.content, params, device)?;
    tracing::debug!("Rendered {} bytes", rendered.len());
    Ok(rendered)
}

/// Full dry-run: render, then optionally police the resulting commands.
/// A policy failure carries the rendered text with the violations.
pub fn dry_run(
    template: TemplateView<'_>,
    params: &Params,
    device: Option<&DeviceView>,
    check: SafetyCheck<'_>,
) -> Result<DryRun, RenderError> {
    let rendered = render_dry_run(template, params, device)?;

    let (strict, policy) = match check {
        SafetyCheck::Skip => {
            return Ok(DryRun {
                rendered,
                commands: None,
            })
        }
        SafetyCheck::Enforce { strict, policy } => (strict, policy),
    };

    let commands = normalize_rendered_config(&rendered);
    match evaluate_command_safety(&commands, strict, policy) {
        Ok(()) => {
            tracing::debug!("{} commands passed policy (strict={})", commands.len(), strict);
            Ok(DryRun {
                rendered,
                commands: Some(commands),
            })
        }
        Err(violation) => {
            tracing::warn!(
                "Command policy rejected {} of {} commands (strict={})",
                violation.violations.len(),
                commands.len(),
                strict
            );
            Err(RenderError::CommandPolicyViolation {
                rendered,
                violation,
            })
        }
    }
}
