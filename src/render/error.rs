use serde::Serialize;
use thiserror::Error;

/// The template's stored parameter schema could not be used
#[derive(Debug, Error)]
#[error("malformed parameter schema: {reason}")]
pub struct MalformedSchema {
    pub reason: String,
}

/// One failed schema constraint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterIssue {
    /// JSON pointer into the parameter set ("" for the root object)
    pub instance_path: String,
    /// JSON pointer into the schema keyword that failed
    pub schema_path: String,
    pub message: String,
}

/// Caller-supplied parameters do not satisfy the template's schema.
/// Always holds at least one issue.
#[derive(Debug)]
pub struct ParameterValidationError {
    issues: Vec<ParameterIssue>,
}

impl ParameterValidationError {
    pub fn new(first: ParameterIssue, rest: impl IntoIterator<Item = ParameterIssue>) -> Self {
        let mut issues = vec![first];
        issues.extend(rest);
        Self { issues }
    }

    /// None when there is nothing to report
    pub fn from_issues(issues: Vec<ParameterIssue>) -> Option<Self> {
        let mut iter = issues.into_iter();
        iter.next().map(|first| Self::new(first, iter))
    }

    pub fn first(&self) -> &ParameterIssue {
        &self.issues[0]
    }

    pub fn issues(&self) -> &[ParameterIssue] {
        &self.issues
    }
}

impl std::fmt::Display for ParameterValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let first = self.first();
        let at = if first.instance_path.is_empty() {
            "/"
        } else {
            first.instance_path.as_str()
        };
        write!(
            f,
            "parameter validation failed at {} (schema {}): {}",
            at, first.schema_path, first.message
        )?;
        if self.issues.len() > 1 {
            write!(f, " (and {} more)", self.issues.len() - 1)?;
        }
        Ok(())
    }
}

impl std::error::Error for ParameterValidationError {}

/// Schema stage failures
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error(transparent)]
    Malformed(#[from] MalformedSchema),
    #[error(transparent)]
    Invalid(#[from] ParameterValidationError),
}

/// Template expansion failed; no partial output is ever returned
#[derive(Debug, Error)]
#[error("template rendering failed: {message}")]
pub struct TemplateRenderError {
    pub message: String,
}

/// Why a command was rejected
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViolationReason {
    /// Matched a forbidden pattern rule
    Forbidden { category: String },
    /// Strict mode: the command verb is not allowlisted
    NotAllowlisted { token: String },
}

impl std::fmt::Display for ViolationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViolationReason::Forbidden { category } => write!(f, "forbidden ({})", category),
            ViolationReason::NotAllowlisted { token } => {
                write!(f, "'{}' is not an allowed command", token)
            }
        }
    }
}

/// One offending command, reported once however many times it appears
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    pub command: String,
    /// 1-based positions in the command list
    pub lines: Vec<usize>,
    pub reasons: Vec<ViolationReason>,
}

/// Rendered output contains forbidden or non-allowlisted commands
#[derive(Debug)]
pub struct CommandPolicyViolation {
    pub violations: Vec<Violation>,
}

impl CommandPolicyViolation {
    pub fn commands(&self) -> Vec<&str> {
        self.violations.iter().map(|v| v.command.as_str()).collect()
    }
}

impl std::fmt::Display for CommandPolicyViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "command policy violation: {} unsafe command(s): {}",
            self.violations.len(),
            self.commands().join("; ")
        )
    }
}

impl std::error::Error for CommandPolicyViolation {}

/// Error from any stage of a dry-run
#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    MalformedSchema(#[from] MalformedSchema),
    #[error(transparent)]
    ParameterValidation(#[from] ParameterValidationError),
    #[error(transparent)]
    TemplateRender(#[from] TemplateRenderError),
    /// Carries the rendered text alongside the violations
    #[error("{violation}")]
    CommandPolicyViolation {
        rendered: String,
        violation: CommandPolicyViolation,
    },
}

impl RenderError {
    /// Name of the pipeline stage that failed
    pub fn stage(&self) -> &'static str {
        match self {
            RenderError::MalformedSchema(_) | RenderError::ParameterValidation(_) => "validate",
            RenderError::TemplateRender(_) => "render",
            RenderError::CommandPolicyViolation { .. } => "policy",
        }
    }
}

impl From<SchemaError> for RenderError {
    fn from(err: SchemaError) -> Self {
        match err {
            SchemaError::Malformed(e) => RenderError::MalformedSchema(e),
            SchemaError::Invalid(e) => RenderError::ParameterValidation(e),
        }
    }
}
