use serde::{Deserialize, Serialize};

/// Lifecycle state of a template version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TemplateStatus {
    #[default]
    Draft,
    PendingApproval,
    Approved,
    Retired,
}

impl TemplateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateStatus::Draft => "draft",
            TemplateStatus::PendingApproval => "pending_approval",
            TemplateStatus::Approved => "approved",
            TemplateStatus::Retired => "retired",
        }
    }

    /// Whether the approval workflow may move a template from `self` to `next`.
    /// A rejected submission goes back to draft.
    pub fn can_transition_to(&self, next: TemplateStatus) -> bool {
        use TemplateStatus::*;
        matches!(
            (self, next),
            (Draft, PendingApproval)
                | (PendingApproval, Approved)
                | (PendingApproval, Draft)
                | (Approved, Retired)
        )
    }

    /// Retired versions are kept for history only and are never rendered
    pub fn is_renderable(&self) -> bool {
        !matches!(self, TemplateStatus::Retired)
    }
}

/// Template represents one immutable version of a configuration template
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    pub content: String,
    /// JSON Schema for the template parameters, stored as text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<String>,
    #[serde(default)]
    pub vendors: Vec<String>,
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub status: TemplateStatus,
}

fn default_version() -> u32 {
    1
}

impl Template {
    /// The read-only projection consumed by the render pipeline
    pub fn view(&self) -> TemplateView<'_> {
        TemplateView {
            content: &self.content,
            parameters: self.parameters.as_deref(),
        }
    }

    /// True when the template declares target vendors and `vendor` is not one of them
    pub fn vendor_mismatch(&self, vendor: &str) -> bool {
        !self.vendors.is_empty()
            && !self.vendors.iter().any(|v| v.eq_ignore_ascii_case(vendor))
    }
}

/// The only template fields the render pipeline reads
#[derive(Debug, Clone, Copy)]
pub struct TemplateView<'a> {
    pub content: &'a str,
    pub parameters: Option<&'a str>,
}

impl<'a> TemplateView<'a> {
    pub fn new(content: &'a str, parameters: Option<&'a str>) -> Self {
        Self { content, parameters }
    }
}

/// TemplateVariable represents a single available template variable
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateVariable {
    pub name: String,
    pub description: String,
    pub example: String,
}
