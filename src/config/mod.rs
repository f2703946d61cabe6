use anyhow::{Context, Result};
use std::env;

use crate::render::{CommandPolicy, PolicyDocument};

/// Config holds all application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: String,
    /// Optional JSON policy document; the built-in policy is used when unset
    pub policy_file: Option<String>,
    /// Strict mode for requests that do not say otherwise
    pub strict_by_default: bool,
    pub cors_allow_any: bool,
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn load() -> Self {
        Self {
            listen_addr: get_env("LISTEN_ADDR", "0.0.0.0:8080"),
            policy_file: env::var("COMMAND_POLICY_FILE")
                .ok()
                .filter(|p| !p.trim().is_empty()),
            strict_by_default: parse_bool(&get_env("STRICT_MODE_DEFAULT", "false")),
            cors_allow_any: parse_bool(&get_env("CORS_ALLOW_ANY", "true")),
        }
    }

    /// Build the command policy: the operator's file if configured, else built-in
    pub fn load_policy(&self) -> Result<CommandPolicy> {
        match &self.policy_file {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read command policy file {}", path))?;
                parse_policy(&raw).with_context(|| format!("Invalid command policy file {}", path))
            }
            None => Ok(CommandPolicy::builtin().clone()),
        }
    }
}

/// Parse and compile a JSON policy document
pub fn parse_policy(raw: &str) -> Result<CommandPolicy> {
    let doc: PolicyDocument = serde_json::from_str(raw).context("policy is not valid JSON")?;
    if doc.forbidden_patterns.is_empty() {
        tracing::warn!("Command policy has no forbidden patterns - only the allowlist will apply");
    }
    Ok(CommandPolicy::from_document(&doc)?)
}

fn get_env(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_bool(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
