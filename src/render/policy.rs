use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::OnceLock;
use thiserror::Error;

use super::error::{CommandPolicyViolation, Violation, ViolationReason};

/// A forbidden-pattern rule. Patterns are matched case-insensitively
/// against the full command text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForbiddenRule {
    pub category: String,
    pub pattern: String,
}

impl ForbiddenRule {
    fn new(category: &str, pattern: &str) -> Self {
        Self {
            category: category.to_string(),
            pattern: pattern.to_string(),
        }
    }
}

/// Serializable form of a command policy, as loaded from an operator file
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PolicyDocument {
    #[serde(default)]
    pub forbidden_patterns: Vec<ForbiddenRule>,
    #[serde(default)]
    pub allowed_prefixes: Vec<String>,
}

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("invalid pattern for rule '{category}' ({pattern}): {source}")]
    InvalidPattern {
        category: String,
        pattern: String,
        #[source]
        source: regex_lite::Error,
    },
}

#[derive(Debug, Clone)]
struct CompiledRule {
    rule: ForbiddenRule,
    regex: Regex,
}

/// Forbidden-pattern blacklist plus an allow-prefix whitelist used in strict mode
#[derive(Debug, Clone)]
pub struct CommandPolicy {
    rules: Vec<CompiledRule>,
    /// Lowercased command verbs
    allowed_prefixes: BTreeSet<String>,
}

/// Default forbidden patterns: device-bricking or lock-out operations
fn builtin_rules() -> Vec<ForbiddenRule> {
    vec![
        ForbiddenRule::new("format", r"^\s*(re)?format\b"),
        ForbiddenRule::new("config-erase", r"^\s*write\s+erase\b"),
        ForbiddenRule::new("config-erase", r"^\s*erase\s+(startup-config|nvram:|flash:)"),
        ForbiddenRule::new("reload", r"^\s*reload\b"),
        ForbiddenRule::new("reload", r"^\s*reboot\b"),
        ForbiddenRule::new(
            "factory-reset",
            r"^\s*(factory-reset|reset\s+factory|reset\s+saved-configuration)\b",
        ),
        ForbiddenRule::new("delete-system-file", r"^\s*delete\s.*(startup|boot|system)"),
        ForbiddenRule::new("remove-superuser", r"^\s*undo\s+(local-user|super)"),
    ]
}

/// Default strict-mode allowlist of non-destructive configuration verbs
const BUILTIN_ALLOWED_PREFIXES: &[&str] = &[
    // navigation
    "system-view", "return", "quit", "exit", "end", "configure",
    // interfaces and switching
    "interface", "description", "vlan", "port", "port-group", "port-link-type",
    "stp", "lldp", "lacp", "mtu", "speed", "duplex",
    // addressing and routing
    "ip", "ipv6", "ospf", "bgp", "router", "network", "route-policy",
    // filtering
    "acl", "rule", "traffic-filter", "traffic-policy",
    // management
    "sysname", "hostname", "ntp-service", "ntp", "snmp-agent", "info-center",
    "logging", "clock", "header", "banner", "dns", "user-interface",
];

impl CommandPolicy {
    /// Compile a policy from its document form
    pub fn from_document(doc: &PolicyDocument) -> Result<Self, PolicyError> {
        let rules = doc
            .forbidden_patterns
            .iter()
            .map(|rule| {
                Regex::new(&format!("(?i){}", rule.pattern))
                    .map(|regex| CompiledRule {
                        rule: rule.clone(),
                        regex,
                    })
                    .map_err(|source| PolicyError::InvalidPattern {
                        category: rule.category.clone(),
                        pattern: rule.pattern.clone(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let allowed_prefixes = doc
            .allowed_prefixes
            .iter()
            .map(|p| p.trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .collect();

        Ok(Self {
            rules,
            allowed_prefixes,
        })
    }

    /// The built-in rule set
    pub fn builtin_document() -> PolicyDocument {
        PolicyDocument {
            forbidden_patterns: builtin_rules(),
            allowed_prefixes: BUILTIN_ALLOWED_PREFIXES.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Shared compiled copy of the built-in policy
    pub fn builtin() -> &'static CommandPolicy {
        static BUILTIN: OnceLock<CommandPolicy> = OnceLock::new();
        BUILTIN.get_or_init(|| {
            CommandPolicy::from_document(&CommandPolicy::builtin_document())
                .expect("built-in command policy patterns are valid")
        })
    }

    /// Serializable view of the active rules
    pub fn document(&self) -> PolicyDocument {
        PolicyDocument {
            forbidden_patterns: self.rules.iter().map(|r| r.rule.clone()).collect(),
            allowed_prefixes: self.allowed_prefixes.iter().cloned().collect(),
        }
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Reasons a single command is unsafe; empty when it passes.
    /// The allowlist applies only in strict mode and only when non-empty.
    pub fn classify(&self, command: &str, strict: bool) -> Vec<ViolationReason> {
        let mut reasons: Vec<ViolationReason> = Vec::new();

        for compiled in &self.rules {
            if compiled.regex.is_match(command) {
                let reason = ViolationReason::Forbidden {
                    category: compiled.rule.category.clone(),
                };
                if !reasons.contains(&reason) {
                    reasons.push(reason);
                }
            }
        }

        if strict && !self.allowed_prefixes.is_empty() {
            let token = command.split_whitespace().next().unwrap_or("");
            if !self.allowed_prefixes.contains(&token.to_lowercase()) {
                reasons.push(ViolationReason::NotAllowlisted {
                    token: token.to_string(),
                });
            }
        }

        reasons
    }

    /// Aggregate violations for a command list: one entry per distinct
    /// command text, in first-seen order, listing every position it occupies.
    pub fn violations<S: AsRef<str>>(&self, commands: &[S], strict: bool) -> Vec<Violation> {
        let mut violations: Vec<Violation> = Vec::new();
        let mut index: HashMap<&str, usize> = HashMap::new();

        for (i, command) in commands.iter().enumerate() {
            let command = command.as_ref();
            if let Some(&pos) = index.get(command) {
                violations[pos].lines.push(i + 1);
                continue;
            }
            let reasons = self.classify(command, strict);
            if reasons.is_empty() {
                continue;
            }
            index.insert(command, violations.len());
            violations.push(Violation {
                command: command.to_string(),
                lines: vec![i + 1],
                reasons,
            });
        }

        violations
    }
}

impl Default for CommandPolicy {
    fn default() -> Self {
        Self::builtin().clone()
    }
}

/// Gate a command list before transmission. `Ok(())` means safe to proceed;
/// otherwise every offending command is reported. Uses the built-in policy
/// when none is given.
pub fn evaluate_command_safety<S: AsRef<str>>(
    commands: &[S],
    strict: bool,
    policy: Option<&CommandPolicy>,
) -> Result<(), CommandPolicyViolation> {
    let policy = policy.unwrap_or_else(|| CommandPolicy::builtin());
    let violations = policy.violations(commands, strict);
    if violations.is_empty() {
        Ok(())
    } else {
        Err(CommandPolicyViolation { violations })
    }
}
