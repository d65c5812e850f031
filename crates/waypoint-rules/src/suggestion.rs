use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{AsRefStr, Display};

/// Coarse urgency band derived from a numeric priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PriorityTier {
    /// 90 and above
    Critical,
    /// 80-89
    High,
    /// 70-79
    Medium,
    /// 60-69
    Low,
    /// below 60
    Optional,
}

impl PriorityTier {
    #[must_use]
    pub const fn from_priority(priority: u8) -> Self {
        match priority {
            90..=u8::MAX => Self::Critical,
            80..=89 => Self::High,
            70..=79 => Self::Medium,
            60..=69 => Self::Low,
            _ => Self::Optional,
        }
    }
}

/// What a rule proposes, before the engine attaches its priority
#[derive(Debug, Clone, PartialEq)]
pub struct Proposal {
    pub action: String,
    pub target_tool: &'static str,
    pub params: Value,
}

/// A ranked, ready-to-invoke next action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub priority: u8,
    pub tier: PriorityTier,
    /// Human-readable action
    pub action: String,
    pub target_tool: String,
    pub params: Value,
    /// Rule that produced this suggestion
    pub rule_id: String,
}
