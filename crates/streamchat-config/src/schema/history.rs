//! History projection configuration types.

use serde::{Deserialize, Serialize};

/// How much of the transcript is sent to the provider on each turn.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum HistoryPolicyKind {
    /// Resend every turn.
    #[default]
    Full,
    /// Resend the system seed plus the most recent `max_turns` turns.
    Recent,
}

/// History projection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub policy: HistoryPolicyKind,
    /// Only used by the `recent` policy (valid range: 1-1000).
    pub max_turns: u32,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            policy: HistoryPolicyKind::Full,
            max_turns: 20,
        }
    }
}
