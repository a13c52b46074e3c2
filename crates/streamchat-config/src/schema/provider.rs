//! Completion provider configuration types.

use serde::{Deserialize, Serialize};

/// Completion provider settings.
///
/// Values here are fixed for the lifetime of the process; every session
/// shares the same model and sampling temperature.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub model: String,
    /// Sampling temperature (valid range: 0.0-2.0).
    pub temperature: f64,
    /// Base URL of an OpenAI-compatible API, without the `/chat/completions` suffix.
    pub base_url: String,
    /// Upper bound on generated tokens. `0` leaves it to the provider.
    pub max_tokens: u32,
    /// Whole-request timeout in seconds (valid range: 1-600).
    pub request_timeout_secs: u32,
    /// Name of the secret holding the API key.
    pub credential_key: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            model: "gpt-3.5-turbo".into(),
            temperature: 0.7,
            base_url: "https://api.openai.com/v1".into(),
            max_tokens: 0,
            request_timeout_secs: 120,
            credential_key: "OPENAI_API_KEY".into(),
        }
    }
}
