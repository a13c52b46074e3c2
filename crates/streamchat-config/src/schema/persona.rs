//! Assistant persona and page chrome.

use serde::{Deserialize, Serialize};

/// Seed prompt and the text shown around the chat.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonaConfig {
    /// Content of the system turn every transcript starts with.
    pub system_prompt: String,
    pub title: String,
    pub caption: String,
    pub input_placeholder: String,
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            system_prompt: "You are a helpful assistant.".into(),
            title: "ChatGPT-like clone".into(),
            caption: "Powered by streamchat".into(),
            input_placeholder: "What is up?".into(),
        }
    }
}
