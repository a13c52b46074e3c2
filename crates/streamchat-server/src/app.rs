//! Startup wiring: credentials, provider client, session store.

use std::sync::Arc;
use std::time::Duration;

use streamchat_ai::{AiClient, AiError, FullHistory, HistoryPolicy, OpenAiClient, OpenAiConfig, RecentTurns};
use streamchat_common::{ConfigError, StreamchatError};
use streamchat_config::schema::{HistoryConfig, HistoryPolicyKind, ProviderConfig};
use streamchat_config::{SecretStore, StreamchatConfig};

use crate::page::render_page;
use crate::store::SessionStore;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Provider client error: {0}")]
    Ai(#[from] AiError),
}

impl From<ServerError> for StreamchatError {
    fn from(e: ServerError) -> Self {
        match e {
            ServerError::Config(e) => StreamchatError::Config(e),
            ServerError::Ai(e) => StreamchatError::Ai(e.to_string()),
        }
    }
}

/// Everything a connection handler needs. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<StreamchatConfig>,
    pub client: Arc<dyn AiClient>,
    pub store: SessionStore,
    page: Arc<str>,
}

impl AppState {
    pub fn new(config: StreamchatConfig, client: Arc<dyn AiClient>) -> Self {
        let store = SessionStore::new(
            config.persona.system_prompt.clone(),
            history_policy(&config.history),
        );
        let page = Arc::from(render_page(&config.persona));
        Self {
            config: Arc::new(config),
            client,
            store,
            page,
        }
    }

    /// Rendered chat page.
    pub fn page(&self) -> &str {
        &self.page
    }
}

/// Resolve the provider credential and build the application state.
///
/// A missing credential is returned as `ConfigError::MissingCredential`,
/// which the binary treats as fatal.
pub fn initialize(config: StreamchatConfig, secrets: &SecretStore) -> Result<AppState, ServerError> {
    let api_key = secrets.require(&config.provider.credential_key)?;
    let client = OpenAiClient::new(openai_config(&config.provider, api_key))?;

    tracing::info!(
        model = %config.provider.model,
        base_url = %config.provider.base_url,
        credential_source = ?secrets.source(),
        "Provider client ready"
    );

    Ok(AppState::new(config, Arc::new(client)))
}

fn openai_config(provider: &ProviderConfig, api_key: String) -> OpenAiConfig {
    OpenAiConfig::new(api_key)
        .with_base_url(provider.base_url.clone())
        .with_model(provider.model.clone())
        .with_temperature(provider.temperature)
        .with_max_tokens(Some(provider.max_tokens))
        .with_request_timeout(Duration::from_secs(u64::from(provider.request_timeout_secs)))
}

pub fn history_policy(config: &HistoryConfig) -> Arc<dyn HistoryPolicy> {
    match config.policy {
        HistoryPolicyKind::Full => Arc::new(FullHistory),
        HistoryPolicyKind::Recent => Arc::new(RecentTurns::new(config.max_turns as usize)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_credential_is_reported_by_key() {
        let mut config = StreamchatConfig::default();
        config.provider.credential_key = "STREAMCHAT_TEST_UNSET_KEY".into();

        let err = initialize(config, &SecretStore::empty()).err().unwrap();
        match err {
            ServerError::Config(ConfigError::MissingCredential(key)) => {
                assert_eq!(key, "STREAMCHAT_TEST_UNSET_KEY");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_credential_stays_a_config_error_at_the_top() {
        let err = ServerError::Config(ConfigError::MissingCredential("OPENAI_API_KEY".into()));
        let top = StreamchatError::from(err);
        assert!(matches!(top, StreamchatError::Config(ConfigError::MissingCredential(_))));
        assert!(top.to_string().starts_with("OPENAI_API_KEY not found"));
    }

    #[test]
    fn initialize_uses_provider_settings() {
        let mut config = StreamchatConfig::default();
        config.provider.model = "gpt-4o-mini".into();
        let secrets = SecretStore::from_pairs([("OPENAI_API_KEY", "sk-test")]);

        let state = initialize(config, &secrets).unwrap();
        assert_eq!(state.client.model(), "gpt-4o-mini");
        assert!(state.page().contains("ChatGPT-like clone"));
    }

    #[test]
    fn openai_config_treats_zero_max_tokens_as_unset() {
        let mut provider = ProviderConfig::default();
        let cfg = openai_config(&provider, "k".into());
        assert_eq!(cfg.max_tokens, None);

        provider.max_tokens = 256;
        provider.request_timeout_secs = 30;
        let cfg = openai_config(&provider, "k".into());
        assert_eq!(cfg.max_tokens, Some(256));
        assert_eq!(cfg.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn recent_policy_is_built_from_config() {
        let config = HistoryConfig {
            policy: HistoryPolicyKind::Recent,
            max_turns: 4,
        };
        let debug = format!("{:?}", history_policy(&config));
        assert!(debug.contains("RecentTurns"));
        assert!(debug.contains('4'));
    }
}
