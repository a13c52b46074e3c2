//! Per-section validators.

use crate::schema::{HistoryPolicyKind, StreamchatConfig};

use super::helpers::{validate_non_empty, validate_range, validate_range_f64};

pub(crate) fn validate_provider(errors: &mut Vec<String>, config: &StreamchatConfig) {
    let provider = &config.provider;
    validate_non_empty(errors, "provider.model", &provider.model);
    validate_non_empty(errors, "provider.credential_key", &provider.credential_key);
    validate_range_f64(errors, "provider.temperature", provider.temperature, 0.0, 2.0);
    validate_range(
        errors,
        "provider.request_timeout_secs",
        u64::from(provider.request_timeout_secs),
        1,
        600,
    );

    let base = provider.base_url.trim();
    if !(base.starts_with("http://") || base.starts_with("https://")) {
        errors.push(format!(
            "provider.base_url = {base:?} must start with http:// or https://"
        ));
    }
}

/// The system prompt may be blank, but the page needs a title.
pub(crate) fn validate_persona(errors: &mut Vec<String>, config: &StreamchatConfig) {
    validate_non_empty(errors, "persona.title", &config.persona.title);
}

pub(crate) fn validate_server(errors: &mut Vec<String>, config: &StreamchatConfig) {
    validate_non_empty(errors, "server.bind_address", &config.server.bind_address);
    if config.server.port == 0 {
        errors.push("server.port must not be 0".into());
    }
    validate_range(
        errors,
        "server.session_ttl_secs",
        config.server.session_ttl_secs,
        60,
        604_800,
    );
}

pub(crate) fn validate_history(errors: &mut Vec<String>, config: &StreamchatConfig) {
    if config.history.policy == HistoryPolicyKind::Recent {
        validate_range(
            errors,
            "history.max_turns",
            u64::from(config.history.max_turns),
            1,
            1000,
        );
    }
}
