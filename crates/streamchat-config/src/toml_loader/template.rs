//! Default TOML config template with inline documentation comments.

/// Generate the default TOML config content with comments.
pub(crate) fn default_config_toml() -> String {
    r##"# streamchat configuration
# Schema version 1
# Only override what you want to change -- missing fields use defaults.
# The API key does not belong here; put it in secrets.toml next to this file.

[provider]
# model = "gpt-3.5-turbo"
# temperature = 0.7              # 0.0-2.0
# base_url = "https://api.openai.com/v1"
# max_tokens = 0                 # 0 = provider default
# request_timeout_secs = 120     # 1-600
# credential_key = "OPENAI_API_KEY"

[persona]
# system_prompt = "You are a helpful assistant."
# title = "ChatGPT-like clone"
# caption = "Powered by streamchat"
# input_placeholder = "What is up?"

[server]
# bind_address = "127.0.0.1"
# port = 8501
# session_ttl_secs = 3600        # 60-604800

[history]
# policy = "full"                # full, recent
# max_turns = 20                 # 1-1000, used by "recent"

[logging]
# level = "INFO"                 # DEBUG, INFO, WARNING, ERROR
"##
    .to_string()
}
