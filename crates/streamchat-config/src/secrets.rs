//! Credential lookup.
//!
//! Secrets live in a flat `secrets.toml` (`KEY = "value"` per line), kept
//! apart from `config.toml` so the config can be shared without leaking keys.
//! A lookup checks the file first and falls back to the process environment.
//! Empty values count as absent.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use streamchat_common::ConfigError;
use tracing::{debug, info, warn};

use crate::toml_loader::config_dir;

const SECRETS_FILE: &str = "secrets.toml";

#[derive(Default)]
pub struct SecretStore {
    values: HashMap<String, String>,
    source: Option<PathBuf>,
}

impl fmt::Debug for SecretStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&str> = self.values.keys().map(String::as_str).collect();
        keys.sort_unstable();
        f.debug_struct("SecretStore")
            .field("keys", &keys)
            .field("source", &self.source)
            .finish()
    }
}

impl SecretStore {
    /// A store with no file backing; lookups consult only the environment.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a store from in-memory pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            source: None,
        }
    }

    /// Load secrets from a TOML file. Non-string values are skipped.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::ParseError(format!("failed to read {}: {e}", path.display()))
        })?;
        let table: toml::Table = toml::from_str(&content).map_err(|e| {
            ConfigError::ParseError(format!("failed to parse {}: {e}", path.display()))
        })?;

        let mut values = HashMap::with_capacity(table.len());
        for (key, value) in table {
            match value {
                toml::Value::String(s) => {
                    values.insert(key, s);
                }
                other => warn!(key = %key, kind = other.type_str(), "ignoring non-string secret"),
            }
        }

        info!(path = %path.display(), count = values.len(), "loaded secrets");
        Ok(Self {
            values,
            source: Some(path.to_path_buf()),
        })
    }

    /// Locate and load the secrets file.
    ///
    /// An explicit path must exist. Without one, `<config_dir>/streamchat/secrets.toml`
    /// and then `./secrets.toml` are tried; if neither exists the store is
    /// empty and lookups fall through to the environment.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        let mut candidates = Vec::with_capacity(2);
        if let Ok(dir) = config_dir() {
            candidates.push(dir.join(SECRETS_FILE));
        }
        candidates.push(PathBuf::from(SECRETS_FILE));

        for path in candidates {
            if path.exists() {
                return Self::load(&path);
            }
        }

        debug!("no secrets file found, using environment only");
        Ok(Self::empty())
    }

    /// Look up a secret by key: file first, then environment.
    pub fn lookup(&self, key: &str) -> Option<String> {
        if let Some(value) = self.values.get(key).filter(|v| !v.trim().is_empty()) {
            return Some(value.clone());
        }
        std::env::var(key).ok().filter(|v| !v.trim().is_empty())
    }

    /// Like [`lookup`](Self::lookup), but absence is a `MissingCredential` error.
    pub fn require(&self, key: &str) -> Result<String, ConfigError> {
        self.lookup(key)
            .ok_or_else(|| ConfigError::MissingCredential(key.to_string()))
    }

    /// The file these secrets were read from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_reads_file_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secrets.toml");
        std::fs::write(&path, "STREAMCHAT_TEST_FILE_KEY = \"sk-file\"\n").unwrap();

        let store = SecretStore::load(&path).unwrap();
        assert_eq!(store.lookup("STREAMCHAT_TEST_FILE_KEY").as_deref(), Some("sk-file"));
        assert_eq!(store.source(), Some(path.as_path()));
    }

    #[test]
    fn file_value_wins_over_environment() {
        std::env::set_var("STREAMCHAT_TEST_SHADOWED_KEY", "from-env");
        let store = SecretStore::from_pairs([("STREAMCHAT_TEST_SHADOWED_KEY", "from-file")]);
        assert_eq!(
            store.lookup("STREAMCHAT_TEST_SHADOWED_KEY").as_deref(),
            Some("from-file")
        );
    }

    #[test]
    fn falls_back_to_environment() {
        std::env::set_var("STREAMCHAT_TEST_ENV_ONLY_KEY", "sk-env");
        let store = SecretStore::empty();
        assert_eq!(
            store.lookup("STREAMCHAT_TEST_ENV_ONLY_KEY").as_deref(),
            Some("sk-env")
        );
    }

    #[test]
    fn empty_values_are_absent() {
        std::env::set_var("STREAMCHAT_TEST_BLANK_KEY", "   ");
        let store = SecretStore::from_pairs([("STREAMCHAT_TEST_BLANK_KEY", "")]);
        assert!(store.lookup("STREAMCHAT_TEST_BLANK_KEY").is_none());
    }

    #[test]
    fn require_reports_missing_credential() {
        let store = SecretStore::empty();
        let err = store.require("STREAMCHAT_TEST_NEVER_SET_KEY").unwrap_err();
        assert!(
            matches!(err, ConfigError::MissingCredential(ref key) if key == "STREAMCHAT_TEST_NEVER_SET_KEY")
        );
    }

    #[test]
    fn non_string_values_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secrets.toml");
        std::fs::write(&path, "PORT = 8080\nTOKEN = \"abc\"\n").unwrap();

        let store = SecretStore::load(&path).unwrap();
        assert!(store.values.get("PORT").is_none());
        assert_eq!(store.lookup("TOKEN").as_deref(), Some("abc"));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let err = SecretStore::discover(Some(Path::new("/tmp/streamchat_no_such_secrets.toml")))
            .unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secrets.toml");
        std::fs::write(&path, "OPENAI_API_KEY = ").unwrap();
        let err = SecretStore::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn debug_output_hides_values() {
        let store = SecretStore::from_pairs([("OPENAI_API_KEY", "sk-very-secret")]);
        let rendered = format!("{store:?}");
        assert!(rendered.contains("OPENAI_API_KEY"));
        assert!(!rendered.contains("sk-very-secret"));
    }
}
