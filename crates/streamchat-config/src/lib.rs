//! streamchat configuration system.
//!
//! Provides TOML-based configuration with validation and a separate
//! secrets store for the provider credential. All config sections use
//! defaults so partial configs work out of the box.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use streamchat_config::{load_config, SecretStore};
//!
//! let config = load_config(None).expect("failed to load config");
//! let secrets = SecretStore::discover(None).expect("failed to read secrets");
//! let key = secrets.require(&config.provider.credential_key);
//! ```

pub mod schema;
pub mod secrets;
pub mod toml_loader;
pub mod validation;

pub use schema::{StreamchatConfig, CONFIG_SCHEMA_VERSION};
pub use secrets::SecretStore;

use std::path::Path;

use streamchat_common::ConfigError;

/// Load config from an explicit path, or from the platform default path.
///
/// An explicit path must exist. The default path is created from the
/// commented template on first run. The result is validated.
pub fn load_config(path: Option<&Path>) -> Result<StreamchatConfig, ConfigError> {
    let config = match path {
        Some(path) => toml_loader::load_from_path(path)?,
        None => toml_loader::load_default()?,
    };

    validation::validate(&config)?;
    Ok(config)
}
