//! Configuration schema types for streamchat.
//!
//! All structs use `serde(default)` so partial configs work correctly.
//! Missing fields are filled with the defaults the chat has always used.

mod history;
mod persona;
mod provider;
mod server;
mod system;

pub use history::*;
pub use persona::*;
pub use provider::*;
pub use server::*;
pub use system::*;

use serde::{Deserialize, Serialize};

/// Current config schema version.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Root configuration for streamchat.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StreamchatConfig {
    pub provider: ProviderConfig,
    pub persona: PersonaConfig,
    pub server: ServerConfig,
    pub history: HistoryConfig,
    pub logging: LoggingConfig,
}
