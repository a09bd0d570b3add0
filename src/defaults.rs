//! System-wide defaults that per-server overrides sit on top of.
//!
//! Layers, lowest to highest: compiled defaults, an optional TOML file, then
//! `GUILDCFG_*` environment variables.

use std::path::Path;

use confique::Config;
use serde::{Deserialize, Serialize};

use crate::error::GuildConfigError;
use crate::types::MAX_PREFIX_LEN;

#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SystemDefaults {
    /// Command prefix used by servers that have not set their own.
    #[config(default = "!", env = "GUILDCFG_PREFIX")]
    pub prefix: String,

    /// Accent colour of structured replies, as `#rrggbb`.
    #[config(default = "#61e096", env = "GUILDCFG_EMBED_COLOR")]
    pub embed_color: String,
}

impl Default for SystemDefaults {
    fn default() -> Self {
        Self {
            prefix: "!".into(),
            embed_color: "#61e096".into(),
        }
    }
}

impl SystemDefaults {
    /// Load defaults from env and, if given, a TOML file. The file may be absent.
    pub fn load(file: Option<&Path>) -> Result<Self, GuildConfigError> {
        let mut builder = Self::builder().env();
        if let Some(path) = file {
            builder = builder.file(path);
        }
        let defaults = builder.load()?;
        defaults.validate()?;
        Ok(defaults)
    }

    /// Check the defaults obey the same rules as per-server overrides.
    pub fn validate(&self) -> Result<(), GuildConfigError> {
        let len = self.prefix.chars().count();
        if len == 0 || len > MAX_PREFIX_LEN {
            return Err(GuildConfigError::InvalidDefault {
                key: "prefix".into(),
                reason: format!("must be 1 to {MAX_PREFIX_LEN} characters, got {len}"),
            });
        }
        let hex = self.embed_color.strip_prefix('#').unwrap_or_default();
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(GuildConfigError::InvalidDefault {
                key: "embed_color".into(),
                reason: format!("expected #rrggbb, got '{}'", self.embed_color),
            });
        }
        Ok(())
    }
}
