//! Effective-value resolution: merge a server's overrides over system defaults.
//!
//! Pure functions over a snapshot; nothing here touches the store.

use crate::defaults::SystemDefaults;
use crate::error::GuildConfigError;
use crate::types::{ServerConfig, Setting, SettingValue};

/// A setting's effective value and how to show it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub setting: Setting,
    pub value: SettingValue,
    /// `true` when no override is stored and the default applies.
    pub is_default: bool,
    pub display: String,
}

/// Resolve `setting` against `config`, falling back to `defaults`.
pub fn resolve(config: &ServerConfig, setting: Setting, defaults: &SystemDefaults) -> Resolved {
    let (value, is_default) = match setting {
        Setting::Prefix => match &config.prefix {
            Some(prefix) => (SettingValue::Prefix(prefix.clone()), false),
            None => (SettingValue::Prefix(defaults.prefix.clone()), true),
        },
        Setting::BoostChannel => match &config.boosts.channel {
            Some(channel) => (SettingValue::Channel(channel.clone()), false),
            None => (SettingValue::NotConfigured, true),
        },
    };
    let display = value.to_string();
    Resolved {
        setting,
        value,
        is_default,
        display,
    }
}

/// Resolve a setting given by its command token (`prefix`, `boosts`, `channel`).
pub fn resolve_named(
    config: &ServerConfig,
    name: &str,
    defaults: &SystemDefaults,
) -> Result<Resolved, GuildConfigError> {
    let setting =
        Setting::from_token(name).ok_or_else(|| GuildConfigError::UnknownSetting(name.into()))?;
    Ok(resolve(config, setting, defaults))
}

/// Every setting, in summary order.
pub fn resolve_all(config: &ServerConfig, defaults: &SystemDefaults) -> Vec<Resolved> {
    Setting::ALL
        .iter()
        .map(|setting| resolve(config, *setting, defaults))
        .collect()
}

/// The prefix commands must start with on this server.
pub fn effective_prefix<'a>(config: &'a ServerConfig, defaults: &'a SystemDefaults) -> &'a str {
    config.prefix.as_deref().unwrap_or(&defaults.prefix)
}
