use std::fmt;

use serde::{Deserialize, Serialize};

/// Longest prefix a server may configure, in characters.
pub const MAX_PREFIX_LEN: usize = 5;

/// Stable identifier of a server (guild). Platform ids are opaque strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServerId(pub String);

impl ServerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a channel inside a server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(pub String);

impl ChannelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Platform mention syntax, rendered as a clickable reference.
    pub fn mention(&self) -> String {
        format!("<#{}>", self.0)
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The whole per-server document as persisted by a [`ConfigStore`](crate::ConfigStore).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerRecord {
    #[serde(default)]
    pub config: ServerConfig,
}

/// Per-server overrides. Every field is optional; absence means "use the default".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,

    #[serde(default)]
    pub boosts: BoostsConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoostsConfig {
    /// Where boost announcements are posted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<ChannelId>,
}

/// A configurable setting, addressed by the command surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Setting {
    Prefix,
    BoostChannel,
}

impl Setting {
    /// Settings in the order the summary view lists them.
    pub const ALL: [Setting; 2] = [Setting::Prefix, Setting::BoostChannel];

    /// Dotted path of the field inside a [`ServerRecord`].
    pub fn path(self) -> &'static str {
        match self {
            Setting::Prefix => "config.prefix",
            Setting::BoostChannel => "config.boosts.channel",
        }
    }

    /// Human label used in summaries.
    pub fn label(self) -> &'static str {
        match self {
            Setting::Prefix => "Prefix",
            Setting::BoostChannel => "Booster list",
        }
    }

    /// Look a setting up by its command token (`prefix`, `boosts`, `channel`),
    /// ignoring case.
    pub fn from_token(token: &str) -> Option<Setting> {
        match token.to_ascii_lowercase().as_str() {
            "prefix" => Some(Setting::Prefix),
            "boosts" | "channel" => Some(Setting::BoostChannel),
            _ => None,
        }
    }

    fn unset_verbs(self) -> &'static [&'static str] {
        match self {
            Setting::Prefix => &["reset", "unset"],
            Setting::BoostChannel => &["remove", "unset"],
        }
    }
}

impl fmt::Display for Setting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Setting::Prefix => f.write_str("prefix"),
            Setting::BoostChannel => f.write_str("boosts"),
        }
    }
}

/// What a command asks to do with a setting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingAction {
    /// No sub-action: show the current effective value.
    Show,
    /// Store an override. The argument is the raw remainder of the command.
    Set(String),
    /// Remove the override so the default applies again.
    Unset,
    /// A sub-action this setting does not understand.
    Unknown(String),
}

impl SettingAction {
    /// Interpret the action token for `setting`. Matching is case-insensitive.
    pub fn parse(setting: Setting, verb: Option<&str>, argument: &str) -> Self {
        let Some(verb) = verb else {
            return SettingAction::Show;
        };
        let lowered = verb.to_ascii_lowercase();
        if lowered == "set" {
            SettingAction::Set(argument.to_string())
        } else if setting.unset_verbs().contains(&lowered.as_str()) {
            SettingAction::Unset
        } else {
            SettingAction::Unknown(verb.to_string())
        }
    }
}

/// An effective value of a setting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingValue {
    Prefix(String),
    Channel(ChannelId),
    NotConfigured,
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingValue::Prefix(p) => write!(f, "`{p}`"),
            SettingValue::Channel(id) => f.write_str(&id.mention()),
            SettingValue::NotConfigured => f.write_str("Not configured"),
        }
    }
}

/// A channel known to the server the command runs in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub id: ChannelId,
    pub name: String,
}

impl Channel {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: ChannelId::new(id),
            name: name.into(),
        }
    }
}
