//! Text command routing for `config`.
//!
//! Parses `config [setting] [action] [argument]`, runs the resolver or mutator
//! against a fresh store snapshot, and sends at most one reply. Every outcome,
//! including silent ones, is returned as an [`Outcome`] so callers and tests
//! can tell them apart.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::defaults::SystemDefaults;
use crate::error::{GuildConfigError, StoreError, ValidationError};
use crate::mutate::{self, MutationResult};
use crate::reply::{Embed, EmbedField, Replier, Reply};
use crate::resolve;
use crate::store::ConfigStore;
use crate::types::{Channel, ServerId, ServerRecord, Setting, SettingAction, SettingValue};

/// Words that invoke the command, matched case-insensitively.
pub const TRIGGERS: [&str; 3] = ["config", "cfg", "setup"];

const SUMMARY_TITLE: &str = "The current settings for this server:";
const STORE_FAILURE: &str = "Something went wrong while accessing the settings. Please try again later.";

/// Where a command came from.
#[derive(Debug, Clone)]
pub struct Invocation<'a> {
    pub server: ServerId,
    /// Display tag of the caller, shown in summary footers.
    pub author: String,
    /// Channels of the server, used to resolve channel references.
    pub channels: &'a [Channel],
}

/// What the router did with a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The message is not a `config` command for this server. No reply.
    NotACommand,
    /// The server has no record in the store. No reply.
    UnknownServer,
    /// The first argument names no setting. No reply.
    UnknownSetting(String),
    /// All settings were listed.
    Summary,
    Mutation(MutationResult),
    Rejected(ValidationError),
    /// The store could not be read or written; a generic failure was sent.
    StoreFailed,
}

pub struct CommandRouter {
    store: Arc<dyn ConfigStore>,
    defaults: SystemDefaults,
}

impl CommandRouter {
    pub fn new(store: Arc<dyn ConfigStore>, defaults: SystemDefaults) -> Self {
        Self { store, defaults }
    }

    /// Handle raw message content, which must start with the server's
    /// effective prefix followed by a trigger word.
    pub async fn handle_message(
        &self,
        invocation: &Invocation<'_>,
        content: &str,
        replier: &dyn Replier,
    ) -> Result<Outcome, GuildConfigError> {
        let record = self.store.get(&invocation.server).await;
        let prefix = match &record {
            Ok(Some(r)) => resolve::effective_prefix(&r.config, &self.defaults),
            _ => self.defaults.prefix.as_str(),
        };
        let Some(arguments) = parse_invocation(content, prefix) else {
            return Ok(Outcome::NotACommand);
        };
        self.dispatch(invocation, record, arguments, replier).await
    }

    /// Handle the text after the trigger word, e.g. `prefix set !!`.
    pub async fn handle_command(
        &self,
        invocation: &Invocation<'_>,
        arguments: &str,
        replier: &dyn Replier,
    ) -> Result<Outcome, GuildConfigError> {
        let record = self.store.get(&invocation.server).await;
        self.dispatch(invocation, record, arguments, replier).await
    }

    async fn dispatch(
        &self,
        invocation: &Invocation<'_>,
        record: Result<Option<ServerRecord>, StoreError>,
        arguments: &str,
        replier: &dyn Replier,
    ) -> Result<Outcome, GuildConfigError> {
        let record = match record {
            Ok(Some(record)) => record,
            Ok(None) => {
                debug!(server = %invocation.server, "no server record, ignoring command");
                return Ok(Outcome::UnknownServer);
            }
            Err(e) => return self.store_failed(invocation, e, replier).await,
        };

        let parts = split_arguments(arguments, 3);
        let Some(token) = parts.first() else {
            send(replier, self.summary(&record, &invocation.author)).await?;
            return Ok(Outcome::Summary);
        };
        let setting = match resolve::resolve_named(&record.config, token, &self.defaults) {
            Ok(current) => current.setting,
            Err(GuildConfigError::UnknownSetting(name)) => {
                debug!(server = %invocation.server, token = %name, "unknown setting");
                return Ok(Outcome::UnknownSetting(name));
            }
            Err(e) => return Err(e),
        };

        let verb = parts.get(1).copied();
        let argument = parts.get(2).copied().unwrap_or_default();
        let action = SettingAction::parse(setting, verb, argument);

        let result = mutate::apply(
            self.store.as_ref(),
            &invocation.server,
            &record.config,
            setting,
            &action,
            &self.defaults,
            invocation.channels,
        )
        .await;

        match result {
            Ok(result) => {
                if let Some(reply) = reply_for(&result) {
                    send(replier, reply).await?;
                }
                Ok(Outcome::Mutation(result))
            }
            Err(GuildConfigError::Validation(e)) => {
                send(replier, Reply::Text(e.to_string())).await?;
                Ok(Outcome::Rejected(e))
            }
            Err(GuildConfigError::StoreUnavailable(e)) => {
                self.store_failed(invocation, e, replier).await
            }
            Err(e) => Err(e),
        }
    }

    async fn store_failed(
        &self,
        invocation: &Invocation<'_>,
        error: StoreError,
        replier: &dyn Replier,
    ) -> Result<Outcome, GuildConfigError> {
        warn!(server = %invocation.server, error = %error, "config store call failed");
        send(replier, Reply::Text(STORE_FAILURE.into())).await?;
        Ok(Outcome::StoreFailed)
    }

    fn summary(&self, record: &ServerRecord, author: &str) -> Reply {
        let fields = resolve::resolve_all(&record.config, &self.defaults)
            .into_iter()
            .map(|r| EmbedField {
                name: r.setting.label().into(),
                value: r.display,
                inline: true,
            })
            .collect();
        Reply::Embed(Embed {
            title: SUMMARY_TITLE.into(),
            fields,
            color: self.defaults.embed_color.clone(),
            footer: Some(format!("Requested by {author}")),
        })
    }
}

async fn send(replier: &dyn Replier, reply: Reply) -> Result<(), GuildConfigError> {
    replier.send(reply).await.map_err(|e| {
        warn!(error = %e, "failed to send reply");
        GuildConfigError::from(e)
    })
}

/// Text shown for a mutation outcome. Unknown actions are ignored silently.
fn reply_for(result: &MutationResult) -> Option<Reply> {
    let text = match result {
        MutationResult::Current(r) => match (r.setting, r.is_default) {
            (Setting::Prefix, true) => format!("The prefix is {} (default).", r.display),
            (Setting::Prefix, false) => format!("The prefix is {}.", r.display),
            (Setting::BoostChannel, true) => "The booster list channel is not configured.".into(),
            (Setting::BoostChannel, false) => {
                format!("The booster list channel is {}.", r.display)
            }
        },
        MutationResult::Applied { setting, new, .. } => match (setting, new) {
            (Setting::BoostChannel, SettingValue::NotConfigured) => {
                "The booster list channel has been removed.".into()
            }
            (Setting::BoostChannel, _) => format!("The booster list channel has been set to {new}"),
            (Setting::Prefix, _) => format!("The prefix has been set to {new}"),
        },
        MutationResult::NoOpAlreadySet { setting, value } => match setting {
            Setting::Prefix => format!("The prefix is already set to {value}."),
            Setting::BoostChannel => {
                "The booster list channel is already set to the same one.".into()
            }
        },
        MutationResult::NoOpAlreadyDefault { setting, .. } => match setting {
            Setting::Prefix => "The prefix is already set to the default one.".into(),
            Setting::BoostChannel => "The booster list channel has already been removed.".into(),
        },
        MutationResult::NoOpUnknownAction { .. } => return None,
    };
    Some(Reply::Text(text))
}

/// Strip `prefix` and a trigger word from `content`, returning the rest.
pub fn parse_invocation<'a>(content: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = content.trim_start().strip_prefix(prefix)?;
    let (word, arguments) = match rest.split_once(char::is_whitespace) {
        Some((word, arguments)) => (word, arguments),
        None => (rest, ""),
    };
    TRIGGERS
        .iter()
        .any(|t| t.eq_ignore_ascii_case(word))
        .then_some(arguments.trim())
}

/// Split on whitespace into at most `limit` pieces; the last keeps the remainder.
pub fn split_arguments(text: &str, limit: usize) -> Vec<&str> {
    let mut parts = Vec::new();
    if limit == 0 {
        return parts;
    }
    let mut rest = text.trim();
    while !rest.is_empty() {
        if parts.len() + 1 == limit {
            parts.push(rest);
            break;
        }
        match rest.split_once(char::is_whitespace) {
            Some((head, tail)) => {
                parts.push(head);
                rest = tail.trim_start();
            }
            None => {
                parts.push(rest);
                break;
            }
        }
    }
    parts
}
