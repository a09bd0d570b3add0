//! Setting mutation: validate a requested change, detect no-ops, and issue at
//! most one store write.

use tracing::{debug, info};

use crate::channel::ChannelLookup;
use crate::defaults::SystemDefaults;
use crate::error::{GuildConfigError, ValidationError};
use crate::resolve::{self, Resolved};
use crate::store::ConfigStore;
use crate::types::{MAX_PREFIX_LEN, ServerConfig, ServerId, Setting, SettingAction, SettingValue};

/// Outcome of [`apply`]. Only `Applied` means the store was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationResult {
    /// Read-only request; the current effective value.
    Current(Resolved),
    Applied {
        setting: Setting,
        old: SettingValue,
        new: SettingValue,
    },
    NoOpAlreadySet {
        setting: Setting,
        value: SettingValue,
    },
    NoOpAlreadyDefault {
        setting: Setting,
        default: SettingValue,
    },
    NoOpUnknownAction {
        setting: Setting,
        action: String,
    },
}

/// Apply `action` to `setting` for `server`, whose current snapshot is `config`.
///
/// Validation failures return [`GuildConfigError::Validation`] and store
/// failures [`GuildConfigError::StoreUnavailable`]; neither leaves a partial write.
pub async fn apply<L>(
    store: &dyn ConfigStore,
    server: &ServerId,
    config: &ServerConfig,
    setting: Setting,
    action: &SettingAction,
    defaults: &SystemDefaults,
    channels: &L,
) -> Result<MutationResult, GuildConfigError>
where
    L: ChannelLookup + ?Sized,
{
    let current = resolve::resolve(config, setting, defaults);

    let result = match action {
        SettingAction::Show => MutationResult::Current(current),
        SettingAction::Unknown(verb) => MutationResult::NoOpUnknownAction {
            setting,
            action: verb.clone(),
        },
        SettingAction::Set(argument) => {
            let (new, stored) = validate(setting, argument, channels)?;
            let unchanged = match setting {
                Setting::Prefix => current.value == new,
                // An unset channel never equals a real one, so compare the override directly.
                Setting::BoostChannel => !current.is_default && current.value == new,
            };
            if unchanged {
                MutationResult::NoOpAlreadySet {
                    setting,
                    value: new,
                }
            } else {
                store.set_field(server, setting.path(), stored).await?;
                MutationResult::Applied {
                    setting,
                    old: current.value,
                    new,
                }
            }
        }
        SettingAction::Unset => {
            let default = resolve::resolve(&ServerConfig::default(), setting, defaults).value;
            if current.is_default {
                MutationResult::NoOpAlreadyDefault { setting, default }
            } else {
                store.unset_field(server, setting.path()).await?;
                MutationResult::Applied {
                    setting,
                    old: current.value,
                    new: default,
                }
            }
        }
    };

    match &result {
        MutationResult::Applied { setting, old, new } => {
            info!(server = %server, %setting, %old, %new, "setting changed");
        }
        MutationResult::Current(_) => {}
        other => debug!(server = %server, outcome = ?other, "no change"),
    }
    Ok(result)
}

/// Check a `set` argument and turn it into the new value and its stored form.
fn validate<L>(
    setting: Setting,
    argument: &str,
    channels: &L,
) -> Result<(SettingValue, toml::Value), ValidationError>
where
    L: ChannelLookup + ?Sized,
{
    let argument = argument.trim();
    match setting {
        Setting::Prefix => {
            let len = argument.chars().count();
            if len == 0 {
                return Err(ValidationError::PrefixEmpty);
            }
            if len > MAX_PREFIX_LEN {
                return Err(ValidationError::PrefixTooLong { len });
            }
            let stored = toml::Value::String(argument.to_string());
            Ok((SettingValue::Prefix(argument.to_string()), stored))
        }
        Setting::BoostChannel => {
            if argument.is_empty() {
                return Err(ValidationError::ChannelMissing);
            }
            let channel = channels
                .find_channel(argument)
                .ok_or_else(|| ValidationError::ChannelNotFound(argument.to_string()))?;
            let stored = toml::Value::String(channel.id.as_str().to_string());
            Ok((SettingValue::Channel(channel.id), stored))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::{channels, server};
    use crate::store::MemoryStore;
    use crate::types::{BoostsConfig, Channel, ChannelId};

    async fn snapshot(store: &MemoryStore) -> ServerConfig {
        store
            .get(&server())
            .await
            .unwrap()
            .map(|r| r.config)
            .unwrap_or_default()
    }

    async fn run(
        store: &MemoryStore,
        setting: Setting,
        action: SettingAction,
    ) -> Result<MutationResult, GuildConfigError> {
        let config = snapshot(store).await;
        apply(
            store,
            &server(),
            &config,
            setting,
            &action,
            &SystemDefaults::default(),
            channels().as_slice(),
        )
        .await
    }

    fn set(arg: &str) -> SettingAction {
        SettingAction::Set(arg.into())
    }

    #[tokio::test]
    async fn valid_prefixes_round_trip() {
        for prefix in ["?", "!!", "abc", "ab-c", "12345", "éé"] {
            let store = MemoryStore::new();
            let result = run(&store, Setting::Prefix, set(prefix)).await.unwrap();
            assert!(matches!(result, MutationResult::Applied { .. }), "{prefix}");
            let config = snapshot(&store).await;
            let r = resolve::resolve(&config, Setting::Prefix, &SystemDefaults::default());
            assert_eq!(r.value, SettingValue::Prefix(prefix.into()));
            assert!(!r.is_default);
        }
    }

    #[tokio::test]
    async fn long_prefix_rejected_without_write() {
        let store = MemoryStore::new();
        let before = store.document(&server()).await;
        let err = run(&store, Setting::Prefix, set("toolong")).await.unwrap_err();
        assert!(matches!(
            err,
            GuildConfigError::Validation(ValidationError::PrefixTooLong { len: 7 })
        ));
        assert_eq!(store.write_count(), 0);
        assert_eq!(store.document(&server()).await, before);
    }

    #[tokio::test]
    async fn empty_prefix_rejected() {
        let store = MemoryStore::new();
        let err = run(&store, Setting::Prefix, set("   ")).await.unwrap_err();
        assert!(matches!(
            err,
            GuildConfigError::Validation(ValidationError::PrefixEmpty)
        ));
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn prefix_equal_to_effective_value_is_noop() {
        let store = MemoryStore::new();
        let result = run(&store, Setting::Prefix, set("!")).await.unwrap();
        assert_eq!(
            result,
            MutationResult::NoOpAlreadySet {
                setting: Setting::Prefix,
                value: SettingValue::Prefix("!".into()),
            }
        );
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn setting_same_prefix_twice_writes_once() {
        let store = MemoryStore::new();
        run(&store, Setting::Prefix, set("??")).await.unwrap();
        let second = run(&store, Setting::Prefix, set(" ?? ")).await.unwrap();
        assert!(matches!(second, MutationResult::NoOpAlreadySet { .. }));
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn reset_never_set_prefix_is_noop() {
        let store = MemoryStore::new();
        let result = run(&store, Setting::Prefix, SettingAction::Unset)
            .await
            .unwrap();
        assert_eq!(
            result,
            MutationResult::NoOpAlreadyDefault {
                setting: Setting::Prefix,
                default: SettingValue::Prefix("!".into()),
            }
        );
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn reset_clears_override() {
        let store = MemoryStore::new();
        run(&store, Setting::Prefix, set("??")).await.unwrap();
        let result = run(&store, Setting::Prefix, SettingAction::Unset)
            .await
            .unwrap();
        assert_eq!(
            result,
            MutationResult::Applied {
                setting: Setting::Prefix,
                old: SettingValue::Prefix("??".into()),
                new: SettingValue::Prefix("!".into()),
            }
        );
        let config = snapshot(&store).await;
        let r = resolve::resolve(&config, Setting::Prefix, &SystemDefaults::default());
        assert!(r.is_default);
        assert_eq!(r.value, SettingValue::Prefix("!".into()));
        assert_eq!(store.write_count(), 2);
    }

    #[tokio::test]
    async fn unknown_channel_rejected_without_write() {
        let store = MemoryStore::new();
        let err = run(&store, Setting::BoostChannel, set("<#999>"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GuildConfigError::Validation(ValidationError::ChannelNotFound(_))
        ));
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn missing_channel_argument_rejected() {
        let store = MemoryStore::new();
        let err = run(&store, Setting::BoostChannel, set("")).await.unwrap_err();
        assert!(matches!(
            err,
            GuildConfigError::Validation(ValidationError::ChannelMissing)
        ));
    }

    #[tokio::test]
    async fn same_channel_twice_writes_once() {
        let store = MemoryStore::new();
        let first = run(&store, Setting::BoostChannel, set("boosts"))
            .await
            .unwrap();
        assert_eq!(
            first,
            MutationResult::Applied {
                setting: Setting::BoostChannel,
                old: SettingValue::NotConfigured,
                new: SettingValue::Channel(ChannelId::new("20")),
            }
        );
        // Same channel by mention instead of name.
        let second = run(&store, Setting::BoostChannel, set("<#20>"))
            .await
            .unwrap();
        assert!(matches!(second, MutationResult::NoOpAlreadySet { .. }));
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn switching_channel_applies() {
        let store = MemoryStore::new();
        run(&store, Setting::BoostChannel, set("boosts")).await.unwrap();
        let result = run(&store, Setting::BoostChannel, set("10")).await.unwrap();
        assert!(matches!(result, MutationResult::Applied { .. }));
        assert_eq!(
            snapshot(&store).await.boosts.channel,
            Some(ChannelId::new("10"))
        );
    }

    #[tokio::test]
    async fn remove_absent_channel_is_noop() {
        let store = MemoryStore::new();
        let result = run(&store, Setting::BoostChannel, SettingAction::Unset)
            .await
            .unwrap();
        assert_eq!(
            result,
            MutationResult::NoOpAlreadyDefault {
                setting: Setting::BoostChannel,
                default: SettingValue::NotConfigured,
            }
        );
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn remove_present_channel_clears_it() {
        let store = MemoryStore::new();
        run(&store, Setting::BoostChannel, set("general")).await.unwrap();
        run(&store, Setting::BoostChannel, SettingAction::Unset)
            .await
            .unwrap();
        let config = snapshot(&store).await;
        let r = resolve::resolve(&config, Setting::BoostChannel, &SystemDefaults::default());
        assert_eq!(r.value, SettingValue::NotConfigured);
        assert_eq!(r.display, "Not configured");
    }

    #[tokio::test]
    async fn show_is_read_only() {
        let store = MemoryStore::new();
        let result = run(&store, Setting::Prefix, SettingAction::Show)
            .await
            .unwrap();
        assert!(matches!(result, MutationResult::Current(ref r) if r.is_default));
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn unknown_action_is_explicit_noop() {
        let store = MemoryStore::new();
        let action = SettingAction::Unknown("frobnicate".into());
        let result = run(&store, Setting::BoostChannel, action).await.unwrap();
        assert_eq!(
            result,
            MutationResult::NoOpUnknownAction {
                setting: Setting::BoostChannel,
                action: "frobnicate".into(),
            }
        );
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn store_failure_surfaces() {
        let store = MemoryStore::new();
        store.set_unavailable(true);
        let err = apply(
            &store,
            &server(),
            &ServerConfig::default(),
            Setting::Prefix,
            &set("?"),
            &SystemDefaults::default(),
            channels().as_slice(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, GuildConfigError::StoreUnavailable(_)));
    }

    #[tokio::test]
    async fn decision_uses_the_given_snapshot() {
        // A stale snapshot that still shows the channel: the unset goes through
        // and the store treats it as a no-op.
        let store = MemoryStore::new();
        let stale = ServerConfig {
            prefix: None,
            boosts: BoostsConfig {
                channel: Some(ChannelId::new("10")),
            },
        };
        let lookup: Vec<Channel> = channels();
        let result = apply(
            &store,
            &server(),
            &stale,
            Setting::BoostChannel,
            &SettingAction::Unset,
            &SystemDefaults::default(),
            &lookup,
        )
        .await
        .unwrap();
        assert!(matches!(result, MutationResult::Applied { .. }));
        assert_eq!(store.write_count(), 1);
        assert_eq!(store.get(&server()).await.unwrap(), None);
    }
}
