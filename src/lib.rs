//! Per-server settings for chat bots: a command prefix and a boost
//! announcement channel, stored as sparse overrides over system defaults.
//!
//! ```ignore
//! let router = CommandRouter::new(store, SystemDefaults::load(None)?);
//! router.handle_message(&invocation, "!config prefix set ??", &replier).await?;
//! ```
//!
//! # Model
//!
//! Each server has one document. Its `config` table holds optional overrides:
//!
//! ```toml
//! [config]
//! prefix = "??"
//!
//! [config.boosts]
//! channel = "812345678901234567"
//! ```
//!
//! A missing field means "use the default". Nothing ever stores an empty string
//! or a sentinel to mean "unset"; fields are removed instead. That keeps the
//! [effective value](resolve::resolve) unambiguous: override if present,
//! otherwise the [`SystemDefaults`] value.
//!
//! # Pieces
//!
//! - [`ConfigStore`] persists documents and exposes only two writes:
//!   `set_field` and `unset_field` on a dotted path such as
//!   `config.boosts.channel`. Both are idempotent and atomic per call.
//!   [`MemoryStore`] and [`FileStore`] implement it.
//! - [`resolve`] computes effective values and their display form. Pure.
//! - [`mutate::apply`] validates a change, reports no-ops without touching
//!   the store, and otherwise issues exactly one write.
//! - [`CommandRouter`] parses `config [setting] [action] [argument]`, runs
//!   the above against a fresh snapshot, and sends at most one [`Reply`]
//!   through a [`Replier`].
//!
//! # Commands
//!
//! | Command | Effect |
//! |---------|--------|
//! | `config` | summary of every setting |
//! | `config prefix` | show the prefix |
//! | `config prefix set <value>` | override the prefix (1 to 5 characters) |
//! | `config prefix reset` | back to the default prefix |
//! | `config boosts` / `config channel` | show the boost channel |
//! | `config boosts set <channel>` | by name, id, or `<#id>` mention |
//! | `config boosts remove` | clear the boost channel |
//!
//! `cfg` and `setup` work in place of `config`. Sub-tokens are
//! case-insensitive. Unrecognized settings and actions are ignored without a
//! reply; servers without a record are ignored too. Each case still comes back
//! as a distinct [`Outcome`].
//!
//! # Concurrency
//!
//! Nothing is cached between commands. Two writers racing on the same field
//! both see a consistent store, and the last write wins; one of them may report
//! a no-op that the other has since made stale.
//!
//! # Clap adapter
//!
//! The `cli` module (behind the `clap` feature, on by default) backs the
//! `guildcfg` binary, which runs one command against a [`FileStore`].

pub mod error;
pub mod types;

mod channel;
#[cfg(feature = "clap")]
pub mod cli;
mod defaults;
mod document;
mod file_store;
pub mod mutate;
mod reply;
pub mod resolve;
mod router;
mod store;

#[cfg(test)]
mod fixtures;

pub use channel::ChannelLookup;
pub use defaults::SystemDefaults;
pub use document::{get_path, set_path, unset_path};
pub use error::{GuildConfigError, ReplyError, StoreError, ValidationError};
pub use file_store::FileStore;
pub use mutate::MutationResult;
pub use reply::{Embed, EmbedField, Replier, Reply};
pub use resolve::Resolved;
pub use router::{CommandRouter, Invocation, Outcome, TRIGGERS, parse_invocation, split_arguments};
pub use store::{ConfigStore, MemoryStore};
pub use types::{
    BoostsConfig, Channel, ChannelId, MAX_PREFIX_LEN, ServerConfig, ServerId, ServerRecord,
    Setting, SettingAction, SettingValue,
};
