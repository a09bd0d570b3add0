//! Command-line adapter: run one `config` command against a [`FileStore`].
//!
//! Compiled only with the `clap` feature (on by default). The chat-facing
//! router stays clap-free; this module only builds an [`Invocation`] from argv
//! and prints the reply.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use clap::Parser;

use crate::defaults::SystemDefaults;
use crate::error::{GuildConfigError, ReplyError};
use crate::file_store::FileStore;
use crate::reply::{Replier, Reply};
use crate::router::{CommandRouter, Invocation, Outcome};
use crate::types::{Channel, ServerId};

const APP_NAME: &str = "guildcfg";

/// Inspect and change per-server bot settings.
///
/// Everything after the options is the text that follows `config` in chat,
/// e.g. `guildcfg --server 1 prefix set !!`.
#[derive(Debug, Parser)]
#[command(name = "guildcfg")]
pub struct Cli {
    /// Server the command runs in.
    #[arg(long)]
    pub server: String,

    /// Store file. Defaults to `servers.toml` in the platform data directory.
    #[arg(long)]
    pub store: Option<PathBuf>,

    /// System defaults file. Defaults to `defaults.toml` in the platform config directory.
    #[arg(long)]
    pub defaults: Option<PathBuf>,

    /// A channel of the server as NAME=ID. Repeat for more channels.
    #[arg(long = "channel", value_name = "NAME=ID", value_parser = parse_channel)]
    pub channels: Vec<Channel>,

    /// Caller tag shown in the settings summary.
    #[arg(long, default_value = "admin")]
    pub author: String,

    /// Create the server's record first if it has none.
    #[arg(long)]
    pub register: bool,

    /// Command words, e.g. `boosts set general`.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub words: Vec<String>,
}

fn parse_channel(s: &str) -> Result<Channel, String> {
    match s.rsplit_once('=') {
        Some((name, id)) if !name.is_empty() && !id.is_empty() => Ok(Channel::new(id, name)),
        _ => Err(format!("expected NAME=ID, got '{s}'")),
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("", "", APP_NAME)
}

impl Cli {
    fn store_path(&self) -> Result<PathBuf, GuildConfigError> {
        if let Some(path) = &self.store {
            return Ok(path.clone());
        }
        project_dirs()
            .map(|dirs| dirs.data_dir().join("servers.toml"))
            .ok_or(GuildConfigError::NoStorePath)
    }

    fn defaults_path(&self) -> Option<PathBuf> {
        self.defaults
            .clone()
            .or_else(|| project_dirs().map(|dirs| dirs.config_dir().join("defaults.toml")))
    }
}

/// Prints replies to stdout.
pub struct StdoutReplier;

#[async_trait]
impl Replier for StdoutReplier {
    async fn send(&self, reply: Reply) -> Result<(), ReplyError> {
        println!("{reply}");
        Ok(())
    }
}

/// Run the command described by `cli`, replying through `replier`.
pub async fn run(cli: &Cli, replier: &dyn Replier) -> Result<Outcome, GuildConfigError> {
    let defaults = SystemDefaults::load(cli.defaults_path().as_deref())?;
    let store = Arc::new(FileStore::open(cli.store_path()?));
    let server = ServerId::new(cli.server.clone());

    if cli.register {
        store.register(&server).await?;
    }

    let router = CommandRouter::new(store, defaults);
    let invocation = Invocation {
        server,
        author: cli.author.clone(),
        channels: &cli.channels,
    };
    router
        .handle_command(&invocation, &cli.words.join(" "), replier)
        .await
}
