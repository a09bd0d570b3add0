//! Replies and the narrow capability the router needs to deliver them.

use std::fmt;

use async_trait::async_trait;

use crate::error::ReplyError;

/// A message sent back to whoever issued a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    Embed(Embed),
}

/// A structured message: a titled card with named fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Embed {
    pub title: String,
    pub fields: Vec<EmbedField>,
    /// Accent colour as `#rrggbb`.
    pub color: String,
    pub footer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Text(text) => write!(f, "{text}"),
            Reply::Embed(embed) => {
                write!(f, "{}", embed.title)?;
                for field in &embed.fields {
                    write!(f, "\n{}: {}", field.name, field.value)?;
                }
                if let Some(footer) = &embed.footer {
                    write!(f, "\n{footer}")?;
                }
                Ok(())
            }
        }
    }
}

/// Anything that can deliver a [`Reply`]: a chat channel, a terminal, a test recorder.
#[async_trait]
pub trait Replier: Send + Sync {
    async fn send(&self, reply: Reply) -> Result<(), ReplyError>;
}
