//! Outbound delivery to chat recipients
//!
//! The notifier only depends on `Transport`. A delivery error means the
//! recipient should be treated as unreachable (blocked the bot, chat deleted,
//! network down past the timeout).

pub mod telegram;

pub use telegram::{TelegramCommandListener, TelegramTransport};

use crate::models::RecipientId;
use async_trait::async_trait;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextFormat {
    Plain,
    /// Telegram MarkdownV2: `*bold*` and `[label](url)`, reserved characters escaped
    Markdown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub text: String,
    pub format: TextFormat,
}

impl Message {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            format: TextFormat::Plain,
        }
    }

    pub fn markdown(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            format: TextFormat::Markdown,
        }
    }
}

#[derive(Debug)]
pub enum DeliveryError {
    Http(reqwest::Error),
    /// The chat service refused the message
    Rejected { status: u16, description: String },
}

impl From<reqwest::Error> for DeliveryError {
    fn from(err: reqwest::Error) -> Self {
        DeliveryError::Http(err)
    }
}

impl std::fmt::Display for DeliveryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryError::Http(e) => write!(f, "HTTP error: {}", e),
            DeliveryError::Rejected { status, description } => {
                write!(f, "Rejected ({}): {}", status, description)
            }
        }
    }
}

impl std::error::Error for DeliveryError {}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn deliver(&self, recipient: RecipientId, message: &Message) -> Result<(), DeliveryError>;
}
