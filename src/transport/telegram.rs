//! Telegram Bot API transport
//!
//! Outbound: `sendMessage` with MarkdownV2 parse mode.
//! Inbound: long-polled `getUpdates`, translating `/start` and `/check` into
//! `Notifier::on_subscribe` and `Notifier::on_demand_check`.
//!
//! API reference: https://core.telegram.org/bots/api

use super::{DeliveryError, Message, TextFormat, Transport};
use crate::error_handler::{ExponentialBackoff, MaxRetriesExceeded};
use crate::models::RecipientId;
use crate::notifier::Notifier;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Extra time on top of the long-poll window before the request is abandoned
const POLL_GRACE: Duration = Duration::from_secs(10);

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'static str>,
    disable_web_page_preview: bool,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    description: Option<String>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct Update {
    update_id: i64,
    message: Option<IncomingMessage>,
}

#[derive(Debug, Deserialize)]
struct IncomingMessage {
    /// Unix seconds
    date: i64,
    chat: Chat,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Chat {
    id: i64,
}

fn bot_url(api_base: &str, token: &str) -> String {
    format!("{}/bot{}", api_base.trim_end_matches('/'), token)
}

/// Read a Bot API reply, mapping `ok: false` and non-2xx to `Rejected`
async fn read_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<Option<T>, DeliveryError> {
    let status = response.status();
    let body = response.text().await?;

    match serde_json::from_str::<ApiResponse<T>>(&body) {
        Ok(api) if status.is_success() && api.ok => Ok(api.result),
        Ok(api) => Err(DeliveryError::Rejected {
            status: status.as_u16(),
            description: api.description.unwrap_or_else(|| "no description".to_string()),
        }),
        Err(_) => Err(DeliveryError::Rejected {
            status: status.as_u16(),
            description: body,
        }),
    }
}

pub struct TelegramTransport {
    client: reqwest::Client,
    bot_url: String,
}

impl TelegramTransport {
    pub fn new(client: reqwest::Client, token: &str) -> Self {
        Self::with_api_base(client, TELEGRAM_API_BASE, token)
    }

    pub fn with_api_base(client: reqwest::Client, api_base: &str, token: &str) -> Self {
        Self {
            client,
            bot_url: bot_url(api_base, token),
        }
    }
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn deliver(&self, recipient: RecipientId, message: &Message) -> Result<(), DeliveryError> {
        let request = SendMessageRequest {
            chat_id: recipient.0,
            text: &message.text,
            parse_mode: match message.format {
                TextFormat::Markdown => Some("MarkdownV2"),
                TextFormat::Plain => None,
            },
            disable_web_page_preview: false,
        };

        let response = self
            .client
            .post(format!("{}/sendMessage", self.bot_url))
            .json(&request)
            .send()
            .await?;

        read_response::<serde_json::Value>(response).await?;
        log::debug!("📨 Delivered message to {}", recipient);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Check,
}

/// Recognize `/start` and `/check`, with or without `@botname` and arguments
pub fn parse_command(text: &str) -> Option<Command> {
    let first = text.split_whitespace().next()?;
    let name = first.strip_prefix('/')?;
    let name = name.split('@').next().unwrap_or(name);

    match name.to_ascii_lowercase().as_str() {
        "start" => Some(Command::Start),
        "check" => Some(Command::Check),
        _ => None,
    }
}

pub struct TelegramCommandListener {
    client: reqwest::Client,
    bot_url: String,
    poll_timeout: Duration,
    /// Next update id to ask for; everything below has been handled
    offset: i64,
}

impl TelegramCommandListener {
    pub fn new(client: reqwest::Client, token: &str, poll_timeout: Duration) -> Self {
        Self::with_api_base(client, TELEGRAM_API_BASE, token, poll_timeout)
    }

    pub fn with_api_base(
        client: reqwest::Client,
        api_base: &str,
        token: &str,
        poll_timeout: Duration,
    ) -> Self {
        Self {
            client,
            bot_url: bot_url(api_base, token),
            poll_timeout,
            offset: 0,
        }
    }

    pub fn offset(&self) -> i64 {
        self.offset
    }

    async fn fetch_updates(&self) -> Result<Vec<Update>, DeliveryError> {
        let response = self
            .client
            .get(format!("{}/getUpdates", self.bot_url))
            .query(&[
                ("offset", self.offset.to_string()),
                ("timeout", self.poll_timeout.as_secs().to_string()),
                ("allowed_updates", r#"["message"]"#.to_string()),
            ])
            .timeout(self.poll_timeout + POLL_GRACE)
            .send()
            .await?;

        Ok(read_response::<Vec<Update>>(response).await?.unwrap_or_default())
    }

    /// Fetch one batch of updates and dispatch the commands in it
    ///
    /// Each command runs as its own task; the handles are returned so callers
    /// can wait for them.
    pub async fn poll_once(&mut self, notifier: &Arc<Notifier>) -> Result<Vec<JoinHandle<()>>, DeliveryError> {
        let updates = self.fetch_updates().await?;

        let mut handles = Vec::new();
        for update in updates {
            self.offset = self.offset.max(update.update_id + 1);

            let Some(message) = update.message else {
                continue;
            };
            let Some(command) = message.text.as_deref().and_then(parse_command) else {
                continue;
            };

            let recipient = RecipientId(message.chat.id);
            let notifier = Arc::clone(notifier);
            log::info!("💬 {:?} from {}", command, recipient);

            handles.push(match command {
                Command::Start => {
                    let as_of = DateTime::<Utc>::from_timestamp(message.date, 0).unwrap_or_else(Utc::now);
                    tokio::spawn(async move { notifier.on_subscribe(recipient, as_of).await })
                }
                Command::Check => {
                    tokio::spawn(async move { notifier.on_demand_check(recipient).await })
                }
            });
        }

        Ok(handles)
    }

    /// Poll forever, backing off on feed errors
    ///
    /// Returns only when the retry budget is exhausted, i.e. the update feed
    /// has been unreachable for the whole backoff sequence.
    pub async fn run(mut self, notifier: Arc<Notifier>) -> Result<(), MaxRetriesExceeded> {
        log::info!("📡 Listening for Telegram commands (long-poll {}s)", self.poll_timeout.as_secs());

        let mut backoff = ExponentialBackoff::new(Duration::from_secs(1), Duration::from_secs(60), 10);

        loop {
            match self.poll_once(&notifier).await {
                Ok(_) => backoff.reset(),
                Err(e) => {
                    log::warn!("⚠️  Telegram update feed error: {}", e);
                    backoff.sleep().await?;
                }
            }
        }
    }
}
