//! Bot runner.
//!
//! The chat network itself sits behind [`ChatGateway`]; the runner only logs
//! in with the resolved token, registers its message handler and logs out on
//! shutdown. Outgoing messages follow the configured [`ReplyMode`].

pub mod console;

use crate::config::ResolvedSettings;
use anyhow::Result;
use async_trait::async_trait;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info};

/// How responses are attached to the message that triggered them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyMode {
    /// Send as a reply referencing the triggering message.
    Reply,
    /// Send as a plain message in the same channel.
    Channel,
}

impl ReplyMode {
    pub fn from_use_reply(use_reply: bool) -> Self {
        if use_reply {
            ReplyMode::Reply
        } else {
            ReplyMode::Channel
        }
    }
}

/// A message received from the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub id: String,
    pub channel_id: String,
    pub author: String,
    pub content: String,
}

/// A message to send through the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub channel_id: String,
    pub content: String,
    /// Message being replied to, in [`ReplyMode::Reply`].
    pub reply_to: Option<String>,
}

impl OutgoingMessage {
    /// Respond to `message` in the same channel.
    pub fn respond(message: &IncomingMessage, content: impl Into<String>, mode: ReplyMode) -> Self {
        Self {
            channel_id: message.channel_id.clone(),
            content: content.into(),
            reply_to: match mode {
                ReplyMode::Reply => Some(message.id.clone()),
                ReplyMode::Channel => None,
            },
        }
    }
}

/// Callback the gateway invokes for every incoming message.
pub type MessageHandler = Arc<dyn Fn(IncomingMessage) -> Option<OutgoingMessage> + Send + Sync>;

/// Connection to a chat network.
#[async_trait]
pub trait ChatGateway: Send + Sync {
    async fn login(&self, token: &str) -> Result<()>;

    async fn register_message_handler(&self, handler: MessageHandler) -> Result<()>;

    async fn logout(&self) -> Result<()>;
}

/// Settings the bot runner consumes.
#[derive(Clone, PartialEq, Eq)]
pub struct BotOptions {
    token: String,
    pub reply_mode: ReplyMode,
}

impl BotOptions {
    pub fn from_settings(settings: &ResolvedSettings) -> Self {
        Self {
            token: settings.token.clone(),
            reply_mode: ReplyMode::from_use_reply(settings.use_reply),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for BotOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotOptions")
            .field("token", &"<redacted>")
            .field("reply_mode", &self.reply_mode)
            .finish()
    }
}

type Responder = Arc<dyn Fn(&IncomingMessage) -> Option<String> + Send + Sync>;

/// Drives a gateway session with a response function.
pub struct Bot {
    options: BotOptions,
    responder: Responder,
}

impl Bot {
    /// `responder` returns the text to send back, or `None` to stay silent.
    pub fn new<F>(options: BotOptions, responder: F) -> Self
    where
        F: Fn(&IncomingMessage) -> Option<String> + Send + Sync + 'static,
    {
        Self {
            options,
            responder: Arc::new(responder),
        }
    }

    pub fn options(&self) -> &BotOptions {
        &self.options
    }

    /// Gateway callback applying the configured reply mode.
    pub fn handler(&self) -> MessageHandler {
        let responder = Arc::clone(&self.responder);
        let mode = self.options.reply_mode;
        Arc::new(move |message: IncomingMessage| {
            debug!(channel = %message.channel_id, author = %message.author, "Message received");
            responder(&message).map(|content| OutgoingMessage::respond(&message, content, mode))
        })
    }

    /// Log in, serve until `shutdown` completes, then log out.
    pub async fn run_until<G, F>(&self, gateway: &G, shutdown: F) -> Result<()>
    where
        G: ChatGateway + ?Sized,
        F: Future<Output = ()>,
    {
        gateway.register_message_handler(self.handler()).await?;
        gateway.login(self.options.token()).await?;
        info!(reply_mode = ?self.options.reply_mode, "Bot logged in");

        shutdown.await;

        info!("Shutdown requested, logging out");
        gateway.logout().await
    }
}
