//! Local console gateway.
//!
//! Treats each line on stdin as an incoming message in channel `console` and
//! prints responses to stdout. Useful for running the bot without a chat
//! network.

use super::{ChatGateway, IncomingMessage, MessageHandler, OutgoingMessage};
use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use std::io::BufRead;
use std::sync::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

pub const CONSOLE_CHANNEL: &str = "console";

type LineReader = Box<dyn BufRead + Send>;

pub struct ConsoleGateway {
    handler: Mutex<Option<MessageHandler>>,
    input: Mutex<Option<LineReader>>,
    dispatcher: Mutex<Option<JoinHandle<()>>>,
}

impl Default for ConsoleGateway {
    fn default() -> Self {
        Self::with_reader(std::io::BufReader::new(std::io::stdin()))
    }
}

impl ConsoleGateway {
    /// Gateway reading from the process stdin.
    pub fn new() -> Self {
        Self::default()
    }

    /// Gateway reading lines from `reader` instead of stdin.
    pub fn with_reader(reader: impl BufRead + Send + 'static) -> Self {
        Self {
            handler: Mutex::new(None),
            input: Mutex::new(Some(Box::new(reader))),
            dispatcher: Mutex::new(None),
        }
    }

    /// Render a response the way it is printed to stdout.
    pub fn render(message: &OutgoingMessage) -> String {
        match message.reply_to {
            Some(ref id) => format!("> #{} {}", id, message.content),
            None => message.content.clone(),
        }
    }
}

fn poisoned<T>(_: T) -> anyhow::Error {
    anyhow!("console gateway state poisoned")
}

/// Forward lines from a blocking reader until it ends or the receiver is gone.
///
/// Runs on a detached OS thread: a blocked read cannot be cancelled, and a
/// detached thread does not hold up runtime shutdown.
fn pump_lines(reader: LineReader, lines: mpsc::UnboundedSender<String>) {
    for line in reader.lines() {
        match line {
            Ok(line) => {
                if lines.send(line).is_err() {
                    break;
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to read console input");
                break;
            }
        }
    }
}

#[async_trait]
impl ChatGateway for ConsoleGateway {
    async fn login(&self, token: &str) -> Result<()> {
        if token.is_empty() {
            bail!("empty token");
        }
        let handler = self
            .handler
            .lock()
            .map_err(poisoned)?
            .clone()
            .ok_or_else(|| anyhow!("no message handler registered"))?;
        let reader = self
            .input
            .lock()
            .map_err(poisoned)?
            .take()
            .ok_or_else(|| anyhow!("console gateway already logged in"))?;

        let (tx, mut rx) = mpsc::unbounded_channel();
        std::thread::Builder::new()
            .name("console-input".to_string())
            .spawn(move || pump_lines(reader, tx))?;

        let task = tokio::spawn(async move {
            let mut id: u64 = 0;
            while let Some(line) = rx.recv().await {
                id += 1;
                let message = IncomingMessage {
                    id: id.to_string(),
                    channel_id: CONSOLE_CHANNEL.to_string(),
                    author: CONSOLE_CHANNEL.to_string(),
                    content: line,
                };
                if let Some(response) = handler(message) {
                    println!("{}", ConsoleGateway::render(&response));
                }
            }
        });

        *self.dispatcher.lock().map_err(poisoned)? = Some(task);
        info!("Console gateway connected");
        Ok(())
    }

    async fn register_message_handler(&self, handler: MessageHandler) -> Result<()> {
        *self.handler.lock().map_err(poisoned)? = Some(handler);
        Ok(())
    }

    async fn logout(&self) -> Result<()> {
        let task = self.dispatcher.lock().map_err(poisoned)?.take();
        if let Some(task) = task {
            task.abort();
            // Dropping the receiver ends the input thread at its next line.
            let _ = task.await;
        }
        info!("Console gateway disconnected");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_reply_and_plain() {
        let reply = OutgoingMessage {
            channel_id: CONSOLE_CHANNEL.into(),
            content: "pong".into(),
            reply_to: Some("3".into()),
        };
        assert_eq!(ConsoleGateway::render(&reply), "> #3 pong");

        let plain = OutgoingMessage {
            reply_to: None,
            ..reply
        };
        assert_eq!(ConsoleGateway::render(&plain), "pong");
    }

    /// Reader whose first read blocks until the sender is dropped.
    struct HeldOpen(std::sync::mpsc::Receiver<()>);

    impl std::io::Read for HeldOpen {
        fn read(&mut self, _: &mut [u8]) -> std::io::Result<usize> {
            let _ = self.0.recv();
            Ok(0)
        }
    }

    fn recording_handler() -> (MessageHandler, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handler: MessageHandler = std::sync::Arc::new(move |message: IncomingMessage| {
            let _ = tx.send(message.content);
            None::<OutgoingMessage>
        });
        (handler, rx)
    }

    #[tokio::test]
    async fn test_lines_reach_handler() {
        let gateway = ConsoleGateway::with_reader(std::io::Cursor::new("!ping\nhello\n"));
        let (handler, mut received) = recording_handler();
        gateway.register_message_handler(handler).await.unwrap();
        gateway.login("token").await.unwrap();

        let timeout = std::time::Duration::from_secs(5);
        let first = tokio::time::timeout(timeout, received.recv()).await.unwrap();
        assert_eq!(first.as_deref(), Some("!ping"));
        let second = tokio::time::timeout(timeout, received.recv()).await.unwrap();
        assert_eq!(second.as_deref(), Some("hello"));
        gateway.logout().await.unwrap();
    }

    #[tokio::test]
    async fn test_logout_returns_while_input_is_blocked() {
        let (_hold, held) = std::sync::mpsc::channel::<()>();
        let gateway = ConsoleGateway::with_reader(std::io::BufReader::new(HeldOpen(held)));
        let (handler, _received) = recording_handler();
        gateway.register_message_handler(handler).await.unwrap();
        gateway.login("token").await.unwrap();

        tokio::time::timeout(std::time::Duration::from_secs(5), gateway.logout())
            .await
            .expect("logout blocked on console input")
            .unwrap();
    }

    #[tokio::test]
    async fn test_second_login_rejected() {
        let gateway = ConsoleGateway::with_reader(std::io::empty());
        let (handler, _received) = recording_handler();
        gateway.register_message_handler(handler).await.unwrap();
        gateway.login("token").await.unwrap();
        assert!(gateway.login("token").await.is_err());
        gateway.logout().await.unwrap();
    }

    #[tokio::test]
    async fn test_login_requires_handler() {
        let gateway = ConsoleGateway::with_reader(std::io::empty());
        assert!(gateway.login("token").await.is_err());
    }

    #[tokio::test]
    async fn test_login_rejects_empty_token() {
        let gateway = ConsoleGateway::with_reader(std::io::empty());
        gateway
            .register_message_handler(std::sync::Arc::new(|_: IncomingMessage| None::<OutgoingMessage>))
            .await
            .unwrap();
        assert!(gateway.login("").await.is_err());
    }
}
