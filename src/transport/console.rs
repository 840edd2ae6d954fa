//! Line-based console transport.
//!
//! Reads one message per stdin line and prints replies to stdout. Every
//! line is attributed to a single configured user in a `console` channel,
//! which makes it handy for trying plugins locally.

use super::{ChannelId, InboundMessage, Transport};
use crate::error::TransportError;
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Stdout};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Channel name used for every console message.
pub const CONSOLE_CHANNEL: &str = "console";

/// Inbound queue depth between the stdin reader and the event loop.
const INBOUND_QUEUE: usize = 64;

/// Writes replies to stdout.
pub struct ConsoleTransport {
    out: Mutex<Stdout>,
}

impl ConsoleTransport {
    pub fn new() -> Self {
        Self {
            out: Mutex::new(tokio::io::stdout()),
        }
    }
}

impl Default for ConsoleTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for ConsoleTransport {
    async fn send(&self, target: &ChannelId, text: &str) -> Result<(), TransportError> {
        let mut out = self.out.lock().await;
        for line in text.lines() {
            out.write_all(format!("[{target}] {line}\n").as_bytes()).await?;
        }
        out.flush().await?;
        Ok(())
    }
}

/// Spawn a task that turns stdin lines into [`InboundMessage`]s.
///
/// The returned receiver closes when stdin reaches EOF.
pub fn spawn_stdin_reader(author: String) -> (mpsc::Receiver<InboundMessage>, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(INBOUND_QUEUE);
    let handle = tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let msg = InboundMessage::new(author.as_str(), CONSOLE_CHANNEL, line);
                    if tx.send(msg).await.is_err() {
                        debug!("Inbound queue closed, stopping stdin reader");
                        break;
                    }
                }
                Ok(None) => {
                    debug!("stdin closed");
                    break;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to read stdin");
                    break;
                }
            }
        }
    });
    (rx, handle)
}
