//! In-memory transport that records every reply.

use async_trait::async_trait;
use parking_lot::Mutex;
use plugbot::error::TransportError;
use plugbot::{ChannelId, Transport};
use std::time::Duration;
use tokio::sync::Notify;

#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<(ChannelId, String)>>,
    notify: Notify,
}

impl RecordingTransport {
    pub fn sent(&self) -> Vec<(ChannelId, String)> {
        self.sent.lock().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent.lock().iter().map(|(_, t)| t.clone()).collect()
    }

    pub fn last(&self) -> Option<String> {
        self.sent.lock().last().map(|(_, t)| t.clone())
    }

    pub fn clear(&self) {
        self.sent.lock().clear();
    }

    /// Wait until at least `n` replies were sent, then return all of them.
    pub async fn wait_for_count(&self, n: usize) -> Vec<String> {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let notified = self.notify.notified();
                if self.sent.lock().len() >= n {
                    return;
                }
                notified.await;
            }
        })
        .await
        .expect("timed out waiting for replies");
        self.texts()
    }

    /// Wait until some reply equals `text`.
    pub async fn wait_for_text(&self, text: &str) {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let notified = self.notify.notified();
                if self.sent.lock().iter().any(|(_, t)| t == text) {
                    return;
                }
                notified.await;
            }
        })
        .await
        .unwrap_or_else(|_| panic!("timed out waiting for {text:?}"));
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, target: &ChannelId, text: &str) -> Result<(), TransportError> {
        self.sent.lock().push((target.clone(), text.to_owned()));
        self.notify.notify_waiters();
        Ok(())
    }
}
