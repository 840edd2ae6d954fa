//! Follow-up message waits ("type go to confirm").
//!
//! A handler registers a filter and awaits the first inbound message that
//! passes it. The wait is bounded by a timeout and a cancellation token, and
//! its registration is removed however the wait ends, including when the
//! waiting future is dropped.

use crate::transport::InboundMessage;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::trace;

type Filter = Box<dyn Fn(&InboundMessage) -> bool + Send + Sync>;

struct PendingWait {
    filter: Filter,
    tx: oneshot::Sender<InboundMessage>,
}

/// How a wait ended.
#[derive(Debug)]
pub enum WaitOutcome {
    Reply(InboundMessage),
    TimedOut,
    Cancelled,
}

/// Registry of outstanding waits.
#[derive(Default)]
pub struct ReplyWaiters {
    next_id: AtomicU64,
    pending: DashMap<u64, PendingWait>,
}

/// Removes a registration when the wait ends or is dropped.
struct WaitGuard<'a> {
    waiters: &'a ReplyWaiters,
    id: u64,
}

impl Drop for WaitGuard<'_> {
    fn drop(&mut self) {
        if self.waiters.pending.remove(&self.id).is_some() {
            trace!(wait_id = self.id, "Wait registration removed");
            crate::metrics::set_pending_waits(self.waiters.pending());
        }
    }
}

impl ReplyWaiters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered waits.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Wait for the first message matching `filter`.
    pub async fn wait_for<F>(
        &self,
        filter: F,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> WaitOutcome
    where
        F: Fn(&InboundMessage) -> bool + Send + Sync + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.pending.insert(
            id,
            PendingWait {
                filter: Box::new(filter),
                tx,
            },
        );
        let _guard = WaitGuard { waiters: self, id };
        crate::metrics::set_pending_waits(self.pending());

        let outcome = tokio::select! {
            _ = cancel.cancelled() => WaitOutcome::Cancelled,
            res = tokio::time::timeout(timeout, rx) => match res {
                Ok(Ok(msg)) => WaitOutcome::Reply(msg),
                Ok(Err(_)) => WaitOutcome::Cancelled,
                Err(_) => WaitOutcome::TimedOut,
            },
        };
        trace!(wait_id = id, outcome = ?std::mem::discriminant(&outcome), "Wait finished");
        outcome
    }

    /// Offer `msg` to every waiting filter. Each matching wait receives a
    /// copy and is unregistered. Returns how many waits were satisfied.
    pub fn feed(&self, msg: &InboundMessage) -> usize {
        // Collect first so no shard lock is held while removing.
        let matched: Vec<u64> = self
            .pending
            .iter()
            .filter(|entry| (entry.value().filter)(msg))
            .map(|entry| *entry.key())
            .collect();

        if matched.is_empty() {
            return 0;
        }

        let mut delivered = 0;
        for id in matched {
            if let Some((_, wait)) = self.pending.remove(&id)
                && wait.tx.send(msg.clone()).is_ok()
            {
                delivered += 1;
            }
        }
        crate::metrics::set_pending_waits(self.pending());
        delivered
    }
}
