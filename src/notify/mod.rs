//! Outbound notification boundary.
//!
//! The core never talks to a chat connection directly: it enqueues text on
//! the [`Outbox`], a bounded queue drained by a single sender task that
//! forwards each message to the host's [`Notify`] implementation. Delivery
//! is fire-and-forget; outbound latency never holds the data-mutation lock,
//! and a full queue drops the message with a warning instead of blocking.

use async_trait::async_trait;
use log::{info, warn};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Capability for delivering a single outbound text message. Implementations
/// wrap whatever the host uses to talk to the channel.
#[async_trait]
pub trait Notify: Send + Sync {
    async fn notify(&self, destination: &str, text: &str);
}

/// A [`Notify`] implementation that only logs. Useful as a stand-in when no
/// chat connection exists.
pub struct LogNotifier;

#[async_trait]
impl Notify for LogNotifier {
    async fn notify(&self, destination: &str, text: &str) {
        info!("-> {destination}: {text}");
    }
}

/// One queued outbound message.
#[derive(Debug, Clone)]
pub struct OutboundMessage {
    pub destination: String,
    pub text: String,
}

/// Handle to the bounded outbound queue. Cheap to clone; all clones feed the
/// same sender task.
#[derive(Clone)]
pub struct Outbox {
    tx: mpsc::Sender<OutboundMessage>,
}

impl Outbox {
    /// Spawn the sender task and return the enqueue handle. Must be called
    /// from within a tokio runtime.
    pub fn start(sink: Arc<dyn Notify>, capacity: usize) -> Self {
        let (tx, mut rx) = mpsc::channel::<OutboundMessage>(capacity);
        tokio::spawn(async move {
            while let Some(msg) = rx.recv().await {
                sink.notify(&msg.destination, &msg.text).await;
            }
        });
        Self { tx }
    }

    /// Enqueue a message without blocking. If the queue is full the message
    /// is dropped and a warning logged.
    pub fn send(&self, destination: &str, text: &str) {
        let msg = OutboundMessage {
            destination: destination.to_string(),
            text: text.to_string(),
        };
        if let Err(e) = self.tx.try_send(msg) {
            warn!("outbox full or closed, dropping message to {destination}: {e}");
        }
    }
}
