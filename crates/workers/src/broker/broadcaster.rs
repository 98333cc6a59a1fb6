use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use stormwatch_common::channel::ALERT_CHANNEL;
use tokio::sync::mpsc;

use super::publisher::{AlertPublisher, BroadcastError};

type Subscribers = DashMap<u64, mpsc::UnboundedSender<Arc<str>>>;

/// Single named publish channel. Each subscriber owns an unbounded queue fed
/// at publish time; nothing is buffered for listeners that subscribe later.
#[derive(Clone)]
pub struct Broadcaster {
    channel: Arc<str>,
    subscribers: Arc<Subscribers>,
    next_id: Arc<AtomicU64>,
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new(ALERT_CHANNEL)
    }
}

impl Broadcaster {
    pub fn new(channel: &str) -> Self {
        Self {
            channel: Arc::from(channel),
            subscribers: Arc::new(DashMap::new()),
            next_id: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn subscribe(&self) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.insert(id, tx);
        tracing::debug!(channel = %self.channel, id, "subscriber attached");
        Subscription {
            id,
            rx,
            subscribers: self.subscribers.clone(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub fn send(&self, message: &str) -> usize {
        let message: Arc<str> = Arc::from(message);
        let mut delivered = 0;
        let mut gone = Vec::new();

        for sub in self.subscribers.iter() {
            if sub.value().send(message.clone()).is_ok() {
                delivered += 1;
            } else {
                gone.push(*sub.key());
            }
        }

        for id in gone {
            self.subscribers.remove(&id);
        }
        delivered
    }
}

#[async_trait]
impl AlertPublisher for Broadcaster {
    async fn publish(&self, message: &str) -> Result<usize, BroadcastError> {
        Ok(self.send(message))
    }
}

/// A live handle on the channel. Dropping it detaches the subscriber.
pub struct Subscription {
    id: u64,
    rx: mpsc::UnboundedReceiver<Arc<str>>,
    subscribers: Arc<Subscribers>,
}

impl Subscription {
    pub async fn recv(&mut self) -> Option<Arc<str>> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<Arc<str>> {
        self.rx.try_recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.subscribers.remove(&self.id);
    }
}
