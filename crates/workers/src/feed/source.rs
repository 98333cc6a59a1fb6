use async_trait::async_trait;
use stormwatch_common::Record;

use super::FeedError;

/// An append-only, insert-notifying source of records for one feed.
#[async_trait]
pub trait FeedSource: Send + Sync {
    fn name(&self) -> &str;

    /// Opens a tail positioned after the most recently inserted record.
    async fn open(&self) -> Result<Box<dyn FeedTail>, FeedError>;
}

/// A live tail over a feed.
///
/// `next` waits for as long as no new record has arrived; it only returns
/// `Err` when the stream itself has broken.
#[async_trait]
pub trait FeedTail: Send {
    async fn next(&mut self) -> Result<Record, FeedError>;
}
