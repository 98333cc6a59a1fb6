use async_trait::async_trait;

#[async_trait]
pub trait AlertPublisher: Send + Sync {
    /// Delivers `message` to every current subscriber and returns how many
    /// received it.
    async fn publish(&self, message: &str) -> Result<usize, BroadcastError>;
}

#[derive(Debug, thiserror::Error)]
pub enum BroadcastError {
    #[error("broadcast: {0}")]
    Backend(String),
}
