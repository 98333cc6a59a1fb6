#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("feed `{0}` is closed")]
    Closed(String),
    #[error("tail fell behind by {0} records")]
    Lagged(u64),
    #[error("feed source: {0}")]
    Source(String),
}
