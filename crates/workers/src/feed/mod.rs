mod error;
mod hub;
mod log;
mod source;

pub use error::FeedError;
pub use hub::FeedHub;
pub use log::{FeedLog, FeedLogTail, FeedQuery};
pub use source::{FeedSource, FeedTail};
