mod broadcaster;
mod publisher;

pub use broadcaster::{Broadcaster, Subscription};
pub use publisher::{AlertPublisher, BroadcastError};
