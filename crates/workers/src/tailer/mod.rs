mod feed_tailer;
mod state;
mod supervisor;

pub use feed_tailer::Tailer;
pub use state::TailerState;
pub use supervisor::{spawn_supervised, TailerHandle};

#[cfg(test)]
pub(crate) mod scripted;
