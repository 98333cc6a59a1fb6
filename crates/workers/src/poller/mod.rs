mod normalize;
mod runner;

pub use normalize::{coerce_numbers, normalize_payload, KeyNormalizer};
pub use runner::{PollError, Poller, PollerConfig};
