mod alerts;
mod feeds;
mod health;
mod metrics;
mod router;

pub use router::{router, AppState};
