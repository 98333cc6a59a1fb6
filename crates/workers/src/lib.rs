pub mod alert;
pub mod broker;
pub mod feed;
pub mod metrics;
pub mod poller;
pub mod store;
pub mod tailer;
