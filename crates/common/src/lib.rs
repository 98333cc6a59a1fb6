pub mod alert;
pub mod channel;
pub mod record;
pub mod retry;

pub use alert::{Alert, AlertClock, Payload, Severity};
pub use record::{Record, RecordError, RecordExt};
