mod session;

pub use session::{DeliveryEvent, DeliveryGateway, DeliveryPhase, DeliverySession};
