mod jwt;
mod kafka;
mod queue;

pub use self::jwt::{DynJwtService, JwtServiceTrait};
pub use self::kafka::{DynEventPublisher, EventPublisherTrait};
pub use self::queue::{DynMessageQueue, MessageQueueTrait};
