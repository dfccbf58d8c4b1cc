mod order;
mod queue;

pub use self::order::{DynOrderService, OrderServiceTrait};
pub use self::queue::{DynQueueService, QueueServiceTrait};
