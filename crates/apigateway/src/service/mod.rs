mod order;
mod queue;

pub use self::order::OrderService;
pub use self::queue::QueueService;
