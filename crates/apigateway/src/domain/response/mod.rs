mod order;
mod queue;

pub use self::order::OrderQueuedResponse;
pub use self::queue::RedriveResponse;
