mod order;

pub use self::order::{OrderProcessingService, OrderProcessingServiceDeps};
