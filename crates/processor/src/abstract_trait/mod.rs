mod repository;
mod service;

pub use self::repository::{DynOrderCommandRepository, OrderCommandRepositoryTrait};
pub use self::service::{DynOrderProcessingService, OrderProcessingServiceTrait};
