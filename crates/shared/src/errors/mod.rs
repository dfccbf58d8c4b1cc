mod error;
mod http;
mod queue;
mod repository;
mod service;

pub use self::error::ErrorResponse;
pub use self::http::HttpError;
pub use self::queue::QueueError;
pub use self::repository::RepositoryError;
pub use self::service::ServiceError;
