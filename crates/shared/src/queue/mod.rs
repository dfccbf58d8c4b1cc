//! Message queue backends with SQS-style semantics: long polling, visibility
//! timeouts, receipt handles and redrive to a dead-letter queue once a
//! message has been received `max_receive_count` times.

mod memory;
mod postgres;

pub use self::memory::InMemoryQueue;
pub use self::postgres::PostgresQueue;
