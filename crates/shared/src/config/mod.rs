mod database;
mod jwt;
mod kafka;
mod myconfig;

pub use self::database::{ConnectionManager, ConnectionPool, DatabaseConfig, run_migrations};
pub use self::jwt::{Claims, JwtConfig};
pub use self::kafka::Kafka;
pub use self::myconfig::{QueueConfig, env_flag, env_or, env_required, validate_receive_bounds};
