mod event;
mod message;
mod queue;
mod responses;

pub use self::event::{ORDER_CREATED_TOPIC, OrderEvent};
pub use self::message::OrderMessage;
pub use self::queue::{
    MAX_RECEIVE_BATCH, MAX_VISIBILITY_TIMEOUT, MAX_WAIT_TIME, QueueDepth, ReceiveOptions,
    ReceivedMessage, validate_visibility_timeout,
};
pub use self::responses::ApiResponse;
