//! WebSocket transport for the trade feed

pub mod connection;
pub mod subscription;

pub use connection::{ConnectionState, WebSocketConnection, WebSocketError};
pub use subscription::{trade_streams, SubscribeRequest, SubscriptionManager};
