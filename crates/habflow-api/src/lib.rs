// habflow-api: Async Rust client for the openHAB REST API and its
// server-sent-event stream.

pub mod descriptor;
pub mod error;
pub mod rest;
pub mod sse;
pub mod transport;

pub use descriptor::ConnectionDescriptor;
pub use error::Error;
pub use rest::{Item, RestClient};
pub use sse::{
    EventStreamHandle, SseMessage, StateChange, StreamConfig, StreamEvent, decode_state_change,
};
pub use transport::TransportConfig;
