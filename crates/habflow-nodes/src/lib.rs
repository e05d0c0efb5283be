// habflow-nodes: openHAB item nodes between habflow-api and flow hosts.

pub mod config;
pub mod error;
pub mod item_in;
pub mod item_out;
pub mod message;
pub mod status;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{ItemInConfig, ItemOutConfig};
pub use error::NodeError;
pub use item_in::{ItemInNode, SubscriptionState};
pub use item_out::ItemOutNode;
pub use message::{FlowMessage, Topic};
pub use status::{Severity, StatusSignal};
