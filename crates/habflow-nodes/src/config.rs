// ── Node configuration ──
//
// These types describe which hub and item a node binds to. The host
// (CLI or flow runtime) constructs them and hands them in -- nodes
// never read config files. Reconfiguration means teardown + recreate;
// the item name never changes on a live node.

use std::time::Duration;

use habflow_api::{ConnectionDescriptor, StreamConfig, TransportConfig};

/// Wait between a terminal stream failure and the next subscription
/// attempt. Fixed, no exponential growth.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(10);

/// Configuration for a subscription node ([`crate::ItemInNode`]).
#[derive(Debug, Clone)]
pub struct ItemInConfig {
    /// Which hub to talk to.
    pub descriptor: ConnectionDescriptor,

    /// Name of the item to subscribe to.
    pub item_name: String,

    /// One-shot request tuning (state fetch).
    pub transport: TransportConfig,

    /// Event stream retry tuning.
    pub stream: StreamConfig,

    /// Delay before re-dialing after the stream gives up.
    pub reconnect_delay: Duration,
}

impl ItemInConfig {
    /// Configuration with default transport and retry tuning.
    pub fn new(descriptor: ConnectionDescriptor, item_name: impl Into<String>) -> Self {
        Self {
            descriptor,
            item_name: item_name.into(),
            transport: TransportConfig::default(),
            stream: StreamConfig::default(),
            reconnect_delay: RECONNECT_DELAY,
        }
    }
}

/// Configuration for a command sink ([`crate::ItemOutNode`]).
#[derive(Debug, Clone)]
pub struct ItemOutConfig {
    /// Which hub to talk to.
    pub descriptor: ConnectionDescriptor,

    /// Name of the item commands are sent to.
    pub item_name: String,

    /// Configured command override. When non-empty it wins over every
    /// message payload.
    pub command: String,

    /// One-shot request tuning.
    pub transport: TransportConfig,
}

impl ItemOutConfig {
    /// Configuration with no override and default transport tuning.
    pub fn new(descriptor: ConnectionDescriptor, item_name: impl Into<String>) -> Self {
        Self {
            descriptor,
            item_name: item_name.into(),
            command: String::new(),
            transport: TransportConfig::default(),
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // The production schedule: a fixed ten-second wait before re-dialing
    // a stream that gave up. Tests shorten it; deployments must not.
    #[test]
    fn default_reconnect_delay_is_ten_seconds() {
        let config = ItemInConfig::new(ConnectionDescriptor::new("hub", 8080), "Lamp");
        assert_eq!(config.reconnect_delay, Duration::from_secs(10));
        assert_eq!(RECONNECT_DELAY, Duration::from_secs(10));
    }
}
