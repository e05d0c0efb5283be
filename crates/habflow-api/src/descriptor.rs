// Connection descriptor: resolves a hub's base address from host/port.
//
// Every component that talks to the same hub shares one descriptor.
// It is immutable, carries no credentials, and never fails — malformed
// hosts surface later as transport errors when a request is attempted.

use serde::{Deserialize, Serialize};

/// Address of one openHAB hub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionDescriptor {
    host: String,
    port: u16,
}

impl ConnectionDescriptor {
    /// Create a descriptor for `host:port`.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// The configured host.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The configured port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Canonical base URL of the hub: `http://{host}:{port}`.
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    // ── Endpoint builders ────────────────────────────────────────────

    /// URL of the item directory: `{base}/rest/items`.
    pub fn items_url(&self) -> String {
        format!("{}/rest/items", self.base_url())
    }

    /// URL of one item's state resource: `{base}/rest/items/{name}`.
    pub fn item_url(&self, name: &str) -> String {
        format!("{}/rest/items/{name}", self.base_url())
    }

    /// URL of the `statechanged` event stream for one item.
    pub fn events_url(&self, name: &str) -> String {
        format!(
            "{}/rest/events?topics=smarthome/items/{name}/statechanged",
            self.base_url()
        )
    }
}

impl std::fmt::Display for ConnectionDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_canonical() {
        let d = ConnectionDescriptor::new("localhost", 8080);
        assert_eq!(d.base_url(), "http://localhost:8080");

        let d = ConnectionDescriptor::new("192.168.1.5", 80);
        assert_eq!(d.base_url(), "http://192.168.1.5:80");
    }

    #[test]
    fn item_urls() {
        let d = ConnectionDescriptor::new("hub", 8080);
        assert_eq!(d.items_url(), "http://hub:8080/rest/items");
        assert_eq!(d.item_url("Lamp"), "http://hub:8080/rest/items/Lamp");
    }

    #[test]
    fn events_url_scopes_to_statechanged_topic() {
        let d = ConnectionDescriptor::new("hub", 8080);
        assert_eq!(
            d.events_url("Lamp"),
            "http://hub:8080/rest/events?topics=smarthome/items/Lamp/statechanged"
        );
    }
}
