// Shared transport configuration for building reqwest::Client instances.
//
// One-shot REST calls and the long-lived event stream need differently
// tuned clients: a total timeout would kill an idle stream, so the stream
// client only bounds the connect phase.

use std::time::Duration;

const USER_AGENT: &str = concat!("habflow/", env!("CARGO_PKG_VERSION"));

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Total timeout for one-shot requests; connect timeout for streams.
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` for one-shot GET/POST calls.
    pub fn build_client(&self) -> Result<reqwest::Client, crate::error::Error> {
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(client)
    }

    /// Build a `reqwest::Client` for the event stream.
    ///
    /// No total timeout -- the stream stays open indefinitely between
    /// events. Only the connect phase is bounded.
    pub fn build_stream_client(&self) -> Result<reqwest::Client, crate::error::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(self.timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(client)
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_timeout() {
        let config = TransportConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn builds_both_client_flavors() {
        let config = TransportConfig::default();
        assert!(config.build_client().is_ok());
        assert!(config.build_stream_client().is_ok());
    }
}
