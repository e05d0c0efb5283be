//! Command handlers: bridge CLI args -> node configs -> terminal output.

pub mod items;
pub mod send;
pub mod watch;

use std::time::Duration;

use habflow_api::{ConnectionDescriptor, TransportConfig};

use crate::cli::GlobalOpts;

/// Hub address from the global flags.
pub fn descriptor(global: &GlobalOpts) -> ConnectionDescriptor {
    ConnectionDescriptor::new(global.host.clone(), global.port)
}

/// One-shot request tuning from the global flags.
pub fn transport(global: &GlobalOpts) -> TransportConfig {
    TransportConfig {
        timeout: Duration::from_secs(global.timeout),
    }
}
