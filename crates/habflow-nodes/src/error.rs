// ── Node error types ──
//
// User-facing errors from habflow-nodes. Runtime stream failures never
// appear here -- the subscription loop absorbs those into the status
// signal and keeps going. What remains is construction-time validation
// and the one-shot command path.

use thiserror::Error;

/// Unified error type for the node crate.
#[derive(Debug, Error)]
pub enum NodeError {
    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// The command sink resolved neither an override nor a payload.
    #[error("no command specified")]
    NoCommand,

    // ── Transport errors (wrapped) ───────────────────────────────────
    #[error(transparent)]
    Api(#[from] habflow_api::Error),
}

impl NodeError {
    /// Construction-time validation failure.
    pub fn config(message: impl Into<String>) -> Self {
        NodeError::Config {
            message: message.into(),
        }
    }
}
