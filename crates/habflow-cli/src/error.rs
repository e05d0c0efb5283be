//! CLI error types with miette diagnostics.
//!
//! Maps `NodeError` and the api-crate taxonomy into user-facing errors
//! with actionable help text and distinct exit codes.

use miette::Diagnostic;
use thiserror::Error;

use habflow_nodes::NodeError;

/// Exit codes for process termination.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to the hub")]
    #[diagnostic(
        code(habflow::connection_failed),
        help(
            "Check that openHAB is running and reachable.\n\
             Try: habflow items --host <HOST> --port <PORT>"
        )
    )]
    ConnectionFailed {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Request timed out")]
    #[diagnostic(
        code(habflow::timeout),
        help("Increase the timeout with --timeout or check hub responsiveness.")
    )]
    Timeout,

    // ── Hub responses ────────────────────────────────────────────────
    #[error("Item not found on the hub")]
    #[diagnostic(
        code(habflow::not_found),
        help("Run: habflow items to see what the hub knows about.")
    )]
    ItemNotFound,

    #[error("Hub rejected the request (HTTP {status}): {body}")]
    #[diagnostic(code(habflow::hub_error))]
    Hub { status: u16, body: String },

    #[error("Could not decode the hub's response: {message}")]
    #[diagnostic(
        code(habflow::decode),
        help("The endpoint may not be an openHAB REST API.")
    )]
    Decode { message: String },

    // ── Usage ────────────────────────────────────────────────────────
    #[error("no command specified")]
    #[diagnostic(
        code(habflow::no_command),
        help("Pass the command as an argument: habflow send <ITEM> <COMMAND>")
    )]
    NoCommand,

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(habflow::validation))]
    Validation { field: String, reason: String },
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout => exit_code::TIMEOUT,
            Self::ItemNotFound => exit_code::NOT_FOUND,
            Self::NoCommand | Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── api / node error mapping ─────────────────────────────────────────

impl From<habflow_api::Error> for CliError {
    fn from(err: habflow_api::Error) -> Self {
        match err {
            habflow_api::Error::Transport(e) if e.is_timeout() => CliError::Timeout,

            habflow_api::Error::Transport(e) => CliError::ConnectionFailed { source: e.into() },

            habflow_api::Error::InvalidUrl(e) => CliError::Validation {
                field: "host".into(),
                reason: e.to_string(),
            },

            habflow_api::Error::Protocol { status: 404, .. } => CliError::ItemNotFound,

            habflow_api::Error::Protocol { status, body } => CliError::Hub { status, body },

            habflow_api::Error::Decode { message, .. } => CliError::Decode { message },
        }
    }
}

impl From<NodeError> for CliError {
    fn from(err: NodeError) -> Self {
        match err {
            NodeError::Config { message } => CliError::Validation {
                field: "item".into(),
                reason: message,
            },
            NodeError::NoCommand => CliError::NoCommand,
            NodeError::Api(e) => e.into(),
        }
    }
}
