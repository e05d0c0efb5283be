// ── Status signal ──
//
// The tri-state indicator a host UI shows per node instance. Ephemeral:
// every transition overwrites the previous signal, so it travels on a
// watch channel rather than accumulating anywhere.

/// How a host UI should render the current signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Connection housekeeping, or a state value that is neither on
    /// nor off.
    Neutral,

    /// The item reports an active state (`"ON"`).
    SuccessOn,

    /// The item reports an inactive state (`"OFF"`), or a command was
    /// accepted.
    SuccessOff,

    /// A failure the node absorbed and keeps running through.
    Error,
}

/// One status update for the host UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSignal {
    pub severity: Severity,
    pub text: String,
}

impl StatusSignal {
    /// Housekeeping signal, e.g. the `?` shown while (re)connecting.
    pub fn neutral(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Neutral,
            text: text.into(),
        }
    }

    /// Failure signal with detail text.
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            text: text.into(),
        }
    }

    /// Signal derived from an item state value: `"ON"` is success-on,
    /// `"OFF"` success-off, anything else neutral. Text is always
    /// `state:<value>`.
    pub fn for_state(value: &str) -> Self {
        let severity = match value {
            "ON" => Severity::SuccessOn,
            "OFF" => Severity::SuccessOff,
            _ => Severity::Neutral,
        };
        Self {
            severity,
            text: format!("state:{value}"),
        }
    }

    /// The command sink's acceptance signal.
    pub fn ok() -> Self {
        Self {
            severity: Severity::SuccessOff,
            text: "OK".to_owned(),
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────
