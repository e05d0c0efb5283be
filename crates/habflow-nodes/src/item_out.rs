// ── Item command sink ──
//
// The outbound half of the adapter: each flow message becomes one
// plain-text POST against the hub. Stateless between inputs, terminal
// in the flow (never emits messages), reports acceptance or failure
// through the status signal.

use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, warn};

use habflow_api::RestClient;

use crate::config::ItemOutConfig;
use crate::error::NodeError;
use crate::status::StatusSignal;

// ── ItemOutNode ──────────────────────────────────────────────────────

/// Command sink for one configured item.
pub struct ItemOutNode {
    item_name: String,
    command_override: String,
    rest: RestClient,
    status: watch::Sender<StatusSignal>,
}

impl ItemOutNode {
    /// Validate the configuration and build the sink.
    ///
    /// The item name is trimmed; a blank name is a configuration error.
    pub fn new(config: ItemOutConfig) -> Result<Self, NodeError> {
        let item_name = config.item_name.trim().to_owned();
        if item_name.is_empty() {
            return Err(NodeError::config("item name must not be blank"));
        }

        let rest = RestClient::new(config.descriptor, &config.transport)?;
        let (status, _) = watch::channel(StatusSignal::neutral(""));

        Ok(Self {
            item_name,
            command_override: config.command,
            rest,
            status,
        })
    }

    /// Name of the item this sink commands.
    pub fn item_name(&self) -> &str {
        &self.item_name
    }

    /// Subscribe to status updates.
    pub fn status(&self) -> watch::Receiver<StatusSignal> {
        self.status.subscribe()
    }

    /// Resolve, normalize, and post the command for one flow message.
    ///
    /// Returns the command actually sent. No request is made when
    /// neither the override nor the payload provides a command.
    pub async fn send(&self, payload: &Value) -> Result<String, NodeError> {
        let Some(command) = resolve_command(&self.command_override, payload) else {
            return Err(NodeError::NoCommand);
        };

        self.rest.send_command(&self.item_name, &command).await?;
        Ok(command)
    }

    /// Host-facing input handler: [`send`](Self::send) plus status
    /// reporting. Failures are absorbed into the returned signal.
    pub async fn handle_input(&self, payload: &Value) -> StatusSignal {
        let signal = match self.send(payload).await {
            Ok(command) => {
                debug!(item = %self.item_name, %command, "command accepted");
                StatusSignal::ok()
            }
            Err(NodeError::NoCommand) => {
                warn!(item = %self.item_name, "no command specified");
                StatusSignal::error("no command specified")
            }
            Err(e) => {
                warn!(item = %self.item_name, error = %e, "command failed");
                StatusSignal::error(e.to_string())
            }
        };

        self.status.send_replace(signal.clone());
        signal
    }
}

// ── Command resolution ───────────────────────────────────────────────

/// Resolve the effective command: a non-empty configured override
/// wins, else the message payload. `None` when neither provides one.
fn resolve_command(override_cmd: &str, payload: &Value) -> Option<String> {
    if !override_cmd.is_empty() {
        return Some(normalize_command(override_cmd));
    }

    match payload {
        Value::Null => None,
        Value::String(s) => Some(normalize_command(s)),
        Value::Bool(true) => Some("ON".to_owned()),
        Value::Bool(false) => Some("OFF".to_owned()),
        Value::Number(n) => Some(match n.as_i64() {
            Some(1) => "ON".to_owned(),
            Some(0) => "OFF".to_owned(),
            _ => n.to_string(),
        }),
        other => Some(other.to_string()),
    }
}

/// Alias the common switch spellings; anything else passes through
/// untouched (arbitrary setpoints).
fn normalize_command(raw: &str) -> String {
    match raw {
        "on" | "1" => "ON".to_owned(),
        "off" | "0" => "OFF".to_owned(),
        other => other.to_owned(),
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn switch_spellings_normalize() {
        assert_eq!(normalize_command("on"), "ON");
        assert_eq!(normalize_command("1"), "ON");
        assert_eq!(normalize_command("off"), "OFF");
        assert_eq!(normalize_command("0"), "OFF");
    }

    #[test]
    fn setpoints_pass_through() {
        assert_eq!(normalize_command("21.5"), "21.5");
        assert_eq!(normalize_command("INCREASE"), "INCREASE");
        // Only the exact lowercase spellings alias.
        assert_eq!(normalize_command("On"), "On");
        assert_eq!(normalize_command("true"), "true");
    }

    #[test]
    fn payload_scalars_resolve() {
        assert_eq!(resolve_command("", &json!("on")), Some("ON".into()));
        assert_eq!(resolve_command("", &json!(true)), Some("ON".into()));
        assert_eq!(resolve_command("", &json!(false)), Some("OFF".into()));
        assert_eq!(resolve_command("", &json!(1)), Some("ON".into()));
        assert_eq!(resolve_command("", &json!(0)), Some("OFF".into()));
        assert_eq!(resolve_command("", &json!(21.5)), Some("21.5".into()));
    }

    #[test]
    fn null_payload_resolves_to_nothing() {
        assert_eq!(resolve_command("", &Value::Null), None);
    }

    #[test]
    fn override_wins_over_payload() {
        assert_eq!(resolve_command("OFF", &json!("on")), Some("OFF".into()));
    }

    #[test]
    fn override_is_normalized_too() {
        assert_eq!(resolve_command("on", &Value::Null), Some("ON".into()));
    }

    #[test]
    fn structured_payloads_pass_as_json() {
        assert_eq!(
            resolve_command("", &json!({"level": 40})),
            Some("{\"level\":40}".into())
        );
    }
}
