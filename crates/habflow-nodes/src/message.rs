// ── Flow messages ──
//
// What a subscription injects into the host's flow. One message per
// state event, each with a generated unique id.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Why a message was emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Topic {
    /// Current value fetched after a (re)connect.
    State,

    /// A change reported live by the event stream.
    StateChanged,
}

/// One message injected into the flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowMessage {
    /// Unique message id, generated per message.
    pub id: String,

    pub topic: Topic,

    /// The item state value this message carries.
    pub payload: String,

    /// Name of the item the value belongs to.
    pub item: String,
}

impl FlowMessage {
    /// Build a message with a fresh id.
    pub fn new(topic: Topic, payload: impl Into<String>, item: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            topic,
            payload: payload.into(),
            item: item.into(),
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn topics_serialize_to_wire_names() {
        assert_eq!(
            serde_json::to_string(&Topic::State).unwrap(),
            "\"state\""
        );
        assert_eq!(
            serde_json::to_string(&Topic::StateChanged).unwrap(),
            "\"statechanged\""
        );
    }

    #[test]
    fn messages_get_distinct_ids() {
        let a = FlowMessage::new(Topic::State, "ON", "Lamp");
        let b = FlowMessage::new(Topic::State, "ON", "Lamp");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn message_shape() {
        let msg = FlowMessage::new(Topic::StateChanged, "21.5", "Thermostat");
        let json = serde_json::to_value(&msg).unwrap();

        assert_eq!(json["topic"], "statechanged");
        assert_eq!(json["payload"], "21.5");
        assert_eq!(json["item"], "Thermostat");
        assert!(json["id"].as_str().is_some_and(|id| !id.is_empty()));
    }
}
