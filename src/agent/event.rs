use serde_json::Value;

/// One classified message from the agent, in emission order.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentEvent {
    /// Session bookkeeping (`init` and friends).
    System { subtype: String },
    /// A model turn.
    Assistant { text: String },
    /// A tool result or other user-role message fed back to the model.
    User { text: String },
    /// The terminal message carrying final metrics.
    Result {
        subtype: String,
        result_text: String,
        cost_usd: f64,
        turn_count: u32,
        session_id: Option<String>,
    },
    /// Anything unrecognised or malformed, kept verbatim.
    Unknown { raw: String },
}

impl AgentEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            AgentEvent::System { .. } => "system",
            AgentEvent::Assistant { .. } => "assistant",
            AgentEvent::User { .. } => "user",
            AgentEvent::Result { .. } => "result",
            AgentEvent::Unknown { .. } => "unknown",
        }
    }

    /// True for events a verdict can be built from.
    pub fn is_usable(&self) -> bool {
        matches!(self, AgentEvent::Assistant { .. } | AgentEvent::Result { .. })
    }
}

fn str_field(raw: &Value, key: &str) -> Option<String> {
    raw.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Build a `Result` event from a terminal message. Each field falls back to
/// its default on its own.
pub(crate) fn result_event(raw: &Value, subtype: String) -> AgentEvent {
    AgentEvent::Result {
        subtype,
        result_text: str_field(raw, "result").unwrap_or_default(),
        cost_usd: raw
            .get("total_cost_usd")
            .and_then(Value::as_f64)
            .filter(|cost| cost.is_finite() && *cost >= 0.0)
            .unwrap_or(0.0),
        turn_count: raw
            .get("num_turns")
            .and_then(Value::as_u64)
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or(0),
        session_id: str_field(raw, "session_id"),
    }
}

/// Classify one line of agent output. Non-JSON lines become `Unknown`.
pub fn classify_line(line: &str) -> AgentEvent {
    match serde_json::from_str::<Value>(line) {
        Ok(value) => classify(&value),
        Err(_) => AgentEvent::Unknown {
            raw: line.to_string(),
        },
    }
}

/// Classify one parsed message. Never fails; unrecognised messages become
/// `Unknown`.
pub fn classify(raw: &Value) -> AgentEvent {
    match raw.get("type").and_then(Value::as_str) {
        // A subtype that is missing or not a string never reads as success
        Some("result") => result_event(raw, str_field(raw, "subtype").unwrap_or_default()),
        Some("system") => AgentEvent::System {
            subtype: str_field(raw, "subtype").unwrap_or_default(),
        },
        Some("assistant") => AgentEvent::Assistant {
            text: message_text(raw),
        },
        Some("user") => AgentEvent::User {
            text: message_text(raw),
        },
        _ => AgentEvent::Unknown {
            raw: raw.to_string(),
        },
    }
}

/// Text of the first `text` block, or a stringified fallback.
fn message_text(raw: &Value) -> String {
    let Some(message) = raw.get("message") else {
        return String::new();
    };

    match message.get("content") {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Array(blocks)) => blocks
            .iter()
            .find_map(|block| {
                if block.get("type").and_then(Value::as_str) == Some("text") {
                    block.get("text").and_then(Value::as_str).map(str::to_string)
                } else {
                    None
                }
            })
            .or_else(|| blocks.first().map(Value::to_string))
            .unwrap_or_default(),
        Some(other) => other.to_string(),
        None => message.to_string(),
    }
}
