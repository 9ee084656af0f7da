use crate::agent::event::AgentEvent;

/// The single verdict for one agent session.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success {
        output: String,
        session_id: Option<String>,
        cost_usd: f64,
        turn_count: u32,
        raw_events: Vec<AgentEvent>,
    },
    Failure {
        reason: String,
        session_id: Option<String>,
        cost_usd: f64,
        turn_count: u32,
    },
    NoResponse,
}

impl Outcome {
    /// A failure that happened before the agent produced any metrics.
    pub fn failed(reason: impl Into<String>) -> Self {
        Outcome::Failure {
            reason: reason.into(),
            session_id: None,
            cost_usd: 0.0,
            turn_count: 0,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }

    /// Human-readable reason for a non-success verdict.
    pub fn reason(&self) -> Option<String> {
        match self {
            Outcome::Success { .. } => None,
            Outcome::Failure { reason, .. } => Some(reason.clone()),
            Outcome::NoResponse => Some("No response from agent".to_string()),
        }
    }

    pub fn cost_usd(&self) -> f64 {
        match self {
            Outcome::Success { cost_usd, .. } | Outcome::Failure { cost_usd, .. } => *cost_usd,
            Outcome::NoResponse => 0.0,
        }
    }

    pub fn turn_count(&self) -> u32 {
        match self {
            Outcome::Success { turn_count, .. } | Outcome::Failure { turn_count, .. } => {
                *turn_count
            }
            Outcome::NoResponse => 0,
        }
    }
}

/// Fold the full event sequence into one verdict.
///
/// The first `Result` event is authoritative; later ones are ignored. Without
/// one, the last assistant turn stands in as the output.
pub fn reduce(events: Vec<AgentEvent>) -> Outcome {
    let terminal = events.iter().find_map(|event| match event {
        AgentEvent::Result {
            subtype,
            result_text,
            cost_usd,
            turn_count,
            session_id,
        } => Some((
            subtype.clone(),
            result_text.clone(),
            *cost_usd,
            *turn_count,
            session_id.clone(),
        )),
        _ => None,
    });

    if let Some((subtype, result_text, cost_usd, turn_count, session_id)) = terminal {
        let results = events
            .iter()
            .filter(|event| matches!(event, AgentEvent::Result { .. }))
            .count();
        if results > 1 {
            tracing::debug!(ignored = results - 1, "Ignoring extra result messages");
        }
        if subtype == "success" {
            return Outcome::Success {
                output: result_text,
                session_id,
                cost_usd,
                turn_count,
                raw_events: events,
            };
        }
        return Outcome::Failure {
            reason: format!("agent failed: {subtype}"),
            session_id,
            cost_usd,
            turn_count,
        };
    }

    let assistant_texts: Vec<&str> = events
        .iter()
        .filter_map(|event| match event {
            AgentEvent::Assistant { text } => Some(text.as_str()),
            _ => None,
        })
        .collect();

    match assistant_texts.last() {
        Some(last) => {
            let output = (*last).to_string();
            let turn_count = assistant_texts.len() as u32;
            tracing::warn!(
                turns = turn_count,
                "Agent stream ended without a result message, using last assistant turn"
            );
            Outcome::Success {
                output,
                session_id: None,
                cost_usd: 0.0,
                turn_count,
                raw_events: events,
            }
        }
        None => Outcome::NoResponse,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(subtype: &str, text: &str, cost: f64, turns: u32) -> AgentEvent {
        AgentEvent::Result {
            subtype: subtype.to_string(),
            result_text: text.to_string(),
            cost_usd: cost,
            turn_count: turns,
            session_id: Some(format!("session-{subtype}")),
        }
    }

    fn assistant(text: &str) -> AgentEvent {
        AgentEvent::Assistant {
            text: text.to_string(),
        }
    }

    fn system() -> AgentEvent {
        AgentEvent::System {
            subtype: "init".to_string(),
        }
    }

    #[test]
    fn test_success_result() {
        let events = vec![system(), assistant("working"), result("success", "Fixed.", 0.02, 3)];
        let outcome = reduce(events.clone());
        assert_eq!(
            outcome,
            Outcome::Success {
                output: "Fixed.".to_string(),
                session_id: Some("session-success".to_string()),
                cost_usd: 0.02,
                turn_count: 3,
                raw_events: events,
            }
        );
    }

    #[test]
    fn test_failure_result_keeps_metrics() {
        let outcome = reduce(vec![result("error_max_turns", "", 0.5, 10)]);
        assert_eq!(
            outcome,
            Outcome::Failure {
                reason: "agent failed: error_max_turns".to_string(),
                session_id: Some("session-error_max_turns".to_string()),
                cost_usd: 0.5,
                turn_count: 10,
            }
        );
    }

    #[test]
    fn test_first_result_wins() {
        let outcome = reduce(vec![
            result("error_during_execution", "", 0.1, 1),
            assistant("retrying"),
            result("success", "done", 0.2, 2),
        ]);
        assert_eq!(
            outcome.reason().as_deref(),
            Some("agent failed: error_during_execution")
        );

        let outcome = reduce(vec![
            result("success", "done", 0.2, 2),
            result("error_max_turns", "", 0.3, 3),
        ]);
        assert!(matches!(outcome, Outcome::Success { ref output, .. } if output == "done"));
    }

    #[test]
    fn test_result_wins_over_later_assistant_turns() {
        let outcome = reduce(vec![result("success", "final", 0.0, 1), assistant("after")]);
        assert!(matches!(outcome, Outcome::Success { ref output, .. } if output == "final"));
    }

    #[test]
    fn test_falls_back_to_last_assistant() {
        let events = vec![
            system(),
            assistant("first"),
            AgentEvent::User {
                text: "tool output".to_string(),
            },
            assistant("second"),
            assistant("last"),
        ];
        match reduce(events) {
            Outcome::Success {
                output,
                session_id,
                cost_usd,
                turn_count,
                raw_events,
            } => {
                assert_eq!(output, "last");
                assert_eq!(turn_count, 3);
                assert_eq!(cost_usd, 0.0);
                assert!(session_id.is_none());
                assert_eq!(raw_events.len(), 5);
            }
            other => panic!("expected Success, got {other:?}"),
        }
    }

    #[test]
    fn test_no_response() {
        assert_eq!(reduce(Vec::new()), Outcome::NoResponse);
        assert_eq!(
            reduce(vec![
                system(),
                AgentEvent::Unknown {
                    raw: "garbage".to_string()
                },
            ]),
            Outcome::NoResponse
        );
    }

    #[test]
    fn test_user_events_alone_are_no_response() {
        let outcome = reduce(vec![AgentEvent::User {
            text: "hi".to_string(),
        }]);
        assert_eq!(outcome, Outcome::NoResponse);
        assert_eq!(outcome.reason().as_deref(), Some("No response from agent"));
    }
}
