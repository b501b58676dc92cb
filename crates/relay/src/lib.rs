//! Message relay between the batch surface and the step interpreter
//!
//! A dispatch is an explicit request/response future: the caller sends an
//! `ExecuteWorkflow` request over an mpsc channel and awaits a oneshot
//! reply. Exactly one reply is produced per request, and the channel is
//! held open only until the run settles. Requests run concurrently; the
//! staggered batch mode depends on that.

use autoflow_core_types::{RunMetadata, Step};
use autoflow_interpreter::{StepError, StepInterpreter};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Reply carried back to the dispatcher once the run settles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchReply {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DispatchReply {
    pub fn success() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Relay-level failures; run failures travel inside [`DispatchReply`].
#[derive(Debug, Error)]
pub enum RelayError {
    /// The relay task stopped before replying.
    #[error("relay is no longer serving dispatches")]
    Closed,

    /// Payload `type` field was not a known message type.
    #[error("unsupported message type: {0}")]
    UnknownMessageType(String),

    /// The steps payload was not an array of step objects.
    #[error("steps payload is not an array")]
    NotAnArray,

    /// A known step kind with malformed fields.
    #[error("malformed {kind} step: {message}")]
    MalformedStep { kind: String, message: String },

    /// Includes `UnknownStepKind` raised while validating external tags.
    #[error(transparent)]
    Step(#[from] StepError),
}

struct DispatchRequest {
    steps: Vec<Step>,
    metadata: Option<RunMetadata>,
    reply: oneshot::Sender<DispatchReply>,
}

/// Cheap-to-clone sender half of the relay.
#[derive(Clone)]
pub struct RelayHandle {
    tx: mpsc::Sender<DispatchRequest>,
}

impl RelayHandle {
    /// Dispatch a step sequence and await its reply.
    pub async fn execute(
        &self,
        steps: Vec<Step>,
        metadata: Option<RunMetadata>,
    ) -> Result<DispatchReply, RelayError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(DispatchRequest {
                steps,
                metadata,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RelayError::Closed)?;
        reply_rx.await.map_err(|_| RelayError::Closed)
    }

    /// Dispatch a raw JSON payload, validating it first. Parse failures
    /// are relay errors; run failures come back as a failure reply.
    pub async fn execute_json(&self, payload: &Value) -> Result<DispatchReply, RelayError> {
        let (steps, metadata) = parse_dispatch(payload)?;
        self.execute(steps, metadata).await
    }
}

/// Owns the interpreter and serves dispatch requests until every handle
/// is dropped. Each request runs in its own task so concurrent dispatches
/// (the staggered batch mode) do not serialize behind one another.
pub struct Relay;

impl Relay {
    pub fn spawn(interpreter: StepInterpreter) -> (RelayHandle, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel::<DispatchRequest>(32);

        let task = tokio::spawn(async move {
            while let Some(request) = rx.recv().await {
                let interpreter = interpreter.clone();
                tokio::spawn(async move {
                    debug!(steps = request.steps.len(), "serving dispatch");
                    let reply = match interpreter
                        .execute(&request.steps, request.metadata.as_ref())
                        .await
                    {
                        Ok(_) => DispatchReply::success(),
                        Err(err) => DispatchReply::failure(err.to_string()),
                    };
                    if request.reply.send(reply).is_err() {
                        warn!("dispatch caller went away before the reply");
                    }
                });
            }
        });

        (RelayHandle { tx }, task)
    }
}

/// Validate an external dispatch payload into typed steps.
///
/// Tags outside the closed step set surface as `UnknownStepKind`; known
/// tags with broken fields are malformed payloads.
pub fn parse_dispatch(payload: &Value) -> Result<(Vec<Step>, Option<RunMetadata>), RelayError> {
    let message_type = payload
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or_default();
    if message_type != "EXECUTE_WORKFLOW" {
        return Err(RelayError::UnknownMessageType(message_type.to_string()));
    }

    let raw_steps = payload
        .get("steps")
        .and_then(Value::as_array)
        .ok_or(RelayError::NotAnArray)?;

    let mut steps = Vec::with_capacity(raw_steps.len());
    for raw in raw_steps {
        let kind = raw
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        if !Step::KNOWN_KINDS.contains(&kind.as_str()) {
            return Err(RelayError::Step(StepError::UnknownStepKind(kind)));
        }
        let step: Step =
            serde_json::from_value(raw.clone()).map_err(|err| RelayError::MalformedStep {
                kind: kind.clone(),
                message: err.to_string(),
            })?;
        steps.push(step);
    }

    let metadata = payload
        .get("metadata")
        .filter(|meta| !meta.is_null())
        .map(|meta| serde_json::from_value(meta.clone()))
        .transpose()
        .map_err(|err| RelayError::MalformedStep {
            kind: "metadata".to_string(),
            message: err.to_string(),
        })?;

    Ok((steps, metadata))
}

#[cfg(test)]
mod tests {
    use super::*;
    use autoflow_dom_adapter::{FakeDom, FakeElement};
    use autoflow_interpreter::StepTiming;
    use serde_json::json;
    use std::sync::Arc;

    fn spawn_relay(dom: &FakeDom) -> RelayHandle {
        let interpreter = StepInterpreter::new(Arc::new(dom.clone())).with_timing(StepTiming {
            inter_step_delay_ms: 1,
            clear_settle_ms: 1,
            appearance_poll_ms: 1,
            appearance_timeout_ms: 50,
            results_poll_ms: 1,
            results_timeout_ms: 50,
        });
        let (handle, _task) = Relay::spawn(interpreter);
        handle
    }

    #[tokio::test]
    async fn successful_run_replies_success() {
        let dom = FakeDom::new();
        dom.insert("button.go", FakeElement::plain());
        let relay = spawn_relay(&dom);

        let reply = relay
            .execute(
                vec![Step::Click {
                    selector: "button.go".to_string(),
                    index: None,
                }],
                None,
            )
            .await
            .unwrap();

        assert!(reply.success);
        assert!(reply.error.is_none());
        assert_eq!(dom.clicks("button.go", 0), 1);
    }

    #[tokio::test]
    async fn failed_run_replies_with_the_error_message() {
        let dom = FakeDom::new();
        let relay = spawn_relay(&dom);

        let reply = relay
            .execute(
                vec![Step::Click {
                    selector: "button.gone".to_string(),
                    index: None,
                }],
                None,
            )
            .await
            .unwrap();

        assert!(!reply.success);
        assert!(reply.error.unwrap().contains("button.gone"));
    }

    #[tokio::test]
    async fn json_payload_round_trips() {
        let dom = FakeDom::new();
        dom.insert("input.q", FakeElement::native_input());
        let relay = spawn_relay(&dom);

        let payload = json!({
            "type": "EXECUTE_WORKFLOW",
            "steps": [
                { "type": "fillInput", "selector": "input.q", "value": "hello" }
            ],
            "metadata": { "promptIndex": 0, "promptText": "hello", "phase": "submit" }
        });

        let reply = relay.execute_json(&payload).await.unwrap();
        assert!(reply.success);
        assert_eq!(dom.value_of("input.q").as_deref(), Some("hello"));
    }

    #[test]
    fn unknown_step_tag_is_rejected_as_unknown_kind() {
        let payload = json!({
            "type": "EXECUTE_WORKFLOW",
            "steps": [ { "type": "hover", "selector": "a" } ]
        });

        let err = parse_dispatch(&payload).unwrap_err();
        match err {
            RelayError::Step(StepError::UnknownStepKind(kind)) => assert_eq!(kind, "hover"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unknown_message_type_is_rejected() {
        let payload = json!({ "type": "PING" });
        assert!(matches!(
            parse_dispatch(&payload),
            Err(RelayError::UnknownMessageType(t)) if t == "PING"
        ));
    }

    #[test]
    fn malformed_known_step_is_distinguished() {
        let payload = json!({
            "type": "EXECUTE_WORKFLOW",
            "steps": [ { "type": "waitForNewResults", "selector": "a.result" } ]
        });

        assert!(matches!(
            parse_dispatch(&payload),
            Err(RelayError::MalformedStep { kind, .. }) if kind == "waitForNewResults"
        ));
    }
}
