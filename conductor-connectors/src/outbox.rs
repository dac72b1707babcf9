//! A send connector that accepts email without delivering it.

use crate::request_map;
use async_trait::async_trait;
use flow0::connector::{Capability, Connector};
use flow0::error::ConnectorError;
use flow0::id::ConnectorName;
use flow0::value::Value;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};

/// Hex digits of the content digest kept in a message id.
const ID_DIGITS: usize = 16;

/// One message accepted by an [`Outbox`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentMessage {
    /// Identifier returned to the caller.
    pub message_id: String,
    /// Recipient addresses.
    pub to: Vec<String>,
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub body: String,
}

/// Bounded record of accepted messages, shared with an [`Outbox`].
///
/// Holds at most `capacity` messages; the oldest is dropped first.
#[derive(Debug)]
pub struct SentLog {
    capacity: usize,
    messages: Mutex<VecDeque<SentMessage>>,
}

impl SentLog {
    /// An empty log keeping at most `capacity` messages.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            messages: Mutex::new(VecDeque::new()),
        }
    }

    /// Recorded messages, oldest first.
    pub fn messages(&self) -> Vec<SentMessage> {
        self.messages
            .lock()
            .map(|m| m.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of recorded messages.
    pub fn len(&self) -> usize {
        self.messages.lock().map(|m| m.len()).unwrap_or_default()
    }

    /// Whether nothing is recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn record(&self, message: SentMessage) {
        if self.capacity == 0 {
            return;
        }
        let Ok(mut messages) = self.messages.lock() else {
            tracing::warn!(message_id = %message.message_id, "conductor.outbox.log_poisoned");
            return;
        };
        while messages.len() >= self.capacity {
            messages.pop_front();
        }
        messages.push_back(message);
    }
}

/// Accepts email requests and acknowledges them without delivery.
///
/// Requests are maps with `to` (an address or a list of addresses),
/// `subject` and `body`. The response depends only on the request: the
/// message id is `<name>-<digest>` where the digest covers recipients,
/// subject and body, so identical requests get identical acknowledgements.
/// Attach a [`SentLog`] to inspect what was accepted.
pub struct Outbox {
    name: ConnectorName,
    log: Option<Arc<SentLog>>,
}

impl Outbox {
    /// An outbox that keeps nothing.
    pub fn new(name: impl Into<ConnectorName>) -> Self {
        Self {
            name: name.into(),
            log: None,
        }
    }

    /// Record accepted messages into `log`.
    #[must_use]
    pub fn with_log(mut self, log: Arc<SentLog>) -> Self {
        self.log = Some(log);
        self
    }

    fn message_id(&self, to: &[String], subject: &str, body: &str) -> String {
        let mut hasher = Sha256::new();
        for address in to {
            hasher.update(address.as_bytes());
            hasher.update([0u8]);
        }
        hasher.update([1u8]);
        hasher.update(subject.as_bytes());
        hasher.update([0u8]);
        hasher.update(body.as_bytes());
        let digest = hex::encode(hasher.finalize());
        format!("{}-{}", self.name, &digest[..ID_DIGITS])
    }
}

fn recipients(value: Option<&Value>) -> Result<Vec<String>, ConnectorError> {
    let addresses = match value {
        Some(Value::Text(one)) => vec![one.clone()],
        Some(Value::List(many)) => many
            .iter()
            .map(|v| {
                v.as_text().map(str::to_owned).ok_or_else(|| {
                    ConnectorError::InvalidRequest("to must hold addresses".into())
                })
            })
            .collect::<Result<_, _>>()?,
        Some(other) => {
            return Err(ConnectorError::InvalidRequest(format!(
                "to must be text or a list, got {}",
                other.kind()
            )));
        }
        None => return Err(ConnectorError::InvalidRequest("missing field to".into())),
    };
    if addresses.is_empty() {
        return Err(ConnectorError::InvalidRequest("no recipients".into()));
    }
    if let Some(bad) = addresses.iter().find(|a| !a.contains('@')) {
        return Err(ConnectorError::InvalidRequest(format!(
            "not an email address: {bad}"
        )));
    }
    Ok(addresses)
}

fn text_field(request: &BTreeMap<String, Value>, key: &str) -> Result<String, ConnectorError> {
    match request.get(key) {
        Some(Value::Text(s)) => Ok(s.clone()),
        Some(other) => Err(ConnectorError::InvalidRequest(format!(
            "{key} must be text, got {}",
            other.kind()
        ))),
        None => Err(ConnectorError::InvalidRequest(format!("missing field {key}"))),
    }
}

#[async_trait]
impl Connector for Outbox {
    fn name(&self) -> &ConnectorName {
        &self.name
    }

    fn capability(&self) -> Capability {
        Capability::Send
    }

    async fn call(&self, request: Value) -> Result<Value, ConnectorError> {
        let request = request_map(&request)?;
        let to = recipients(request.get("to"))?;
        let subject = text_field(request, "subject")?;
        if subject.trim().is_empty() {
            return Err(ConnectorError::InvalidRequest("empty subject".into()));
        }
        let body = text_field(request, "body")?;

        let message_id = self.message_id(&to, &subject, &body);
        tracing::info!(
            connector = %self.name,
            message_id = %message_id,
            recipients = ?to,
            subject = %subject,
            "conductor.outbox.sent"
        );
        let response = Value::map([
            ("status", Value::text("sent")),
            ("message_id", Value::text(message_id.clone())),
            (
                "recipients",
                Value::List(to.iter().cloned().map(Value::Text).collect()),
            ),
        ]);
        if let Some(log) = &self.log {
            log.record(SentMessage {
                message_id,
                to,
                subject,
                body,
            });
        }
        Ok(response)
    }
}
