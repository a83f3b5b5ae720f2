//! Wire types exchanged with the client, and the closed sets of command and event tags the relay understands.
//!
//! Inbound commands look like `{"type": <tag>, "data": {...}, "id": <optional correlation id>}`.
//!
//! Every outbound message, whether it answers a command or forwards an upstream event, has the same shape:
//! `{"type": <tag>, "data": {...}}`. Error envelopes use the `error` tag, put the message in `data.message`, and also
//! repeat it in a top-level `message` field so that clients which only look at `message` keep working.
use std::fmt::Display;

use log::*;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

//--------------------------------------   CommandEnvelope   ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CommandEnvelope {
    #[serde(rename = "type", default)]
    pub tag: String,
    #[serde(default)]
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
}

impl CommandEnvelope {
    pub fn new<S: Into<String>>(tag: S, data: Value) -> Self {
        Self { tag: tag.into(), data, id: None }
    }

    pub fn with_id<V: Into<Value>>(mut self, id: V) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Parses a command from a text frame. Anything that isn't a JSON object with a string `type` still produces a
    /// command, with an empty tag, so that it is answered by the `unhandled` handler instead of ending the session.
    pub fn from_json(text: &str) -> Self {
        match serde_json::from_str::<CommandEnvelope>(text) {
            Ok(cmd) => cmd,
            Err(e) => {
                debug!("🔌️ Received a frame that is not a valid command. {e}");
                Self::new("", Value::Null)
            },
        }
    }

    pub fn command(&self) -> CommandTag {
        CommandTag::from_tag(&self.tag)
    }
}

//--------------------------------------      Envelope       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
}

impl Envelope {
    pub fn new<S: Into<String>>(kind: S, data: Value) -> Self {
        Self { kind: kind.into(), data, message: None, id: None }
    }

    pub fn error<S: Display>(message: S) -> Self {
        let message = message.to_string();
        Self { kind: "error".into(), data: json!({ "message": message }), message: Some(message), id: None }
    }

    pub fn unhandled() -> Self {
        Self::new(CommandTag::Unhandled.as_str(), json!({ "message": "unhandled" }))
    }

    pub fn with_id(mut self, id: Option<Value>) -> Self {
        self.id = id;
        self
    }

    pub fn is_error(&self) -> bool {
        self.kind == "error"
    }

    /// The error message, if this is an error envelope.
    pub fn error_message(&self) -> Option<&str> {
        self.message.as_deref().filter(|_| self.is_error())
    }

    pub fn to_json(&self) -> String {
        // An Envelope holds nothing but strings and JSON values, so serialization can't fail
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"type":"error","data":{}}"#.to_string())
    }
}

//--------------------------------------     CommandTag      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandTag {
    Ping,
    User,
    CreateInvoice,
    Pay,
    Invoice,
    PayLnurlp,
    PayLnurlw,
    Unhandled,
}

impl CommandTag {
    /// Exact, case-sensitive lookup. Anything that isn't a known tag maps to [`CommandTag::Unhandled`].
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "ping" => Self::Ping,
            "user" => Self::User,
            "create_invoice" => Self::CreateInvoice,
            "pay" => Self::Pay,
            "invoice" => Self::Invoice,
            "pay_lnurlp" => Self::PayLnurlp,
            "pay_lnurlw" => Self::PayLnurlw,
            _ => Self::Unhandled,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ping => "ping",
            Self::User => "user",
            Self::CreateInvoice => "create_invoice",
            Self::Pay => "pay",
            Self::Invoice => "invoice",
            Self::PayLnurlp => "pay_lnurlp",
            Self::PayLnurlw => "pay_lnurlw",
            Self::Unhandled => "unhandled",
        }
    }
}

impl Display for CommandTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

//--------------------------------------      EventTag       ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventTag {
    Heartbeat,
    PaymentReceived,
    Unhandled,
}

impl EventTag {
    /// Tags are expected in normalized form, i.e. `payment_received` rather than `payment-received`.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "ping" | "heartbeat" => Self::Heartbeat,
            "payment_received" => Self::PaymentReceived,
            _ => Self::Unhandled,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Heartbeat => "ping",
            Self::PaymentReceived => "payment_received",
            Self::Unhandled => "unhandled",
        }
    }
}

impl Display for EventTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single event read off the provider's event stream.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamEvent {
    pub event: String,
    pub data: Value,
}

impl UpstreamEvent {
    pub fn new<S: Into<String>>(event: S, data: Value) -> Self {
        Self { event: event.into(), data }
    }
}
