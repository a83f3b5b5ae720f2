use log::*;
use serde_json::json;

use crate::messages::{Envelope, EventTag, UpstreamEvent};

/// What should happen to an upstream event.
#[derive(Debug, Clone, PartialEq)]
pub enum EventOutcome {
    /// Send this envelope to the client.
    Forward(Envelope),
    /// The event has no handler. The envelope describes it; forwarding it is up to the caller.
    Unhandled(Envelope),
    /// Nothing to send (heartbeats).
    Suppressed,
}

/// Translates provider events into client envelopes.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventDispatcher;

impl EventDispatcher {
    pub fn dispatch(&self, event: UpstreamEvent) -> EventOutcome {
        match EventTag::from_tag(&event.event) {
            EventTag::Heartbeat => {
                trace!("📡️ Heartbeat: {}", event.data);
                EventOutcome::Suppressed
            },
            EventTag::PaymentReceived => {
                debug!("📡️ Payment received");
                EventOutcome::Forward(Envelope::new(EventTag::PaymentReceived.as_str(), event.data))
            },
            EventTag::Unhandled => {
                debug!("📡️ Unhandled event '{}'", event.event);
                let data = json!({ "message": "unhandled sse action", "data": event.data });
                EventOutcome::Unhandled(Envelope::new(EventTag::Unhandled.as_str(), data))
            },
        }
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;
    use crate::stream::parse_frame;

    #[test]
    fn payment_received_is_forwarded() {
        let event = parse_frame("event: payment-received", r#"data: {"amount":1000}"#).unwrap();
        let outcome = EventDispatcher.dispatch(event);
        assert_eq!(outcome, EventOutcome::Forward(Envelope::new("payment_received", json!({"amount": 1000}))));
        if let EventOutcome::Forward(env) = outcome {
            assert_eq!(env.to_json(), r#"{"type":"payment_received","data":{"amount":1000}}"#);
        }
    }

    #[test]
    fn heartbeats_are_suppressed() {
        for tag in ["ping", "heartbeat"] {
            let outcome = EventDispatcher.dispatch(UpstreamEvent::new(tag, json!("2024-06-01T10:00:00")));
            assert_eq!(outcome, EventOutcome::Suppressed);
        }
    }

    #[test]
    fn unknown_events_are_described() {
        let outcome = EventDispatcher.dispatch(UpstreamEvent::new("invoice_expired", json!({"hash": "a1"})));
        let expected = Envelope::new("unhandled", json!({"message": "unhandled sse action", "data": {"hash": "a1"}}));
        assert_eq!(outcome, EventOutcome::Unhandled(expected));
    }
}
