//! Wire protocol framing for the quote feed.
//!
//! The feed speaks a Socket.IO-style text protocol: single-character
//! heartbeat frames, a session-open frame carrying a JSON payload, a bare
//! handshake acknowledgement, and `42`-prefixed JSON event arrays. The
//! upstream also emits vendor frames not modeled here; those decode to
//! [`Frame::Unrecognized`] and are ignored by the client.

use serde_json::{json, Value};

use crate::models::Instrument;

pub const PING: &str = "2";
pub const PONG: &str = "3";
pub const HANDSHAKE_OPEN: &str = "40";

const SESSION_OPEN_PREFIX: &str = "0";
const DATA_PREFIX: &str = "42";

/// Event names that carry a price for some instrument. The upstream is not
/// consistent about which one it uses, so all are accepted.
const PRICE_EVENTS: [&str; 5] = ["quotes", "quotes/stream", "price", "tick", "candle"];

#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Ping,
    Pong,
    SessionOpen { sid: Option<String> },
    HandshakeAck,
    Data { event: String, body: Value },
    Unrecognized,
}

impl Frame {
    /// Decode a raw text frame. Never fails: anything outside the modeled
    /// protocol, including malformed payloads, becomes `Unrecognized`.
    pub fn decode(raw: &str) -> Frame {
        match raw {
            PING => return Frame::Ping,
            PONG => return Frame::Pong,
            HANDSHAKE_OPEN => return Frame::HandshakeAck,
            _ => {}
        }

        if let Some(payload) = raw.strip_prefix(DATA_PREFIX) {
            return match serde_json::from_str::<Value>(payload) {
                Ok(Value::Array(items)) if items.len() >= 2 => match &items[0] {
                    Value::String(event) => Frame::Data {
                        event: event.clone(),
                        body: items[1].clone(),
                    },
                    _ => Frame::Unrecognized,
                },
                _ => Frame::Unrecognized,
            };
        }

        if let Some(payload) = raw.strip_prefix(SESSION_OPEN_PREFIX) {
            let sid = serde_json::from_str::<Value>(payload)
                .ok()
                .and_then(|v| v.get("sid").and_then(Value::as_str).map(str::to_string));
            return Frame::SessionOpen { sid };
        }

        Frame::Unrecognized
    }
}

/// Encode an event frame: `42["<event>",<payload>]`.
pub fn encode_event(event: &str, payload: &Value) -> String {
    format!(
        "{}{}",
        DATA_PREFIX,
        Value::Array(vec![Value::String(event.to_string()), payload.clone()])
    )
}

pub fn is_price_event(event: &str) -> bool {
    PRICE_EVENTS.contains(&event)
}

/// Pull a `(symbol, price)` pair out of a price-event body.
///
/// Probes `body.data.{symbol,price}` first, then the flat
/// `body.{symbol, price|close|bid|ask}` shape. Prices arrive as JSON
/// numbers or numeric strings; anything non-finite yields `None` and the
/// frame is dropped without error.
pub fn extract_quote(body: &Value) -> Option<(String, f64)> {
    let (symbol, price) = match body.get("data") {
        Some(data) => (data.get("symbol"), data.get("price")),
        None => (
            body.get("symbol"),
            body.get("price")
                .or_else(|| body.get("close"))
                .or_else(|| body.get("bid"))
                .or_else(|| body.get("ask")),
        ),
    };

    let symbol = symbol.and_then(Value::as_str)?.trim();
    if symbol.is_empty() {
        return None;
    }
    let price = numeric(price?)?;
    if !price.is_finite() {
        return None;
    }
    Some((symbol.to_string(), price))
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Post-connect session-initialization burst, sent in order with a small
/// gap between frames.
pub fn handshake_frames() -> Vec<String> {
    vec![
        HANDSHAKE_OPEN.to_string(),
        encode_event("authenticate", &json!({ "token": "guest" })),
        encode_event("subscribe", &json!({ "name": "connection" })),
    ]
}

/// All accepted subscribe spellings for one instrument. The upstream honors
/// only one of these, but which one is undocumented, so every variant goes
/// out.
pub fn subscribe_frames(instrument: &Instrument) -> Vec<String> {
    let symbol = instrument.wire_symbol();
    vec![
        encode_event("quotes/subscribe", &json!({ "symbol": &symbol })),
        encode_event("subscribe/quotes", &json!({ "symbol": &symbol })),
        encode_event("price/subscribe", &json!({ "symbol": &symbol })),
        encode_event("subscribe", &json!({ "name": "quotes", "symbol": &symbol })),
    ]
}

/// The single spelling used when replaying subscriptions after a handshake
/// acknowledgement.
pub fn subscribe_frame(instrument: &Instrument) -> String {
    encode_event(
        "quotes/subscribe",
        &json!({ "symbol": instrument.wire_symbol() }),
    )
}

pub fn unsubscribe_frames(instrument: &Instrument) -> Vec<String> {
    let symbol = instrument.wire_symbol();
    vec![
        encode_event("quotes/unsubscribe", &json!({ "symbol": &symbol })),
        encode_event("unsubscribe", &json!({ "name": "quotes", "symbol": &symbol })),
    ]
}
