//! Text framing for the presence channel (Engine.IO v4 carrying Socket.IO v5
//! packets on the default namespace).
//!
//! Only what the presence client needs is modelled: handshake, ping/pong,
//! namespace connect/disconnect and events. Binary attachments and acks are
//! not supported.

use serde::Deserialize;
use serde_json::Value;

/// Engine.IO pong, sent in answer to every ping.
pub const PONG: &str = "3";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handshake {
    pub sid: String,
    #[serde(default)]
    pub ping_interval: u64,
    #[serde(default)]
    pub ping_timeout: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    Open(Handshake),
    Close,
    Ping,
    Pong,
    Noop,
    Connected,
    Disconnected,
    ConnectError(String),
    Event { name: String, args: Vec<Value> },
}

#[derive(Debug, thiserror::Error)]
pub enum PacketError {
    #[error("empty frame")]
    Empty,
    #[error("unsupported packet type {0:?}")]
    Unsupported(String),
    #[error("malformed packet payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("event packet without a name")]
    MissingEventName,
}

pub fn decode_packet(frame: &str) -> Result<Packet, PacketError> {
    let mut chars = frame.chars();
    let kind = chars.next().ok_or(PacketError::Empty)?;
    let rest = chars.as_str();
    match kind {
        '0' => Ok(Packet::Open(serde_json::from_str(rest)?)),
        '1' => Ok(Packet::Close),
        '2' => Ok(Packet::Ping),
        '3' => Ok(Packet::Pong),
        '4' => decode_message(rest),
        '6' => Ok(Packet::Noop),
        _ => Err(PacketError::Unsupported(frame.chars().take(2).collect())),
    }
}

fn decode_message(body: &str) -> Result<Packet, PacketError> {
    let mut chars = body.chars();
    let kind = chars.next().ok_or(PacketError::Empty)?;
    let rest = chars.as_str();
    match kind {
        '0' => Ok(Packet::Connected),
        '1' => Ok(Packet::Disconnected),
        '2' => {
            // An ack id, if present, precedes the JSON array.
            let payload = rest.trim_start_matches(|c: char| c.is_ascii_digit());
            let mut args: Vec<Value> = serde_json::from_str(payload)?;
            if args.is_empty() {
                return Err(PacketError::MissingEventName);
            }
            let name = match args.remove(0) {
                Value::String(name) => name,
                _ => return Err(PacketError::MissingEventName),
            };
            Ok(Packet::Event { name, args })
        }
        '4' => {
            let message = serde_json::from_str::<Value>(rest)
                .ok()
                .and_then(|value| value.get("message").and_then(Value::as_str).map(str::to_owned))
                .unwrap_or_else(|| rest.to_string());
            Ok(Packet::ConnectError(message))
        }
        other => Err(PacketError::Unsupported(format!("4{other}"))),
    }
}

/// Socket.IO connect to the default namespace.
pub fn encode_connect() -> String {
    "40".to_string()
}

pub fn encode_event(name: &str, args: &[Value]) -> String {
    let mut array = Vec::with_capacity(args.len() + 1);
    array.push(Value::String(name.to_string()));
    array.extend(args.iter().cloned());
    format!("42{}", Value::Array(array))
}
