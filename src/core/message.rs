//! Messages delivered to the state machine.
//!
//! A message is an event identifier plus an ordered argument list and a
//! string-keyed parameter map. Messages are built once with the consuming
//! `with_*` methods and are immutable afterwards.

use super::id::EventId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Errors from the raw-byte transport encoding.
#[derive(Debug, Error)]
pub enum MessageError {
    #[error("Message encoding failed: {0}")]
    EncodeFailed(String),

    #[error("Message decoding failed: {0}")]
    DecodeFailed(String),
}

/// A single positional argument: text or raw bytes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Arg {
    Text(String),
    Bytes(Vec<u8>),
}

impl Arg {
    /// The argument as text, if it is text or valid UTF-8 bytes.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Bytes(b) => std::str::from_utf8(b).ok(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(s) => s.as_bytes(),
            Self::Bytes(b) => b,
        }
    }
}

impl From<&str> for Arg {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Arg {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<Vec<u8>> for Arg {
    fn from(b: Vec<u8>) -> Self {
        Self::Bytes(b)
    }
}

/// An event together with its payload.
///
/// # Example
///
/// ```rust
/// use evfsm::core::{EventId, Message};
///
/// const MOVE: EventId = EventId::from_static("robot::MOVE");
///
/// let msg = Message::new(MOVE)
///     .with_arg("north")
///     .with_param("speed", "3");
///
/// assert_eq!(msg.arg_str(0), Some("north"));
/// assert_eq!(msg.param("speed"), "3");
/// assert_eq!(msg.param("missing"), "");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    event: EventId,
    #[serde(default)]
    args: Vec<Arg>,
    #[serde(default)]
    params: BTreeMap<String, String>,
}

impl Message {
    /// Create a message carrying only an event.
    pub fn new(event: EventId) -> Self {
        Self {
            event,
            args: Vec::new(),
            params: BTreeMap::new(),
        }
    }

    /// Idle-timeout message synthesized by the main loop.
    pub fn timeout() -> Self {
        Self::new(EventId::TIMEOUT)
    }

    /// Stop sentinel.
    pub fn stop() -> Self {
        Self::new(EventId::STOP)
    }

    pub fn with_arg(mut self, arg: impl Into<Arg>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append a binary argument.
    pub fn with_bytes(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.args.push(Arg::Bytes(data.into()));
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Replace all parameters.
    pub fn with_params(mut self, params: BTreeMap<String, String>) -> Self {
        self.params = params;
        self
    }

    pub fn event(&self) -> &EventId {
        &self.event
    }

    pub fn is_stop(&self) -> bool {
        self.event == EventId::STOP
    }

    pub fn args(&self) -> &[Arg] {
        &self.args
    }

    /// Positional argument `index` as text.
    pub fn arg_str(&self, index: usize) -> Option<&str> {
        self.args.get(index).and_then(Arg::as_str)
    }

    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    pub fn has_param(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    /// Named parameter, or the empty string when it is absent.
    pub fn param(&self, key: &str) -> &str {
        self.params.get(key).map(String::as_str).unwrap_or("")
    }

    /// Encode into the compact binary transport form.
    pub fn to_bytes(&self) -> Result<Vec<u8>, MessageError> {
        bincode::serialize(self).map_err(|e| MessageError::EncodeFailed(e.to_string()))
    }

    /// Decode from the compact binary transport form.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MessageError> {
        bincode::deserialize(bytes).map_err(|e| MessageError::DecodeFailed(e.to_string()))
    }
}

impl From<EventId> for Message {
    fn from(event: EventId) -> Self {
        Self::new(event)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => f.write_str(&json),
            Err(_) => write!(f, "{}", self.event),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PING: EventId = EventId::from_static("test::PING");

    #[test]
    fn bare_event_has_no_payload() {
        let msg = Message::from(PING);
        assert_eq!(msg.event(), &PING);
        assert!(msg.args().is_empty());
        assert!(msg.params().is_empty());
        assert!(!msg.is_stop());
    }

    #[test]
    fn args_keep_insertion_order() {
        let msg = Message::new(PING)
            .with_arg("first")
            .with_bytes(vec![0xff, 0x00])
            .with_arg(String::from("third"));

        assert_eq!(msg.args().len(), 3);
        assert_eq!(msg.arg_str(0), Some("first"));
        assert_eq!(msg.arg_str(1), None);
        assert_eq!(msg.args()[1].as_bytes(), &[0xff, 0x00]);
        assert_eq!(msg.arg_str(2), Some("third"));
        assert_eq!(msg.arg_str(3), None);
    }

    #[test]
    fn params_lookup_defaults_to_empty() {
        let msg = Message::new(PING).with_param("k", "v");
        assert!(msg.has_param("k"));
        assert_eq!(msg.param("k"), "v");
        assert!(!msg.has_param("other"));
        assert_eq!(msg.param("other"), "");
    }

    #[test]
    fn with_params_replaces_existing() {
        let mut params = BTreeMap::new();
        params.insert("a".to_string(), "1".to_string());
        let msg = Message::new(PING).with_param("b", "2").with_params(params);
        assert!(msg.has_param("a"));
        assert!(!msg.has_param("b"));
    }

    #[test]
    fn binary_transport_preserves_message() {
        let msg = Message::new(PING)
            .with_arg("x")
            .with_bytes(vec![1, 2, 3])
            .with_param("key", "value");
        let bytes = msg.to_bytes().unwrap();
        assert_eq!(Message::from_bytes(&bytes).unwrap(), msg);
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let err = Message::from_bytes(&[0xff; 3]).unwrap_err();
        assert!(matches!(err, MessageError::DecodeFailed(_)));
    }

    #[test]
    fn display_renders_json() {
        let msg = Message::new(PING).with_param("n", "1");
        assert_eq!(msg.to_string(), r#"{"event":"test::PING","args":[],"params":{"n":"1"}}"#);
    }

    #[test]
    fn reserved_constructors() {
        assert!(Message::stop().is_stop());
        assert_eq!(Message::timeout().event(), &EventId::TIMEOUT);
    }
}
