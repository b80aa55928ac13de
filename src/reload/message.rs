//! Hot reload message protocol.
//!
//! JSON objects discriminated by `operation`:
//!
//! - `pages` (client → server): bundle keys now on screen
//! - `reload` (server → client): a displayed bundle was rebuilt
//! - `warn` / `error` (server → client): build problems to surface

use serde::{Deserialize, Serialize};

/// Message received from the browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "lowercase")]
pub enum ClientMessage {
    Pages { value: Vec<String> },
}

impl ClientMessage {
    /// Parse a text frame; unknown or malformed frames yield `None`.
    pub fn parse(text: &str) -> Option<Self> {
        serde_json::from_str(text).ok()
    }
}

/// Message pushed to the browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "lowercase")]
pub enum ServerMessage {
    Reload,
    Warn { message: String },
    Error { message: String },
}

/// Severity of a message surfaced to the developer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Warn,
    Error,
}

impl ServerMessage {
    pub fn log(level: LogLevel, message: impl Into<String>) -> Self {
        let message = message.into();
        match level {
            LogLevel::Warn => Self::Warn { message },
            LogLevel::Error => Self::Error { message },
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"operation":"reload"}"#.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pages_message() {
        let msg = ClientMessage::parse(r#"{"operation":"pages","value":["a","b"]}"#).unwrap();
        assert_eq!(
            msg,
            ClientMessage::Pages {
                value: vec!["a".into(), "b".into()]
            }
        );
    }

    #[test]
    fn rejects_unknown_operation() {
        assert!(ClientMessage::parse(r#"{"operation":"navigate","value":[]}"#).is_none());
        assert!(ClientMessage::parse("not json").is_none());
    }

    #[test]
    fn server_messages_are_tagged_by_operation() {
        assert_eq!(ServerMessage::Reload.to_json(), r#"{"operation":"reload"}"#);
        assert_eq!(
            ServerMessage::log(LogLevel::Warn, "slow build").to_json(),
            r#"{"operation":"warn","message":"slow build"}"#
        );
        assert_eq!(
            ServerMessage::log(LogLevel::Error, "boom").to_json(),
            r#"{"operation":"error","message":"boom"}"#
        );
    }
}
