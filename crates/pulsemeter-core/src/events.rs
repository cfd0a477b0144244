//! Closed event kinds accepted by the aggregator.
//!
//! Callers pass these enums instead of free-form strings, so an unknown kind is
//! a compile error rather than a silently ignored event. `FromStr` exists only
//! for text boundaries (HTTP query strings, config) and rejects unknown names.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MeterError;

/// Security-relevant events raised by auth strategies and guards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SecurityEventKind {
    FailedLogin,
    SuspiciousRequest,
    BlockedRequest,
    RateLimitHit,
}

impl SecurityEventKind {
    pub const ALL: [SecurityEventKind; 4] = [
        SecurityEventKind::FailedLogin,
        SecurityEventKind::SuspiciousRequest,
        SecurityEventKind::BlockedRequest,
        SecurityEventKind::RateLimitHit,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SecurityEventKind::FailedLogin => "failedLogin",
            SecurityEventKind::SuspiciousRequest => "suspiciousRequest",
            SecurityEventKind::BlockedRequest => "blockedRequest",
            SecurityEventKind::RateLimitHit => "rateLimitHit",
        }
    }
}

/// WebSocket lifecycle and traffic events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WebSocketEventKind {
    Connection,
    Disconnection,
    MessageSent,
    MessageReceived,
    Error,
}

impl WebSocketEventKind {
    pub const ALL: [WebSocketEventKind; 5] = [
        WebSocketEventKind::Connection,
        WebSocketEventKind::Disconnection,
        WebSocketEventKind::MessageSent,
        WebSocketEventKind::MessageReceived,
        WebSocketEventKind::Error,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            WebSocketEventKind::Connection => "connection",
            WebSocketEventKind::Disconnection => "disconnection",
            WebSocketEventKind::MessageSent => "messageSent",
            WebSocketEventKind::MessageReceived => "messageReceived",
            WebSocketEventKind::Error => "error",
        }
    }
}

/// Business-domain transitions reported by domain services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BusinessEventKind {
    OfferCreated,
    OfferCompleted,
    TaskCreated,
    TaskCompleted,
    FileUploaded,
}

impl BusinessEventKind {
    pub const ALL: [BusinessEventKind; 5] = [
        BusinessEventKind::OfferCreated,
        BusinessEventKind::OfferCompleted,
        BusinessEventKind::TaskCreated,
        BusinessEventKind::TaskCompleted,
        BusinessEventKind::FileUploaded,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BusinessEventKind::OfferCreated => "offerCreated",
            BusinessEventKind::OfferCompleted => "offerCompleted",
            BusinessEventKind::TaskCreated => "taskCreated",
            BusinessEventKind::TaskCompleted => "taskCompleted",
            BusinessEventKind::FileUploaded => "fileUploaded",
        }
    }
}

macro_rules! text_boundary {
    ($ty:ty) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = MeterError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                <$ty>::ALL
                    .into_iter()
                    .find(|k| k.as_str() == s)
                    .ok_or_else(|| MeterError::UnknownEventKind(s.to_string()))
            }
        }
    };
}

text_boundary!(SecurityEventKind);
text_boundary!(WebSocketEventKind);
text_boundary!(BusinessEventKind);
