//! Frame — the JSON envelope every websocket message travels in.
//!
//! DESIGN
//! ======
//! A frame is `{ "event": <name>, "data": <payload> }`. The event names and
//! payload shapes are the compatibility surface with existing clients, so the
//! envelope stays deliberately thin: `data` is an untyped JSON value and each
//! handler decodes the payload type it expects via [`Frame::payload`].
//! A payload that fails to decode is an error for that one frame only.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

// =============================================================================
// ERROR CODES
// =============================================================================

/// Grepable error code and retryable flag for structured error logging.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("invalid json: {0}")]
    Json(#[source] serde_json::Error),
    #[error("invalid payload for {event}: {source}")]
    Payload {
        event: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ErrorCode for FrameError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Json(_) => "E_FRAME_JSON",
            Self::Payload { .. } => "E_FRAME_PAYLOAD",
        }
    }
}

// =============================================================================
// FRAME
// =============================================================================

/// The universal message type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub event: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub data: Value,
}

impl Frame {
    /// Frame carrying an already-built JSON payload.
    pub fn new(event: impl Into<String>, data: impl Into<Value>) -> Self {
        Self { event: event.into(), data: data.into() }
    }

    /// Frame without a payload (`join_pending`, `clear_board`, ...).
    pub fn empty(event: impl Into<String>) -> Self {
        Self { event: event.into(), data: Value::Null }
    }

    /// Frame whose payload is serialized from a typed value. A payload that
    /// cannot be represented as JSON is logged and sent as `null`.
    pub fn with_payload<T: Serialize + ?Sized>(event: impl Into<String>, payload: &T) -> Self {
        let event = event.into();
        let data = match serde_json::to_value(payload) {
            Ok(data) => data,
            Err(e) => {
                warn!(%event, error = %e, "frame: failed to serialize payload");
                Value::Null
            }
        };
        Self { event, data }
    }

    /// Parse an inbound text message.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::Json`] if the text is not a frame object.
    pub fn parse(text: &str) -> Result<Self, FrameError> {
        serde_json::from_str(text).map_err(FrameError::Json)
    }

    /// Serialize for the wire.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::Json`] if serialization fails.
    pub fn to_json(&self) -> Result<String, FrameError> {
        serde_json::to_string(self).map_err(FrameError::Json)
    }

    /// Decode the payload as `T`.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::Payload`] if `data` does not match `T`.
    pub fn payload<T: DeserializeOwned>(&self) -> Result<T, FrameError> {
        T::deserialize(&self.data).map_err(|source| FrameError::Payload { event: self.event.clone(), source })
    }
}

// =============================================================================
// TESTS
// =============================================================================
