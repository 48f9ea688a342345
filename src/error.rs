//! Unified SDK error model.
//! Every failure that crosses the `TruvideoSdk` boundary is one of these variants, whether it
//! came from a caller precondition, the session state, or the authentication engine.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SdkError {
    AuthenticationRequired { code: String, message: String },
    NotInitialized { code: String, message: String },
    Engine { code: String, message: String },
    InvalidInput { code: String, message: String },
}

impl SdkError {
    pub fn code_str(&self) -> &str {
        match self {
            SdkError::AuthenticationRequired { code, .. }
            | SdkError::NotInitialized { code, .. }
            | SdkError::Engine { code, .. }
            | SdkError::InvalidInput { code, .. } => code.as_str(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            SdkError::AuthenticationRequired { message, .. }
            | SdkError::NotInitialized { message, .. }
            | SdkError::Engine { message, .. }
            | SdkError::InvalidInput { message, .. } => message.as_str(),
        }
    }

    pub fn authentication_required<S: Into<String>>(msg: S) -> Self {
        SdkError::AuthenticationRequired { code: "authentication_required".into(), message: msg.into() }
    }
    pub fn not_initialized<S: Into<String>>(msg: S) -> Self {
        SdkError::NotInitialized { code: "not_initialized".into(), message: msg.into() }
    }
    pub fn engine<S: Into<String>>(code: S, msg: S) -> Self { SdkError::Engine { code: code.into(), message: msg.into() } }
    pub fn invalid_input<S: Into<String>>(code: S, msg: S) -> Self { SdkError::InvalidInput { code: code.into(), message: msg.into() } }

    /// True for the two state-ordering failures (called too early in the lifecycle).
    pub fn is_lifecycle(&self) -> bool {
        matches!(self, SdkError::AuthenticationRequired { .. } | SdkError::NotInitialized { .. })
    }
}

impl Display for SdkError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code_str(), self.message())
    }
}

impl std::error::Error for SdkError {}

pub type SdkResult<T> = Result<T, SdkError>;

impl From<anyhow::Error> for SdkError {
    fn from(err: anyhow::Error) -> Self {
        // Errors the engine raised as SdkError pass through untouched, context layers included.
        match err.downcast::<SdkError>() {
            Ok(sdk) => sdk,
            Err(other) => {
                let message = other.to_string();
                let message = if message.trim().is_empty() { "Unknown error".to_string() } else { message };
                SdkError::Engine { code: "engine_error".into(), message }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn codes_and_messages() {
        let e = SdkError::authentication_required("authenticate first");
        assert_eq!(e.code_str(), "authentication_required");
        assert_eq!(e.message(), "authenticate first");
        assert_eq!(e.to_string(), "authentication_required: authenticate first");

        let e = SdkError::not_initialized("init first");
        assert_eq!(e.code_str(), "not_initialized");
        assert!(e.is_lifecycle());

        let e = SdkError::engine("invalid_signature", "bad");
        assert_eq!(e.code_str(), "invalid_signature");
        assert!(!e.is_lifecycle());
    }

    #[test]
    fn anyhow_sdk_error_passes_through() {
        let original = SdkError::engine("unknown_api_key", "no such key");
        let wrapped: anyhow::Error = original.clone().into();
        assert_eq!(SdkError::from(wrapped), original);
    }

    #[test]
    fn generic_failure_becomes_engine_error() {
        let e = SdkError::from(anyhow!("connection reset"));
        match e {
            SdkError::Engine { code, message } => {
                assert_eq!(code, "engine_error");
                assert_eq!(message, "connection reset");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn empty_message_gets_placeholder() {
        let e = SdkError::from(anyhow!(""));
        assert_eq!(e.message(), "Unknown error");
    }

    #[test]
    fn serde_tagging() {
        let e = SdkError::not_initialized("x");
        let v = serde_json::to_value(&e).unwrap();
        assert_eq!(v["type"], "not_initialized");
        assert_eq!(v["code"], "not_initialized");
    }
}
