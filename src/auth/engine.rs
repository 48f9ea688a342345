use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::credentials::Authentication;

/// Inputs to a single authenticate attempt.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AuthenticateRequest {
    pub api_key: String,
    pub payload: String,
    pub signature: String,
    pub external_id: Option<String>,
    pub access_token_ttl: Option<Duration>,
    pub refresh_token_ttl: Option<Duration>,
}

impl AuthenticateRequest {
    pub fn new(api_key: impl Into<String>, payload: impl Into<String>, signature: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            payload: payload.into(),
            signature: signature.into(),
            ..Default::default()
        }
    }

    pub fn external_id(mut self, external_id: Option<impl Into<String>>) -> Self {
        self.external_id = external_id.map(Into::into).filter(|s: &String| !s.trim().is_empty());
        self
    }

    pub fn access_token_ttl(mut self, ttl: Duration) -> Self {
        self.access_token_ttl = Some(ttl);
        self
    }

    pub fn refresh_token_ttl(mut self, ttl: Duration) -> Self {
        self.refresh_token_ttl = Some(ttl);
        self
    }
}

// Payload and signature stay out of Debug output.
impl std::fmt::Debug for AuthenticateRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticateRequest")
            .field("api_key", &self.api_key)
            .field("external_id", &self.external_id)
            .field("access_token_ttl", &self.access_token_ttl)
            .field("refresh_token_ttl", &self.refresh_token_ttl)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InitOptions {
    pub force_refresh: bool,
    pub access_token_ttl: Option<Duration>,
    pub refresh_token_ttl: Option<Duration>,
}

impl InitOptions {
    pub fn with_ttls(access_token_ttl: Option<Duration>, refresh_token_ttl: Option<Duration>) -> Self {
        Self { force_refresh: false, access_token_ttl, refresh_token_ttl }
    }
}

/// Point-in-time status an engine reports. Reading it must not block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStatus {
    pub is_authenticated: bool,
    pub is_authentication_expired: bool,
    pub is_initialized: bool,
    pub api_key: String,
}

/// Authentication engine contract consumed by the SDK facade.
///
/// Implementations report well-known rejections by returning an [`crate::error::SdkError`]
/// inside the `anyhow::Error`; anything else is treated as a generic engine failure.
#[async_trait]
pub trait AuthEngine: Send + Sync {
    /// Fresh one-time challenge. Invalidates any earlier payload.
    fn generate_payload(&self) -> Result<String>;

    async fn authenticate(&self, req: &AuthenticateRequest) -> Result<()>;

    async fn init(&self, opts: &InitOptions) -> Result<()>;

    async fn clear(&self) -> Result<()>;

    fn status(&self) -> EngineStatus;

    fn authentication(&self) -> Option<Authentication>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_external_id_is_dropped() {
        let r = AuthenticateRequest::new("K", "p", "s").external_id(Some("  "));
        assert!(r.external_id.is_none());
        let r = AuthenticateRequest::new("K", "p", "s").external_id(Some("user-7"));
        assert_eq!(r.external_id.as_deref(), Some("user-7"));
        let r = AuthenticateRequest::new("K", "p", "s").external_id(None::<String>);
        assert!(r.external_id.is_none());
    }

    #[test]
    fn debug_hides_payload_and_signature() {
        let r = AuthenticateRequest::new("K", "the-payload", "the-signature");
        let s = format!("{:?}", r);
        assert!(s.contains("K"));
        assert!(!s.contains("the-payload"));
        assert!(!s.contains("the-signature"));
    }
}
