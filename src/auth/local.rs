//! In-process authentication engine.
//!
//! Plays the backend's role for a set of registered api keys: hands out one-time payloads,
//! checks HMAC signatures over them, and issues, refreshes and persists credential bundles.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::credentials::{Authentication, CredentialBundle, CredentialStore};
use super::engine::{AuthEngine, AuthenticateRequest, EngineStatus, InitOptions};
use super::payload::PendingPayload;
use super::signature::verify_signature;
use crate::config::SdkConfig;
use crate::error::SdkError;
use crate::tprintln;

#[derive(Debug, Clone)]
pub struct LocalEngineSettings {
    pub payload_ttl: Duration,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
}

impl Default for LocalEngineSettings {
    fn default() -> Self {
        Self {
            payload_ttl: Duration::from_secs(5 * 60),
            access_token_ttl: Duration::from_secs(60 * 60),
            refresh_token_ttl: Duration::from_secs(30 * 24 * 60 * 60),
        }
    }
}

#[derive(Debug, Default)]
struct EngineState {
    pending: Option<PendingPayload>,
    bundle: Option<CredentialBundle>,
    initialized: bool,
}

pub struct LocalAuthEngine {
    settings: LocalEngineSettings,
    api_keys: RwLock<HashMap<String, String>>,
    state: RwLock<EngineState>,
    store: Option<CredentialStore>,
    // Held across every store write or removal together with the state commit that goes with it.
    commit: Mutex<()>,
}

impl LocalAuthEngine {
    /// Memory-only engine; nothing survives the process.
    pub fn new(settings: LocalEngineSettings) -> Self {
        Self {
            settings,
            api_keys: RwLock::new(HashMap::new()),
            state: RwLock::new(EngineState::default()),
            store: None,
            commit: Mutex::new(()),
        }
    }

    /// Engine backed by a credential file. A previously saved bundle is restored
    /// (authenticated, not yet initialized).
    pub fn open(settings: LocalEngineSettings, store: CredentialStore) -> Result<Self> {
        let restored = store.load()?;
        if let Some(b) = restored.as_ref() {
            info!(target: "truvideo::engine", api_key = %b.api_key, path = %store.path().display(), "restored persisted credentials");
        }
        Ok(Self {
            settings,
            api_keys: RwLock::new(HashMap::new()),
            state: RwLock::new(EngineState { pending: None, bundle: restored, initialized: false }),
            store: Some(store),
            commit: Mutex::new(()),
        })
    }

    pub fn from_config(cfg: &SdkConfig) -> Result<Self> {
        let settings = LocalEngineSettings {
            payload_ttl: Duration::from_secs(cfg.engine.payload_ttl_secs),
            access_token_ttl: Duration::from_secs(cfg.engine.access_token_ttl_secs),
            refresh_token_ttl: Duration::from_secs(cfg.engine.refresh_token_ttl_secs),
        };
        let engine = match cfg.credentials_path.as_ref() {
            Some(p) => Self::open(settings, CredentialStore::new(p))?,
            None => Self::new(settings),
        };
        for (key, secret) in cfg.engine.api_keys.iter() {
            engine.register_api_key(key, secret);
        }
        Ok(engine)
    }

    /// Make `api_key` known with its shared secret. Re-registering replaces the secret.
    pub fn register_api_key(&self, api_key: &str, secret: &str) {
        self.api_keys.write().insert(api_key.to_string(), secret.to_string());
    }

    pub fn settings(&self) -> &LocalEngineSettings { &self.settings }

    fn holds_session(&self, session_id: &str) -> bool {
        self.state.read().bundle.as_ref().map(|b| b.session_id.as_str()) == Some(session_id)
    }

    async fn persist(&self, bundle: &CredentialBundle) -> Result<()> {
        if let Some(store) = self.store.as_ref() {
            store.save(bundle).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl AuthEngine for LocalAuthEngine {
    fn generate_payload(&self) -> Result<String> {
        let payload = PendingPayload::generate()?;
        let value = payload.value.clone();
        self.state.write().pending = Some(payload);
        debug!(target: "truvideo::engine", "payload issued");
        Ok(value)
    }

    async fn authenticate(&self, req: &AuthenticateRequest) -> Result<()> {
        // Only the latest payload is acceptable, and only once.
        let pending = {
            let mut st = self.state.write();
            match st.pending.take() {
                Some(p) if p.matches(&req.payload) => p,
                other => {
                    st.pending = other;
                    bail!(SdkError::engine("invalid_payload", "payload was not issued by the latest generate_payload call"));
                }
            }
        };
        if pending.is_expired(self.settings.payload_ttl) {
            bail!(SdkError::engine("payload_expired", "payload is older than the allowed signing window"));
        }
        let secret = match self.api_keys.read().get(&req.api_key) {
            Some(s) => s.clone(),
            None => bail!(SdkError::engine("unknown_api_key".to_string(), format!("api key '{}' is not registered", req.api_key))),
        };
        if !verify_signature(secret.as_bytes(), &req.payload, &req.signature) {
            warn!(target: "truvideo::engine", api_key = %req.api_key, "signature rejected");
            bail!(SdkError::engine("invalid_signature", "signature does not match payload"));
        }

        let bundle = CredentialBundle::issue(
            &req.api_key,
            req.external_id.clone(),
            req.access_token_ttl.unwrap_or(self.settings.access_token_ttl),
            req.refresh_token_ttl.unwrap_or(self.settings.refresh_token_ttl),
        )?;
        let _commit = self.commit.lock().await;
        self.persist(&bundle).await?;
        tprintln!("engine.authenticate api_key={} sid={}", bundle.api_key, bundle.session_id);
        {
            let mut st = self.state.write();
            st.bundle = Some(bundle);
            st.initialized = false;
        }
        Ok(())
    }

    async fn init(&self, opts: &InitOptions) -> Result<()> {
        let current = self.state.read().bundle.clone();
        let Some(mut bundle) = current else {
            bail!(SdkError::authentication_required("no credentials; authenticate first"));
        };
        if bundle.is_refresh_expired() {
            bail!(SdkError::engine("authentication_expired", "refresh token expired; authenticate again"));
        }

        let needs_refresh = opts.force_refresh
            || bundle.is_access_expired()
            || opts.access_token_ttl.is_some()
            || opts.refresh_token_ttl.is_some();
        if needs_refresh {
            bundle.refresh(opts.access_token_ttl.unwrap_or(self.settings.access_token_ttl), opts.refresh_token_ttl)?;
        }

        let _commit = self.commit.lock().await;
        // A clear or re-authenticate that landed before we got here wins; nothing is written.
        if !self.holds_session(&bundle.session_id) {
            bail!(SdkError::engine("session_changed", "credentials changed during init"));
        }
        if needs_refresh {
            self.persist(&bundle).await?;
        }
        tprintln!("engine.init sid={} refreshed={}", bundle.session_id, needs_refresh);
        let mut st = self.state.write();
        st.bundle = Some(bundle);
        st.initialized = true;
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let _commit = self.commit.lock().await;
        {
            let mut st = self.state.write();
            st.pending = None;
            st.bundle = None;
            st.initialized = false;
        }
        if let Some(store) = self.store.as_ref() {
            store.remove().await?;
        }
        tprintln!("engine.clear");
        Ok(())
    }

    fn status(&self) -> EngineStatus {
        let st = self.state.read();
        match st.bundle.as_ref() {
            Some(b) => EngineStatus {
                is_authenticated: true,
                is_authentication_expired: b.is_refresh_expired(),
                is_initialized: st.initialized,
                api_key: b.api_key.clone(),
            },
            None => EngineStatus::default(),
        }
    }

    fn authentication(&self) -> Option<Authentication> {
        self.state.read().bundle.as_ref().map(CredentialBundle::view)
    }
}
