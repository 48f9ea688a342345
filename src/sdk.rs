//! Session facade over an [`AuthEngine`].
//!
//! [`TruvideoSdk`] is the single entry point a host application uses to drive the
//! authenticate → init → use → clear lifecycle.
//!
//! The facade checks call ordering and caller preconditions before touching the engine,
//! mirrors each engine outcome into [`SessionState`], and classifies every failure into
//! [`SdkError`] (SDK errors pass through, the rest become `Engine`). Nothing is retried here.
//! Lifecycle events go to the [`LogAdapter`] on a best-effort basis.
//!
//! Instances are built and injected; [`install`]/[`shared`] exist only for hosts that
//! need one process-wide handle.

use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;
use tokio::runtime::Handle;
use tracing::{debug, error, info};

use crate::auth::{AuthEngine, Authentication, AuthenticateRequest, EngineStatus, InitOptions, LocalAuthEngine, SignatureProvider};
use crate::config::SdkConfig;
use crate::environment::Environment;
use crate::error::{SdkError, SdkResult};
use crate::session::{SessionPhase, SessionSnapshot, SessionState};
use crate::telemetry::{guarded, LogAdapter, LogSeverity, NoopLogAdapter, TracingLogAdapter, VersionAdapter};

/// Version of this module as reported to the version adapter.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

const MODULE_NAME: &str = "core";

#[derive(Clone)]
pub struct TruvideoSdk {
    inner: Arc<Inner>,
}

struct Inner {
    engine: Arc<dyn AuthEngine>,
    state: SessionState,
    log: Arc<dyn LogAdapter>,
    runtime: Handle,
}

#[derive(Default)]
pub struct TruvideoSdkBuilder {
    engine: Option<Arc<dyn AuthEngine>>,
    log: Option<Arc<dyn LogAdapter>>,
    version: Option<Arc<dyn VersionAdapter>>,
    environment: Option<Environment>,
    runtime: Option<Handle>,
}

impl TruvideoSdkBuilder {
    pub fn engine(mut self, engine: Arc<dyn AuthEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn log_adapter(mut self, log: Arc<dyn LogAdapter>) -> Self {
        self.log = Some(log);
        self
    }

    pub fn version_adapter(mut self, version: Arc<dyn VersionAdapter>) -> Self {
        self.version = Some(version);
        self
    }

    pub fn environment(mut self, environment: Environment) -> Self {
        self.environment = Some(environment);
        self
    }

    /// Runtime the callback variants spawn onto. Defaults to the runtime `build` runs in.
    pub fn runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    pub fn build(self) -> SdkResult<TruvideoSdk> {
        let engine = self
            .engine
            .ok_or_else(|| SdkError::invalid_input("missing_engine", "an authentication engine is required"))?;
        let runtime = match self.runtime {
            Some(h) => h,
            None => Handle::try_current()
                .map_err(|_| SdkError::invalid_input("no_runtime", "build inside a tokio runtime or pass one explicitly"))?,
        };
        let environment = self.environment.unwrap_or_else(Environment::from_build);
        let log = self.log.unwrap_or_else(|| Arc::new(NoopLogAdapter));

        let state = SessionState::new(environment);
        // Credentials the engine restored from storage count as authenticated, never as initialized.
        state.apply(&EngineStatus { is_initialized: false, ..engine.status() });

        if let Some(version) = self.version.as_ref() {
            guarded(|| version.register(MODULE_NAME, VERSION));
        }
        info!(target: "truvideo::sdk", environment = %environment, version = VERSION, restored = state.is_authenticated(), "sdk ready");

        Ok(TruvideoSdk { inner: Arc::new(Inner { engine, state, log, runtime }) })
    }
}

impl TruvideoSdk {
    pub fn builder() -> TruvideoSdkBuilder { TruvideoSdkBuilder::default() }

    /// Local engine plus tracing-backed telemetry, all driven by `cfg`.
    pub fn from_config(cfg: &SdkConfig) -> SdkResult<Self> {
        let engine = LocalAuthEngine::from_config(cfg)?;
        let telemetry = Arc::new(TracingLogAdapter::from_config(&cfg.log));
        Self::builder()
            .engine(Arc::new(engine))
            .log_adapter(telemetry.clone())
            .version_adapter(telemetry)
            .environment(cfg.resolved_environment())
            .build()
    }

    // ------------------------------------------------------------------
    // Status reads
    // ------------------------------------------------------------------

    pub fn is_authenticated(&self) -> bool { self.inner.state.is_authenticated() }

    /// Asks the engine whether the credentials have lapsed. Noticing expiry here is what
    /// moves a `Ready` session back to `AuthenticatedUninitialized`.
    pub fn is_authentication_expired(&self) -> bool {
        let state = &self.inner.state;
        if !state.is_authenticated() { return false; }
        let expired = self.inner.engine.status().is_authentication_expired;
        if expired && !state.is_expired() {
            info!(target: "truvideo::sdk", api_key = %state.api_key(), "authentication expired");
            state.mark_expired();
        }
        expired
    }

    pub fn is_initialized(&self) -> bool { self.inner.state.is_initialized() }

    /// Empty when not authenticated.
    pub fn api_key(&self) -> String { self.inner.state.api_key() }

    pub fn phase(&self) -> SessionPhase { self.inner.state.phase() }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.is_authentication_expired();
        self.inner.state.snapshot()
    }

    pub fn environment(&self) -> Environment { self.inner.state.environment() }

    pub fn version(&self) -> &'static str { VERSION }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    pub fn generate_payload(&self) -> SdkResult<String> {
        self.inner.engine.generate_payload().map_err(|e| self.fail("generate_payload", e.into()))
    }

    pub async fn authenticate(&self, req: AuthenticateRequest) -> SdkResult<()> {
        if req.api_key.trim().is_empty() {
            return Err(self.fail("authenticate", SdkError::invalid_input("empty_api_key", "api key must not be empty")));
        }
        // Raw values go to the sink; redaction is the sink's job.
        self.emit(
            "event_auth_authenticate",
            &format!(
                "api_key={} external_id={} payload={} signature={}",
                req.api_key,
                req.external_id.as_deref().unwrap_or(""),
                req.payload,
                req.signature
            ),
            LogSeverity::Info,
        );

        if let Err(e) = self.inner.engine.authenticate(&req).await {
            return Err(self.fail("authenticate", e.into()));
        }
        self.inner.state.apply(&EngineStatus { is_initialized: false, ..self.inner.engine.status() });
        info!(target: "truvideo::sdk", api_key = %req.api_key, "authenticated");
        Ok(())
    }

    pub async fn init_authentication(
        &self,
        access_token_ttl: Option<Duration>,
        refresh_token_ttl: Option<Duration>,
    ) -> SdkResult<()> {
        self.init_authentication_with(InitOptions::with_ttls(access_token_ttl, refresh_token_ttl)).await
    }

    pub async fn init_authentication_with(&self, opts: InitOptions) -> SdkResult<()> {
        // Ask the engine, not the mirror: it may hold credentials restored from storage.
        if !self.inner.engine.status().is_authenticated {
            return Err(self.fail("init", SdkError::authentication_required("authenticate before initializing")));
        }
        self.emit("event_auth_init", &format!("force_refresh={}", opts.force_refresh), LogSeverity::Info);

        if let Err(e) = self.inner.engine.init(&opts).await {
            return Err(self.fail("init", e.into()));
        }
        self.inner.state.apply(&EngineStatus { is_initialized: true, ..self.inner.engine.status() });
        info!(target: "truvideo::sdk", api_key = %self.api_key(), "authentication initialized");
        Ok(())
    }

    /// Always leaves the session unauthenticated, even when the engine fails to clear;
    /// that failure is still returned.
    pub async fn clear_authentication(&self) -> SdkResult<()> {
        self.emit("event_auth_clear", "clear", LogSeverity::Info);
        let result = self.inner.engine.clear().await;
        self.inner.state.reset();
        match result {
            Ok(()) => {
                info!(target: "truvideo::sdk", "authentication cleared");
                Ok(())
            }
            Err(e) => Err(self.fail("clear", e.into())),
        }
    }

    /// Authenticate only when needed, then init.
    ///
    /// When the session is authenticated and not expired the payload, signature and
    /// authenticate steps are skipped and the provider is never called.
    pub async fn handle_authentication(
        &self,
        api_key: &str,
        external_id: Option<&str>,
        signature_provider: &dyn SignatureProvider,
    ) -> SdkResult<()> {
        if !self.is_authenticated() || self.is_authentication_expired() {
            let payload = self.generate_payload()?;
            let signature = signature_provider.generate_signature(&payload);
            let req = AuthenticateRequest::new(api_key, payload, signature).external_id(external_id);
            self.authenticate(req).await?;
        } else {
            debug!(target: "truvideo::sdk", "session still valid; skipping authenticate");
        }
        self.init_authentication(None, None).await
    }

    /// Live credentials for modules that call the backend.
    pub fn authentication(&self) -> SdkResult<Authentication> {
        self.is_authentication_expired();
        if !self.is_authenticated() {
            return Err(SdkError::authentication_required("not authenticated"));
        }
        if !self.is_initialized() {
            return Err(SdkError::not_initialized("authentication not initialized"));
        }
        self.inner
            .engine
            .authentication()
            .ok_or_else(|| SdkError::authentication_required("engine holds no credentials"))
    }

    pub(crate) fn runtime(&self) -> &Handle { &self.inner.runtime }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn emit(&self, event: &str, message: &str, severity: LogSeverity) {
        let log = &self.inner.log;
        guarded(|| log.add_log(event, message, severity));
    }

    fn fail(&self, op: &str, err: SdkError) -> SdkError {
        error!(target: "truvideo::sdk", op = op, code = err.code_str(), "{}", err.message());
        self.emit(&format!("event_auth_{}_failed", op), &err.to_string(), LogSeverity::Error);
        err
    }
}

impl std::fmt::Debug for TruvideoSdk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TruvideoSdk")
            .field("phase", &self.phase())
            .field("environment", &self.environment())
            .finish_non_exhaustive()
    }
}

static SHARED: OnceCell<TruvideoSdk> = OnceCell::new();

/// Install the process-wide instance. Only the first call succeeds.
pub fn install(sdk: TruvideoSdk) -> SdkResult<()> {
    SHARED
        .set(sdk)
        .map_err(|_| SdkError::invalid_input("already_installed", "a shared sdk instance is already installed"))
}

pub fn shared() -> SdkResult<&'static TruvideoSdk> {
    SHARED
        .get()
        .ok_or_else(|| SdkError::invalid_input("not_installed", "no shared sdk instance installed"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{HmacSignatureProvider, LocalEngineSettings};

    fn local_sdk() -> TruvideoSdk {
        let engine = LocalAuthEngine::new(LocalEngineSettings::default());
        engine.register_api_key("KEY1", "secret-1");
        TruvideoSdk::builder().engine(Arc::new(engine)).environment(Environment::Dev).build().unwrap()
    }

    #[test]
    fn build_requires_engine() {
        let err = TruvideoSdk::builder().build().unwrap_err();
        assert_eq!(err.code_str(), "missing_engine");
    }

    #[test]
    fn build_outside_runtime_needs_handle() {
        let engine = LocalAuthEngine::new(LocalEngineSettings::default());
        let err = TruvideoSdk::builder().engine(Arc::new(engine)).build().unwrap_err();
        assert_eq!(err.code_str(), "no_runtime");
    }

    #[tokio::test]
    async fn empty_api_key_is_invalid_input() {
        let sdk = local_sdk();
        let err = sdk.authenticate(AuthenticateRequest::new("  ", "p", "s")).await.unwrap_err();
        assert!(matches!(err, SdkError::InvalidInput { .. }));
        assert_eq!(sdk.phase(), SessionPhase::Unauthenticated);
    }

    #[tokio::test]
    async fn full_lifecycle_with_local_engine() {
        let sdk = local_sdk();
        assert_eq!(sdk.environment(), Environment::Dev);
        assert_eq!(sdk.version(), VERSION);

        let provider = HmacSignatureProvider::new("secret-1");
        sdk.handle_authentication("KEY1", Some("user-1"), &provider).await.unwrap();
        assert_eq!(sdk.phase(), SessionPhase::Ready);
        assert_eq!(sdk.api_key(), "KEY1");
        let auth = sdk.authentication().unwrap();
        assert_eq!(auth.external_id.as_deref(), Some("user-1"));

        sdk.clear_authentication().await.unwrap();
        assert!(!sdk.is_authenticated());
        assert_eq!(sdk.api_key(), "");
        assert!(matches!(sdk.authentication(), Err(SdkError::AuthenticationRequired { .. })));
    }

    #[tokio::test]
    async fn authentication_before_init_is_not_initialized() {
        let sdk = local_sdk();
        let payload = sdk.generate_payload().unwrap();
        let sig = HmacSignatureProvider::new("secret-1").generate_signature(&payload);
        sdk.authenticate(AuthenticateRequest::new("KEY1", payload, sig)).await.unwrap();
        assert!(matches!(sdk.authentication(), Err(SdkError::NotInitialized { .. })));
    }

    #[tokio::test]
    async fn shared_instance_is_set_once() {
        assert_eq!(shared().unwrap_err().code_str(), "not_installed");
        install(local_sdk()).unwrap();
        assert_eq!(shared().unwrap().environment(), Environment::Dev);
        assert_eq!(install(local_sdk()).unwrap_err().code_str(), "already_installed");
    }

    #[tokio::test]
    async fn debug_shows_phase() {
        let sdk = local_sdk();
        assert!(format!("{:?}", sdk).contains("Unauthenticated"));
    }
}
