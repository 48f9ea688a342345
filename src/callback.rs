//! Callback-style variants of the async lifecycle operations.
//!
//! Each `*_with_callback` method schedules the async operation on the runtime captured when
//! the SDK was built and returns at once. Exactly one of `on_complete` / `on_error` runs, on a
//! runtime worker thread, after the operation settles. No handle is returned, so results are
//! only observable through the callback.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::oneshot;

use crate::auth::{AuthenticateRequest, SignatureProvider};
use crate::error::{SdkError, SdkResult};
use crate::sdk::TruvideoSdk;

/// Receives the outcome of a callback-style call. Consumed by whichever method runs.
pub trait SdkCallback<T>: Send + 'static {
    fn on_complete(self, result: T);
    fn on_error(self, error: SdkError);
}

pub struct FnCallback<C, E> {
    on_complete: C,
    on_error: E,
}

/// Build a callback out of two closures.
pub fn from_fns<T, C, E>(on_complete: C, on_error: E) -> FnCallback<C, E>
where
    C: FnOnce(T) + Send + 'static,
    E: FnOnce(SdkError) + Send + 'static,
{
    FnCallback { on_complete, on_error }
}

impl<T, C, E> SdkCallback<T> for FnCallback<C, E>
where
    C: FnOnce(T) + Send + 'static,
    E: FnOnce(SdkError) + Send + 'static,
{
    fn on_complete(self, result: T) { (self.on_complete)(result) }
    fn on_error(self, error: SdkError) { (self.on_error)(error) }
}

// Lets a caller await the outcome of a callback-style call through a channel.
impl<T: Send + 'static> SdkCallback<T> for oneshot::Sender<SdkResult<T>> {
    fn on_complete(self, result: T) { let _ = self.send(Ok(result)); }
    fn on_error(self, error: SdkError) { let _ = self.send(Err(error)); }
}

impl TruvideoSdk {
    pub fn authenticate_with_callback(&self, req: AuthenticateRequest, callback: impl SdkCallback<()>) {
        let sdk = self.clone();
        self.dispatch(async move { sdk.authenticate(req).await }, callback);
    }

    pub fn init_authentication_with_callback(
        &self,
        access_token_ttl: Option<std::time::Duration>,
        refresh_token_ttl: Option<std::time::Duration>,
        callback: impl SdkCallback<()>,
    ) {
        let sdk = self.clone();
        self.dispatch(async move { sdk.init_authentication(access_token_ttl, refresh_token_ttl).await }, callback);
    }

    pub fn clear_authentication_with_callback(&self, callback: impl SdkCallback<()>) {
        let sdk = self.clone();
        self.dispatch(async move { sdk.clear_authentication().await }, callback);
    }

    pub fn handle_authentication_with_callback(
        &self,
        api_key: impl Into<String>,
        external_id: Option<String>,
        signature_provider: Arc<dyn SignatureProvider>,
        callback: impl SdkCallback<()>,
    ) {
        let sdk = self.clone();
        let api_key = api_key.into();
        self.dispatch(
            async move {
                sdk.handle_authentication(&api_key, external_id.as_deref(), signature_provider.as_ref())
                    .await
            },
            callback,
        );
    }

    fn dispatch<T, F, C>(&self, fut: F, callback: C)
    where
        T: Send + 'static,
        F: Future<Output = SdkResult<T>> + Send + 'static,
        C: SdkCallback<T>,
    {
        self.runtime().spawn(async move {
            match fut.await {
                Ok(v) => callback.on_complete(v),
                Err(e) => callback.on_error(e),
            }
        });
    }
}
