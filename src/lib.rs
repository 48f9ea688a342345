//! Session and authentication core for the truvideo SDK.
//!
//! [`TruvideoSdk`] drives the authenticate → init → use → clear lifecycle over a pluggable
//! [`auth::AuthEngine`]. [`auth::LocalAuthEngine`] is the in-process engine used by the CLI
//! and by tests.

pub mod auth;
pub mod callback;
pub mod cli;
pub mod config;
pub mod environment;
pub mod error;
pub mod sdk;
pub mod session;
pub mod telemetry;

pub use auth::{AuthEngine, AuthenticateRequest, Authentication, HmacSignatureProvider, InitOptions, SignatureProvider};
pub use callback::{from_fns, SdkCallback};
pub use config::SdkConfig;
pub use environment::Environment;
pub use error::{SdkError, SdkResult};
pub use sdk::{TruvideoSdk, TruvideoSdkBuilder};
pub use session::{SessionPhase, SessionSnapshot};

// Test-only printing helper: expands to eprintln! in tests and debug builds and is absent otherwise.
// Usage: tprintln!("debug: {}", value);
#[cfg(any(test, debug_assertions))]
#[macro_export]
macro_rules! tprintln {
    ($($arg:tt)*) => ( eprintln!($($arg)*) );
}

// In release builds, provide a no-op tprintln! so calls compile without effect.
#[cfg(not(any(test, debug_assertions)))]
#[macro_export]
macro_rules! tprintln {
    ($($arg:tt)*) => ({
        // Preserve formatting checks in release without producing code
        if false { let _ = format!($($arg)*); }
    });
}
