//! Authentication primitives behind the SDK facade.
//! Keep the public surface thin and split implementation across sub-modules.

mod credentials;
mod engine;
mod local;
mod payload;
mod signature;

pub use credentials::{Authentication, CredentialBundle, CredentialStore};
pub use engine::{AuthEngine, AuthenticateRequest, EngineStatus, InitOptions};
pub use local::{LocalAuthEngine, LocalEngineSettings};
pub use payload::PendingPayload;
pub use signature::{sign_payload, verify_signature, HmacSignatureProvider, SignatureProvider};
