use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Host-supplied signer for authentication payloads.
/// The SDK never sees the secret behind it.
pub trait SignatureProvider: Send + Sync {
    fn generate_signature(&self, payload: &str) -> String;
}

impl<F> SignatureProvider for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn generate_signature(&self, payload: &str) -> String { self(payload) }
}

/// HMAC-SHA256 signer keyed by a shared secret, hex output.
#[derive(Clone)]
pub struct HmacSignatureProvider {
    secret: Vec<u8>,
}

impl HmacSignatureProvider {
    pub fn new(secret: impl AsRef<[u8]>) -> Self { Self { secret: secret.as_ref().to_vec() } }
}

impl std::fmt::Debug for HmacSignatureProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HmacSignatureProvider").field("secret", &"<redacted>").finish()
    }
}

impl SignatureProvider for HmacSignatureProvider {
    fn generate_signature(&self, payload: &str) -> String {
        sign_payload(&self.secret, payload)
    }
}

/// Lowercase hex HMAC-SHA256 of `payload` under `secret`.
pub fn sign_payload(secret: &[u8], payload: &str) -> String {
    // HMAC accepts keys of any length
    let mut mac = HmacSha256::new_from_slice(secret).expect("hmac key of any size");
    mac.update(payload.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Constant-time check of a hex signature. Case-insensitive; malformed hex is simply invalid.
pub fn verify_signature(secret: &[u8], payload: &str, signature_hex: &str) -> bool {
    let Ok(raw) = hex::decode(signature_hex.trim()) else { return false; };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else { return false; };
    mac.update(payload.as_bytes());
    mac.verify_slice(&raw).is_ok()
}
