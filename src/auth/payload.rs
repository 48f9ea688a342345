use std::time::Duration;

use anyhow::{anyhow, Result};
use base64::Engine;
use chrono::{DateTime, Utc};

/// Challenge handed out by the local engine and waiting to be signed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingPayload {
    pub value: String,
    pub issued_at: DateTime<Utc>,
}

impl PendingPayload {
    /// `<base64url nonce>.<issued unix millis>`
    pub fn generate() -> Result<Self> {
        let mut nonce = [0u8; 32];
        getrandom::getrandom(&mut nonce).map_err(|e| anyhow!("payload nonce: {}", e))?;
        let issued_at = Utc::now();
        let value = format!(
            "{}.{}",
            base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(nonce),
            issued_at.timestamp_millis()
        );
        Ok(Self { value, issued_at })
    }

    pub fn is_expired(&self, ttl: Duration) -> bool {
        match chrono::Duration::from_std(ttl) {
            Ok(ttl) => self.issued_at + ttl < Utc::now(),
            Err(_) => false,
        }
    }

    pub fn matches(&self, presented: &str) -> bool { self.value == presented }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payloads_are_unique_and_carry_issue_time() {
        let a = PendingPayload::generate().unwrap();
        let b = PendingPayload::generate().unwrap();
        assert_ne!(a.value, b.value);
        let (nonce, millis) = a.value.split_once('.').unwrap();
        assert_eq!(nonce.len(), 43);
        assert_eq!(millis.parse::<i64>().unwrap(), a.issued_at.timestamp_millis());
    }

    #[test]
    fn expiry_uses_ttl() {
        let mut p = PendingPayload::generate().unwrap();
        assert!(!p.is_expired(Duration::from_secs(300)));
        p.issued_at -= chrono::Duration::seconds(301);
        assert!(p.is_expired(Duration::from_secs(300)));
    }

    #[test]
    fn matches_exact_value_only() {
        let p = PendingPayload::generate().unwrap();
        assert!(p.matches(&p.value.clone()));
        assert!(!p.matches("something-else"));
    }
}
