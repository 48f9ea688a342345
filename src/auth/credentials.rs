//! Credential bundle issued by the authentication engine, and its on-disk store.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialBundle {
    pub session_id: String,
    pub api_key: String,
    pub access_token: String,
    pub refresh_token: String,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    pub issued_at: DateTime<Utc>,
}

/// Read-only view of the live credentials handed to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authentication {
    pub api_key: String,
    pub access_token: String,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
}

impl CredentialBundle {
    pub fn issue(api_key: &str, external_id: Option<String>, access_ttl: Duration, refresh_ttl: Duration) -> Result<Self> {
        let now = Utc::now();
        Ok(Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            api_key: api_key.to_string(),
            access_token: gen_token()?,
            refresh_token: gen_token()?,
            access_expires_at: expiry(now, access_ttl),
            refresh_expires_at: expiry(now, refresh_ttl),
            external_id,
            issued_at: now,
        })
    }

    pub fn is_access_expired(&self) -> bool { self.access_expires_at <= Utc::now() }

    pub fn is_refresh_expired(&self) -> bool { self.refresh_expires_at <= Utc::now() }

    /// New access token; the refresh token rotates only when a refresh TTL is supplied.
    pub fn refresh(&mut self, access_ttl: Duration, refresh_ttl: Option<Duration>) -> Result<()> {
        let now = Utc::now();
        let access_token = gen_token()?;
        let refresh_token = match refresh_ttl {
            Some(_) => Some(gen_token()?),
            None => None,
        };
        self.access_token = access_token;
        self.access_expires_at = expiry(now, access_ttl);
        if let (Some(ttl), Some(token)) = (refresh_ttl, refresh_token) {
            self.refresh_token = token;
            self.refresh_expires_at = expiry(now, ttl);
        }
        Ok(())
    }

    pub fn view(&self) -> Authentication {
        Authentication {
            api_key: self.api_key.clone(),
            access_token: self.access_token.clone(),
            access_expires_at: self.access_expires_at,
            refresh_expires_at: self.refresh_expires_at,
            external_id: self.external_id.clone(),
        }
    }
}

// Out-of-range TTLs saturate instead of overflowing.
fn expiry(now: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(ttl)
        .ok()
        .and_then(|d| now.checked_add_signed(d))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

pub(crate) fn gen_token() -> Result<String> {
    let mut buf = [0u8; 32];
    getrandom::getrandom(&mut buf).map_err(|e| anyhow!("token generation: {}", e))?;
    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(buf))
}

/// JSON file holding at most one credential bundle.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self { Self { path: path.into() } }

    pub fn path(&self) -> &Path { &self.path }

    /// Returns `None` when nothing has been saved yet.
    pub fn load(&self) -> Result<Option<CredentialBundle>> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(anyhow::Error::new(e).context(format!("reading credentials: {}", self.path.display())));
            }
        };
        let bundle: CredentialBundle = serde_json::from_str(&contents)
            .with_context(|| format!("parsing credentials: {}", self.path.display()))?;
        Ok(Some(bundle))
    }

    /// Write with owner-only permissions on unix.
    pub async fn save(&self, bundle: &CredentialBundle) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("creating directory: {}", parent.display()))?;
            }
        }
        let contents = serde_json::to_vec_pretty(bundle)?;
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, &contents)
            .await
            .with_context(|| format!("writing credentials: {}", tmp.display()))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&tmp, std::fs::Permissions::from_mode(0o600))
                .await
                .with_context(|| format!("restricting credentials: {}", tmp.display()))?;
        }
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("replacing credentials: {}", self.path.display()))?;
        Ok(())
    }

    pub async fn remove(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(anyhow::Error::new(e).context(format!("removing credentials: {}", self.path.display()))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_random_and_url_safe() {
        let a = gen_token().unwrap();
        let b = gen_token().unwrap();
        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert!(!a.is_empty());
    }

    #[test]
    fn zero_ttl_is_expired_immediately() {
        let b = CredentialBundle::issue("KEY1", None, Duration::ZERO, Duration::ZERO).unwrap();
        assert!(b.is_access_expired());
        assert!(b.is_refresh_expired());
    }

    #[test]
    fn refresh_rotates_access_and_optionally_refresh() {
        let mut b = CredentialBundle::issue("KEY1", Some("ext".into()), Duration::ZERO, Duration::from_secs(60)).unwrap();
        let (old_access, old_refresh) = (b.access_token.clone(), b.refresh_token.clone());
        b.refresh(Duration::from_secs(60), None).unwrap();
        assert_ne!(b.access_token, old_access);
        assert_eq!(b.refresh_token, old_refresh);
        assert!(!b.is_access_expired());

        b.refresh(Duration::from_secs(60), Some(Duration::from_secs(120))).unwrap();
        assert_ne!(b.refresh_token, old_refresh);
    }

    #[test]
    fn view_omits_refresh_token() {
        let b = CredentialBundle::issue("KEY1", Some("ext".into()), Duration::from_secs(5), Duration::from_secs(10)).unwrap();
        let v = serde_json::to_value(b.view()).unwrap();
        assert!(v.get("refresh_token").is_none());
        assert_eq!(v["api_key"], "KEY1");
        assert_eq!(v["external_id"], "ext");
    }

    #[test]
    fn load_nonexistent_file_returns_none() {
        let store = CredentialStore::new("/tmp/nonexistent-truvideo-credentials.json");
        assert!(store.load().unwrap().is_none());
    }

    #[tokio::test]
    async fn save_load_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("nested").join("auth.json"));
        let b = CredentialBundle::issue("KEY1", None, Duration::from_secs(60), Duration::from_secs(600)).unwrap();
        store.save(&b).await.unwrap();
        assert_eq!(store.load().unwrap(), Some(b));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }

        store.remove().await.unwrap();
        assert!(store.load().unwrap().is_none());
        // second remove is fine
        store.remove().await.unwrap();
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("auth.json");
        std::fs::write(&p, "garbage").unwrap();
        assert!(CredentialStore::new(&p).load().is_err());
    }
}
