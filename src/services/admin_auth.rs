// src/services/admin_auth.rs
use crate::models::admin::AdminIdentity;
use crate::store::{Store, StoreError};
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use thiserror::Error;

pub const SESSION_LIFETIME_HOURS: i64 = 24;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// SHA-256 hex digest; the only form in which session tokens are persisted.
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// 32 random bytes, hex encoded.
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

pub struct AdminAuth {
    store: Arc<dyn Store>,
    hash_cost: u32,
}

impl AdminAuth {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self::with_hash_cost(store, bcrypt::DEFAULT_COST)
    }

    pub fn with_hash_cost(store: Arc<dyn Store>, hash_cost: u32) -> Self {
        Self { store, hash_cost }
    }

    /// Check credentials and open a session. On success the returned token
    /// replaces whatever token the account held before.
    pub async fn verify_admin(
        &self,
        username: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<String>, AuthError> {
        let admin = match self.store.find_admin(username).await? {
            Some(admin) => admin,
            None => {
                tracing::warn!("Login attempt for unknown admin '{}'", username);
                return Ok(None);
            }
        };

        match bcrypt::verify(password, &admin.password_hash) {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!("Invalid password for admin '{}'", username);
                return Ok(None);
            }
            Err(e) => {
                tracing::error!("Stored hash for admin '{}' is unreadable: {}", username, e);
                return Ok(None);
            }
        }

        let token = generate_token();
        self.store
            .start_admin_session(&admin.username, &hash_token(&token), now)
            .await?;
        tracing::info!("✅ Admin '{}' logged in", admin.username);

        Ok(Some(token))
    }

    /// Resolve a bearer token. Valid tokens get their expiry pushed out again.
    pub async fn verify_admin_session(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<AdminIdentity>, StoreError> {
        if token.is_empty() {
            return Ok(None);
        }

        let token_hash = hash_token(token);
        let admin = match self.store.find_admin_by_token(&token_hash).await? {
            Some(admin) => admin,
            None => return Ok(None),
        };

        let last_seen = match admin.last_login {
            Some(at) => at,
            None => return Ok(None),
        };
        if now - last_seen > Duration::hours(SESSION_LIFETIME_HOURS) {
            tracing::info!("Admin session for '{}' expired", admin.username);
            self.store.end_admin_session(&token_hash).await?;
            return Ok(None);
        }

        self.store.refresh_admin_session(&token_hash, now).await?;
        Ok(Some(AdminIdentity { username: admin.username }))
    }

    pub async fn logout(&self, token: &str) -> Result<bool, StoreError> {
        self.store.end_admin_session(&hash_token(token)).await
    }

    /// Create the bootstrap account when no admin exists. Returns true if one was created.
    pub async fn ensure_default_admin(
        &self,
        username: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, AuthError> {
        if self.store.admin_count().await? > 0 {
            return Ok(false);
        }
        self.create_or_reset_admin(username, password, now).await?;
        Ok(true)
    }

    pub async fn create_or_reset_admin(
        &self,
        username: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        let password_hash = bcrypt::hash(password, self.hash_cost)?;
        self.store.upsert_admin(username, &password_hash, now).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    async fn auth_with_admin() -> (AdminAuth, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let auth = AdminAuth::with_hash_cost(store.clone(), 4);
        auth.create_or_reset_admin("admin", "admin123", Utc::now()).await.unwrap();
        (auth, store)
    }

    #[test]
    fn test_token_shape() {
        let token = generate_token();
        assert_eq!(token.len(), 64);
        assert_ne!(token, generate_token());
        assert_eq!(hash_token(&token).len(), 64);
        assert_ne!(hash_token(&token), token);
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_user_rejected() {
        let (auth, _) = auth_with_admin().await;
        assert!(auth.verify_admin("admin", "nope", Utc::now()).await.unwrap().is_none());
        assert!(auth.verify_admin("root", "admin123", Utc::now()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_only_token_digest_is_stored() {
        let (auth, store) = auth_with_admin().await;
        let token = auth.verify_admin("admin", "admin123", Utc::now()).await.unwrap().unwrap();
        let account = store.find_admin("admin").await.unwrap().unwrap();
        assert_eq!(account.session_token_hash, Some(hash_token(&token)));
        assert_ne!(account.password_hash, "admin123");
    }

    #[tokio::test]
    async fn test_session_slides_and_expires_after_a_day_idle() {
        let (auth, _) = auth_with_admin().await;
        let t0 = Utc::now();
        let token = auth.verify_admin("admin", "admin123", t0).await.unwrap().unwrap();

        let t1 = t0 + Duration::hours(23);
        assert!(auth.verify_admin_session(&token, t1).await.unwrap().is_some());
        // Refreshed at t1, so t0 + 25h is still inside the window.
        assert!(auth.verify_admin_session(&token, t0 + Duration::hours(25)).await.unwrap().is_some());

        let idle = t0 + Duration::hours(25) + Duration::hours(25);
        assert!(auth.verify_admin_session(&token, idle).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unused_token_expires_after_25_hours() {
        let (auth, _) = auth_with_admin().await;
        let t0 = Utc::now();
        let token = auth.verify_admin("admin", "admin123", t0).await.unwrap().unwrap();
        assert!(auth
            .verify_admin_session(&token, t0 + Duration::hours(25))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_logout_and_relogin_invalidate_tokens() {
        let (auth, _) = auth_with_admin().await;
        let now = Utc::now();

        let first = auth.verify_admin("admin", "admin123", now).await.unwrap().unwrap();
        let second = auth.verify_admin("admin", "admin123", now).await.unwrap().unwrap();
        assert!(auth.verify_admin_session(&first, now).await.unwrap().is_none());
        assert_eq!(
            auth.verify_admin_session(&second, now).await.unwrap().unwrap().username,
            "admin"
        );

        assert!(auth.logout(&second).await.unwrap());
        assert!(auth.verify_admin_session(&second, now).await.unwrap().is_none());
        assert!(!auth.logout(&second).await.unwrap());
    }

    #[tokio::test]
    async fn test_default_admin_only_created_once() {
        let store = Arc::new(MemoryStore::new());
        let auth = AdminAuth::with_hash_cost(store.clone(), 4);
        assert!(auth.ensure_default_admin("admin", "admin123", Utc::now()).await.unwrap());
        assert!(!auth.ensure_default_admin("other", "pw", Utc::now()).await.unwrap());
        assert_eq!(store.admin_count().await.unwrap(), 1);
    }
}
