// src/services/bootstrap.rs
use crate::config::AppConfig;
use crate::models::catalog::Catalog;
use crate::services::admin_auth::{AdminAuth, AuthError};
use crate::store::Store;
use chrono::Utc;

/// First-start provisioning: seed the course catalog and the bootstrap admin
/// when they do not exist yet. Safe to run on every start.
pub async fn bootstrap(store: &dyn Store, auth: &AdminAuth, config: &AppConfig) -> Result<(), AuthError> {
    if store.seed_catalog(&Catalog::default_seed()).await? {
        tracing::info!("📚 Seeded default course catalog");
    }

    let created = auth
        .ensure_default_admin(&config.admin_username, &config.admin_password, Utc::now())
        .await?;
    if created {
        tracing::info!("👤 Created admin account '{}'", config.admin_username);
        if config.admin_password_is_default {
            tracing::warn!(
                "⚠️  Admin '{}' uses the built-in default password. Set ADMIN_PASSWORD or run createadmin.",
                config.admin_username
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::sync::Arc;

    fn config() -> AppConfig {
        AppConfig::from_lookup(|key| match key {
            "GEMINI_API_KEY" => Some("key".to_string()),
            "DATABASE_URL" => Some("postgres://localhost/uniassist".to_string()),
            _ => None,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_bootstrap_seeds_once_and_keeps_edits() {
        let store = Arc::new(MemoryStore::new());
        let auth = AdminAuth::with_hash_cost(store.clone(), 4);

        bootstrap(store.as_ref(), &auth, &config()).await.unwrap();
        assert_eq!(store.load_catalog().await.unwrap(), Catalog::default_seed());
        assert!(auth.verify_admin("admin", "admin123", Utc::now()).await.unwrap().is_some());

        let edited = Catalog::parse(r#"{"MCA": {"duration": "2 years", "fees": "x", "semesters": 4, "subjects": {}}}"#).unwrap();
        store.save_catalog(&edited).await.unwrap();
        bootstrap(store.as_ref(), &auth, &config()).await.unwrap();
        assert_eq!(store.load_catalog().await.unwrap(), edited);
        assert_eq!(store.admin_count().await.unwrap(), 1);
    }
}
