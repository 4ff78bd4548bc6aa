use std::sync::Arc;

use anyhow::Context;
use sqlx::PgPool;
use tracing::{info, warn};

use crate::auth::password::decoy_hash;
use crate::auth::repo::{MemoryUserRepo, PgUserRepo, UserRepo};
use crate::auth::store::CredentialStore;
use crate::cipher::FieldCipher;
use crate::config::{AppConfig, HashConfig};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub credentials: CredentialStore,
    /// Verified against when a login email matches no record.
    pub decoy_hash: Arc<str>,
    pub db: Option<PgPool>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;
        Self::from_config(config).await
    }

    pub async fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        // An unusable key stops startup instead of failing the first request.
        let cipher = FieldCipher::from_base64_key(&config.encryption_key)
            .context("ENCRYPTION_KEY must be base64 of 32 bytes")?;
        let decoy = decoy_hash(&config.hash).context("HASH_* parameters are not usable")?;

        let (db, users) = match &config.database_url {
            Some(url) => {
                let db = sqlx::postgres::PgPoolOptions::new()
                    .max_connections(config.db_max_connections)
                    .connect(url)
                    .await
                    .context("connect to database")?;
                info!("using postgres user repository");
                let repo = Arc::new(PgUserRepo::new(db.clone())) as Arc<dyn UserRepo>;
                (Some(db), repo)
            }
            None => {
                warn!("DATABASE_URL not set; users are kept in memory and lost on restart");
                (None, Arc::new(MemoryUserRepo::new()) as Arc<dyn UserRepo>)
            }
        };

        Ok(Self {
            config: Arc::new(config),
            credentials: CredentialStore::new(cipher, users),
            decoy_hash: decoy.into(),
            db,
        })
    }

    pub fn hash_cost(&self) -> HashConfig {
        self.config.hash
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        let config = AppConfig {
            database_url: None,
            db_max_connections: 1,
            encryption_key: String::new(),
            hash: crate::auth::password::cheap_cost(),
        };
        let cipher = FieldCipher::new(&[42u8; 32]).expect("32-byte test key");
        let decoy = decoy_hash(&config.hash).expect("cheap decoy hash");
        Self {
            config: Arc::new(config),
            credentials: CredentialStore::new(cipher, Arc::new(MemoryUserRepo::new())),
            decoy_hash: decoy.into(),
            db: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64ct::{Base64, Encoding};

    fn config_with_key(key: &str) -> AppConfig {
        AppConfig {
            database_url: None,
            db_max_connections: 1,
            encryption_key: key.into(),
            hash: crate::auth::password::cheap_cost(),
        }
    }

    #[tokio::test]
    async fn bad_key_fails_startup() {
        let short = Base64::encode_string(&[1u8; 16]);
        assert!(AppState::from_config(config_with_key(&short)).await.is_err());
        assert!(AppState::from_config(config_with_key("%%%")).await.is_err());
    }

    #[tokio::test]
    async fn memory_backend_without_database_url() {
        let key = Base64::encode_string(&[1u8; 32]);
        let state = AppState::from_config(config_with_key(&key)).await.unwrap();
        assert!(state.db.is_none());
        assert!(state.decoy_hash.starts_with("$argon2id$"));
        assert!(state.credentials.find_all().await.unwrap().is_empty());
    }
}
