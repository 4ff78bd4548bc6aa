use std::sync::Arc;

use crate::{
    auth::{
        repo::UserRepo,
        repo_types::{NewUser, User},
    },
    cipher::FieldCipher,
    error::AuthError,
};

/// Pairs the field cipher with the user repository. Everything that touches a
/// stored record goes through here.
#[derive(Clone)]
pub struct CredentialStore {
    cipher: FieldCipher,
    users: Arc<dyn UserRepo>,
}

impl CredentialStore {
    pub fn new(cipher: FieldCipher, users: Arc<dyn UserRepo>) -> Self {
        Self { cipher, users }
    }

    pub fn encrypt_value(&self, plaintext: &str) -> Result<String, AuthError> {
        self.cipher.encrypt_value(plaintext)
    }

    pub fn decrypt_value(&self, ciphertext: &str) -> Result<String, AuthError> {
        self.cipher.decrypt_value(ciphertext)
    }

    pub async fn save(&self, user: NewUser) -> Result<User, AuthError> {
        self.users.save(user).await
    }

    pub async fn find_all(&self) -> Result<Vec<User>, AuthError> {
        self.users.find_all().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repo::MemoryUserRepo;

    #[tokio::test]
    async fn saved_fields_stay_encrypted() {
        let store = CredentialStore::new(
            FieldCipher::new(&[5u8; 32]).unwrap(),
            Arc::new(MemoryUserRepo::new()),
        );
        let saved = store
            .save(NewUser {
                name: store.encrypt_value("Ann Lee").unwrap(),
                email: store.encrypt_value("ann@x.com").unwrap(),
                password: "$argon2id$stub".into(),
            })
            .await
            .unwrap();

        let all = store.find_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, saved.id);
        assert_ne!(all[0].email, "ann@x.com");
        assert_eq!(store.decrypt_value(&all[0].email).unwrap(), "ann@x.com");
        assert_eq!(store.decrypt_value(&all[0].name).unwrap(), "Ann Lee");
    }
}
