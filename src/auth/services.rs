use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    auth::{
        dto::{LoginRequest, PublicUser, RegisterRequest},
        password::{hash_password, verify_password},
        repo_types::NewUser,
        store::CredentialStore,
    },
    config::HashConfig,
    error::AuthError,
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Presence check only; the value is kept exactly as sent.
fn required(value: Option<String>, field: &str) -> Result<String, AuthError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(AuthError::Validation(format!("{field} is required"))),
    }
}

/// Validated registration input.
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl TryFrom<RegisterRequest> for Registration {
    type Error = AuthError;

    fn try_from(req: RegisterRequest) -> Result<Self, Self::Error> {
        let name = required(req.name, "name")?;
        let email = required(req.email, "email")?;
        let password = required(req.password, "password")?;

        if !is_valid_email(&email) {
            return Err(AuthError::Validation("Invalid email".into()));
        }
        Ok(Self {
            name,
            email,
            password,
        })
    }
}

/// Validated login input.
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl TryFrom<LoginRequest> for Credentials {
    type Error = AuthError;

    fn try_from(req: LoginRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            email: required(req.email, "email")?,
            password: required(req.password, "password")?,
        })
    }
}

async fn blocking<T, F>(f: F) -> Result<T, AuthError>
where
    F: FnOnce() -> Result<T, AuthError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AuthError::Crypto(format!("hashing task failed: {e}")))?
}

/// Hashes the password, encrypts name and email, and appends the record.
/// Duplicate emails are accepted.
pub async fn register(
    store: &CredentialStore,
    cost: HashConfig,
    input: Registration,
) -> Result<Uuid, AuthError> {
    let Registration {
        name,
        email,
        password,
    } = input;

    let password = blocking(move || hash_password(&password, &cost)).await?;
    let user = store
        .save(NewUser {
            name: store.encrypt_value(&name)?,
            email: store.encrypt_value(&email)?,
            password,
        })
        .await?;

    debug!(user_id = %user.id, "user record stored");
    Ok(user.id)
}

/// Scans every record, decrypting emails until one matches exactly, then
/// checks the password. When nothing matches, the password is still verified
/// against `decoy_hash` so both failures cost one Argon2 run.
pub async fn login(
    store: &CredentialStore,
    decoy_hash: &str,
    input: Credentials,
) -> Result<PublicUser, AuthError> {
    let Credentials { email, password } = input;

    let mut found = None;
    for user in store.find_all().await? {
        match store.decrypt_value(&user.email) {
            Ok(stored_email) if stored_email == email => {
                found = Some(user);
                break;
            }
            Ok(_) => {}
            Err(e) => warn!(user_id = %user.id, error = %e, "skipping undecryptable email"),
        }
    }

    let hash = match &found {
        Some(user) => user.password.clone(),
        None => decoy_hash.to_string(),
    };
    let ok = blocking(move || verify_password(&password, &hash)).await?;

    let Some(user) = found else {
        debug!("login for unknown email");
        return Err(AuthError::InvalidCredentials);
    };
    if !ok {
        debug!(user_id = %user.id, "login with wrong password");
        return Err(AuthError::InvalidCredentials);
    }

    Ok(PublicUser {
        id: user.id,
        name: store.decrypt_value(&user.name)?,
        email,
    })
}
