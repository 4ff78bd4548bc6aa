use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use tracing::error;

use crate::{config::HashConfig, error::AuthError};

fn argon2_with(cost: &HashConfig) -> Result<Argon2<'static>, AuthError> {
    let params = Params::new(cost.memory_kib, cost.time_cost, cost.parallelism, None)
        .map_err(|e| {
            error!(error = %e, "argon2 params error");
            AuthError::Crypto(e.to_string())
        })?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

pub fn hash_password(plain: &str, cost: &HashConfig) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = argon2_with(cost)?
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            AuthError::Crypto(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

/// Cost parameters are read back from the PHC string, so hashes made under an
/// older configuration keep verifying.
pub fn verify_password(plain: &str, hash: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        AuthError::Crypto(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

/// Hash of a random throwaway password, verified against on logins whose
/// email matches no record.
pub fn decoy_hash(cost: &HashConfig) -> Result<String, AuthError> {
    hash_password(&uuid::Uuid::new_v4().to_string(), cost)
}

#[cfg(test)]
pub(crate) fn cheap_cost() -> HashConfig {
    HashConfig {
        memory_kib: 1024,
        time_cost: 1,
        parallelism: 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_roundtrip() {
        let password = "Secur3P@ssw0rd!";
        let hash = hash_password(password, &cheap_cost()).expect("hashing should succeed");
        assert!(verify_password(password, &hash).expect("verify should succeed"));
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let password = "correct-horse-battery-staple";
        let hash = hash_password(password, &cheap_cost()).expect("hashing should succeed");
        assert!(!verify_password("wrong-password", &hash).expect("verify should not error"));
    }

    #[test]
    fn verify_errors_on_malformed_hash() {
        let err = verify_password("anything", "not-a-valid-hash").unwrap_err();
        assert!(matches!(err, AuthError::Crypto(_)));
    }

    #[test]
    fn hash_is_salted_and_not_plaintext() {
        let a = hash_password("Secret123", &cheap_cost()).unwrap();
        let b = hash_password("Secret123", &cheap_cost()).unwrap();
        assert_ne!(a, "Secret123");
        assert_ne!(a, b);
        assert!(a.starts_with("$argon2id$"));
    }

    #[test]
    fn configured_cost_is_recorded_in_hash() {
        let cost = HashConfig {
            memory_kib: 2048,
            time_cost: 3,
            parallelism: 1,
        };
        let hash = hash_password("Secret123", &cost).unwrap();
        assert!(hash.contains("m=2048,t=3,p=1"));
        assert!(verify_password("Secret123", &hash).unwrap());
    }

    #[test]
    fn decoy_hash_uses_configured_cost() {
        let hash = decoy_hash(&cheap_cost()).unwrap();
        assert!(hash.contains("m=1024,t=1,p=1"));
        assert!(!verify_password("", &hash).unwrap());
    }

    #[test]
    fn invalid_cost_is_crypto_error() {
        let cost = HashConfig {
            memory_kib: 1,
            time_cost: 0,
            parallelism: 1,
        };
        assert!(matches!(
            hash_password("x", &cost),
            Err(AuthError::Crypto(_))
        ));
    }
}
