use anyhow::Context;

/// Argon2id cost parameters applied to every stored password.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashConfig {
    pub memory_kib: u32,
    pub time_cost: u32,
    pub parallelism: u32,
}

impl Default for HashConfig {
    fn default() -> Self {
        // OWASP baseline for Argon2id, comparable to bcrypt at cost 10.
        Self {
            memory_kib: 19 * 1024,
            time_cost: 2,
            parallelism: 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Absent means the in-memory user repository is used.
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    /// Base64 of the 32-byte field encryption key.
    pub encryption_key: String,
    pub hash: HashConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let encryption_key = lookup("ENCRYPTION_KEY")
            .filter(|v| !v.trim().is_empty())
            .context("ENCRYPTION_KEY must be set")?;

        let defaults = HashConfig::default();
        let hash = HashConfig {
            memory_kib: parse_or(&lookup, "HASH_MEMORY_KIB", defaults.memory_kib)?,
            time_cost: parse_or(&lookup, "HASH_TIME_COST", defaults.time_cost)?,
            parallelism: parse_or(&lookup, "HASH_PARALLELISM", defaults.parallelism)?,
        };

        Ok(Self {
            database_url: lookup("DATABASE_URL").filter(|v| !v.trim().is_empty()),
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 10)?,
            encryption_key: encryption_key.trim().to_string(),
            hash,
        })
    }
}

fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(name) {
        Some(v) => v
            .trim()
            .parse::<T>()
            .with_context(|| format!("{name} is not a valid number")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn missing_key_is_fatal() {
        let err = AppConfig::from_lookup(env(&[("DATABASE_URL", "postgres://x")])).unwrap_err();
        assert!(err.to_string().contains("ENCRYPTION_KEY"));
    }

    #[test]
    fn blank_key_is_fatal() {
        assert!(AppConfig::from_lookup(env(&[("ENCRYPTION_KEY", "   ")])).is_err());
    }

    #[test]
    fn defaults_apply() {
        let cfg = AppConfig::from_lookup(env(&[("ENCRYPTION_KEY", "abc")])).unwrap();
        assert_eq!(cfg.database_url, None);
        assert_eq!(cfg.db_max_connections, 10);
        assert_eq!(cfg.hash, HashConfig::default());
    }

    #[test]
    fn hash_cost_overrides() {
        let cfg = AppConfig::from_lookup(env(&[
            ("ENCRYPTION_KEY", "abc"),
            ("HASH_TIME_COST", "4"),
            ("HASH_MEMORY_KIB", "8192"),
            ("DATABASE_URL", "postgres://localhost/app"),
        ]))
        .unwrap();
        assert_eq!(cfg.hash.time_cost, 4);
        assert_eq!(cfg.hash.memory_kib, 8192);
        assert_eq!(cfg.hash.parallelism, 1);
        assert_eq!(cfg.database_url.as_deref(), Some("postgres://localhost/app"));
    }

    #[test]
    fn bad_number_is_rejected() {
        let err = AppConfig::from_lookup(env(&[
            ("ENCRYPTION_KEY", "abc"),
            ("HASH_TIME_COST", "ten"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("HASH_TIME_COST"));
    }
}
