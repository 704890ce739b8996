use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use argon2::Params;
use chrono::Duration;

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
    "secret",
];

/// Process configuration, read once at startup and passed down by value.
#[derive(Clone)]
pub struct Config {
    pub jwt_secret: String,
    pub db_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub session_ttl: Duration,
    pub hash_params: Params,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(get: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = get("PARLOR_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("PARLOR_JWT_SECRET is unset or still a placeholder");
        }

        let db_path: PathBuf = get("PARLOR_DB_PATH").unwrap_or_else(|| "parlor.db".into()).into();
        let host = get("PARLOR_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = parse_or(&get, "PARLOR_PORT", 8080u16)?;

        let ttl_minutes = parse_or(&get, "PARLOR_SESSION_TTL_MINUTES", 120i64)?;
        if ttl_minutes <= 0 {
            bail!("PARLOR_SESSION_TTL_MINUTES must be positive");
        }

        let hash_params = Params::new(
            parse_or(&get, "PARLOR_HASH_MEMORY_KIB", Params::DEFAULT_M_COST)?,
            parse_or(&get, "PARLOR_HASH_ITERATIONS", Params::DEFAULT_T_COST)?,
            parse_or(&get, "PARLOR_HASH_PARALLELISM", Params::DEFAULT_P_COST)?,
            None,
        )
        .map_err(|e| anyhow::anyhow!("Invalid password hashing cost: {}", e))?;

        Ok(Self {
            jwt_secret,
            db_path,
            host,
            port,
            session_ttl: Duration::minutes(ttl_minutes),
            hash_params,
        })
    }
}

fn parse_or<F, T>(get: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match get(key) {
        Some(raw) => raw.parse().with_context(|| format!("Invalid {}: {:?}", key, raw)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let config = config_from(&[("PARLOR_JWT_SECRET", "a-real-secret")]).unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.db_path, PathBuf::from("parlor.db"));
        assert_eq!(config.session_ttl, Duration::minutes(120));
        assert_eq!(config.hash_params.m_cost(), Params::DEFAULT_M_COST);
    }

    #[test]
    fn secret_is_required() {
        assert!(config_from(&[]).is_err());
        assert!(config_from(&[("PARLOR_JWT_SECRET", "")]).is_err());
        assert!(config_from(&[("PARLOR_JWT_SECRET", "dev-secret-change-me")]).is_err());
    }

    #[test]
    fn overrides_and_bad_values() {
        let config = config_from(&[
            ("PARLOR_JWT_SECRET", "a-real-secret"),
            ("PARLOR_PORT", "9000"),
            ("PARLOR_SESSION_TTL_MINUTES", "15"),
            ("PARLOR_HASH_ITERATIONS", "3"),
        ])
        .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.session_ttl, Duration::minutes(15));
        assert_eq!(config.hash_params.t_cost(), 3);

        assert!(config_from(&[("PARLOR_JWT_SECRET", "s3cr3t!"), ("PARLOR_PORT", "http")]).is_err());
        assert!(
            config_from(&[("PARLOR_JWT_SECRET", "s3cr3t!"), ("PARLOR_SESSION_TTL_MINUTES", "0")])
                .is_err()
        );
        assert!(
            config_from(&[("PARLOR_JWT_SECRET", "s3cr3t!"), ("PARLOR_HASH_MEMORY_KIB", "1")])
                .is_err()
        );
    }
}
