use std::env;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub store_backend: StoreBackend,
    pub database_url: Option<String>,
    pub bind_addr: String,
    pub jwt_secret: String,
    pub session_ttl_hours: i64,
    /// Secure cookie flag; on in production.
    pub cookie_secure: bool,
    pub allow_admin_signup: bool,
    pub seed_demo: bool,
}

fn parse_flag(raw: Option<String>) -> bool {
    matches!(
        raw.as_deref().map(str::trim),
        Some("1") | Some("true") | Some("TRUE") | Some("yes")
    )
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let store_backend = match lookup("STORE_BACKEND").as_deref().map(str::trim) {
            None | Some("") | Some("postgres") => StoreBackend::Postgres,
            Some("memory") => StoreBackend::Memory,
            Some(other) => anyhow::bail!("STORE_BACKEND must be postgres or memory, got {other}"),
        };

        let database_url = lookup("DATABASE_URL").filter(|s| !s.trim().is_empty());
        if store_backend == StoreBackend::Postgres && database_url.is_none() {
            anyhow::bail!("DATABASE_URL is required for the postgres store");
        }

        let jwt_secret = lookup("JWT_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or_else(|| anyhow::anyhow!("JWT_SECRET is required"))?;

        let bind_addr = lookup("BIND_ADDR").unwrap_or_else(|| "127.0.0.1:8080".to_string());
        let session_ttl_hours = lookup("SESSION_TTL_HOURS")
            .and_then(|s| s.parse::<i64>().ok())
            .filter(|h| *h > 0)
            .unwrap_or(24 * 7);

        let cookie_secure = lookup("APP_ENV").as_deref() == Some("production");

        Ok(Self {
            store_backend,
            database_url,
            bind_addr,
            jwt_secret,
            session_ttl_hours,
            cookie_secure,
            allow_admin_signup: parse_flag(lookup("ALLOW_ADMIN_SIGNUP")),
            seed_demo: parse_flag(lookup("SEED_DEMO")),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn defaults() {
        let cfg = config_from(&[("DATABASE_URL", "postgres://x"), ("JWT_SECRET", "s")]).unwrap();
        assert_eq!(cfg.store_backend, StoreBackend::Postgres);
        assert_eq!(cfg.bind_addr, "127.0.0.1:8080");
        assert_eq!(cfg.session_ttl_hours, 168);
        assert!(!cfg.cookie_secure);
        assert!(!cfg.allow_admin_signup);
    }

    #[test]
    fn memory_backend_needs_no_database() {
        let cfg = config_from(&[
            ("STORE_BACKEND", "memory"),
            ("JWT_SECRET", "s"),
            ("APP_ENV", "production"),
            ("SEED_DEMO", "true"),
        ])
        .unwrap();
        assert_eq!(cfg.store_backend, StoreBackend::Memory);
        assert!(cfg.cookie_secure);
        assert!(cfg.seed_demo);
    }

    #[test]
    fn missing_secret_or_database_fails() {
        assert!(config_from(&[("DATABASE_URL", "postgres://x")]).is_err());
        assert!(config_from(&[("JWT_SECRET", "s")]).is_err());
        assert!(config_from(&[("STORE_BACKEND", "mongo"), ("JWT_SECRET", "s")]).is_err());
    }
}
