use std::{net::SocketAddr, path::PathBuf, str::FromStr};

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub endpoint: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: Option<String>,
    pub storage: Option<StorageConfig>,
    pub photo_url_ttl_secs: u64,
    pub calorie_table_path: Option<PathBuf>,
    /// Drafts untouched for this long are dropped.
    pub draft_idle_secs: u64,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup, so tests never touch the process env.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let storage = match (
            non_empty("S3_ENDPOINT"),
            non_empty("S3_BUCKET"),
            non_empty("S3_ACCESS_KEY"),
            non_empty("S3_SECRET_KEY"),
        ) {
            (Some(endpoint), Some(bucket), Some(access_key), Some(secret_key)) => {
                Some(StorageConfig {
                    endpoint,
                    bucket,
                    access_key,
                    secret_key,
                    region: non_empty("S3_REGION").unwrap_or_else(|| "us-east-1".into()),
                })
            }
            (None, None, None, None) => None,
            _ => anyhow::bail!(
                "S3_ENDPOINT, S3_BUCKET, S3_ACCESS_KEY and S3_SECRET_KEY must be set together"
            ),
        };

        Ok(Self {
            database_url: non_empty("DATABASE_URL"),
            storage,
            photo_url_ttl_secs: parse_or(&non_empty, "PHOTO_URL_TTL_SECS", 600)?,
            calorie_table_path: non_empty("CALORIE_TABLE_PATH").map(PathBuf::from),
            draft_idle_secs: parse_or(&non_empty, "DRAFT_IDLE_SECS", 24 * 60 * 60)?,
            host: non_empty("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse_or(&non_empty, "APP_PORT", 8080)?,
        })
    }

    pub fn listen_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }
}

fn parse_or<T>(
    lookup: &dyn Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(v) => v.parse::<T>().map_err(|e| anyhow::anyhow!("{key}: {e}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn empty_env_gives_in_memory_defaults() {
        let cfg = AppConfig::from_lookup(lookup_from(&[])).unwrap();
        assert!(cfg.database_url.is_none());
        assert!(cfg.storage.is_none());
        assert_eq!(cfg.photo_url_ttl_secs, 600);
        assert!(cfg.calorie_table_path.is_none());
        assert_eq!(cfg.draft_idle_secs, 86_400);
        assert_eq!(cfg.listen_addr().unwrap().to_string(), "0.0.0.0:8080");
    }

    #[test]
    fn listen_address_comes_from_config() {
        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("APP_HOST", "127.0.0.1"),
            ("APP_PORT", "3000"),
            ("DRAFT_IDLE_SECS", "60"),
        ]))
        .unwrap();
        assert_eq!(cfg.listen_addr().unwrap().to_string(), "127.0.0.1:3000");
        assert_eq!(cfg.draft_idle_secs, 60);

        let err = AppConfig::from_lookup(lookup_from(&[("APP_PORT", "http")])).unwrap_err();
        assert!(err.to_string().contains("APP_PORT"));
    }

    #[test]
    fn full_storage_config_is_read() {
        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/meals"),
            ("S3_ENDPOINT", "http://minio:9000"),
            ("S3_BUCKET", "photos"),
            ("S3_ACCESS_KEY", "key"),
            ("S3_SECRET_KEY", "secret"),
            ("PHOTO_URL_TTL_SECS", "120"),
        ]))
        .unwrap();
        let storage = cfg.storage.expect("storage configured");
        assert_eq!(storage.bucket, "photos");
        assert_eq!(storage.region, "us-east-1");
        assert_eq!(cfg.photo_url_ttl_secs, 120);
        assert_eq!(cfg.database_url.as_deref(), Some("postgres://localhost/meals"));
    }

    #[test]
    fn partial_storage_config_is_rejected() {
        let err = AppConfig::from_lookup(lookup_from(&[("S3_BUCKET", "photos")])).unwrap_err();
        assert!(err.to_string().contains("must be set together"));
    }

    #[test]
    fn bad_ttl_is_rejected() {
        let err =
            AppConfig::from_lookup(lookup_from(&[("PHOTO_URL_TTL_SECS", "soon")])).unwrap_err();
        assert!(err.to_string().contains("PHOTO_URL_TTL_SECS"));
    }
}
