// src/config.rs

use serde::Deserialize;
use std::{env, fs, path::PathBuf};
use url::Url;

use crate::error::ConfigError;

pub const DEV_ENVIRONMENT: &str = "dev";
const DEFAULT_ENVIRONMENT: &str = "prod";
const DEFAULT_PORT: u16 = 10443;
const MIN_POOL_SIZE: u32 = 10;
const CONNECTIONS_PER_CPU: u32 = 20;

/// Database connection settings, read from the JSON file at `DB_CONFIG_PATH`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbConfig {
    /// `host` or `host:port`.
    pub url: String,
    pub user: String,
    #[serde(default)]
    pub password: String,
    pub dbname: String,
    #[serde(default)]
    pub sslmode: bool,
    #[serde(default)]
    pub pool_size: u32,
    #[serde(default)]
    pub ca_cert_file_path: String,
    #[serde(default)]
    pub cert_file_path: String,
    #[serde(default)]
    pub key_file_path: String,
}

impl DbConfig {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_string(),
            source,
        })?;
        let config: DbConfig = serde_json::from_str(&text).map_err(|source| ConfigError::Json {
            path: path.to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "url",
                reason: "empty database address".to_string(),
            });
        }
        if self.sslmode {
            for (key, value) in [
                ("caCertFilePath", &self.ca_cert_file_path),
                ("certFilePath", &self.cert_file_path),
                ("keyFilePath", &self.key_file_path),
            ] {
                if value.is_empty() {
                    return Err(ConfigError::Invalid {
                        key,
                        reason: "required when sslmode is on".to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn host(&self) -> &str {
        match self.split_port() {
            Some((host, _)) => host,
            None => &self.url,
        }
    }

    pub fn port(&self) -> Option<u16> {
        self.split_port().map(|(_, port)| port)
    }

    fn split_port(&self) -> Option<(&str, u16)> {
        let (host, port) = self.url.rsplit_once(':')?;
        port.parse().ok().map(|port| (host, port))
    }

    /// A configured pool below the minimum is sized from the CPU count instead.
    pub fn effective_pool_size(&self) -> u32 {
        if self.pool_size >= MIN_POOL_SIZE {
            return self.pool_size;
        }
        let cpus = std::thread::available_parallelism()
            .map(|n| n.get() as u32)
            .unwrap_or(1);
        cpus.max(1) * CONNECTIONS_PER_CPU
    }
}

/// Certificate and key the HTTP server presents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsFiles {
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub source_base_url: Url,
    pub environment: String,
    pub server_port: u16,
    pub tls: Option<TlsFiles>,
    pub database: DbConfig,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from any key lookup; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let raw_url = get("SOURCE_BASE_URL").ok_or(ConfigError::Missing("SOURCE_BASE_URL"))?;
        let source_base_url = Url::parse(&raw_url).map_err(|e| ConfigError::Invalid {
            key: "SOURCE_BASE_URL",
            reason: e.to_string(),
        })?;

        let environment = get("ENVIRONMENT").unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string());

        let server_port = match get("SERVER_PORT") {
            Some(p) => p.parse().map_err(|_| ConfigError::Invalid {
                key: "SERVER_PORT",
                reason: format!("'{}' is not a port", p),
            })?,
            None => DEFAULT_PORT,
        };

        let tls = match (get("SECRETS_PATH"), get("CERT_FILENAME"), get("KEY_FILENAME")) {
            (None, None, None) => None,
            (Some(dir), Some(cert), Some(key)) => {
                let dir = PathBuf::from(dir);
                Some(TlsFiles {
                    cert_path: dir.join(cert),
                    key_path: dir.join(key),
                })
            }
            _ => {
                return Err(ConfigError::Invalid {
                    key: "SECRETS_PATH",
                    reason: "SECRETS_PATH, CERT_FILENAME and KEY_FILENAME go together"
                        .to_string(),
                })
            }
        };

        let db_path = get("DB_CONFIG_PATH").ok_or(ConfigError::Missing("DB_CONFIG_PATH"))?;
        let database = DbConfig::from_file(&db_path)?;

        Ok(Self {
            source_base_url,
            environment,
            server_port,
            tls,
            database,
        })
    }

    pub fn is_dev(&self) -> bool {
        self.environment.eq_ignore_ascii_case(DEV_ENVIRONMENT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{collections::HashMap, io::Write};
    use tempfile::NamedTempFile;

    fn db_file(json: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(json.as_bytes()).unwrap();
        f
    }

    fn settings(vars: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|k| vars.get(k).cloned())
    }

    const DB_JSON: &str = r#"{"url": "db.internal:6432", "user": "crawler",
        "password": "secret", "dbname": "shares", "poolSize": 4}"#;

    #[test]
    fn test_minimal_settings() {
        let db = db_file(DB_JSON);
        let s = settings(&[
            ("SOURCE_BASE_URL", "https://smart-lab.ru"),
            ("DB_CONFIG_PATH", db.path().to_str().unwrap()),
        ])
        .unwrap();
        assert_eq!(s.source_base_url.as_str(), "https://smart-lab.ru/");
        assert_eq!(s.environment, "prod");
        assert!(!s.is_dev());
        assert_eq!(s.server_port, 10443);
        assert_eq!(s.tls, None);
        assert_eq!(s.database.host(), "db.internal");
        assert_eq!(s.database.port(), Some(6432));
        assert!(!s.database.sslmode);
    }

    #[test]
    fn test_missing_values() {
        let err = settings(&[("SOURCE_BASE_URL", "  ")]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("SOURCE_BASE_URL")));

        let err = settings(&[("SOURCE_BASE_URL", "https://x.test")]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("DB_CONFIG_PATH")));

        let err = settings(&[("SOURCE_BASE_URL", "not a url")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "SOURCE_BASE_URL", .. }));
    }

    #[test]
    fn test_tls_needs_all_three() {
        let db = db_file(DB_JSON);
        let path = db.path().to_str().unwrap();
        let s = settings(&[
            ("SOURCE_BASE_URL", "https://x.test"),
            ("DB_CONFIG_PATH", path),
            ("SECRETS_PATH", "/secrets"),
            ("CERT_FILENAME", "tls.crt"),
            ("KEY_FILENAME", "tls.key"),
            ("ENVIRONMENT", "DEV"),
            ("SERVER_PORT", "8443"),
        ])
        .unwrap();
        assert_eq!(
            s.tls,
            Some(TlsFiles {
                cert_path: PathBuf::from("/secrets/tls.crt"),
                key_path: PathBuf::from("/secrets/tls.key"),
            })
        );
        assert!(s.is_dev());
        assert_eq!(s.server_port, 8443);

        let err = settings(&[
            ("SOURCE_BASE_URL", "https://x.test"),
            ("DB_CONFIG_PATH", path),
            ("CERT_FILENAME", "tls.crt"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "SECRETS_PATH", .. }));
    }

    #[test]
    fn test_db_config_errors() {
        let bad_json = db_file("{ not json");
        assert!(matches!(
            DbConfig::from_file(bad_json.path().to_str().unwrap()),
            Err(ConfigError::Json { .. })
        ));

        assert!(matches!(
            DbConfig::from_file("/definitely/not/here.json"),
            Err(ConfigError::Io { .. })
        ));

        let ssl = db_file(r#"{"url": "db", "user": "u", "dbname": "d", "sslmode": true}"#);
        assert!(matches!(
            DbConfig::from_file(ssl.path().to_str().unwrap()),
            Err(ConfigError::Invalid { key: "caCertFilePath", .. })
        ));
    }

    #[test]
    fn test_pool_size() {
        let mut config: DbConfig = serde_json::from_str(DB_JSON).unwrap();
        assert!(config.effective_pool_size() >= CONNECTIONS_PER_CPU);
        assert_eq!(config.effective_pool_size() % CONNECTIONS_PER_CPU, 0);
        config.pool_size = 32;
        assert_eq!(config.effective_pool_size(), 32);
    }

    #[test]
    fn test_address_without_port() {
        let config: DbConfig =
            serde_json::from_str(r#"{"url": "localhost", "user": "u", "dbname": "d"}"#).unwrap();
        assert_eq!(config.host(), "localhost");
        assert_eq!(config.port(), None);
    }
}
