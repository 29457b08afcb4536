use crate::error::{ParamflowError, Result};
use dashmap::DashMap;
use std::env;
use std::str::FromStr;
use std::sync::Arc;

/// Configuration service
///
/// A shared key/value store seeded from the process environment. Clones share
/// the same store.
#[derive(Clone, Default)]
pub struct ConfigService {
    config: Arc<DashMap<String, String>>,
}

impl ConfigService {
    /// Load every environment variable.
    pub fn from_env() -> Self {
        let service = Self::default();
        for (key, value) in env::vars() {
            service.set(&key, &value);
        }
        service
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.config.get(key).map(|v| v.clone())
    }

    /// First key in `keys` that is set.
    pub fn get_any(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|key| self.get(key))
    }

    pub fn set(&self, key: &str, value: &str) {
        self.config.insert(key.to_string(), value.to_string());
    }

    /// Parse the value of `key`, `Ok(None)` if unset.
    pub fn get_parsed<T: FromStr>(&self, key: &str) -> Result<Option<T>> {
        self.get(key)
            .map(|raw| {
                raw.parse::<T>().map_err(|_| {
                    ParamflowError::Config(format!(
                        "{} must be a valid {}, got '{}'",
                        key,
                        std::any::type_name::<T>(),
                        raw
                    ))
                })
            })
            .transpose()
    }
}

/// Where the HTTP server listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_service(&ConfigService::from_env())
    }

    /// Read `PARAMFLOW_HOST`/`PARAMFLOW_PORT`, falling back to `HOST`/`PORT`.
    pub fn from_service(config: &ConfigService) -> Result<Self> {
        let defaults = Self::default();
        let host = config
            .get_any(&["PARAMFLOW_HOST", "HOST"])
            .unwrap_or(defaults.host);
        let port = match config.get("PARAMFLOW_PORT") {
            Some(_) => config.get_parsed::<u16>("PARAMFLOW_PORT")?,
            None => config.get_parsed::<u16>("PORT")?,
        }
        .unwrap_or(defaults.port);
        Ok(Self { host, port })
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_service(&ConfigService::default()).unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.address(), "0.0.0.0:3000");
    }

    #[test]
    fn test_prefixed_keys_win() {
        let service = ConfigService::default();
        service.set("HOST", "10.0.0.1");
        service.set("PORT", "8080");
        service.set("PARAMFLOW_PORT", "9090");
        let config = ServerConfig::from_service(&service).unwrap();
        assert_eq!(config.host, "10.0.0.1");
        assert_eq!(config.port, 9090);
    }

    #[test]
    fn test_invalid_port() {
        let service = ConfigService::default();
        service.set("PORT", "eighty");
        let err = ServerConfig::from_service(&service).unwrap_err();
        assert!(matches!(err, ParamflowError::Config(message) if message.contains("PORT")));
    }

    #[test]
    fn test_clones_share_store() {
        let service = ConfigService::default();
        let clone = service.clone();
        clone.set("KEY", "value");
        assert_eq!(service.get("KEY").as_deref(), Some("value"));
        assert_eq!(service.get_parsed::<u8>("MISSING").unwrap(), None);
    }
}
