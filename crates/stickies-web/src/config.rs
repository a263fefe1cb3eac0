use std::collections::HashMap;
use std::env;

use stickies_core::config::GatewayConfig;
use stickies_core::util::is_http_url;
use thiserror::Error;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),
    #[error(transparent)]
    Gateway(#[from] stickies_core::Error),
}

/// Server settings. `Debug` is safe to log: gateway secrets are redacted.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    /// Origin share links are built against, without a trailing slash.
    pub public_origin: String,
    pub gateway: GatewayConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let values: HashMap<String, String> = env::vars().collect();
        Self::from_lookup(|name| values.get(name).cloned())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_addr = value_or_default(&lookup, "STICKIES_BIND_ADDR", DEFAULT_BIND_ADDR);

        let default_origin = format!("http://{bind_addr}");
        let public_origin = value_or_default(&lookup, "STICKIES_PUBLIC_ORIGIN", &default_origin)
            .trim_end_matches('/')
            .to_string();
        if !is_http_url(&public_origin) {
            return Err(ConfigError::Invalid(
                "STICKIES_PUBLIC_ORIGIN must start with http:// or https://".to_string(),
            ));
        }

        let gateway = GatewayConfig::from_lookup(&lookup)?;

        Ok(Self {
            bind_addr,
            public_origin,
            gateway,
        })
    }

    /// Prefix under which local-mode blobs are served by this process.
    pub fn local_blob_base_url(&self) -> String {
        format!("{}/blobs", self.public_origin)
    }
}

fn value_or_default(lookup: impl Fn(&str) -> Option<String>, name: &str, default: &str) -> String {
    lookup(name)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;

    use super::*;

    fn config_from(map: &HashMap<&str, &str>) -> Result<AppConfig, ConfigError> {
        AppConfig::from_lookup(|key| map.get(key).map(|value| (*value).to_string()))
    }

    #[test]
    fn defaults_to_local_mode_on_loopback() {
        let config = config_from(&HashMap::new()).unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:8080");
        assert_eq!(config.public_origin, "http://127.0.0.1:8080");
        assert_eq!(config.local_blob_base_url(), "http://127.0.0.1:8080/blobs");
        assert!(config.gateway.is_local());
    }

    #[test]
    fn public_origin_drops_trailing_slash() {
        let mut map = HashMap::new();
        map.insert("STICKIES_PUBLIC_ORIGIN", "https://stickies.example.com/");
        let config = config_from(&map).unwrap();
        assert_eq!(config.public_origin, "https://stickies.example.com");
    }

    #[test]
    fn rejects_non_http_origin() {
        let mut map = HashMap::new();
        map.insert("STICKIES_PUBLIC_ORIGIN", "stickies.example.com");
        let err = config_from(&map).unwrap_err();
        assert!(err.to_string().contains("STICKIES_PUBLIC_ORIGIN"));
    }

    #[test]
    fn config_redacts_sensitive_debug_fields() {
        let mut map = HashMap::new();
        map.insert("SUPABASE_URL", "https://project.supabase.co");
        map.insert("SUPABASE_ANON_KEY", "sensitive-anon-key");
        map.insert("R2_ACCOUNT_ID", "acc");
        map.insert("R2_BUCKET", "bucket");
        map.insert("R2_ACCESS_KEY_ID", "access");
        map.insert("R2_SECRET_ACCESS_KEY", "sensitive-r2-secret");
        map.insert("R2_PUBLIC_BASE_URL", "https://images.example.com");

        let config = config_from(&map).unwrap();

        let debug_output = format!("{config:?}");
        assert!(!debug_output.contains("sensitive-anon-key"));
        assert!(!debug_output.contains("sensitive-r2-secret"));
        assert!(debug_output.contains("[REDACTED]"));
    }

    #[test]
    fn partial_r2_config_is_an_error() {
        let mut map = HashMap::new();
        map.insert("SUPABASE_URL", "https://project.supabase.co");
        map.insert("SUPABASE_ANON_KEY", "anon");
        map.insert("R2_BUCKET", "bucket");
        let err = config_from(&map).unwrap_err();
        assert!(err.to_string().contains("R2_ACCOUNT_ID"));
    }
}
