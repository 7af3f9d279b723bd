use std::fmt;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::provider::cloudflare::CLOUDFLARE_API_BASE;
use crate::response::ResponseMode;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub cloudflare: CloudflareConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub response_mode: ResponseMode,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_api_base() -> String {
    CLOUDFLARE_API_BASE.to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            response_mode: ResponseMode::default(),
        }
    }
}

#[derive(Clone, Deserialize)]
pub struct CloudflareConfig {
    #[serde(default)]
    pub api_token: String,
    /// Each entry may itself be a comma-separated list.
    #[serde(default)]
    pub hostnames: Vec<String>,
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

impl Default for CloudflareConfig {
    fn default() -> Self {
        Self {
            api_token: String::new(),
            hostnames: Vec::new(),
            api_base: default_api_base(),
        }
    }
}

// The token never shows up in logs.
impl fmt::Debug for CloudflareConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudflareConfig")
            .field("api_token", &"<REDACTED>")
            .field("hostnames", &self.hostnames)
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl Config {
    /// Reads the optional config file, then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => {
                let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                toml::from_str(&content).map_err(|source| ConfigError::Parse {
                    path: path.to_path_buf(),
                    source,
                })?
            }
            None => Config::default(),
        };

        file.with_env(|key| std::env::var(key).ok())
    }

    /// Applies overrides from `env` and validates the result. Hostname
    /// lists are flattened here, once, for the lifetime of the process.
    pub fn with_env<F>(mut self, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = var("CF_API_TOKEN") {
            self.cloudflare.api_token = token.trim().to_string();
        }
        if let Some(base) = var("CF_API_BASE") {
            self.cloudflare.api_base = base.trim().to_string();
        }
        if let Some(hostnames) = var("DDNS_HOSTNAMES") {
            self.cloudflare.hostnames.push(hostnames);
        }
        if let Some(host) = var("DDNS_HOST") {
            self.server.host = host;
        }
        if let Some(port) = var("DDNS_PORT") {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue {
                    key: "DDNS_PORT",
                    value: port,
                })?;
        }
        if let Some(level) = var("DDNS_LOG_LEVEL") {
            self.server.log_level = level;
        }
        if let Some(mode) = var("DDNS_RESPONSE_MODE") {
            self.server.response_mode = mode.parse().map_err(|value| ConfigError::InvalidValue {
                key: "DDNS_RESPONSE_MODE",
                value,
            })?;
        }

        self.cloudflare.hostnames = split_hostnames(&self.cloudflare.hostnames);

        if self.cloudflare.api_token.is_empty() {
            return Err(ConfigError::MissingApiToken);
        }
        if self.cloudflare.hostnames.is_empty() {
            return Err(ConfigError::NoHostnames);
        }

        Ok(self)
    }

    pub fn hostnames(&self) -> &[String] {
        &self.cloudflare.hostnames
    }
}

fn split_hostnames(lists: &[String]) -> Vec<String> {
    lists
        .iter()
        .flat_map(|list| list.split(','))
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn environment_alone_is_enough() {
        let config = Config::default()
            .with_env(env(&[
                ("CF_API_TOKEN", "token"),
                ("DDNS_HOSTNAMES", "home.example.com, example.org,,"),
            ]))
            .unwrap();

        assert_eq!(config.cloudflare.api_token, "token");
        assert_eq!(config.hostnames(), ["home.example.com", "example.org"]);
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.response_mode, ResponseMode::Json);
        assert_eq!(config.cloudflare.api_base, CLOUDFLARE_API_BASE);
    }

    #[test]
    fn missing_token_is_an_error() {
        let err = Config::default()
            .with_env(env(&[("DDNS_HOSTNAMES", "home.example.com")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiToken));
    }

    #[test]
    fn missing_hostnames_is_an_error() {
        let err = Config::default()
            .with_env(env(&[("CF_API_TOKEN", "token"), ("DDNS_HOSTNAMES", " , ")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::NoHostnames));
    }

    #[test]
    fn bad_port_is_reported() {
        let err = Config::default()
            .with_env(env(&[
                ("CF_API_TOKEN", "token"),
                ("DDNS_HOSTNAMES", "example.com"),
                ("DDNS_PORT", "eighty"),
            ]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "DDNS_PORT", .. }));
    }

    #[test]
    fn response_mode_from_env() {
        let config = Config::default()
            .with_env(env(&[
                ("CF_API_TOKEN", "token"),
                ("DDNS_HOSTNAMES", "example.com"),
                ("DDNS_RESPONSE_MODE", "dyndns"),
            ]))
            .unwrap();
        assert_eq!(config.server.response_mode, ResponseMode::Dyndns);
    }

    #[test]
    fn file_lists_merge_with_environment() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[server]
port = 8080
response_mode = "dyndns"

[cloudflare]
api_token = "from-file"
hostnames = ["home.example.com,vpn.example.com", "example.org"]
"#
        )
        .unwrap();

        let content = fs::read_to_string(file.path()).unwrap();
        let parsed: Config = toml::from_str(&content).unwrap();
        let config = parsed
            .with_env(env(&[
                ("CF_API_TOKEN", "from-env"),
                ("DDNS_HOSTNAMES", "nas.example.net"),
            ]))
            .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.response_mode, ResponseMode::Dyndns);
        assert_eq!(config.cloudflare.api_token, "from-env");
        assert_eq!(
            config.hostnames(),
            [
                "home.example.com",
                "vpn.example.com",
                "example.org",
                "nas.example.net"
            ]
        );
    }

    #[test]
    fn unreadable_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(Some(dir.path().join("missing.toml").as_path())).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server\nport = ").unwrap();
        let err = Config::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn debug_hides_token() {
        let config = Config::default()
            .with_env(env(&[("CF_API_TOKEN", "s3cr3t"), ("DDNS_HOSTNAMES", "example.com")]))
            .unwrap();
        assert!(!format!("{:?}", config).contains("s3cr3t"));
    }
}
