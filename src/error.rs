use std::path::PathBuf;

use axum::http::StatusCode;
use thiserror::Error;

/// Failure of a single update step, folded into the response per hostname
/// and per record type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpdateError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("'{value}' is not a valid {family} address")]
    InvalidAddress { value: String, family: &'static str },

    #[error("'{0}' is not a valid hostname, expected at least two labels")]
    InvalidHostname(String),

    #[error("Zone '{0}' not found")]
    ZoneNotFound(String),

    #[error("{record_type} record '{fqdn}' not found in zone")]
    RecordNotFound { record_type: &'static str, fqdn: String },

    #[error("Unexpected remote API failure: {0}")]
    Internal(String),
}

impl UpdateError {
    pub fn kind(&self) -> &'static str {
        match self {
            UpdateError::InvalidRequest(_) => "invalid_request",
            UpdateError::InvalidAddress { .. } => "invalid_address",
            UpdateError::InvalidHostname(_) => "invalid_hostname",
            UpdateError::ZoneNotFound(_) => "zone_not_found",
            UpdateError::RecordNotFound { .. } => "record_not_found",
            UpdateError::Internal(_) => "internal_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            UpdateError::InvalidRequest(_) | UpdateError::InvalidAddress { .. } => {
                StatusCode::BAD_REQUEST
            }
            UpdateError::InvalidHostname(_)
            | UpdateError::ZoneNotFound(_)
            | UpdateError::RecordNotFound { .. } => StatusCode::NOT_FOUND,
            UpdateError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<anyhow::Error> for UpdateError {
    fn from(err: anyhow::Error) -> Self {
        UpdateError::Internal(format!("{:#}", err))
    }
}

/// Startup configuration failure. Reported by `main`, never acted on here.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("CF_API_TOKEN is not set")]
    MissingApiToken,

    #[error("No hostnames configured (set DDNS_HOSTNAMES or cloudflare.hostnames)")]
    NoHostnames,

    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },
}
