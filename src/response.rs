use axum::http::StatusCode;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::UpdateError;
use crate::hostname::{self, ZoneRecordPair};
use crate::provider::RecordType;
use crate::updater::{AddressRequest, DnsRecordUpdater, UpdateOutcome};

/// How `/update` answers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseMode {
    /// JSON report listing every record result and error.
    #[default]
    Json,
    /// One plain-text DynDNS token, as router firmware expects.
    #[serde(alias = "legacy", alias = "text")]
    Dyndns,
}

impl std::str::FromStr for ResponseMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(ResponseMode::Json),
            "dyndns" | "legacy" | "text" => Ok(ResponseMode::Dyndns),
            other => Err(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Success,
    Partial,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordResult {
    pub hostname: String,
    pub zone: String,
    pub record: String,
    #[serde(rename = "type")]
    pub record_type: RecordType,
    pub content: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordError {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub record_type: Option<RecordType>,
    pub kind: &'static str,
    pub message: String,
    #[serde(skip)]
    status: StatusCode,
}

impl RecordError {
    fn new(
        hostname: Option<&str>,
        pair: Option<&ZoneRecordPair>,
        record_type: Option<RecordType>,
        err: &UpdateError,
    ) -> Self {
        Self {
            hostname: hostname.map(str::to_string),
            zone: pair.map(|p| p.zone.clone()),
            record: pair.map(|p| p.record.clone()),
            record_type,
            kind: err.kind(),
            message: err.to_string(),
            status: err.status_code(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateReport {
    pub status: ReportStatus,
    pub results: Vec<RecordResult>,
    pub errors: Vec<RecordError>,
}

impl UpdateReport {
    /// Report for a request rejected before any hostname was touched.
    pub fn rejected(err: &UpdateError) -> (StatusCode, Self) {
        let report = Self {
            status: ReportStatus::Error,
            results: Vec::new(),
            errors: vec![RecordError::new(None, None, None, err)],
        };
        (err.status_code(), report)
    }

    fn finish(results: Vec<RecordResult>, errors: Vec<RecordError>) -> (StatusCode, Self) {
        let (status, code) = if errors.is_empty() {
            (ReportStatus::Success, StatusCode::OK)
        } else if !results.is_empty() {
            (ReportStatus::Partial, StatusCode::MULTI_STATUS)
        } else {
            let code = errors
                .iter()
                .map(|e| e.status)
                .max_by_key(|s| s.as_u16())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (ReportStatus::Error, code)
        };

        (
            code,
            Self {
                status,
                results,
                errors,
            },
        )
    }
}

/// Updates every configured hostname and reports each record separately.
/// One failing hostname never stops the others.
pub async fn structured(
    updater: &DnsRecordUpdater,
    hostnames: &[String],
    request: &AddressRequest,
) -> (StatusCode, UpdateReport) {
    if !request.has_address() {
        let err = UpdateError::InvalidRequest(
            "Missing 'ipv4' or 'ipv6' parameter".to_string(),
        );
        warn!("Update request rejected: {}", err);
        return UpdateReport::rejected(&err);
    }

    let mut results = Vec::new();
    let mut errors = Vec::new();

    for hostname in hostnames {
        let pair = match hostname::resolve(hostname) {
            Ok(pair) => pair,
            Err(err) => {
                warn!("Skipping configured hostname: {}", err);
                errors.push(RecordError::new(Some(hostname.as_str()), None, None, &err));
                continue;
            }
        };

        let outcomes = match updater.update(&pair, request).await {
            Ok(outcomes) => outcomes,
            Err(err) => {
                errors.push(RecordError::new(Some(hostname.as_str()), Some(&pair), None, &err));
                continue;
            }
        };

        for (record_type, outcome) in outcomes.iter() {
            match outcome {
                UpdateOutcome::Updated { content } => results.push(RecordResult {
                    hostname: hostname.clone(),
                    zone: pair.zone.clone(),
                    record: pair.record.clone(),
                    record_type,
                    content: content.clone(),
                    message: format!(
                        "{} record {} updated to {}",
                        record_type, outcomes.fqdn, content
                    ),
                }),
                UpdateOutcome::Failed(err) => errors.push(RecordError::new(
                    Some(hostname.as_str()),
                    Some(&pair),
                    Some(record_type),
                    err,
                )),
                UpdateOutcome::Skipped => {}
            }
        }
    }

    UpdateReport::finish(results, errors)
}

/// Plain-text DynDNS return codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DynDnsToken {
    Good,
    NoChange,
    NoHost,
    BadAgent,
    ServerError,
}

impl DynDnsToken {
    pub fn as_str(self) -> &'static str {
        match self {
            DynDnsToken::Good => "good",
            DynDnsToken::NoChange => "nochg",
            DynDnsToken::NoHost => "nohost",
            DynDnsToken::BadAgent => "badagent",
            DynDnsToken::ServerError => "911",
        }
    }

    fn for_error(err: &UpdateError) -> Self {
        match err {
            UpdateError::InvalidHostname(_)
            | UpdateError::ZoneNotFound(_)
            | UpdateError::RecordNotFound { .. } => DynDnsToken::NoHost,
            UpdateError::InvalidAddress { .. } => DynDnsToken::BadAgent,
            UpdateError::InvalidRequest(_) | UpdateError::Internal(_) => DynDnsToken::ServerError,
        }
    }
}

/// Collapses the batch into one token. Stops at the first hostname that
/// fails; hostnames after it are not attempted.
pub async fn legacy(
    updater: &DnsRecordUpdater,
    hostnames: &[String],
    request: &AddressRequest,
) -> DynDnsToken {
    let mut attempted = false;
    let mut updated = false;

    for hostname in hostnames {
        // Structure is checked before the request so a broken entry is
        // always reported as `nohost`.
        let pair = match hostname::resolve(hostname) {
            Ok(pair) => pair,
            Err(err) => {
                warn!("{}", err);
                return DynDnsToken::NoHost;
            }
        };

        let outcomes = match updater.update(&pair, request).await {
            Ok(outcomes) => outcomes,
            Err(err) => {
                warn!("Update of {} failed: {}", hostname, err);
                return DynDnsToken::for_error(&err);
            }
        };

        for (_, outcome) in outcomes.iter() {
            if let UpdateOutcome::Failed(err) = outcome {
                return DynDnsToken::for_error(err);
            }
            updated |= outcome.is_updated();
        }
        attempted = true;
    }

    if updated {
        DynDnsToken::Good
    } else if attempted {
        DynDnsToken::NoChange
    } else {
        DynDnsToken::ServerError
    }
}
