pub mod cloudflare;
#[cfg(test)]
pub mod stub;

use std::fmt;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RecordType {
    A,
    AAAA,
}

impl RecordType {
    pub fn as_str(self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::AAAA => "AAAA",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Zone {
    pub id: String,
    pub name: String,
}

/// A record as listed by the remote API. Listing by name returns every
/// type, so `record_type` stays a plain string.
#[derive(Debug, Clone, Deserialize)]
pub struct DnsRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub name: String,
    pub content: String,
    #[serde(default = "default_ttl")]
    pub ttl: u32,
    #[serde(default)]
    pub proxied: bool,
}

impl DnsRecord {
    pub fn is_type(&self, record_type: RecordType) -> bool {
        self.record_type == record_type.as_str()
    }
}

// Cloudflare's "automatic" TTL
fn default_ttl() -> u32 {
    1
}

/// Body of an update call. `ttl` and `proxied` are echoed from the
/// existing record; only `content` changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordUpdate {
    #[serde(rename = "type")]
    pub record_type: RecordType,
    pub name: String,
    pub content: String,
    pub ttl: u32,
    pub proxied: bool,
}

/// The three remote operations the updater needs.
#[async_trait]
pub trait DnsApi: Send + Sync {
    async fn list_zones(&self, name: &str) -> Result<Vec<Zone>>;

    async fn list_records(&self, zone_id: &str, fqdn: &str) -> Result<Vec<DnsRecord>>;

    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        update: &RecordUpdate,
    ) -> Result<DnsRecord>;
}
