use std::fmt;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{DnsApi, DnsRecord, RecordUpdate, Zone};

pub const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Cloudflare API v4 client. Uses reqwest's default timeouts and never
/// retries; a failed call surfaces as an error for the caller to report.
pub struct CloudflareClient {
    client: Client,
    api_base: String,
    api_token: String,
}

impl fmt::Debug for CloudflareClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudflareClient")
            .field("api_base", &self.api_base)
            .field("api_token", &"<REDACTED>")
            .finish()
    }
}

impl CloudflareClient {
    pub fn new(api_base: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            api_token: api_token.into(),
        }
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("Authorization", format!("Bearer {}", self.api_token))
            .header("Content-Type", "application/json")
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder, action: &str) -> Result<T> {
        let response: CloudflareResponse<T> = self
            .authorized(request)
            .send()
            .await
            .with_context(|| format!("Failed to send {} request to Cloudflare", action))?
            .json()
            .await
            .with_context(|| format!("Failed to parse Cloudflare {} response", action))?;

        response.into_result(action)
    }
}

#[async_trait]
impl DnsApi for CloudflareClient {
    async fn list_zones(&self, name: &str) -> Result<Vec<Zone>> {
        let url = format!("{}/zones", self.api_base);
        let request = self.client.get(&url).query(&[("name", name)]);
        self.send(request, "zone list").await
    }

    async fn list_records(&self, zone_id: &str, fqdn: &str) -> Result<Vec<DnsRecord>> {
        let url = format!("{}/zones/{}/dns_records", self.api_base, zone_id);
        let request = self.client.get(&url).query(&[("name", fqdn)]);
        self.send(request, "record list").await
    }

    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        update: &RecordUpdate,
    ) -> Result<DnsRecord> {
        let url = format!(
            "{}/zones/{}/dns_records/{}",
            self.api_base, zone_id, record_id
        );
        let request = self.client.put(&url).json(update);
        self.send(request, "update").await
    }
}

// Cloudflare API envelope

#[derive(Debug, Deserialize)]
struct CloudflareResponse<T> {
    success: bool,
    #[serde(default)]
    errors: Vec<CloudflareError>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct CloudflareError {
    code: i32,
    message: String,
}

impl<T> CloudflareResponse<T> {
    fn into_result(self, action: &str) -> Result<T> {
        if !self.success {
            let errors: Vec<String> = self
                .errors
                .iter()
                .map(|e| format!("{}: {}", e.code, e.message))
                .collect();
            anyhow::bail!("Cloudflare API error: {}", errors.join(", "));
        }

        self.result
            .ok_or_else(|| anyhow::anyhow!("No result in Cloudflare {} response", action))
    }
}
