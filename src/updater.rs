use std::sync::Arc;

use log::{debug, error, info, warn};
use serde::Deserialize;

use crate::address::{combine_ipv6, validate_ipv4, validate_ipv6};
use crate::error::UpdateError;
use crate::hostname::ZoneRecordPair;
use crate::provider::{DnsApi, DnsRecord, RecordType, RecordUpdate};

/// Addresses a client pushed with one update call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AddressRequest {
    #[serde(default)]
    pub ipv4: Option<String>,
    #[serde(default)]
    pub ipv6: Option<String>,
    #[serde(default, rename = "ipv6lanprefix")]
    pub ipv6_lan_prefix: Option<String>,
}

impl AddressRequest {
    /// Routers send `ipv6=` when they have no address; blank means absent.
    pub fn normalized(self) -> Self {
        fn present(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }

        Self {
            ipv4: present(self.ipv4),
            ipv6: present(self.ipv6),
            ipv6_lan_prefix: present(self.ipv6_lan_prefix),
        }
    }

    pub fn has_address(&self) -> bool {
        self.ipv4.is_some() || self.ipv6.is_some()
    }

    /// Full IPv6 address to publish, with the LAN prefix applied if given.
    pub fn ipv6_target(&self) -> Option<String> {
        self.ipv6
            .as_deref()
            .map(|suffix| combine_ipv6(self.ipv6_lan_prefix.as_deref(), suffix))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated { content: String },
    Skipped,
    Failed(UpdateError),
}

impl UpdateOutcome {
    pub fn is_updated(&self) -> bool {
        matches!(self, UpdateOutcome::Updated { .. })
    }
}

/// Per-type outcome of updating one zone/record pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordOutcomes {
    pub fqdn: String,
    pub a: UpdateOutcome,
    pub aaaa: UpdateOutcome,
}

impl RecordOutcomes {
    pub fn iter(&self) -> impl Iterator<Item = (RecordType, &UpdateOutcome)> {
        [(RecordType::A, &self.a), (RecordType::AAAA, &self.aaaa)].into_iter()
    }
}

/// Pushes addresses into existing A/AAAA records. Never creates records.
#[derive(Clone)]
pub struct DnsRecordUpdater {
    api: Arc<dyn DnsApi>,
}

impl DnsRecordUpdater {
    pub fn new(api: Arc<dyn DnsApi>) -> Self {
        Self { api }
    }

    /// Updates the A and/or AAAA record of `pair`.
    ///
    /// Returns `Err` only for failures shared by both record types: an
    /// unusable request (checked before any remote call), a missing zone,
    /// or a failed record lookup. Everything after that is reported per
    /// type, so a bad IPv4 address does not stop the AAAA update.
    pub async fn update(
        &self,
        pair: &ZoneRecordPair,
        request: &AddressRequest,
    ) -> Result<RecordOutcomes, UpdateError> {
        info!(
            "Request to update DNS records: zone={}, record={}, ipv4={:?}, ipv6={:?}, ipv6lanprefix={:?}",
            pair.zone, pair.record, request.ipv4, request.ipv6, request.ipv6_lan_prefix
        );

        if pair.zone.is_empty() || pair.record.is_empty() {
            return Err(UpdateError::InvalidRequest(
                "zone and record are required".to_string(),
            ));
        }
        if !request.has_address() {
            return Err(UpdateError::InvalidRequest(
                "at least one of ipv4 or ipv6 is required".to_string(),
            ));
        }

        let zone_id = self.zone_id(&pair.zone).await?;
        let fqdn = pair.fqdn();
        // One lookup serves both record types.
        let records = self.api.list_records(&zone_id, &fqdn).await?;

        let a = match request.ipv4.as_deref() {
            Some(ipv4) => {
                let content = validate_ipv4(ipv4).map(|ip| ip.to_string());
                self.apply(&zone_id, &fqdn, &records, RecordType::A, content)
                    .await
            }
            None => UpdateOutcome::Skipped,
        };

        let aaaa = match request.ipv6_target() {
            Some(ipv6) => {
                let content = validate_ipv6(&ipv6).map(|ip| ip.to_string());
                self.apply(&zone_id, &fqdn, &records, RecordType::AAAA, content)
                    .await
            }
            None => UpdateOutcome::Skipped,
        };

        Ok(RecordOutcomes { fqdn, a, aaaa })
    }

    /// First match wins; duplicate zones on the account are not detected.
    async fn zone_id(&self, zone: &str) -> Result<String, UpdateError> {
        let zones = self.api.list_zones(zone).await?;
        match zones.into_iter().next() {
            Some(found) => {
                debug!("Zone {} resolved to id {}", found.name, found.id);
                Ok(found.id)
            }
            None => {
                warn!("Zone not found: {}", zone);
                Err(UpdateError::ZoneNotFound(zone.to_string()))
            }
        }
    }

    async fn apply(
        &self,
        zone_id: &str,
        fqdn: &str,
        records: &[DnsRecord],
        record_type: RecordType,
        content: Result<String, UpdateError>,
    ) -> UpdateOutcome {
        let result = match content {
            Ok(content) => self.push(zone_id, fqdn, records, record_type, content).await,
            Err(err) => Err(err),
        };

        match result {
            Ok(content) => {
                info!("{} record {} updated to {}", record_type, fqdn, content);
                UpdateOutcome::Updated { content }
            }
            Err(err @ UpdateError::Internal(_)) => {
                error!("{} record {} update failed: {}", record_type, fqdn, err);
                UpdateOutcome::Failed(err)
            }
            Err(err) => {
                warn!("{} record {} not updated: {}", record_type, fqdn, err);
                UpdateOutcome::Failed(err)
            }
        }
    }

    async fn push(
        &self,
        zone_id: &str,
        fqdn: &str,
        records: &[DnsRecord],
        record_type: RecordType,
        content: String,
    ) -> Result<String, UpdateError> {
        let existing = records
            .iter()
            .find(|r| r.is_type(record_type))
            .ok_or_else(|| UpdateError::RecordNotFound {
                record_type: record_type.as_str(),
                fqdn: fqdn.to_string(),
            })?;

        let update = RecordUpdate {
            record_type,
            name: existing.name.clone(),
            content,
            ttl: existing.ttl,
            proxied: existing.proxied,
        };
        let updated = self
            .api
            .update_record(zone_id, &existing.id, &update)
            .await?;

        Ok(updated.content)
    }
}
