//! In-memory `DnsApi` used by the tests. Counts every remote call.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;

use super::{DnsApi, DnsRecord, RecordUpdate, Zone};

#[derive(Default)]
pub struct StubDnsApi {
    zones: Vec<Zone>,
    records: Mutex<Vec<(String, DnsRecord)>>,
    updates: Mutex<Vec<(String, String, RecordUpdate)>>,
    calls: AtomicUsize,
    fail_record_list: bool,
    fail_updates_for: Option<&'static str>,
}

impl StubDnsApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_zone(mut self, id: &str, name: &str) -> Self {
        self.zones.push(Zone {
            id: id.to_string(),
            name: name.to_string(),
        });
        self
    }

    #[allow(clippy::too_many_arguments)]
    pub fn with_record(
        self,
        zone_id: &str,
        id: &str,
        record_type: &str,
        name: &str,
        content: &str,
        ttl: u32,
        proxied: bool,
    ) -> Self {
        self.records.lock().unwrap().push((
            zone_id.to_string(),
            DnsRecord {
                id: id.to_string(),
                record_type: record_type.to_string(),
                name: name.to_string(),
                content: content.to_string(),
                ttl,
                proxied,
            },
        ));
        self
    }

    pub fn failing_record_list(mut self) -> Self {
        self.fail_record_list = true;
        self
    }

    /// Makes every update of the given record type fail.
    pub fn failing_updates_for(mut self, record_type: &'static str) -> Self {
        self.fail_updates_for = Some(record_type);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// `(zone_id, record_id, body)` of every successful update, in order.
    pub fn updates(&self) -> Vec<(String, String, RecordUpdate)> {
        self.updates.lock().unwrap().clone()
    }

    pub fn content_of(&self, record_id: &str) -> Option<String> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|(_, r)| r.id == record_id)
            .map(|(_, r)| r.content.clone())
    }
}

#[async_trait]
impl DnsApi for StubDnsApi {
    async fn list_zones(&self, name: &str) -> Result<Vec<Zone>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.zones.iter().filter(|z| z.name == name).cloned().collect())
    }

    async fn list_records(&self, zone_id: &str, fqdn: &str) -> Result<Vec<DnsRecord>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_record_list {
            anyhow::bail!("Cloudflare API error: 10000: Authentication error");
        }
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|(zone, r)| zone == zone_id && r.name == fqdn)
            .map(|(_, r)| r.clone())
            .collect())
    }

    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        update: &RecordUpdate,
    ) -> Result<DnsRecord> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_updates_for == Some(update.record_type.as_str()) {
            anyhow::bail!("Cloudflare API error: 81057: Record already exists");
        }

        let mut records = self.records.lock().unwrap();
        let (_, record) = records
            .iter_mut()
            .find(|(zone, r)| zone == zone_id && r.id == record_id)
            .ok_or_else(|| anyhow::anyhow!("Cloudflare API error: 81044: Record does not exist"))?;
        record.content = update.content.clone();
        record.ttl = update.ttl;
        record.proxied = update.proxied;
        let updated = record.clone();
        drop(records);

        self.updates.lock().unwrap().push((
            zone_id.to_string(),
            record_id.to_string(),
            update.clone(),
        ));
        Ok(updated)
    }
}
