use crate::error::UpdateError;

pub const APEX: &str = "@";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneRecordPair {
    pub zone: String,
    pub record: String,
}

impl ZoneRecordPair {
    /// Name the records carry at Cloudflare.
    pub fn fqdn(&self) -> String {
        if self.record == APEX {
            self.zone.clone()
        } else {
            format!("{}.{}", self.record, self.zone)
        }
    }
}

/// Splits `sub.example.com` into zone `example.com` and record `sub`.
///
/// The zone is always the last two labels, so multi-label public suffixes
/// such as `co.uk` are not recognised. A hostname equal to its zone maps
/// to the apex record `@`. No DNS lookup is involved.
pub fn resolve(hostname: &str) -> Result<ZoneRecordPair, UpdateError> {
    let name = hostname.trim();
    let name = name.strip_suffix('.').unwrap_or(name);

    let labels: Vec<&str> = name.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|label| label.is_empty()) {
        return Err(UpdateError::InvalidHostname(hostname.to_string()));
    }

    let zone = labels[labels.len() - 2..].join(".");
    let record = if name == zone {
        APEX.to_string()
    } else {
        name[..name.len() - zone.len() - 1].to_string()
    };

    Ok(ZoneRecordPair { zone, record })
}
