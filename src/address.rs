use std::net::{Ipv4Addr, Ipv6Addr};

use crate::error::UpdateError;

pub fn validate_ipv4(ip: &str) -> Result<Ipv4Addr, UpdateError> {
    ip.parse::<Ipv4Addr>().map_err(|_| UpdateError::InvalidAddress {
        value: ip.to_string(),
        family: "IPv4",
    })
}

pub fn validate_ipv6(ip: &str) -> Result<Ipv6Addr, UpdateError> {
    ip.parse::<Ipv6Addr>().map_err(|_| UpdateError::InvalidAddress {
        value: ip.to_string(),
        family: "IPv6",
    })
}

/// Joins the router's LAN prefix (e.g. `2001:db8:1:2::/64`) with the host
/// part it reported. Without a prefix the suffix is already the full address.
///
/// The result is not validated here; callers pass it to [`validate_ipv6`].
pub fn combine_ipv6(lan_prefix: Option<&str>, suffix: &str) -> String {
    let Some(lan_prefix) = lan_prefix else {
        return suffix.to_string();
    };

    let mut prefix = lan_prefix
        .split_once('/')
        .map_or(lan_prefix, |(prefix, _len)| prefix)
        .to_string();
    if !prefix.ends_with(':') && prefix.matches(':').count() < 7 {
        prefix.push(':');
    }

    if prefix.ends_with(':') {
        // Covers both `:` and `::` endings; one colon from the suffix is
        // dropped so `::` + `:1` never yields `:::`.
        match suffix.strip_prefix(':') {
            Some(rest) => format!("{}{}", prefix, rest),
            None => format!("{}{}", prefix, suffix),
        }
    } else {
        format!("{}:{}", prefix, suffix.trim_start_matches(':'))
    }
}
