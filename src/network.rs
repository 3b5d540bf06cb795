use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use ipnet::IpNet;
use thiserror::Error;
use tracing::debug;

/// IPv4 blocks shorter than /8 are refused instead of expanded.
pub const MAX_V4_HOST_BITS: u8 = 24;
/// IPv6 blocks wider than 2^20 addresses are refused instead of expanded.
pub const MAX_V6_HOST_BITS: u8 = 20;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CidrError {
    #[error("invalid CIDR notation: {0}")]
    Parse(String),
    #[error("CIDR block {cidr} spans 2^{host_bits} addresses, more than the 2^{limit} limit")]
    TooLarge { cidr: String, host_bits: u8, limit: u8 },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TargetError {
    #[error("empty target entry")]
    Empty,
    #[error(transparent)]
    Cidr(#[from] CidrError),
}

/// Outcome of resolving one configured target entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedTarget {
    Expanded { cidr: String, hosts: Vec<String> },
    Literal(String),
    Skipped { entry: String, error: TargetError },
}

/// Expands a CIDR block into its host addresses in ascending order.
///
/// The first and last addresses are dropped only when the block holds more
/// than two addresses, so /31 and /32 (/127 and /128 for IPv6) come back whole.
pub fn expand_cidr(cidr: &str) -> Result<Vec<String>, CidrError> {
    let network: IpNet = cidr
        .trim()
        .parse()
        .map_err(|_| CidrError::Parse(cidr.to_string()))?;

    let host_bits = network.max_prefix_len() - network.prefix_len();
    let limit = match network {
        IpNet::V4(_) => MAX_V4_HOST_BITS,
        IpNet::V6(_) => MAX_V6_HOST_BITS,
    };
    if host_bits > limit {
        return Err(CidrError::TooLarge {
            cidr: cidr.to_string(),
            host_bits,
            limit,
        });
    }

    let mut ips = Vec::with_capacity(1usize << host_bits);
    let mut addr = network.network();
    while network.contains(&addr) {
        ips.push(addr.to_string());
        match increment_addr(addr) {
            Some(next) => addr = next,
            None => break,
        }
    }

    if ips.len() > 2 {
        let last = ips.len() - 1;
        return Ok(ips.drain(1..last).collect());
    }
    Ok(ips)
}

/// Big-endian increment with carry. Returns `None` once the address wraps
/// past all-ones.
pub fn increment_addr(addr: IpAddr) -> Option<IpAddr> {
    match addr {
        IpAddr::V4(v4) => {
            let mut octets = v4.octets();
            if increment_octets(&mut octets) {
                Some(IpAddr::V4(Ipv4Addr::from(octets)))
            } else {
                None
            }
        }
        IpAddr::V6(v6) => {
            let mut octets = v6.octets();
            if increment_octets(&mut octets) {
                Some(IpAddr::V6(Ipv6Addr::from(octets)))
            } else {
                None
            }
        }
    }
}

fn increment_octets(octets: &mut [u8]) -> bool {
    for byte in octets.iter_mut().rev() {
        *byte = byte.wrapping_add(1);
        if *byte != 0 {
            return true;
        }
    }
    false
}

/// Classifies each configured target and expands the CIDR entries.
///
/// Anything containing a `/` is treated as CIDR; a CIDR entry that fails to
/// expand is reported as `Skipped` and the remaining entries still resolve.
pub fn resolve_targets<S: AsRef<str>>(entries: &[S]) -> Vec<ResolvedTarget> {
    entries.iter().map(|entry| resolve_target(entry.as_ref())).collect()
}

fn resolve_target(entry: &str) -> ResolvedTarget {
    let part = entry.trim();

    if part.is_empty() {
        return ResolvedTarget::Skipped {
            entry: entry.to_string(),
            error: TargetError::Empty,
        };
    }

    if !part.contains('/') {
        return ResolvedTarget::Literal(part.to_string());
    }

    match expand_cidr(part) {
        Ok(hosts) => {
            debug!(cidr = part, count = hosts.len(), "expanded CIDR block");
            ResolvedTarget::Expanded { cidr: part.to_string(), hosts }
        }
        Err(e) => {
            debug!(cidr = part, error = %e, "skipping CIDR entry");
            ResolvedTarget::Skipped { entry: part.to_string(), error: e.into() }
        }
    }
}

/// Flattens resolved entries into the ordered host list handed to the scanner.
pub fn collect_hosts(resolved: &[ResolvedTarget]) -> Vec<String> {
    let mut hosts = Vec::new();
    for target in resolved {
        match target {
            ResolvedTarget::Expanded { hosts: expanded, .. } => {
                hosts.extend(expanded.iter().cloned())
            }
            ResolvedTarget::Literal(host) => hosts.push(host.clone()),
            ResolvedTarget::Skipped { .. } => {}
        }
    }
    hosts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_cidr_drops_network_and_broadcast() {
        let ips = expand_cidr("192.168.1.0/30").unwrap();
        assert_eq!(ips, vec!["192.168.1.1", "192.168.1.2"]);
    }

    #[test]
    fn test_expand_cidr_24() {
        let ips = expand_cidr("10.1.2.0/24").unwrap();
        assert_eq!(ips.len(), 254);
        assert_eq!(ips.first().unwrap(), "10.1.2.1");
        assert_eq!(ips.last().unwrap(), "10.1.2.254");
    }

    #[test]
    fn test_expand_cidr_is_ascending() {
        let ips = expand_cidr("172.16.0.0/23").unwrap();
        let parsed: Vec<Ipv4Addr> = ips.iter().map(|ip| ip.parse().unwrap()).collect();
        assert!(parsed.windows(2).all(|w| u32::from(w[0]) + 1 == u32::from(w[1])));
        assert_eq!(ips.len(), 510);
        assert!(ips.contains(&"172.16.0.255".to_string()));
        assert!(ips.contains(&"172.16.1.0".to_string()));
    }

    #[test]
    fn test_expand_cidr_masks_host_bits() {
        let ips = expand_cidr("192.168.1.77/30").unwrap();
        assert_eq!(ips, vec!["192.168.1.77", "192.168.1.78"]);
    }

    #[test]
    fn test_expand_cidr_31_keeps_both() {
        let ips = expand_cidr("10.0.0.4/31").unwrap();
        assert_eq!(ips, vec!["10.0.0.4", "10.0.0.5"]);
    }

    #[test]
    fn test_expand_cidr_32_single() {
        let ips = expand_cidr("10.0.0.9/32").unwrap();
        assert_eq!(ips, vec!["10.0.0.9"]);
    }

    #[test]
    fn test_expand_cidr_top_of_space_terminates() {
        let ips = expand_cidr("255.255.255.252/30").unwrap();
        assert_eq!(ips, vec!["255.255.255.253", "255.255.255.254"]);

        let ips = expand_cidr("255.255.255.255/32").unwrap();
        assert_eq!(ips, vec!["255.255.255.255"]);
    }

    #[test]
    fn test_expand_cidr_ipv6() {
        let ips = expand_cidr("2001:db8::/126").unwrap();
        assert_eq!(ips, vec!["2001:db8::1", "2001:db8::2"]);

        let ips = expand_cidr("2001:db8::7/128").unwrap();
        assert_eq!(ips, vec!["2001:db8::7"]);
    }

    #[test]
    fn test_invalid_cidr() {
        assert_eq!(expand_cidr("not-a-cidr"), Err(CidrError::Parse("not-a-cidr".to_string())));
        assert!(matches!(expand_cidr("192.168.1.0/99"), Err(CidrError::Parse(_))));
        assert!(matches!(expand_cidr("192.168.1/24"), Err(CidrError::Parse(_))));
    }

    #[test]
    fn test_expand_cidr_wide_ipv4() {
        let ips = expand_cidr("10.0.0.0/11").unwrap();
        assert_eq!(ips.len(), (1 << 21) - 2);
        assert_eq!(ips.first().unwrap(), "10.0.0.1");
        assert_eq!(ips.last().unwrap(), "10.31.255.254");
    }

    #[test]
    fn test_oversized_cidr_rejected() {
        assert!(matches!(
            expand_cidr("10.0.0.0/7"),
            Err(CidrError::TooLarge { host_bits: 25, limit: 24, .. })
        ));
        assert!(matches!(expand_cidr("0.0.0.0/0"), Err(CidrError::TooLarge { .. })));
        assert!(matches!(
            expand_cidr("2001:db8::/64"),
            Err(CidrError::TooLarge { host_bits: 64, limit: 20, .. })
        ));
        assert_eq!(expand_cidr("2001:db8::/108").unwrap().len(), (1 << 20) - 2);
    }

    #[test]
    fn test_increment_carries() {
        let next = increment_addr("10.0.0.255".parse().unwrap()).unwrap();
        assert_eq!(next, "10.0.1.0".parse::<IpAddr>().unwrap());

        let next = increment_addr("10.255.255.255".parse().unwrap()).unwrap();
        assert_eq!(next, "11.0.0.0".parse::<IpAddr>().unwrap());

        let next = increment_addr("::ffff".parse().unwrap()).unwrap();
        assert_eq!(next, "::1:0".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn test_increment_wraps_at_all_ones() {
        assert_eq!(increment_addr("255.255.255.255".parse().unwrap()), None);
        let top: IpAddr = "ffff:ffff:ffff:ffff:ffff:ffff:ffff:ffff".parse().unwrap();
        assert_eq!(increment_addr(top), None);
    }

    #[test]
    fn test_resolve_mixed() {
        let resolved = resolve_targets(&["10.0.0.0/30", "example.com"]);
        assert_eq!(collect_hosts(&resolved), vec!["10.0.0.1", "10.0.0.2", "example.com"]);
        assert_eq!(resolved[1], ResolvedTarget::Literal("example.com".to_string()));
    }

    #[test]
    fn test_resolve_skips_bad_cidr_and_continues() {
        let resolved = resolve_targets(&["10.0.0.0/33", "192.168.0.8/31", "host.internal"]);
        assert!(matches!(
            &resolved[0],
            ResolvedTarget::Skipped {
                entry,
                error: TargetError::Cidr(CidrError::Parse(_)),
            } if entry == "10.0.0.0/33"
        ));
        assert_eq!(
            collect_hosts(&resolved),
            vec!["192.168.0.8", "192.168.0.9", "host.internal"]
        );
    }

    #[test]
    fn test_resolve_literal_ip_untouched() {
        let resolved = resolve_targets(&[" 192.168.1.1 ".to_string()]);
        assert_eq!(resolved, vec![ResolvedTarget::Literal("192.168.1.1".to_string())]);
    }

    #[test]
    fn test_resolve_empty_entry_skipped() {
        let resolved = resolve_targets(&["", "  "]);
        assert!(resolved.iter().all(|r| matches!(
            r,
            ResolvedTarget::Skipped { error: TargetError::Empty, .. }
        )));
        assert!(collect_hosts(&resolved).is_empty());
    }
}
