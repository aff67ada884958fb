//! EDNS Client Subnet derivation.
//!
//! Source addresses are validated textually. By default only the strict forms are accepted: an
//! IPv4 dotted-quad with four numeric octets, or an IPv6 address written as exactly eight
//! colon-separated hextets. Zero-compressed IPv6 (`::1`, `2001:db8::1`) is rejected unless
//! [`EcsConfig::accept_compressed_ipv6`] is set.
use crate::config::{EcsConfig, EcsPolicy};
use ipnetwork::{IpNetwork, Ipv4Network};
use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

const IPV4_PREFIX: u8 = 24;
const IPV6_PREFIX: u8 = 56;

#[derive(Debug, Clone)]
pub struct SubnetResolver {
    policy: EcsPolicy,
    default_subnet: String,
    accept_compressed_ipv6: bool,
    validate_explicit_subnet: bool,
}

impl SubnetResolver {
    pub fn new(config: &EcsConfig) -> Self {
        Self {
            policy: config.policy,
            default_subnet: config.default_subnet.clone(),
            accept_compressed_ipv6: config.accept_compressed_ipv6,
            validate_explicit_subnet: config.validate_explicit_subnet,
        }
    }

    /// Choose the `edns_client_subnet` value for the outgoing query, or `None` to let the
    /// upstream resolver apply its own default.
    pub fn resolve(&self, explicit: Option<&str>, source_addr: Option<&str>) -> Option<String> {
        match self.policy {
            EcsPolicy::FixedDefault => Some(self.default_subnet.clone()),
            EcsPolicy::PassThroughOnly => self.explicit(explicit),
            EcsPolicy::AddressDerived => self
                .explicit(explicit)
                .or_else(|| source_addr.and_then(|addr| self.derive(addr))),
        }
    }

    fn explicit(&self, explicit: Option<&str>) -> Option<String> {
        let explicit = explicit?;
        if self.validate_explicit_subnet && IpNetwork::from_str(explicit).is_err() {
            tracing::debug!("ignoring malformed edns_client_subnet \"{explicit}\"");
            return None;
        }
        Some(explicit.to_string())
    }

    fn derive(&self, addr: &str) -> Option<String> {
        if let Some(ip) = strict_ipv4(addr) {
            // NB: a /24 prefix is always valid for an IPv4 network.
            let network = Ipv4Network::new(ip, IPV4_PREFIX).ok()?.network();
            return Some(format!("{network}/{IPV4_PREFIX}"));
        }
        if let Some(hextets) = strict_ipv6_hextets(addr) {
            return Some(format!("{}::/{IPV6_PREFIX}", hextets[..4].join(":")));
        }
        if self.accept_compressed_ipv6 {
            if let Ok(ip) = Ipv6Addr::from_str(addr) {
                let s = ip.segments();
                return Some(format!(
                    "{:x}:{:x}:{:x}:{:x}::/{IPV6_PREFIX}",
                    s[0], s[1], s[2], s[3]
                ));
            }
        }
        tracing::debug!("no client subnet derivable from source address \"{addr}\"");
        None
    }
}

fn strict_ipv4(addr: &str) -> Option<Ipv4Addr> {
    let octets: Vec<&str> = addr.split('.').collect();
    if octets.len() != 4
        || !octets
            .iter()
            .all(|o| !o.is_empty() && o.len() <= 3 && o.bytes().all(|b| b.is_ascii_digit()))
    {
        return None;
    }
    Ipv4Addr::from_str(addr).ok()
}

fn strict_ipv6_hextets(addr: &str) -> Option<Vec<&str>> {
    let hextets: Vec<&str> = addr.split(':').collect();
    let well_formed = hextets.len() == 8
        && hextets
            .iter()
            .all(|h| !h.is_empty() && h.len() <= 4 && h.bytes().all(|b| b.is_ascii_hexdigit()));
    well_formed.then_some(hextets)
}
