//! Query parameter translation.
//!
//! Only the safelisted parameters are read from the caller's query string and only those are
//! ever written to the upstream URL. Everything else is dropped.
use url::{form_urlencoded, Url};

pub const PARAM_DNS: &str = "dns";
pub const PARAM_NAME: &str = "name";
pub const PARAM_TYPE: &str = "type";
pub const PARAM_CD: &str = "cd";
pub const PARAM_DO: &str = "do";
pub const PARAM_ECS: &str = "edns_client_subnet";

/// The recognized parameters of a client request. Where a parameter is repeated the first
/// occurrence wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncomingQuery {
    pub dns: Option<String>,
    pub name: Option<String>,
    pub record_type: Option<String>,
    pub cd: Option<String>,
    pub dnssec_ok: Option<String>,
    pub edns_client_subnet: Option<String>,
}

impl IncomingQuery {
    pub fn parse(raw: Option<&str>) -> Self {
        let mut query = Self::default();
        let Some(raw) = raw else {
            return query;
        };
        for (key, value) in form_urlencoded::parse(raw.as_bytes()) {
            let slot = match key.as_ref() {
                PARAM_DNS => &mut query.dns,
                PARAM_NAME => &mut query.name,
                PARAM_TYPE => &mut query.record_type,
                PARAM_CD => &mut query.cd,
                PARAM_DO => &mut query.dnssec_ok,
                PARAM_ECS => &mut query.edns_client_subnet,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }
        query
    }
}

/// The parameter set sent upstream, in insertion order with set-semantics per key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutgoingQuery {
    params: Vec<(&'static str, String)>,
}

impl OutgoingQuery {
    /// Map `incoming` onto the upstream parameter set, merging `subnet` last.
    pub fn translate(incoming: &IncomingQuery, subnet: Option<String>) -> Self {
        let mut out = Self::default();
        if let Some(dns) = &incoming.dns {
            out.set(PARAM_DNS, dns.clone());
        }
        if let (Some(name), Some(record_type)) = (&incoming.name, &incoming.record_type) {
            out.set(PARAM_NAME, name.clone());
            out.set(PARAM_TYPE, record_type.clone());
            if let Some(cd) = &incoming.cd {
                out.set(PARAM_CD, cd.clone());
            }
            if let Some(dnssec_ok) = &incoming.dnssec_ok {
                out.set(PARAM_DO, dnssec_ok.clone());
            }
        }
        if let Some(subnet) = subnet {
            out.set(PARAM_ECS, subnet);
        }
        out
    }

    pub fn set(&mut self, key: &'static str, value: String) {
        match self.params.iter_mut().find(|(k, _)| *k == key) {
            Some((_, v)) => *v = value,
            None => self.params.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Build the upstream request URL. Parameters already present on `upstream` are kept unless
    /// this query sets the same key.
    pub fn to_url(&self, upstream: &Url) -> Url {
        let mut url = upstream.clone();
        let kept: Vec<(String, String)> = upstream
            .query_pairs()
            .filter(|(k, _)| self.get(k).is_none())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        url.set_query(None);
        if kept.is_empty() && self.is_empty() {
            return url;
        }
        url.query_pairs_mut()
            .extend_pairs(kept)
            .extend_pairs(self.params.iter().map(|(k, v)| (*k, v.as_str())));
        url
    }
}
