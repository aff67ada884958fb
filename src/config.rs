use crate::error::Error;
use axum::http::{HeaderName, HeaderValue};
use ipnetwork::IpNetwork;
use lazy_static::lazy_static;
use serde::Deserialize;
use serde_with::{serde_as, DurationSeconds};
use std::fs::File;
use std::io::BufReader;
use std::net::SocketAddr;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

pub type SharedConfig = Arc<Config>;

lazy_static! {
    static ref GOOGLE_DOH_ENDPOINT: Url = Url::parse("https://dns.google/dns-query").unwrap();
}

#[serde_as]
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub path: String,
    #[serde_as(as = "DurationSeconds<u64>")]
    pub api_timeout: Duration,
    pub upstream: UpstreamConfig,
    pub ecs: EcsConfig,
    pub extra_removed_headers: Vec<String>,
    pub service_name: String,
    pub error_prefix: String,
}

#[serde_as]
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct UpstreamConfig {
    pub url: Url,
    #[serde_as(as = "DurationSeconds<u64>")]
    pub timeout: Duration,
    pub max_redirects: usize,
}

/// Selects how the `edns_client_subnet` parameter of the outgoing query is chosen. The
/// policies are mutually exclusive.
#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EcsPolicy {
    /// Use the caller's explicit `edns_client_subnet` if present, otherwise derive one from the
    /// caller's source address, otherwise send none.
    #[default]
    AddressDerived,
    /// Always send [`EcsConfig::default_subnet`], hiding every caller behind one subnet.
    FixedDefault,
    /// Forward the caller's explicit `edns_client_subnet` if present, never derive one.
    PassThroughOnly,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct EcsConfig {
    pub policy: EcsPolicy,
    pub default_subnet: String,
    pub client_ip_header: Option<String>,
    pub accept_compressed_ipv6: bool,
    pub validate_explicit_subnet: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8053)),
            path: "/google".to_string(),
            api_timeout: Duration::from_secs(30),
            upstream: UpstreamConfig::default(),
            ecs: EcsConfig::default(),
            extra_removed_headers: Vec::default(),
            service_name: "DoH-ECS-Proxy".to_string(),
            error_prefix: "DNS Proxy Error".to_string(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: GOOGLE_DOH_ENDPOINT.clone(),
            timeout: Duration::from_secs(10),
            max_redirects: 10,
        }
    }
}

impl Default for EcsConfig {
    fn default() -> Self {
        Self {
            policy: EcsPolicy::default(),
            default_subnet: "119.6.6.0/24".to_string(),
            client_ip_header: None,
            accept_compressed_ipv6: false,
            validate_explicit_subnet: false,
        }
    }
}

impl Config {
    pub fn try_from_file(p: impl AsRef<Path>) -> Result<Self, Error> {
        let f = File::open(p)?;
        let reader = BufReader::new(f);
        let conf: Config = serde_json::from_reader(reader)?;
        conf.validate()?;
        Ok(conf)
    }

    /// Check the invariants serde can't express.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUpstreamScheme`], [`Error::InvalidDefaultSubnet`],
    /// [`Error::InvalidPath`], [`Error::InvalidHeaderName`] or [`Error::InvalidServiceName`] for the
    /// first invalid setting found.
    pub fn validate(&self) -> Result<(), Error> {
        match self.upstream.url.scheme() {
            "http" | "https" => {}
            scheme => return Err(Error::InvalidUpstreamScheme(scheme.to_string())),
        }
        if let Err(err) = IpNetwork::from_str(&self.ecs.default_subnet) {
            return Err(Error::InvalidDefaultSubnet(
                self.ecs.default_subnet.clone(),
                err,
            ));
        }
        if !self.path.starts_with('/') || self.path.trim_end_matches('/').is_empty() {
            return Err(Error::InvalidPath(self.path.clone()));
        }
        self.client_ip_header()?;
        self.extra_removed_headers()?;
        self.service_name()?;
        Ok(())
    }

    /// The `X-Proxy-Service` header value.
    pub fn service_name(&self) -> Result<HeaderValue, Error> {
        HeaderValue::from_str(&self.service_name)
            .map_err(|_| Error::InvalidServiceName(self.service_name.clone()))
    }

    pub fn client_ip_header(&self) -> Result<Option<HeaderName>, Error> {
        self.ecs
            .client_ip_header
            .as_deref()
            .map(parse_header_name)
            .transpose()
    }

    pub fn extra_removed_headers(&self) -> Result<Vec<HeaderName>, Error> {
        self.extra_removed_headers
            .iter()
            .map(|name| parse_header_name(name))
            .collect()
    }

    /// The mount path without any trailing slash.
    pub fn mount_path(&self) -> &str {
        self.path.trim_end_matches('/')
    }
}

fn parse_header_name(name: &str) -> Result<HeaderName, Error> {
    HeaderName::from_str(name).map_err(|_| Error::InvalidHeaderName(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let conf: Config = serde_json::from_str("{}").unwrap();
        assert!(conf.validate().is_ok());
        assert_eq!(conf.upstream.url.as_str(), "https://dns.google/dns-query");
        assert_eq!(conf.ecs.policy, EcsPolicy::AddressDerived);
        assert_eq!(conf.ecs.default_subnet, "119.6.6.0/24");
        assert_eq!(conf.upstream.timeout, Duration::from_secs(10));
        assert_eq!(conf.mount_path(), "/google");
    }

    #[test]
    fn parses_full_config() {
        let conf: Config = serde_json::from_str(
            r#"{
                "bind_addr": "0.0.0.0:8080",
                "path": "/cn/google/",
                "api_timeout": 5,
                "upstream": { "url": "https://cloudflare-dns.com/dns-query", "timeout": 3 },
                "ecs": {
                    "policy": "fixed_default",
                    "default_subnet": "203.0.113.0/24",
                    "client_ip_header": "CF-Connecting-IP"
                },
                "extra_removed_headers": ["x-debug-token"],
                "service_name": "test"
            }"#,
        )
        .unwrap();
        assert!(conf.validate().is_ok());
        assert_eq!(conf.mount_path(), "/cn/google");
        assert_eq!(conf.ecs.policy, EcsPolicy::FixedDefault);
        assert_eq!(conf.upstream.timeout, Duration::from_secs(3));
        assert_eq!(conf.upstream.max_redirects, 10);
        assert_eq!(
            conf.client_ip_header().unwrap(),
            Some(HeaderName::from_static("cf-connecting-ip"))
        );
        assert_eq!(conf.error_prefix, "DNS Proxy Error");
    }

    #[test]
    fn rejects_invalid_settings() {
        let mut conf = Config::default();
        conf.upstream.url = Url::parse("ftp://example.com/").unwrap();
        assert!(matches!(
            conf.validate(),
            Err(Error::InvalidUpstreamScheme(s)) if s == "ftp"
        ));

        let mut conf = Config::default();
        conf.ecs.default_subnet = "119.6.6.0/33".to_string();
        assert!(matches!(
            conf.validate(),
            Err(Error::InvalidDefaultSubnet(..))
        ));

        let mut conf = Config::default();
        conf.path = "/".to_string();
        assert!(matches!(conf.validate(), Err(Error::InvalidPath(_))));

        let mut conf = Config::default();
        conf.extra_removed_headers = vec!["bad header".to_string()];
        assert!(matches!(conf.validate(), Err(Error::InvalidHeaderName(_))));

        let mut conf = Config::default();
        conf.service_name = "proxy\nX-Injected: 1".to_string();
        assert!(matches!(
            conf.validate(),
            Err(Error::InvalidServiceName(s)) if s.starts_with("proxy")
        ));
    }
}
