use crate::config::Config;
use crate::error::Error;
use axum::http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, COOKIE};
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use lazy_static::lazy_static;

pub const DNS_MESSAGE: &str = "application/dns-message";
pub const DNS_JSON: &str = "application/dns-json";

lazy_static! {
    /// Identity, origin and tracing headers that are never forwarded upstream.
    static ref MANDATORY_REMOVED_HEADERS: Vec<HeaderName> = vec![
        COOKIE,
        HeaderName::from_static("cf-connecting-ip"),
        HeaderName::from_static("x-forwarded-for"),
        HeaderName::from_static("x-real-ip"),
        HeaderName::from_static("cf-ray"),
        HeaderName::from_static("cf-request-id"),
        AUTHORIZATION,
    ];
}

/// Strips caller-identifying headers and picks the upstream `Accept` encoding.
#[derive(Debug, Clone)]
pub struct HeaderSanitizer {
    removed: Vec<HeaderName>,
}

impl HeaderSanitizer {
    pub fn new(config: &Config) -> Result<Self, Error> {
        let mut removed = MANDATORY_REMOVED_HEADERS.clone();
        for name in config.extra_removed_headers()? {
            if !removed.contains(&name) {
                removed.push(name);
            }
        }
        Ok(Self { removed })
    }

    pub fn sanitize(&self, incoming: &HeaderMap) -> HeaderMap {
        let mut headers = incoming.clone();
        for name in &self.removed {
            headers.remove(name);
        }
        let accept = match headers.get(CONTENT_TYPE) {
            Some(ct) if ct == DNS_MESSAGE => DNS_MESSAGE,
            _ => DNS_JSON,
        };
        headers.insert(ACCEPT, HeaderValue::from_static(accept));
        headers
    }
}
