use crate::doh::headers::{DNS_JSON, DNS_MESSAGE};
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    CONTENT_SECURITY_POLICY, CONTENT_TYPE, STRICT_TRANSPORT_SECURITY,
};
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use axum::response::Response;

pub const X_PROXY_SERVICE: HeaderName = HeaderName::from_static("x-proxy-service");
pub const X_EDNS_SUPPORTED: HeaderName = HeaderName::from_static("x-edns-supported");

/// Rewrites upstream response headers for clients. Status and body pass through untouched.
#[derive(Debug, Clone)]
pub struct ResponseAdapter {
    service: HeaderValue,
}

impl ResponseAdapter {
    pub fn new(service: HeaderValue) -> Self {
        Self { service }
    }

    pub fn adapt(&self, mut response: Response) -> Response {
        let headers = response.headers_mut();
        set_cors(headers);
        headers.insert(X_PROXY_SERVICE, self.service.clone());
        headers.insert(X_EDNS_SUPPORTED, HeaderValue::from_static("true"));

        let normalized = match headers.get(CONTENT_TYPE).and_then(|ct| ct.to_str().ok()) {
            Some(ct) if ct.contains("dns-message") => Some(DNS_MESSAGE),
            Some(ct) if ct.contains("json") => Some(DNS_JSON),
            _ => None,
        };
        if let Some(ct) = normalized {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(ct));
        }

        headers.remove(CONTENT_SECURITY_POLICY);
        headers.remove(STRICT_TRANSPORT_SECURITY);
        response
    }
}

/// Permissive CORS so browsers can query the proxy directly.
pub fn set_cors(headers: &mut HeaderMap) {
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
}
