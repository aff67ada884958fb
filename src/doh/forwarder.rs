//! Upstream forwarding.
//!
//! A [`Forwarder`] issues exactly one outbound request per client request. Failures are
//! returned as [`Error::Upstream`] and are never retried.
use crate::config::UpstreamConfig;
use crate::error::Error;
use axum::body::{boxed, Bytes, StreamBody};
use axum::http::header::{CONNECTION, CONTENT_LENGTH, HOST, TE, TRAILER, TRANSFER_ENCODING, UPGRADE};
use axum::http::{HeaderMap, HeaderName, Method};
use axum::response::Response;
use lazy_static::lazy_static;
use std::sync::Arc;
use url::Url;

lazy_static! {
    /// Headers describing the inbound connection rather than the message. The HTTP client
    /// sets its own for the outbound hop.
    static ref HOP_HEADERS: Vec<HeaderName> = vec![
        HOST,
        CONTENT_LENGTH,
        TRANSFER_ENCODING,
        CONNECTION,
        HeaderName::from_static("keep-alive"),
        HeaderName::from_static("proxy-connection"),
        UPGRADE,
        TE,
        TRAILER,
    ];
}

/// `DynForwarder` is a type alias for a [`Forwarder`] shared between concurrent requests.
pub type DynForwarder = Arc<dyn Forwarder + Send + Sync>;

/// A request ready to be sent to the upstream resolver.
#[derive(Debug, Clone)]
pub struct ProxyRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Bytes,
}

#[async_trait::async_trait]
pub trait Forwarder {
    /// Send `request` upstream, returning the response with its body still streaming.
    async fn forward(&self, request: ProxyRequest) -> Result<Response, Error>;
}

/// The production [`Forwarder`], backed by a [`reqwest::Client`] that follows redirects and
/// enforces the configured deadline.
#[derive(Debug, Clone)]
pub struct HttpForwarder {
    client: reqwest::Client,
}

impl HttpForwarder {
    pub fn new(config: &UpstreamConfig) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()
            .map_err(Error::ClientBuild)?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl Forwarder for HttpForwarder {
    async fn forward(&self, request: ProxyRequest) -> Result<Response, Error> {
        let ProxyRequest {
            method,
            url,
            mut headers,
            body,
        } = request;
        for name in HOP_HEADERS.iter() {
            headers.remove(name);
        }

        let mut outbound = self.client.request(method.clone(), url).headers(headers);
        if method != Method::GET && method != Method::HEAD {
            outbound = outbound.body(body);
        }
        let upstream = outbound.send().await.map_err(Error::Upstream)?;

        let mut builder = Response::builder().status(upstream.status());
        if let Some(headers) = builder.headers_mut() {
            for (name, value) in upstream.headers() {
                if !HOP_HEADERS.contains(name) {
                    headers.append(name, value.clone());
                }
            }
        }
        let body = boxed(StreamBody::new(upstream.bytes_stream()));
        Ok(builder.body(body)?)
    }
}
