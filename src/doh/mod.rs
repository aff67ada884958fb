//! DNS-over-HTTPS forwarding pipeline.
//!
//! Each inbound request runs through the same linear pipeline, with no state shared between
//! requests:
//!
//! 1. [`SubnetResolver`] picks the EDNS Client Subnet value, per the configured
//!    [`EcsPolicy`][crate::config::EcsPolicy].
//! 2. [`OutgoingQuery::translate`] copies the safelisted parameters (`dns`, or `name`/`type`
//!    with optional `cd`/`do`) and merges the subnet as `edns_client_subnet`.
//! 3. [`HeaderSanitizer`] strips identity headers and sets `Accept` to match the caller's
//!    encoding.
//! 4. A [`Forwarder`] performs the single upstream call.
//! 5. [`ResponseAdapter`] adds CORS and marker headers and normalizes the `Content-Type`, while
//!    the body streams through untouched.
//!
//! E.g. with the default config, a client request of:
//!
//! ```text
//! GET /google/?name=example.com&type=A&evil=1     (from 203.0.113.77)
//! ```
//!
//! is forwarded as:
//!
//! ```text
//! GET https://dns.google/dns-query?name=example.com&type=A&edns_client_subnet=203.0.113.0%2F24
//! Accept: application/dns-json
//! ```

pub mod forwarder;
pub mod headers;
pub mod query;
pub mod response;
pub mod subnet;

use crate::config::SharedConfig;
use crate::error::Error;
use axum::body::Bytes;
use axum::http::{HeaderMap, HeaderName, Method};
use axum::response::Response;
use std::net::IpAddr;
use url::Url;

pub use forwarder::{DynForwarder, Forwarder, HttpForwarder, ProxyRequest};
pub use headers::HeaderSanitizer;
pub use query::{IncomingQuery, OutgoingQuery};
pub use response::ResponseAdapter;
pub use subnet::SubnetResolver;

/// An inbound client request, as seen by the proxy.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub method: Method,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub peer: Option<IpAddr>,
}

#[derive(Clone)]
pub struct Proxy {
    upstream: Url,
    client_ip_header: Option<HeaderName>,
    subnets: SubnetResolver,
    sanitizer: HeaderSanitizer,
    adapter: ResponseAdapter,
    forwarder: DynForwarder,
}

impl Proxy {
    pub fn new(config: &SharedConfig, forwarder: DynForwarder) -> Result<Self, Error> {
        Ok(Self {
            upstream: config.upstream.url.clone(),
            client_ip_header: config.client_ip_header()?,
            subnets: SubnetResolver::new(&config.ecs),
            sanitizer: HeaderSanitizer::new(config)?,
            adapter: ResponseAdapter::new(config.service_name()?),
            forwarder,
        })
    }

    /// Build the request that would be sent upstream for `request`.
    pub fn prepare(&self, request: InboundRequest) -> ProxyRequest {
        let incoming = IncomingQuery::parse(request.query.as_deref());
        let source_addr = self.source_addr(&request.headers, request.peer);
        let subnet = self.subnets.resolve(
            incoming.edns_client_subnet.as_deref(),
            source_addr.as_deref(),
        );
        tracing::debug!(
            "source address {:?} resolved to client subnet {:?}",
            source_addr,
            subnet
        );
        let url = OutgoingQuery::translate(&incoming, subnet).to_url(&self.upstream);
        ProxyRequest {
            method: request.method,
            url,
            headers: self.sanitizer.sanitize(&request.headers),
            body: request.body,
        }
    }

    /// Forward `request` upstream and adapt the response for the client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Upstream`] if the upstream call fails.
    pub async fn handle(&self, request: InboundRequest) -> Result<Response, Error> {
        let outbound = self.prepare(request);
        tracing::debug!("forwarding {} {}", outbound.method, outbound.url);
        let response = self.forwarder.forward(outbound).await?;
        Ok(self.adapter.adapt(response))
    }

    fn source_addr(&self, headers: &HeaderMap, peer: Option<IpAddr>) -> Option<String> {
        if let Some(name) = &self.client_ip_header {
            // NB: for X-Forwarded-For style lists the first entry is the original client.
            return headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(',').next())
                .map(|v| v.trim().to_string());
        }
        peer.map(|ip| expanded(ip.to_canonical()))
    }
}

/// Render a peer address in the full eight-hextet form the strict validator accepts, rather
/// than the zero-compressed form of `Display`.
fn expanded(ip: IpAddr) -> String {
    match ip {
        IpAddr::V4(v4) => v4.to_string(),
        IpAddr::V6(v6) => v6
            .segments()
            .iter()
            .map(|s| format!("{s:x}"))
            .collect::<Vec<_>>()
            .join(":"),
    }
}
