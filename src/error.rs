//! Error types.

use ipnetwork::IpNetworkError;

/// Error enumerates the possible DoH proxy error states.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Returned when the outbound call to the upstream resolver fails: DNS resolution of the
    /// upstream host, connection refused/reset, TLS failure or the deadline expiring. Surfaced
    /// to clients as HTTP 502 and never retried.
    #[error("{0}")]
    Upstream(reqwest::Error),

    /// Returned when an upstream response can't be rebuilt for the client.
    #[error("malformed upstream response: {0}")]
    MalformedUpstreamResponse(#[from] axum::http::Error),

    /// Returned when the [`reqwest`] client used by the
    /// [`HttpForwarder`][crate::doh::forwarder::HttpForwarder] can't be constructed.
    #[error("failed to build upstream HTTP client: {0}")]
    ClientBuild(reqwest::Error),

    /// Returned when [`UpstreamConfig::url`][crate::config::UpstreamConfig::url] uses a scheme
    /// other than `http` or `https`.
    #[error("upstream URL scheme must be http or https, found \"{0}\"")]
    InvalidUpstreamScheme(String),

    /// Returned when [`EcsConfig::default_subnet`][crate::config::EcsConfig::default_subnet]
    /// isn't a valid CIDR network.
    #[error("invalid default EDNS client subnet \"{0}\": {1}")]
    InvalidDefaultSubnet(String, IpNetworkError),

    /// Returned when a configured header name isn't a valid HTTP header name.
    #[error("invalid header name \"{0}\"")]
    InvalidHeaderName(String),

    /// Returned when [`Config::service_name`][crate::config::Config::service_name] can't be
    /// used as an HTTP header value.
    #[error("invalid service name \"{0}\"")]
    InvalidServiceName(String),

    /// Returned when [`Config::path`][crate::config::Config::path] doesn't start with `/`, or is
    /// the root path.
    #[error("proxy path must start with '/' and must not be the root path, found \"{0}\"")]
    InvalidPath(String),

    /// Returned when a generic IO error occurs.
    #[error("an IO error occurred")]
    IO(#[from] std::io::Error),

    /// Returned when [trying to load a `Config`][crate::config::Config::try_from_file] fails due
    /// to invalid JSON content.
    #[error("invalid JSON")]
    InvalidJSON(#[from] serde_json::Error),
}
