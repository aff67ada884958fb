//! DoH ECS Proxy
//!
//! A DNS-over-HTTPS forwarding proxy that rewrites client queries for a single upstream DoH
//! resolver, optionally attaching an [EDNS Client Subnet][RFC-7871] hint derived from the
//! caller's network.
//!
//! The proxy never parses DNS messages. Wire-format (`dns=`) and JSON API (`name=`/`type=`)
//! queries are forwarded as HTTP, and the upstream response is streamed back with permissive
//! CORS headers.
//!
//! [RFC-7871]: https://www.rfc-editor.org/rfc/rfc7871
//!
#![warn(clippy::pedantic)]

pub mod api;
pub mod config;
pub mod doh;
pub mod error;

pub use api::router;
pub use config::{Config, EcsPolicy, SharedConfig};
pub use doh::{Forwarder, HttpForwarder, Proxy};
