//! HTTP surface of the proxy.
//!
//! # Endpoints
//!
//! ## `/healthcheck` (GET)
//!
//!   Returns HTTP 200 (OK) and the JSON body `{"ok":"healthy"}` when the service is operational.
//!
//! ## [`Config::path`][crate::config::Config::path] (GET, POST, OPTIONS)
//!
//!   The DoH proxy, mounted at `/google` by default. Both `/google` and anything beneath it
//!   (`/google/`, `/google/dns-query`, ...) are proxied to the configured upstream resolver.
//!
//!   JSON API style:
//!
//!   ```bash
//!   ❯ curl 'http://localhost:8053/google/?name=example.com&type=A'
//!   ```
//!
//!   Wire format, [RFC-8484][RFC-8484] `GET` and `POST`:
//!
//!   ```bash
//!   ❯ curl 'http://localhost:8053/google/?dns=AAABAAABAAAAAAAAB2V4YW1wbGUDY29tAAABAAE'
//!   ❯ curl -H 'content-type: application/dns-message' --data-binary @query.bin \
//!       http://localhost:8053/google/
//!   ```
//!
//!   `OPTIONS` is answered locally as a CORS preflight. Other methods return HTTP 405.
//!
//!   If the upstream call fails the response is HTTP 502 with a `text/plain` body of the form
//!   `DNS Proxy Error: <message>` and an `X-Proxy-Error: true` header.
//!
//! ## Anything else
//!
//!   Returns a static HTML 404 page.
//!
//! [RFC-8484]: https://www.rfc-editor.org/rfc/rfc8484

mod api_error;
mod not_found;
mod routes;
pub mod server;

pub use server::{new, router};
