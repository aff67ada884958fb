use crate::error::Error;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

pub const X_PROXY_ERROR: HeaderName = HeaderName::from_static("x-proxy-error");

/// A request-terminating failure, rendered as `<prefix>: <message>` plaintext.
pub(crate) struct APIError {
    prefix: String,
    err: anyhow::Error,
}

impl APIError {
    pub fn new(prefix: impl Into<String>, err: impl Into<anyhow::Error>) -> Self {
        Self {
            prefix: prefix.into(),
            err: err.into(),
        }
    }
}

impl IntoResponse for APIError {
    fn into_response(self) -> Response {
        let upstream_failure = matches!(
            self.err.downcast_ref::<Error>(),
            Some(Error::Upstream(_) | Error::MalformedUpstreamResponse(_))
        );
        let status = if upstream_failure {
            StatusCode::BAD_GATEWAY
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        let body = format!("{}: {}", self.prefix, self.err);
        let mut response = (status, body).into_response();
        let headers = response.headers_mut();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        if upstream_failure {
            headers.insert(X_PROXY_ERROR, HeaderValue::from_static("true"));
        }
        response
    }
}
