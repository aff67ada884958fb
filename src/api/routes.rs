use crate::api::api_error::APIError;
use crate::api::not_found::not_found;
use crate::api::server::AppState;
use crate::doh::response::set_cors;
use crate::doh::InboundRequest;
use axum::body::Bytes;
use axum::extract::{ConnectInfo, DefaultBodyLimit, State};
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use std::net::SocketAddr;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// RFC 8484 §6: maximum wire-format message size.
const MAX_DNS_MESSAGE_BYTES: usize = 65_535;

pub(super) fn new(state: AppState) -> Router {
    Router::new()
        .route("/healthcheck", get(health_check))
        .fallback(dispatch)
        .layer(DefaultBodyLimit::max(MAX_DNS_MESSAGE_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(state.config.api_timeout))
        .with_state(state)
}

#[allow(clippy::unused_async)]
async fn health_check() -> impl IntoResponse {
    Json(json!({"ok":"healthy"}))
}

async fn dispatch(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if !is_proxy_path(uri.path(), state.config.mount_path()) {
        return not_found().await.into_response();
    }

    if method == Method::OPTIONS {
        let mut response = StatusCode::NO_CONTENT.into_response();
        set_cors(response.headers_mut());
        return response;
    }
    if method != Method::GET && method != Method::POST {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }

    let request = InboundRequest {
        method,
        query: uri.query().map(ToString::to_string),
        headers,
        body,
        peer: connect_info.map(|ConnectInfo(addr)| addr.ip()),
    };
    match state.proxy.handle(request).await {
        Ok(response) => response,
        Err(err) => {
            tracing::warn!("proxy request failed: {err}");
            APIError::new(state.config.error_prefix.as_str(), err).into_response()
        }
    }
}

fn is_proxy_path(path: &str, mount: &str) -> bool {
    path.strip_prefix(mount)
        .map_or(false, |rest| rest.is_empty() || rest.starts_with('/'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::api_error::X_PROXY_ERROR;
    use crate::api::server::router;
    use crate::config::Config;
    use crate::doh::{Forwarder, ProxyRequest};
    use crate::error::Error;
    use axum::body::{boxed, Body};
    use axum::http::header::{ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE};
    use axum::http::Request;
    use std::sync::Arc;
    use tower::ServiceExt;

    struct StaticForwarder;

    #[async_trait::async_trait]
    impl Forwarder for StaticForwarder {
        async fn forward(&self, request: ProxyRequest) -> Result<Response, Error> {
            Ok(Response::builder()
                .header(CONTENT_TYPE, "application/dns-json")
                .body(boxed(Body::from(request.url.to_string())))
                .unwrap())
        }
    }

    fn app() -> Router {
        router(Arc::new(Config::default()), Arc::new(StaticForwarder)).unwrap()
    }

    async fn body_string(response: Response) -> String {
        let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn proxy_path_matching() {
        assert!(is_proxy_path("/google", "/google"));
        assert!(is_proxy_path("/google/", "/google"));
        assert!(is_proxy_path("/google/resolve", "/google"));
        assert!(!is_proxy_path("/googlefoo", "/google"));
        assert!(!is_proxy_path("/", "/google"));
        assert!(!is_proxy_path("/cn/google", "/google"));
    }

    #[tokio::test]
    async fn health_check_ok() {
        let response = app()
            .oneshot(Request::get("/healthcheck").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, r#"{"ok":"healthy"}"#);
    }

    #[tokio::test]
    async fn root_is_custom_404() {
        let response = app()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "text/html; charset=utf-8"
        );
        assert_eq!(response.headers().get("x-404-page").unwrap(), "custom");
    }

    #[tokio::test]
    async fn proxies_under_mount_path() {
        let mut request = Request::get("/google/?name=example.com&type=A&evil=1")
            .body(Body::empty())
            .unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([203, 0, 113, 77], 40000))));
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "*"
        );
        assert_eq!(
            body_string(response).await,
            "https://dns.google/dns-query?name=example.com&type=A&edns_client_subnet=203.0.113.0%2F24"
        );
    }

    #[tokio::test]
    async fn answers_preflight_locally() {
        let response = app()
            .oneshot(
                Request::options("/google")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(
            response.headers().get("access-control-allow-methods").unwrap(),
            "GET, POST, OPTIONS"
        );
    }

    #[tokio::test]
    async fn rejects_other_methods() {
        let response = app()
            .oneshot(Request::delete("/google").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn rejects_oversized_body() {
        let response = app()
            .oneshot(
                Request::post("/google")
                    .header(CONTENT_TYPE, "application/dns-message")
                    .body(Body::from(vec![0u8; MAX_DNS_MESSAGE_BYTES + 1]))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn unreachable_upstream_is_502() {
        let mut config = Config::default();
        config.upstream.url = url::Url::parse("http://127.0.0.1:1/dns-query").unwrap();
        let config = Arc::new(config);
        let forwarder = Arc::new(crate::doh::HttpForwarder::new(&config.upstream).unwrap());
        let app = router(config, forwarder).unwrap();

        let response = app
            .oneshot(
                Request::get("/google?name=example.com&type=A")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(response.headers().get(X_PROXY_ERROR).unwrap(), "true");
        assert_eq!(response.headers().get(CONTENT_TYPE).unwrap(), "text/plain");
        assert!(body_string(response).await.starts_with("DNS Proxy Error: "));
    }
}
