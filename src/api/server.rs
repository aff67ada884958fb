use crate::api::routes;
use crate::config::SharedConfig;
use crate::doh::{DynForwarder, Proxy};
use crate::error::Error;
use axum::Router;
use std::future::Future;
use std::net::SocketAddr;

#[derive(Clone)]
pub(super) struct AppState {
    pub config: SharedConfig,
    pub proxy: Proxy,
}

/// Build the application [`Router`] around the given [`DynForwarder`].
///
/// # Errors
///
/// Returns an [`Error`] if the config contains an invalid header name.
pub fn router(config: SharedConfig, forwarder: DynForwarder) -> Result<Router, Error> {
    let proxy = Proxy::new(&config, forwarder)?;
    Ok(routes::new(AppState { config, proxy }))
}

pub fn new(
    config: SharedConfig,
    forwarder: DynForwarder,
) -> Result<impl Future<Output = hyper::Result<()>>, Error> {
    let app = router(config.clone(), forwarder)?;
    Ok(axum::Server::bind(&config.bind_addr)
        .serve(app.into_make_service_with_connect_info::<SocketAddr>()))
}
