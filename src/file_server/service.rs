//! Actix Service Implementation for File Server

use std::{ops::Deref, rc::Rc, sync::Arc};

use actix_web::{
    HttpRequest,
    body::BoxBody,
    dev::{self, Service, ServiceRequest, ServiceResponse},
    error::Error,
    web,
};
use futures_core::future::LocalBoxFuture;

use super::{
    Outcome, render, route,
    uri::{MAX_LOGGED_METHOD, validate},
};
use crate::config::Configuration;

#[derive(Clone)]
pub struct FileService(pub(crate) Rc<FileServiceInner>);

impl Deref for FileService {
    type Target = FileServiceInner;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

pub struct FileServiceInner {
    pub(crate) config: Arc<Configuration>,
    pub(crate) log_requests: bool,
}

#[inline]
fn raw_uri(req: &HttpRequest) -> &str {
    req.uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| req.uri().path())
}

#[inline]
fn client_host(req: &HttpRequest) -> String {
    req.peer_addr()
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "-".to_owned())
}

fn log_request(req: &HttpRequest, loggable: bool) {
    let host = client_host(req);
    let method = req.method().as_str();
    match (loggable, method.len() > MAX_LOGGED_METHOD) {
        (true, _) => log::info!("{host} - {method} {}", raw_uri(req)),
        (false, true) => log::info!("Request from {host}"),
        (false, false) => log::info!("Bad request from {host}"),
    }
}

impl Service<ServiceRequest> for FileService {
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    dev::always_ready!();

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let this = self.clone();
        Box::pin(async move {
            let (req, _) = req.into_parts();
            let checked = validate(
                req.method().as_str(),
                raw_uri(&req),
                this.config.max_uri_length(),
            );
            if this.log_requests {
                log_request(&req, checked.loggable);
            }

            let outcome = match checked.path {
                Ok(uri) => {
                    let config = this.config.clone();
                    web::block(move || route(&uri, &config))
                        .await
                        .unwrap_or_else(|err| {
                            log::error!("routing task failed: {err}");
                            Outcome::InternalError
                        })
                }
                Err(err) => {
                    log::debug!("rejected request: {err}");
                    err.outcome()
                }
            };

            let res = render::respond(&req, outcome, &this.config).await;
            Ok(ServiceResponse::new(req, res))
        })
    }
}
