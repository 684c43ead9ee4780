//! File Server Service Factory

use std::{rc::Rc, sync::Arc};

use actix_service::ServiceFactory;
use actix_web::{
    Error,
    dev::{AppService, HttpServiceFactory, ResourceDef, ServiceRequest, ServiceResponse},
};
use futures_core::future::LocalBoxFuture;

use super::service::{FileService, FileServiceInner};
use crate::config::Configuration;

/// Routing engine mounted at the application root.
#[derive(Clone)]
pub struct FileServer {
    config: Arc<Configuration>,
    log_requests: bool,
}

impl FileServer {
    pub fn new(config: Arc<Configuration>) -> Self {
        Self {
            config,
            log_requests: false,
        }
    }
    /// Emit a log line for every request.
    pub fn log_requests(mut self, log_requests: bool) -> Self {
        self.log_requests = log_requests;
        self
    }
}

impl HttpServiceFactory for FileServer {
    fn register(self, config: &mut AppService) {
        let rdef = if config.is_root() {
            ResourceDef::root_prefix("")
        } else {
            ResourceDef::prefix("")
        };
        config.register_service(rdef, None, self, None)
    }
}

impl ServiceFactory<ServiceRequest> for FileServer {
    type Response = ServiceResponse;
    type Error = Error;
    type Config = ();
    type Service = FileService;
    type InitError = ();
    type Future = LocalBoxFuture<'static, Result<Self::Service, Self::InitError>>;

    fn new_service(&self, _: ()) -> Self::Future {
        let inner = FileServiceInner {
            config: self.config.clone(),
            log_requests: self.log_requests,
        };
        Box::pin(async move { Ok(FileService(Rc::new(inner))) })
    }
}
