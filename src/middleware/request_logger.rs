use crate::models::identity::Identity;
use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage,
};
use futures_util::future::{ok, LocalBoxFuture, Ready};
use log::{info, warn};
use std::{rc::Rc, time::Instant};

// Request logger middleware
pub struct RequestLogger;

impl<S, B> Transform<S, ServiceRequest> for RequestLogger
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = RequestLoggerMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(RequestLoggerMiddleware {
            service: Rc::new(service),
        })
    }
}

pub struct RequestLoggerMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequestLoggerMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let start_time = Instant::now();
        let method = req.method().clone();
        let path = req.path().to_owned();
        let client_ip = req
            .connection_info()
            .peer_addr()
            .unwrap_or("unknown")
            .to_owned();

        let service = self.service.clone();
        Box::pin(async move {
            let res = service.call(req).await;
            let elapsed = start_time.elapsed();

            // Auth rejections surface here as errors; their status comes from
            // the ResponseError impl, the detail stays in the debug log.
            match &res {
                Ok(response) => {
                    let subject = response
                        .request()
                        .extensions()
                        .get::<Identity>()
                        .map(|identity| identity.subject_id.clone())
                        .unwrap_or_else(|| "-".to_string());
                    info!(
                        "{} {} {} -> {} in {:.2?} (subject: {})",
                        client_ip,
                        method,
                        path,
                        response.status().as_u16(),
                        elapsed,
                        subject
                    );
                }
                Err(err) => {
                    warn!(
                        "{} {} {} -> {} in {:.2?} ({})",
                        client_ip,
                        method,
                        path,
                        err.as_response_error().status_code().as_u16(),
                        elapsed,
                        err
                    );
                }
            }

            res
        })
    }
}
