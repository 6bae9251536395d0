use crate::errors::ApiError;
use crate::models::identity::Identity;
use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage,
};
use futures_util::future::{ok, LocalBoxFuture, Ready};
use log::warn;
use std::rc::Rc;

/// Lets a request through only when the identity injected by
/// [`BearerAuth`](super::auth_middleware::BearerAuth) carries exactly `role`.
/// Must be wrapped inside `BearerAuth`; without an identity every request is
/// forbidden.
pub struct RequireRole {
    role: Rc<str>,
}

impl RequireRole {
    pub fn new(role: &str) -> Self {
        RequireRole { role: role.into() }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequireRole
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = RequireRoleMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(RequireRoleMiddleware {
            service,
            role: self.role.clone(),
        })
    }
}

pub struct RequireRoleMiddleware<S> {
    service: S,
    role: Rc<str>,
}

impl<S, B> Service<ServiceRequest> for RequireRoleMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let allowed = req
            .extensions()
            .get::<Identity>()
            .is_some_and(|identity| identity.has_role(&self.role));

        if !allowed {
            warn!(
                "role gate: {} requires role {:?}, denied",
                req.path(),
                self.role
            );
            let err: Error = ApiError::Forbidden.into();
            return Box::pin(async move { Err(err) });
        }

        Box::pin(self.service.call(req))
    }
}
