use crate::errors::ApiError;
use crate::handlers::session::SessionService;
use actix_web::{
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{HeaderMap, AUTHORIZATION},
    web, Error, HttpMessage,
};
use futures_util::future::{ok, Ready};
use log::debug;
use std::{
    future::Future,
    pin::Pin,
    rc::Rc,
    task::{Context, Poll},
};

/// Middleware for bearer-token authentication.
///
/// Rejects with 401 when the `Authorization` header is missing, is not of the
/// form `Bearer <token>`, or carries a token the session service refuses.
/// On success the validated [`Identity`](crate::models::identity::Identity)
/// is stored in the request extensions.
pub struct BearerAuth {
    session: web::Data<SessionService>,
}

impl BearerAuth {
    pub fn new(session: web::Data<SessionService>) -> Self {
        BearerAuth { session }
    }
}

impl<S, B> Transform<S, ServiceRequest> for BearerAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = BearerAuthMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(BearerAuthMiddleware {
            service: Rc::new(service),
            session: self.session.clone(),
        })
    }
}

pub struct BearerAuthMiddleware<S> {
    service: Rc<S>,
    session: web::Data<SessionService>,
}

impl<S, B> Service<ServiceRequest> for BearerAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    fn poll_ready(&self, ctx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let session = self.session.clone();

        Box::pin(async move {
            let token = match bearer_token(req.headers()) {
                Ok(token) => token.to_owned(),
                Err(rejection) => {
                    debug!("bearer auth: {} on {}", rejection, req.path());
                    return Err(rejection.into());
                }
            };

            // Every validation failure looks the same to the client
            let identity = match session.validate_token(&token).await {
                Ok(identity) => identity,
                Err(e) => {
                    debug!("bearer auth: token rejected on {}: {}", req.path(), e);
                    return Err(ApiError::InvalidToken.into());
                }
            };

            req.extensions_mut().insert(identity);
            service.call(req).await
        })
    }
}

/// Pulls the token out of an `Authorization: Bearer <token>` header.
///
/// The scheme is matched case-insensitively and must be followed by exactly
/// one space and a non-empty token.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(ApiError::MissingAuthorization)?;
    let value = value
        .to_str()
        .map_err(|_| ApiError::InvalidAuthorizationHeader)?;

    let (scheme, token) = value
        .split_once(' ')
        .ok_or(ApiError::InvalidAuthorizationHeader)?;
    if !scheme.eq_ignore_ascii_case("bearer")
        || token.is_empty()
        || token.contains(char::is_whitespace)
    {
        return Err(ApiError::InvalidAuthorizationHeader);
    }

    Ok(token)
}
