//! Request-scoped identity.
//!
//! `BearerAuth` inserts an [`Identity`] into the request extensions once the
//! token has been validated. Handlers take it as an argument; it is never
//! written to after insertion and is dropped with the request.

use actix_web::{dev::Payload, FromRequest, HttpMessage, HttpRequest};
use futures_util::future::{ready, Ready};
use serde::Serialize;

use crate::errors::ApiError;
use crate::handlers::auth::Claims;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub subject_id: String,
    pub role: Option<String>,
}

impl Identity {
    /// Exact, case-sensitive role comparison.
    pub fn has_role(&self, role: &str) -> bool {
        self.role.as_deref() == Some(role)
    }
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        Identity {
            subject_id: claims.sub,
            role: claims.role,
        }
    }
}

impl FromRequest for Identity {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // Only present behind BearerAuth
        ready(
            req.extensions()
                .get::<Identity>()
                .cloned()
                .ok_or(ApiError::MissingAuthorization),
        )
    }
}
