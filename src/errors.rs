//! Error types shared by the session service and the HTTP layer.
//!
//! `AuthError` keeps the full failure taxonomy for logging. `ApiError` is what
//! leaves the process: authentication failures are reduced to a handful of
//! fixed messages so a client cannot tell which check rejected it.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

use crate::handlers::auth::TokenError;
use crate::handlers::user_lookup::LookupError;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error("user not found")]
    UserNotFound,
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("user store failure: {0}")]
    Lookup(String),
}

impl From<LookupError> for AuthError {
    fn from(err: LookupError) -> Self {
        match err {
            LookupError::NotFound => AuthError::UserNotFound,
            LookupError::Backend(detail) => AuthError::Lookup(detail),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("missing authorization")]
    MissingAuthorization,
    #[error("invalid authorization header")]
    InvalidAuthorizationHeader,
    #[error("invalid token")]
    InvalidToken,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("forbidden")]
    Forbidden,
    #[error("{0}")]
    BadRequest(String),
    #[error("internal server error")]
    Internal,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MissingAuthorization
            | ApiError::InvalidAuthorizationHeader
            | ApiError::InvalidToken
            | ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.to_string(),
        })
    }
}
