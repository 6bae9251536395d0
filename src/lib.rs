//! Bearer-token authentication gate for actix-web services.
//!
//! Login mints a signed, time-limited token for a known subject; protected
//! routes require `Authorization: Bearer <token>` and may additionally demand
//! an exact role.

pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;

use actix_web::web;

use handlers::session::SessionService;
use routes::user_auth::{config_protected_routes, config_public_routes};

/// Registers the session service and every route on an `App`.
pub fn configure_app(
    session: web::Data<SessionService>,
) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg: &mut web::ServiceConfig| {
        cfg.app_data(session.clone());
        config_public_routes(cfg);
        config_protected_routes(session)(cfg);
    }
}
