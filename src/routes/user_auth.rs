use crate::errors::{ApiError, AuthError};
use crate::handlers::session::SessionService;
use crate::middleware::{auth_middleware::BearerAuth, role_gate::RequireRole};
use crate::models::identity::Identity;
use actix_web::{error::JsonPayloadError, web, Error, HttpRequest, HttpResponse};
use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use serde_json::json;

pub const ADMIN_ROLE: &str = "admin";

//Login Request
#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default, alias = "user_id")]
    pub subject_id: String,
}

//Login Response
#[derive(Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

//Login
//Login Input: LoginRequest
//Login Output: LoginResponse
pub async fn login(
    session: web::Data<SessionService>,
    payload: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    let token = session
        .login(&payload.subject_id)
        .await
        .map_err(|e| match e {
            AuthError::InvalidRequest(detail) => ApiError::BadRequest(detail),
            AuthError::UserNotFound => {
                info!("login refused for unknown subject");
                ApiError::InvalidCredentials
            }
            other => {
                error!("login failed: {}", other);
                ApiError::Internal
            }
        })?;

    Ok(HttpResponse::Ok().json(LoginResponse { token }))
}

fn login_body_error(err: JsonPayloadError, _req: &HttpRequest) -> Error {
    debug!("login: rejected body: {}", err);
    ApiError::BadRequest("invalid body".to_string()).into()
}

pub async fn hello() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "message": "hello" }))
}

pub async fn protected(identity: Identity) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "message": "protected",
        "user_id": identity.subject_id,
        "role": identity.role,
    }))
}

pub async fn admin_area(_identity: Identity) -> HttpResponse {
    HttpResponse::Ok().json(json!({ "message": "admin area" }))
}

//Config Public Routes
// GET  /hello
// POST /login
pub fn config_public_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/hello", web::get().to(hello)).service(
        web::resource("/login")
            .app_data(web::JsonConfig::default().error_handler(login_body_error))
            .route(web::post().to(login)),
    );
}

//Config Protected Routes
// GET /protected  (bearer)
// GET /admin/...  (bearer + admin role)
pub fn config_protected_routes(
    session: web::Data<SessionService>,
) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg: &mut web::ServiceConfig| {
        cfg.service(
            web::resource("/protected")
                .wrap(BearerAuth::new(session.clone()))
                .route(web::get().to(protected)),
        )
        .service(
            // wrap order: BearerAuth runs first, then the role gate
            web::scope("/admin")
                .wrap(RequireRole::new(ADMIN_ROLE))
                .wrap(BearerAuth::new(session))
                .route("", web::get().to(admin_area))
                .route("/{tail:.*}", web::get().to(admin_area)),
        );
    }
}
