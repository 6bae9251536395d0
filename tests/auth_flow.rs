use actix_web::body::{to_bytes, MessageBody};
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use async_trait::async_trait;
use bearer_gate::configure_app;
use bearer_gate::handlers::auth::{encode_token, encode_token_at, TokenSecret};
use bearer_gate::handlers::session::SessionService;
use bearer_gate::handlers::user_lookup::{InMemoryUserLookup, LookupError, UserLookup};
use bearer_gate::models::user::User;
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use std::sync::Arc;

const SECRET: &str = "integration-test-secret";

fn users() -> InMemoryUserLookup {
    InMemoryUserLookup::new()
        .with_user(User::new("alice", "Alice", "admin"))
        .with_user(User::new("bob", "Bob", "user"))
}

fn verified_session(users: InMemoryUserLookup) -> web::Data<SessionService> {
    web::Data::new(SessionService::new(
        Arc::new(users),
        TokenSecret::new(SECRET),
        Duration::hours(1),
    ))
}

/// Calls the app and returns status and JSON body, whether the request was
/// answered by a handler or rejected by middleware.
async fn send<S, R, B>(app: &S, req: R) -> (StatusCode, Value)
where
    S: Service<R, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    match app.call(req).await {
        Ok(res) => {
            let status = res.status();
            let body = test::read_body(res).await;
            (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
        }
        Err(err) => {
            let res = err.error_response();
            let status = res.status();
            let body = to_bytes(res.into_body()).await.unwrap();
            (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
        }
    }
}

fn login_req(subject_id: &str) -> test::TestRequest {
    test::TestRequest::post()
        .uri("/login")
        .set_json(json!({ "subject_id": subject_id }))
}

fn get_req(uri: &str, authorization: Option<&str>) -> test::TestRequest {
    let req = test::TestRequest::get().uri(uri);
    match authorization {
        Some(value) => req.insert_header(("Authorization", value.to_string())),
        None => req,
    }
}

fn token_of(body: &Value) -> String {
    body["token"].as_str().expect("login returns a token").to_string()
}

#[actix_web::test]
async fn test_admin_can_reach_admin_area() {
    let app =
        test::init_service(App::new().configure(configure_app(verified_session(users())))).await;

    let (status, body) = send(&app, login_req("alice").to_request()).await;
    assert_eq!(status, StatusCode::OK);
    let token = token_of(&body);

    let auth = format!("Bearer {token}");
    let (status, body) = send(&app, get_req("/admin/", Some(&auth)).to_request()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "admin area" }));

    let (status, _) = send(&app, get_req("/admin/reports/daily", Some(&auth)).to_request()).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn test_user_role_is_forbidden_from_admin_area() {
    let app =
        test::init_service(App::new().configure(configure_app(verified_session(users())))).await;

    let (_, body) = send(&app, login_req("bob").to_request()).await;
    let auth = format!("Bearer {}", token_of(&body));

    let (status, body) = send(&app, get_req("/admin/", Some(&auth)).to_request()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, json!({ "error": "forbidden" }));

    // bob is still authenticated for plain protected routes
    let (status, body) = send(&app, get_req("/protected", Some(&auth)).to_request()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "message": "protected", "user_id": "bob", "role": "user" })
    );
}

#[actix_web::test]
async fn test_missing_and_malformed_headers_are_401() {
    let app =
        test::init_service(App::new().configure(configure_app(verified_session(users())))).await;

    let (status, body) = send(&app, get_req("/protected", None).to_request()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "missing authorization");

    let (status, body) = send(&app, get_req("/protected", Some("Basic xyz")).to_request()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid authorization header");

    // the role gate never runs without a valid token
    let (status, _) = send(&app, get_req("/admin/", None).to_request()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_scheme_is_case_insensitive() {
    let app =
        test::init_service(App::new().configure(configure_app(verified_session(users())))).await;

    let (_, body) = send(&app, login_req("alice").to_request()).await;
    let auth = format!("bearer {}", token_of(&body));

    let (status, _) = send(&app, get_req("/protected", Some(&auth)).to_request()).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn test_token_failures_are_indistinguishable() {
    let app =
        test::init_service(App::new().configure(configure_app(verified_session(users())))).await;

    let expired = encode_token_at(
        "alice",
        Some("admin"),
        &TokenSecret::new(SECRET),
        Duration::minutes(10),
        Utc::now() - Duration::hours(1),
    )
    .unwrap();
    let forged = encode_token_at(
        "alice",
        Some("admin"),
        &TokenSecret::new("someone-elses-secret"),
        Duration::minutes(10),
        Utc::now(),
    )
    .unwrap();

    for token in [expired.as_str(), forged.as_str(), "not-a-real-token"] {
        let auth = format!("Bearer {token}");
        let (status, body) = send(&app, get_req("/protected", Some(&auth)).to_request()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({ "error": "invalid token" }));
    }
}

#[actix_web::test]
async fn test_deleted_user_loses_access() {
    let issuer =
        test::init_service(App::new().configure(configure_app(verified_session(users())))).await;
    let (_, body) = send(&issuer, login_req("bob").to_request()).await;
    let auth = format!("Bearer {}", token_of(&body));

    // Same secret, bob removed from the store
    let only_alice = InMemoryUserLookup::new().with_user(User::new("alice", "Alice", "admin"));
    let app =
        test::init_service(App::new().configure(configure_app(verified_session(only_alice)))).await;

    let (status, body) = send(&app, get_req("/protected", Some(&auth)).to_request()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid token");
}

#[actix_web::test]
async fn test_login_unknown_user() {
    let app =
        test::init_service(App::new().configure(configure_app(verified_session(users())))).await;

    let (status, body) = send(&app, login_req("mallory").to_request()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid credentials");
}

#[actix_web::test]
async fn test_unverified_mode_has_no_role() {
    let session = web::Data::new(SessionService::unverified(
        TokenSecret::new(SECRET),
        Duration::hours(1),
    ));
    let app = test::init_service(App::new().configure(configure_app(session))).await;

    let (status, body) = send(&app, login_req("whoever").to_request()).await;
    assert_eq!(status, StatusCode::OK);
    let auth = format!("Bearer {}", token_of(&body));

    let (status, body) = send(&app, get_req("/protected", Some(&auth)).to_request()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_id"], "whoever");
    assert_eq!(body["role"], Value::Null);

    let (status, _) = send(&app, get_req("/admin/", Some(&auth)).to_request()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn test_hello_is_public() {
    let app =
        test::init_service(App::new().configure(configure_app(verified_session(users())))).await;

    let (status, body) = send(&app, get_req("/hello", None).to_request()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "hello" }));
}

/// A user store whose backend is unreachable.
struct UnavailableLookup;

#[async_trait]
impl UserLookup for UnavailableLookup {
    async fn get_by_id(&self, _id: &str) -> Result<User, LookupError> {
        Err(LookupError::Backend("connection refused".to_string()))
    }
}

#[actix_web::test]
async fn test_store_outage() {
    let session = web::Data::new(SessionService::new(
        Arc::new(UnavailableLookup),
        TokenSecret::new(SECRET),
        Duration::hours(1),
    ));
    let app = test::init_service(App::new().configure(configure_app(session))).await;

    let (status, body) = send(&app, login_req("alice").to_request()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "internal server error" }));

    // A correctly signed token still cannot be validated without the store
    let token = encode_token(
        "alice",
        Some("admin"),
        &TokenSecret::new(SECRET),
        Duration::hours(1),
    )
    .unwrap();
    let auth = format!("Bearer {token}");
    let (status, body) = send(&app, get_req("/protected", Some(&auth)).to_request()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "error": "invalid token" }));
}
