use actix_web::{web, App, HttpServer};
use anyhow::Context;
use bearer_gate::{
    config::{AppConfig, UserStore},
    configure_app,
    handlers::{
        auth::TokenSecret,
        db::{check_db_connection, connect_with_retry, CONNECT_ATTEMPTS, CONNECT_RETRY_DELAY},
        session::SessionService,
        user_lookup::{InMemoryUserLookup, PgUserLookup},
    },
    middleware::request_logger::RequestLogger,
    models::user::User,
};
use log::{info, warn};
use std::{sync::Arc, time::Duration};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("=== bearer-gate starting ===");

    let cfg = AppConfig::from_env().context("invalid configuration")?;
    info!("configuration loaded: {:?}", cfg);

    let secret = TokenSecret::new(cfg.jwt_secret.as_bytes());
    let session = match &cfg.user_store {
        UserStore::Memory => {
            // Demo users so login works out of the box
            let users = InMemoryUserLookup::new()
                .with_user(User::new("alice", "Alice", "admin"))
                .with_user(User::new("bob", "Bob", "user"));
            info!("using in-memory user store with {} users", users.len());
            SessionService::new(Arc::new(users), secret, cfg.jwt_ttl)
        }
        UserStore::Postgres { database_url } => {
            let pool = connect_with_retry(database_url, CONNECT_ATTEMPTS, CONNECT_RETRY_DELAY)
                .await
                .context("failed to connect to Postgres")?;
            if !check_db_connection(&pool).await {
                anyhow::bail!("database connection could not be verified");
            }
            info!("Database connection established and verified");
            SessionService::new(Arc::new(PgUserLookup::new(pool)), secret, cfg.jwt_ttl)
        }
        UserStore::Unverified => SessionService::unverified(secret, cfg.jwt_ttl),
    };
    if !session.is_verified() {
        warn!("logins are NOT checked against a user store");
    }
    let session = web::Data::new(session);

    let addr = (cfg.host.clone(), cfg.port);
    info!("listening on {}:{}", addr.0, addr.1);

    HttpServer::new(move || {
        App::new()
            .wrap(RequestLogger)
            .configure(configure_app(session.clone()))
    })
    .client_request_timeout(Duration::from_secs(5))
    .client_disconnect_timeout(Duration::from_secs(10))
    .bind(addr)
    .with_context(|| format!("failed to bind {}:{}", cfg.host, cfg.port))?
    .run()
    .await
    .context("server error")?;

    Ok(())
}
