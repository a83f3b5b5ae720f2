use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use lnbits_tools::LnbitsApi;
use log::*;
use relay_engine::{stream::TlsConnector, SqliteDatabase};
use tokio_util::sync::CancellationToken;

use crate::{
    auth::JwtAuthenticator,
    config::ServerConfig,
    errors::ServerError,
    integrations::lnbits::LnbitsProvider,
    relay_state::RelayState,
    routes::{health, status, WsRoute},
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.migrate().await.map_err(|e| ServerError::InitializeError(format!("Database migration failed. {e}")))?;
    let api = LnbitsApi::new(config.lnbits.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let connector = TlsConnector::new().map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let shutdown = CancellationToken::new();
    let relay = RelayState::new(
        LnbitsProvider::new(api),
        connector,
        config.relay.clone(),
        shutdown.clone(),
        &config.access_token_cookie,
    );
    info!("📡️ Relaying to the LNbits instance at {}", config.lnbits.url);
    let srv = create_server_instance(config, db.clone(), relay)?;
    let handle = srv.handle();
    let signal_token = shutdown.clone();
    actix_web::rt::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("🚀️ Could not listen for the shutdown signal. {e}");
            return;
        }
        info!("🚀️ Shutdown requested. Closing all relay sessions.");
        // Sessions hold their connections open, so they must end before a graceful stop can complete.
        signal_token.cancel();
        handle.stop(true).await;
    });
    let result = srv.await;
    shutdown.cancel();
    db.close().await;
    result.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    relay: RelayState,
) -> Result<Server, ServerError> {
    let srv = HttpServer::new(move || {
        let authenticator = JwtAuthenticator::new(&config.auth, db.clone());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("saas::access_log"))
            .app_data(web::Data::new(authenticator))
            .app_data(web::Data::new(relay.clone()))
            .service(health)
            .service(status)
            .service(WsRoute::<SqliteDatabase>::new())
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .disable_signals()
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
