//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Relay sessions run for as long as the client stays connected, so
//! they are spawned onto the worker's runtime and the handler returns as soon as the connection is upgraded.
use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use log::*;
use relay_engine::{RelaySession, UserManagement};
use serde_json::json;

use crate::{
    auth::{access_token, JwtAuthenticator},
    errors::ServerError,
    relay_state::RelayState,
    websocket::{WsSink, WsSource},
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

#[get("/status")]
pub async fn status(relay: web::Data<RelayState>) -> impl Responder {
    trace!("💻️ Received status request");
    HttpResponse::Ok().json(json!({ "status": "OK", "sessions": relay.sessions.count() }))
}

//----------------------------------------------   Relay  ----------------------------------------------------
route!(ws => Get "/ws" impl UserManagement);
/// Opens a relay session.
///
/// The client must present an access token, either as an `Authorization: Bearer` header or in the access token cookie.
/// The token is checked before the connection is upgraded, so a refused client gets a plain HTTP error and no session
/// is ever created for it. Once upgraded, the session runs on its own until the client or the provider goes away, or
/// the server shuts down.
pub async fn ws<U: UserManagement>(
    req: HttpRequest,
    body: web::Payload,
    authenticator: web::Data<JwtAuthenticator<U>>,
    relay: web::Data<RelayState>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ Received relay connection request");
    let token = access_token(&req, &relay.access_token_cookie);
    let session = RelaySession::authenticate(
        authenticator.get_ref(),
        token.as_deref(),
        relay.provider.clone(),
        relay.config.clone(),
        &relay.shutdown,
    )
    .await?;
    let (response, ws_session, stream) = actix_ws::handle(&req, body).map_err(|e| {
        debug!("💻️ Could not upgrade the connection for {}. {e}", session.principal().username);
        ServerError::UpgradeError(e.to_string())
    })?;
    let source = WsSource::new(stream, ws_session.clone());
    let sink = WsSink::new(ws_session);
    let connector = relay.connector.clone();
    let guard = relay.sessions.open();
    actix_web::rt::spawn(async move {
        let report = session.run(source, sink, connector).await;
        debug!("💻️ Relay session ended. {report:?}");
        drop(guard);
    });
    Ok(response)
}
