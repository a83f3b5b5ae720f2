//! # Relay server
//! This crate hosts the WebSocket front end of the payment relay. It is responsible for:
//! Checking the access token of every incoming connection and looking up the user it belongs to.
//! Upgrading accepted connections to WebSockets and running a relay session over each of them.
//! Wiring each session to the LNbits instance that holds the user's wallet.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/status`: Reports the number of live relay sessions.
//! * `/ws`: Opens a relay session. Requires an access token.

pub mod auth;
pub mod cli;
pub mod config;
pub mod errors;
pub mod integrations;
pub mod relay_state;
pub mod routes;
pub mod server;
pub mod websocket;

#[cfg(test)]
mod endpoint_tests;
