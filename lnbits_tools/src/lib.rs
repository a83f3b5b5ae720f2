//! A thin, typed client for the parts of the LNbits REST API (and the LNURL callback endpoints it hands out) that the
//! relay needs.
mod api;
mod config;
mod data_objects;
mod error;
pub mod helpers;

pub use api::LnbitsApi;
pub use config::LnbitsConfig;
pub use data_objects::{CreatedInvoice, LnurlPayInvoice};
pub use error::LnbitsApiError;
