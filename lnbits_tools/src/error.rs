use thiserror::Error;

#[derive(Debug, Error)]
pub enum LnbitsApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Invalid REST request: {0}")]
    RestRequestError(String),
    #[error("Invalid REST response: {0}")]
    RestResponseError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("{message}")]
    QueryError { status: u16, message: String },
    #[error("LNURL service returned an error: {0}")]
    LnurlError(String),
}
