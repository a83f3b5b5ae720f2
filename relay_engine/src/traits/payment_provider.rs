use serde_json::Value;
use thiserror::Error;
use url::Url;

/// An invoice freshly issued by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInvoice {
    pub payment_hash: String,
    pub payment_request: String,
}

/// The invoice an LNURL-pay service handed back, along with the message to show once it is paid (possibly empty).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LnurlInvoice {
    pub payment_request: String,
    pub success_message: String,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    /// The provider answered, but refused the request.
    #[error("{0}")]
    Rejected(String),
    /// The provider could not be reached, or sent back something we don't understand.
    #[error("Payment provider is unavailable. {0}")]
    Unavailable(String),
    #[error("Invalid provider URL. {0}")]
    InvalidUrl(String),
}

/// The operations the relay needs from the external payment provider.
///
/// Implementations are expected to be cheap to share: the dispatcher holds one and calls it from every session.
/// All amounts are in satoshis, except `lnurl_pay_invoice`, whose amount is in millisatoshis as LNURL demands.
#[allow(async_fn_in_trait)]
pub trait PaymentProvider {
    /// Recent payments of the wallet owning `api_key`.
    async fn payments(&self, api_key: &str) -> Result<Value, ProviderError>;

    /// The wallet balance, in satoshis.
    async fn balance(&self, api_key: &str) -> Result<i64, ProviderError>;

    async fn create_invoice(&self, api_key: &str, amount: u64, memo: &str) -> Result<NewInvoice, ProviderError>;

    /// Pays `bolt11` out of the wallet owning `api_key` and returns the payment hash.
    async fn pay_invoice(&self, api_key: &str, bolt11: &str) -> Result<String, ProviderError>;

    /// Decodes a BOLT11 invoice or an LNURL. A decoded invoice carries a `payment_hash`; a decoded LNURL carries a
    /// `domain` holding the URL of the LNURL service.
    async fn decode_invoice(&self, data: &str) -> Result<Value, ProviderError>;

    /// Fetches the description of the LNURL service at `url`.
    async fn decode_lnurl(&self, url: &str) -> Result<Value, ProviderError>;

    /// Requests an invoice over `amount` millisatoshis from an LNURL-pay callback. An empty `comment` is not sent.
    async fn lnurl_pay_invoice(&self, callback: &str, amount: u64, comment: &str)
        -> Result<LnurlInvoice, ProviderError>;

    /// Asks an LNURL-withdraw service to pay `payment_request`.
    async fn lnurl_withdraw(&self, callback: &str, k1: &str, payment_request: &str) -> Result<(), ProviderError>;

    /// The push-event endpoint for the wallet owning `api_key`.
    fn event_stream_url(&self, api_key: &str) -> Result<Url, ProviderError>;
}
