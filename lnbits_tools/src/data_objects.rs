use serde::{Deserialize, Serialize};

/// The result of creating an incoming invoice.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CreatedInvoice {
    pub payment_hash: String,
    pub payment_request: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct PaymentResponse {
    pub payment_hash: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WalletDetails {
    /// Wallet balance in millisatoshis
    #[serde(default)]
    pub balance: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct SuccessAction {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct LnurlPayResponse {
    pub pr: String,
    #[serde(rename = "successAction", default)]
    pub success_action: Option<SuccessAction>,
}

/// An invoice obtained from an LNURL-pay callback, along with the message the service wants shown on success.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LnurlPayInvoice {
    pub pr: String,
    pub success_message: String,
}

impl From<LnurlPayResponse> for LnurlPayInvoice {
    fn from(value: LnurlPayResponse) -> Self {
        let success_message = value.success_action.and_then(|a| a.message).unwrap_or_default();
        Self { pr: value.pr, success_message }
    }
}
