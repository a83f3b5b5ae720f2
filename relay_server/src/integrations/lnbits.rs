//! Plugs the LNbits client into the relay as its payment provider.
use lnbits_tools::{LnbitsApi, LnbitsApiError};
use relay_engine::{LnurlInvoice, NewInvoice, PaymentProvider, ProviderError};
use serde_json::Value;
use url::Url;

#[derive(Clone)]
pub struct LnbitsProvider(LnbitsApi);

impl LnbitsProvider {
    pub fn new(api: LnbitsApi) -> Self {
        Self(api)
    }
}

fn to_provider_error(e: LnbitsApiError) -> ProviderError {
    match e {
        LnbitsApiError::QueryError { message, .. } => ProviderError::Rejected(message),
        LnbitsApiError::LnurlError(m) => ProviderError::Rejected(m),
        LnbitsApiError::InvalidUrl(m) => ProviderError::InvalidUrl(m),
        e => ProviderError::Unavailable(e.to_string()),
    }
}

impl PaymentProvider for LnbitsProvider {
    async fn payments(&self, api_key: &str) -> Result<Value, ProviderError> {
        self.0.payments(api_key).await.map_err(to_provider_error)
    }

    async fn balance(&self, api_key: &str) -> Result<i64, ProviderError> {
        self.0.balance(api_key).await.map_err(to_provider_error)
    }

    async fn create_invoice(&self, api_key: &str, amount: u64, memo: &str) -> Result<NewInvoice, ProviderError> {
        let invoice = self.0.create_invoice(api_key, amount, memo).await.map_err(to_provider_error)?;
        Ok(NewInvoice { payment_hash: invoice.payment_hash, payment_request: invoice.payment_request })
    }

    async fn pay_invoice(&self, api_key: &str, bolt11: &str) -> Result<String, ProviderError> {
        self.0.pay_invoice(api_key, bolt11).await.map_err(to_provider_error)
    }

    async fn decode_invoice(&self, data: &str) -> Result<Value, ProviderError> {
        self.0.decode_invoice(data).await.map_err(to_provider_error)
    }

    async fn decode_lnurl(&self, url: &str) -> Result<Value, ProviderError> {
        self.0.decode_lnurl(url).await.map_err(to_provider_error)
    }

    async fn lnurl_pay_invoice(
        &self,
        callback: &str,
        amount: u64,
        comment: &str,
    ) -> Result<LnurlInvoice, ProviderError> {
        let comment = Some(comment).filter(|c| !c.is_empty());
        let invoice = self.0.lnurl_pay_invoice(callback, amount, comment).await.map_err(to_provider_error)?;
        Ok(LnurlInvoice { payment_request: invoice.pr, success_message: invoice.success_message })
    }

    async fn lnurl_withdraw(&self, callback: &str, k1: &str, payment_request: &str) -> Result<(), ProviderError> {
        self.0.lnurl_withdraw(callback, k1, payment_request).await.map_err(to_provider_error)
    }

    fn event_stream_url(&self, api_key: &str) -> Result<Url, ProviderError> {
        self.0.payment_events_url(api_key).map_err(to_provider_error)
    }
}

#[cfg(test)]
mod test {
    use lnbits_tools::LnbitsConfig;

    use super::*;

    #[test]
    fn error_mapping() {
        let e = to_provider_error(LnbitsApiError::QueryError { status: 400, message: "Insufficient balance.".into() });
        assert_eq!(e, ProviderError::Rejected("Insufficient balance.".into()));
        assert_eq!(e.to_string(), "Insufficient balance.");
        let e = to_provider_error(LnbitsApiError::RestResponseError("connection reset".into()));
        assert!(matches!(e, ProviderError::Unavailable(_)));
    }

    #[test]
    fn event_stream_url() {
        let api = LnbitsApi::new(LnbitsConfig::new("http://localhost:5000/")).unwrap();
        let provider = LnbitsProvider::new(api);
        let url = provider.event_stream_url("c80bda73f47f4539ad2514d9b409c1da").unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/api/v1/payments/sse?api-key=c80bda73f47f4539ad2514d9b409c1da");
    }
}
