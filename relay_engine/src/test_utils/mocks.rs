use mockall::mock;
use serde_json::Value;
use url::Url;

use crate::{
    db_types::Principal,
    traits::{LnurlInvoice, NewInvoice, PaymentProvider, ProviderError, UserDirectoryError, UserManagement},
};

mock! {
    pub Provider {}
    impl PaymentProvider for Provider {
        async fn payments(&self, api_key: &str) -> Result<Value, ProviderError>;
        async fn balance(&self, api_key: &str) -> Result<i64, ProviderError>;
        async fn create_invoice(&self, api_key: &str, amount: u64, memo: &str) -> Result<NewInvoice, ProviderError>;
        async fn pay_invoice(&self, api_key: &str, bolt11: &str) -> Result<String, ProviderError>;
        async fn decode_invoice(&self, data: &str) -> Result<Value, ProviderError>;
        async fn decode_lnurl(&self, url: &str) -> Result<Value, ProviderError>;
        async fn lnurl_pay_invoice(&self, callback: &str, amount: u64, comment: &str) -> Result<LnurlInvoice, ProviderError>;
        async fn lnurl_withdraw(&self, callback: &str, k1: &str, payment_request: &str) -> Result<(), ProviderError>;
        fn event_stream_url(&self, api_key: &str) -> Result<Url, ProviderError>;
    }
}

mock! {
    pub UserDirectory {}
    impl UserManagement for UserDirectory {
        async fn fetch_user_by_username(&self, username: &str) -> Result<Option<Principal>, UserDirectoryError>;
    }
}
