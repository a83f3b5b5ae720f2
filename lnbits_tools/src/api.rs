use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    Method,
    Response,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};
use url::Url;

use crate::{
    config::LnbitsConfig,
    data_objects::{LnurlPayResponse, PaymentResponse, WalletDetails},
    helpers::{append_query, check_lnurl_status, error_detail, msat_to_sat},
    CreatedInvoice,
    LnbitsApiError,
    LnurlPayInvoice,
};

#[derive(Clone)]
pub struct LnbitsApi {
    config: LnbitsConfig,
    client: Arc<Client>,
}

impl LnbitsApi {
    pub fn new(config: LnbitsConfig) -> Result<Self, LnbitsApiError> {
        let mut headers = HeaderMap::with_capacity(1);
        headers.insert("Content-Type", HeaderValue::from_static("application/json; charset=utf-8"));
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| LnbitsApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.url)
    }

    /// The server-sent-events endpoint that pushes payment notifications for the wallet owning `api_key`.
    pub fn payment_events_url(&self, api_key: &str) -> Result<Url, LnbitsApiError> {
        append_query(&self.url("/api/v1/payments/sse"), &[("api-key", api_key)])
    }

    /// Sends a request to the LNbits REST API. The `api_key`, if given, is sent in the `X-Api-Key` header.
    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        api_key: Option<&str>,
        body: Option<B>,
    ) -> Result<T, LnbitsApiError> {
        let url = self.url(path);
        trace!("⚡️ Sending REST query: {method} {url}");
        let mut req = self.client.request(method, url);
        if let Some(key) = api_key {
            let val = HeaderValue::from_str(key).map_err(|e| LnbitsApiError::RestRequestError(e.to_string()))?;
            req = req.header("X-Api-Key", val);
        }
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await.map_err(|e| LnbitsApiError::RestResponseError(e.to_string()))?;
        parse_response(response).await
    }

    /// Sends a plain GET to a third-party URL, typically an LNURL endpoint.
    async fn external_get(&self, url: Url) -> Result<Value, LnbitsApiError> {
        trace!("⚡️ Sending external request to {}", url.host_str().unwrap_or("<no host>"));
        let response =
            self.client.get(url).send().await.map_err(|e| LnbitsApiError::RestResponseError(e.to_string()))?;
        let json = parse_response::<Value>(response).await?;
        check_lnurl_status(&json)?;
        Ok(json)
    }

    pub async fn create_invoice(
        &self,
        api_key: &str,
        amount: u64,
        memo: &str,
    ) -> Result<CreatedInvoice, LnbitsApiError> {
        let body = json!({
            "amount": amount,
            "memo": memo,
            "unit": "sat",
            "out": false,
        });
        debug!("⚡️ Creating invoice for {amount} sat");
        let invoice = self
            .rest_query::<CreatedInvoice, Value>(Method::POST, "/api/v1/payments", Some(api_key), Some(body))
            .await?;
        info!("⚡️ Created invoice {}", invoice.payment_hash);
        Ok(invoice)
    }

    /// Pays the given BOLT11 invoice from the wallet owning `api_key`. Returns the payment hash.
    pub async fn pay_invoice(&self, api_key: &str, bolt11: &str) -> Result<String, LnbitsApiError> {
        let body = json!({ "out": true, "bolt11": bolt11 });
        debug!("⚡️ Paying invoice");
        let result = self
            .rest_query::<PaymentResponse, Value>(Method::POST, "/api/v1/payments", Some(api_key), Some(body))
            .await?;
        info!("⚡️ Paid invoice {}", result.payment_hash);
        Ok(result.payment_hash)
    }

    /// Decodes a BOLT11 invoice or an LNURL. LNbits answers with the invoice fields for the former, and with a
    /// `domain` field holding the decoded URL for the latter.
    pub async fn decode_invoice(&self, data: &str) -> Result<Value, LnbitsApiError> {
        let body = json!({ "data": data });
        self.rest_query::<Value, Value>(Method::POST, "/api/v1/payments/decode", None, Some(body)).await
    }

    pub async fn payments(&self, api_key: &str) -> Result<Value, LnbitsApiError> {
        self.rest_query::<Value, ()>(Method::GET, "/api/v1/payments", Some(api_key), None).await
    }

    /// The wallet balance, in satoshis.
    pub async fn balance(&self, api_key: &str) -> Result<i64, LnbitsApiError> {
        let wallet = self.rest_query::<WalletDetails, ()>(Method::GET, "/api/v1/wallet", Some(api_key), None).await?;
        Ok(msat_to_sat(wallet.balance))
    }

    /// Fetches the LNURL service description living at `url`.
    pub async fn decode_lnurl(&self, url: &str) -> Result<Value, LnbitsApiError> {
        let url = append_query(url, &[])?;
        self.external_get(url).await
    }

    /// Asks an LNURL-pay service for an invoice over `amount` millisatoshis.
    pub async fn lnurl_pay_invoice(
        &self,
        callback: &str,
        amount: u64,
        comment: Option<&str>,
    ) -> Result<LnurlPayInvoice, LnbitsApiError> {
        let amount = amount.to_string();
        let mut params = vec![("amount", amount.as_str())];
        if let Some(comment) = comment.filter(|c| !c.is_empty()) {
            params.push(("comment", comment));
        }
        let url = append_query(callback, &params)?;
        let json = self.external_get(url).await?;
        let response =
            serde_json::from_value::<LnurlPayResponse>(json).map_err(|e| LnbitsApiError::JsonError(e.to_string()))?;
        Ok(response.into())
    }

    /// Hands `payment_request` to an LNURL-withdraw service so that it pays us.
    pub async fn lnurl_withdraw(&self, callback: &str, k1: &str, payment_request: &str) -> Result<(), LnbitsApiError> {
        let url = append_query(callback, &[("k1", k1), ("pr", payment_request)])?;
        self.external_get(url).await?;
        info!("⚡️ LNURL withdraw request accepted");
        Ok(())
    }
}

async fn parse_response<T: DeserializeOwned>(response: Response) -> Result<T, LnbitsApiError> {
    let status = response.status();
    if status.is_success() {
        trace!("⚡️ Query successful. {status}");
        response.json::<T>().await.map_err(|e| LnbitsApiError::JsonError(e.to_string()))
    } else {
        let body = response.text().await.map_err(|e| LnbitsApiError::RestResponseError(e.to_string()))?;
        let message = error_detail(&body);
        error!("⚡️ Query failed. {status}. {message}");
        Err(LnbitsApiError::QueryError { status: status.as_u16(), message })
    }
}
