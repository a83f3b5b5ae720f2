use serde_json::Value;
use url::Url;

use crate::LnbitsApiError;

/// Appends `params` to the query string of `base`, keeping whatever query the base URL already carries. LNURL
/// callbacks frequently include their own parameters, so naive `?` concatenation is not an option.
pub fn append_query(base: &str, params: &[(&str, &str)]) -> Result<Url, LnbitsApiError> {
    let mut url = Url::parse(base).map_err(|e| LnbitsApiError::InvalidUrl(format!("{base}: {e}")))?;
    if !params.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (k, v) in params {
            pairs.append_pair(k, v);
        }
    }
    Ok(url)
}

/// Pulls a human-readable message out of an error response body. LNbits reports errors as `{"detail": ...}`, LNURL
/// services as `{"status": "ERROR", "reason": ...}`. Anything else is returned verbatim.
pub fn error_detail(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(json) => match (&json["detail"], &json["reason"]) {
            (Value::String(s), _) => s.clone(),
            (Value::Null, Value::String(s)) => s.clone(),
            (Value::Null, _) => body.to_string(),
            (other, _) => other.to_string(),
        },
        Err(_) => body.to_string(),
    }
}

/// LNURL services answer with HTTP 200 even when they refuse a request, signalling the failure in the body instead.
pub fn check_lnurl_status(json: &Value) -> Result<(), LnbitsApiError> {
    match json["status"].as_str() {
        Some(s) if s.eq_ignore_ascii_case("ERROR") => {
            let reason = json["reason"].as_str().unwrap_or("no reason given");
            Err(LnbitsApiError::LnurlError(reason.to_string()))
        },
        _ => Ok(()),
    }
}

/// Converts millisatoshis to whole satoshis, rounding down.
pub fn msat_to_sat(msat: i64) -> i64 {
    msat.div_euclid(1000)
}
