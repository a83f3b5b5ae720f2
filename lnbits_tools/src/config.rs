use log::*;

const DEFAULT_LNBITS_URL: &str = "https://legend.lnbits.com";

#[derive(Debug, Clone)]
pub struct LnbitsConfig {
    /// Base URL of the LNbits instance, without a trailing slash. e.g. "https://legend.lnbits.com"
    pub url: String,
}

impl Default for LnbitsConfig {
    fn default() -> Self {
        Self { url: DEFAULT_LNBITS_URL.to_string() }
    }
}

impl LnbitsConfig {
    pub fn new<S: Into<String>>(url: S) -> Self {
        let url = url.into().trim_end_matches('/').to_string();
        Self { url }
    }

    pub fn new_from_env_or_default() -> Self {
        match std::env::var("SAAS_LNBITS_URL") {
            Ok(url) => Self::new(url),
            Err(_) => {
                warn!("🪛️ SAAS_LNBITS_URL not set, using {DEFAULT_LNBITS_URL} as default");
                Self::default()
            },
        }
    }
}
