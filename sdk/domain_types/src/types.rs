use common_enums::Environment;
use hyperswitch_masking::{ExposeInterface, Secret};

#[derive(Debug, serde::Deserialize, Clone, Default)]
pub struct Proxy {
    pub http_url: Option<String>,
    pub https_url: Option<String>,
    pub idle_pool_connection_timeout: Option<u64>,
    #[serde(default)]
    pub bypass_proxy_urls: Vec<String>,
}

/// Settings shared by every component of one checkout.
#[derive(Debug, serde::Deserialize, Clone)]
pub struct CheckoutConfiguration {
    #[serde(default)]
    pub environment: Environment,
    pub client_key: Secret<String>,
    pub shopper_locale: Option<String>,
    /// Universal link the 3DS2 challenge returns to, sent from protocol 2.2.0 on.
    pub three_ds_requestor_app_url: Option<String>,
    /// Replaces the environment host, used for tests and self hosted proxies.
    pub base_url_override: Option<String>,
}

impl CheckoutConfiguration {
    pub fn new(environment: Environment, client_key: impl Into<String>) -> Self {
        Self {
            environment,
            client_key: Secret::new(client_key.into()),
            shopper_locale: None,
            three_ds_requestor_app_url: None,
            base_url_override: None,
        }
    }

    pub fn base_url(&self) -> &str {
        self.base_url_override
            .as_deref()
            .unwrap_or_else(|| self.environment.checkout_shopper_base_url())
    }

    pub fn client_key(&self) -> String {
        self.client_key.clone().expose()
    }
}

/// Return url the host received after an external redirect.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RedirectIntent {
    pub data: Option<url::Url>,
}

impl RedirectIntent {
    pub fn new(data: url::Url) -> Self {
        Self { data: Some(data) }
    }
}
