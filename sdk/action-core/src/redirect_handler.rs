//! Default [`RedirectHandler`]: launches external urls and parses the return url.

// std::sync::Mutex is fine here, the lock is never held across an .await point.
use std::sync::{Arc, Mutex, PoisonError};

use domain_types::errors::CheckoutError;
use interfaces::{
    delegate::RedirectListener,
    redirect::{RedirectHandler, UriLauncher},
};
use serde_json::{Map, Value};

const PAYLOAD_PARAMETER: &str = "payload";
const REDIRECT_RESULT_PARAMETER: &str = "redirectResult";
const PAYMENT_RESULT_PARAMETER: &str = "PaRes";
const MD_PARAMETER: &str = "MD";
const QUERY_STRING_RESULT: &str = "returnUrlQueryString";

/// Tries each launcher in order (native app, in-app browser, system browser) until one accepts
/// the url.
pub struct DefaultRedirectHandler {
    launchers: Vec<Arc<dyn UriLauncher>>,
    on_redirect: Mutex<Option<RedirectListener>>,
}

impl DefaultRedirectHandler {
    pub fn new(launchers: Vec<Arc<dyn UriLauncher>>) -> Self {
        Self {
            launchers,
            on_redirect: Mutex::new(None),
        }
    }

    fn listener(&self) -> Option<RedirectListener> {
        self.on_redirect
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl RedirectHandler for DefaultRedirectHandler {
    fn launch_uri_redirect(&self, url: &str) -> Result<(), CheckoutError> {
        if url.is_empty() {
            return Err(CheckoutError::component("Redirect URL is empty."));
        }
        let uri = url::Url::parse(url).map_err(|error| {
            tracing::error!(%error, "redirect url does not parse");
            CheckoutError::component("Launching redirect failed.")
        })?;

        for launcher in &self.launchers {
            match launcher.launch(&uri) {
                Ok(()) => {
                    if let Some(listener) = self.listener() {
                        listener();
                    }
                    return Ok(());
                }
                Err(error) => tracing::debug!(%error, "launcher declined redirect"),
            }
        }

        tracing::error!("Could not launch url");
        Err(CheckoutError::component("Launching redirect failed."))
    }

    fn parse_redirect_result(&self, data: Option<&url::Url>) -> Result<Value, CheckoutError> {
        tracing::debug!(data = ?data.map(url::Url::path), "parse_redirect_result");
        let data = data.ok_or_else(|| CheckoutError::component("Received a null redirect Uri"))?;

        let query_parameter = |name: &str| {
            data.query_pairs()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.into_owned())
        };

        let mut extracted = Map::new();
        for name in [PAYLOAD_PARAMETER, REDIRECT_RESULT_PARAMETER] {
            if let Some(value) = query_parameter(name) {
                extracted.insert(name.to_string(), Value::String(value));
            }
        }
        if let (Some(payment_result), Some(md)) = (
            query_parameter(PAYMENT_RESULT_PARAMETER),
            query_parameter(MD_PARAMETER),
        ) {
            extracted.insert(PAYMENT_RESULT_PARAMETER.to_string(), Value::String(payment_result));
            extracted.insert(MD_PARAMETER.to_string(), Value::String(md));
        }

        if extracted.is_empty() {
            if let Some(query) = data.query().filter(|query| !query.is_empty()) {
                extracted.insert(QUERY_STRING_RESULT.to_string(), Value::String(query.to_string()));
            }
        }

        if extracted.is_empty() {
            return Err(CheckoutError::component(
                "Error parsing redirect result, could not any query parameters",
            ));
        }
        Ok(Value::Object(extracted))
    }

    fn set_on_redirect_listener(&self, listener: RedirectListener) {
        *self.on_redirect.lock().unwrap_or_else(PoisonError::into_inner) = Some(listener);
    }

    fn remove_on_redirect_listener(&self) {
        *self.on_redirect.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    use super::*;

    struct Launcher {
        accepts: bool,
        launched: AtomicUsize,
    }

    impl UriLauncher for Launcher {
        fn launch(&self, _url: &url::Url) -> Result<(), CheckoutError> {
            self.launched.fetch_add(1, Ordering::SeqCst);
            if self.accepts {
                Ok(())
            } else {
                Err(CheckoutError::component("no handler"))
            }
        }
    }

    fn launcher(accepts: bool) -> Arc<Launcher> {
        Arc::new(Launcher {
            accepts,
            launched: AtomicUsize::new(0),
        })
    }

    fn parse(url: &str) -> Result<Value, CheckoutError> {
        DefaultRedirectHandler::new(Vec::new())
            .parse_redirect_result(Some(&url::Url::parse(url).unwrap()))
    }

    #[test]
    fn redirect_result_is_extracted() {
        assert_eq!(
            parse("adyencheckout://com.shop?redirectResult=abc%3D%3D&other=1").unwrap(),
            json!({ "redirectResult": "abc==" })
        );
    }

    #[test]
    fn pares_needs_md() {
        assert_eq!(
            parse("app://return?PaRes=pares&MD=md").unwrap(),
            json!({ "PaRes": "pares", "MD": "md" })
        );
        assert_eq!(
            parse("app://return?PaRes=pares").unwrap(),
            json!({ "returnUrlQueryString": "PaRes=pares" })
        );
    }

    #[test]
    fn missing_data_is_an_error() {
        let handler = DefaultRedirectHandler::new(Vec::new());
        assert_eq!(
            handler.parse_redirect_result(None).unwrap_err().message(),
            "Received a null redirect Uri"
        );
        assert!(parse("app://return").is_err());
    }

    #[test]
    fn falls_through_launchers_and_notifies_listener() {
        let native = launcher(false);
        let browser = launcher(true);
        let handler = DefaultRedirectHandler::new(vec![native.clone(), browser.clone()]);
        let notified = Arc::new(AtomicUsize::new(0));
        let counter = notified.clone();
        handler.set_on_redirect_listener(Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        handler.launch_uri_redirect("https://bank.example/pay").unwrap();

        assert_eq!(native.launched.load(Ordering::SeqCst), 1);
        assert_eq!(browser.launched.load(Ordering::SeqCst), 1);
        assert_eq!(notified.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn launch_errors() {
        let handler = DefaultRedirectHandler::new(vec![launcher(false)]);
        assert_eq!(
            handler.launch_uri_redirect("").unwrap_err().message(),
            "Redirect URL is empty."
        );
        assert_eq!(
            handler
                .launch_uri_redirect("https://bank.example")
                .unwrap_err()
                .message(),
            "Launching redirect failed."
        );
    }
}
