use domain_types::errors::CheckoutError;

use crate::delegate::RedirectListener;

/// Opens an external url (browser, banking app) on behalf of a delegate.
pub trait UriLauncher: Send + Sync {
    fn launch(&self, url: &url::Url) -> Result<(), CheckoutError>;
}

pub trait RedirectHandler: Send + Sync {
    fn launch_uri_redirect(&self, url: &str) -> Result<(), CheckoutError>;

    /// Turns the return url of a redirect into the details to submit.
    fn parse_redirect_result(
        &self,
        data: Option<&url::Url>,
    ) -> Result<serde_json::Value, CheckoutError>;

    fn set_on_redirect_listener(&self, listener: RedirectListener);

    fn remove_on_redirect_listener(&self);
}
