use domain_types::{action::SdkAction, errors::CheckoutError};

/// Hands an `sdk` action over to the payment method's native SDK.
#[async_trait::async_trait]
pub trait NativeSdkLauncher: Send + Sync {
    /// Resolves with the details the native SDK returned once the shopper is back.
    async fn launch(&self, action: &SdkAction) -> Result<serde_json::Value, CheckoutError>;
}
