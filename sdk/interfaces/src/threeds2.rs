//! Seam towards the platform 3DS2 SDK.

use std::sync::Arc;

use domain_types::{
    errors::CheckoutError,
    threeds2::{
        AuthenticationRequestParameters, ChallengeParameters, ChallengeResult,
        ThreeDs2ConfigParameters, ThreeDs2InitFailure,
    },
};

#[async_trait::async_trait]
pub trait ThreeDs2Service: Send + Sync {
    async fn initialize(
        &self,
        parameters: ThreeDs2ConfigParameters,
        locale: Option<String>,
    ) -> Result<(), ThreeDs2InitFailure>;

    fn create_transaction(
        &self,
        directory_server_id: &str,
        message_version: &str,
    ) -> Result<Arc<dyn ThreeDs2Transaction>, CheckoutError>;

    /// Releases SDK resources. Safe to call when the SDK was never initialised.
    fn cleanup(&self);
}

#[async_trait::async_trait]
pub trait ThreeDs2Transaction: Send + Sync {
    fn authentication_request_parameters(&self) -> Option<AuthenticationRequestParameters>;

    async fn do_challenge(
        &self,
        parameters: ChallengeParameters,
        timeout_minutes: u32,
    ) -> Result<ChallengeResult, CheckoutError>;

    fn close(&self);
}
