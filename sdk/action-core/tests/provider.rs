#![allow(clippy::unwrap_used, clippy::panic)]

use std::sync::Arc;

use action_core::{ActionDelegateProvider, ActionHost};
use common_enums::{DelegateKind, Environment};
use common_utils::{
    request::{Request, Response},
    CustomResult,
};
use domain_types::{
    action::{Action, SdkAction},
    errors::{ActionError, ApiClientError, CheckoutError},
    threeds2::{ThreeDs2ConfigParameters, ThreeDs2InitFailure},
    types::CheckoutConfiguration,
};
use interfaces::{
    api::ApiClient,
    delegate::RedirectListener,
    redirect::RedirectHandler,
    saved_state::InMemorySavedState,
    sdk::NativeSdkLauncher,
    threeds2::{ThreeDs2Service, ThreeDs2Transaction},
};
use serde_json::json;

struct OfflineApiClient;

#[async_trait::async_trait]
impl ApiClient for OfflineApiClient {
    async fn execute(
        &self,
        _request: Request,
    ) -> CustomResult<Result<Response, Response>, ApiClientError> {
        Err(ApiClientError::RequestNotSent("offline".to_string()).into())
    }
}

struct NoopRedirectHandler;

impl RedirectHandler for NoopRedirectHandler {
    fn launch_uri_redirect(&self, _url: &str) -> Result<(), CheckoutError> {
        Ok(())
    }

    fn parse_redirect_result(
        &self,
        _data: Option<&url::Url>,
    ) -> Result<serde_json::Value, CheckoutError> {
        Ok(json!({}))
    }

    fn set_on_redirect_listener(&self, _listener: RedirectListener) {}

    fn remove_on_redirect_listener(&self) {}
}

struct NoopThreeDs2Service;

#[async_trait::async_trait]
impl ThreeDs2Service for NoopThreeDs2Service {
    async fn initialize(
        &self,
        _parameters: ThreeDs2ConfigParameters,
        _locale: Option<String>,
    ) -> Result<(), ThreeDs2InitFailure> {
        Ok(())
    }

    fn create_transaction(
        &self,
        _directory_server_id: &str,
        _message_version: &str,
    ) -> Result<Arc<dyn ThreeDs2Transaction>, CheckoutError> {
        Err(CheckoutError::component("no 3DS2 SDK"))
    }

    fn cleanup(&self) {}
}

struct NoopSdkLauncher;

#[async_trait::async_trait]
impl NativeSdkLauncher for NoopSdkLauncher {
    async fn launch(&self, _action: &SdkAction) -> Result<serde_json::Value, CheckoutError> {
        Ok(json!({}))
    }
}

fn host() -> ActionHost {
    ActionHost {
        api_client: Arc::new(OfflineApiClient),
        redirect_handler: Arc::new(NoopRedirectHandler),
        threeds2_service: Arc::new(NoopThreeDs2Service),
        sdk_launcher: Arc::new(NoopSdkLauncher),
    }
}

fn dispatch(action: serde_json::Value) -> CustomResult<DelegateKind, ActionError> {
    let action: Action = serde_json::from_value(action).unwrap();
    ActionDelegateProvider::get_delegate(
        &action,
        &CheckoutConfiguration::new(Environment::Test, "test_CLIENTKEY"),
        Arc::new(InMemorySavedState::new()),
        &host(),
    )
    .map(|delegate| delegate.kind())
}

#[test]
fn every_known_action_type_has_a_delegate() {
    let cases = [
        ("await", DelegateKind::Await),
        ("qrCode", DelegateKind::QrCode),
        ("redirect", DelegateKind::Redirect),
        ("nativeRedirect", DelegateKind::Redirect),
        ("threeDS2Fingerprint", DelegateKind::ThreeDs2),
        ("threeDS2Challenge", DelegateKind::ThreeDs2),
        ("threeDS2", DelegateKind::ThreeDs2),
        ("voucher", DelegateKind::Voucher),
        ("sdk", DelegateKind::Sdk),
    ];

    for (action_type, expected) in cases {
        let kind = dispatch(json!({ "type": action_type, "paymentData": "pd" })).unwrap();
        assert_eq!(kind, expected, "action type {action_type}");
    }
}

#[test]
fn unknown_action_type_is_rejected_with_its_tag() {
    let error = dispatch(json!({ "type": "bankTransfer", "paymentData": "pd" })).unwrap_err();

    assert_eq!(
        error.current_context(),
        &ActionError::UnsupportedActionType("bankTransfer".to_string())
    );
}
