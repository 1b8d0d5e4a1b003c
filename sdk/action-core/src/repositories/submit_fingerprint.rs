use std::sync::Arc;

use common_utils::{
    consts,
    request::{build_url, Method, RequestBuilder, RequestContent},
    CustomResult,
};
use domain_types::{
    action::Action,
    threeds2::{SubmitFingerprintRequest, SubmitFingerprintResponse, SubmitFingerprintResult},
    types::CheckoutConfiguration,
};
use error_stack::{report, ResultExt};
use external_services::service::execute_checkout_api_call;
use hyperswitch_masking::{ExposeInterface, Secret};
use interfaces::api::ApiClient;

use super::RepositoryError;

const RESPONSE_TYPE_COMPLETED: &str = "completed";
const RESPONSE_TYPE_ACTION: &str = "action";

/// Posts the device fingerprint of a `threeDS2` action directly to the Checkout API.
pub struct SubmitFingerprintRepository {
    api_client: Arc<dyn ApiClient>,
    base_url: String,
    client_key: Secret<String>,
}

impl SubmitFingerprintRepository {
    pub fn new(api_client: Arc<dyn ApiClient>, configuration: &CheckoutConfiguration) -> Self {
        Self {
            api_client,
            base_url: configuration.base_url().to_string(),
            client_key: configuration.client_key.clone(),
        }
    }

    pub async fn submit_fingerprint(
        &self,
        encoded_fingerprint: &str,
        payment_data: Option<String>,
    ) -> CustomResult<SubmitFingerprintResult, RepositoryError> {
        let client_key = self.client_key.clone().expose();
        let url = build_url(
            &self.base_url,
            consts::SUBMIT_FINGERPRINT_PATH,
            &[(consts::TOKEN_QUERY, client_key.as_str())],
        )
        .change_context(RepositoryError::InvalidUrl)?;

        let request = RequestBuilder::new()
            .method(Method::Post)
            .url(url.as_str())
            .attach_default_headers()
            .set_body(RequestContent::json(SubmitFingerprintRequest {
                fingerprint_result: encoded_fingerprint.to_string(),
                payment_data,
            }))
            .build();

        let response: SubmitFingerprintResponse =
            execute_checkout_api_call(self.api_client.as_ref(), request, "submit_fingerprint")
                .await
                .change_context(RepositoryError::RequestFailed)?;

        match (response.response_type.as_str(), response.details, response.action) {
            (RESPONSE_TYPE_COMPLETED, Some(details), _) => {
                Ok(SubmitFingerprintResult::Completed(details))
            }
            (RESPONSE_TYPE_ACTION, _, Some(Action::Redirect(action))) => {
                Ok(SubmitFingerprintResult::Redirect(action))
            }
            (RESPONSE_TYPE_ACTION, _, Some(Action::Threeds2(action))) => {
                Ok(SubmitFingerprintResult::Threeds2(action))
            }
            (response_type, _, action) => Err(report!(RepositoryError::UnexpectedResponse(
                format!(
                    "Failed to retrieve 3DS2 fingerprint result - {response_type} {:?}",
                    action.map(|a| a.type_tag())
                )
            ))),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use common_enums::Environment;
    use common_utils::request::{Request, Response};
    use domain_types::errors::ApiClientError;
    use serde_json::json;

    use super::*;

    struct Fixed(serde_json::Value);

    #[async_trait::async_trait]
    impl ApiClient for Fixed {
        async fn execute(
            &self,
            request: Request,
        ) -> CustomResult<Result<Response, Response>, ApiClientError> {
            assert!(request
                .url
                .ends_with("v1/submitThreeDS2Fingerprint?token=test_KEY"));
            Ok(Ok(Response::json(200, &self.0)))
        }
    }

    fn repository(body: serde_json::Value) -> SubmitFingerprintRepository {
        SubmitFingerprintRepository::new(
            Arc::new(Fixed(body)),
            &CheckoutConfiguration::new(Environment::Test, "test_KEY"),
        )
    }

    #[tokio::test]
    async fn completed_response_carries_details() {
        let result = repository(json!({
            "type": "completed",
            "details": { "threeDSResult": "abc" }
        }))
        .submit_fingerprint("fp", Some("pd".into()))
        .await
        .unwrap();

        assert_eq!(
            result,
            SubmitFingerprintResult::Completed(json!({ "threeDSResult": "abc" }))
        );
    }

    #[tokio::test]
    async fn action_response_continues_with_challenge() {
        let result = repository(json!({
            "type": "action",
            "action": { "type": "threeDS2", "subtype": "challenge", "token": "tok" }
        }))
        .submit_fingerprint("fp", None)
        .await
        .unwrap();

        let SubmitFingerprintResult::Threeds2(action) = result else {
            panic!("expected a threeDS2 continuation");
        };
        assert_eq!(action.token.as_deref(), Some("tok"));
    }

    #[tokio::test]
    async fn unexpected_action_is_rejected() {
        let error = repository(json!({
            "type": "action",
            "action": { "type": "voucher" }
        }))
        .submit_fingerprint("fp", None)
        .await
        .unwrap_err();

        assert!(matches!(
            error.current_context(),
            RepositoryError::UnexpectedResponse(_)
        ));
    }
}
