use std::sync::Arc;

use common_utils::{
    consts,
    request::{build_url, Method, RequestBuilder, RequestContent},
    CustomResult,
};
use domain_types::types::CheckoutConfiguration;
use error_stack::ResultExt;
use external_services::service::execute_checkout_api_call;
use hyperswitch_masking::{ExposeInterface, Secret};
use interfaces::api::ApiClient;
use serde::{Deserialize, Serialize};

use super::RepositoryError;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeRedirectRequest {
    pub redirect_data: String,
    pub return_query_string: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeRedirectResponse {
    pub redirect_result: String,
}

/// Exchanges the data of a `nativeRedirect` return for a `redirectResult`.
pub struct NativeRedirectRepository {
    api_client: Arc<dyn ApiClient>,
    base_url: String,
    client_key: Secret<String>,
}

impl NativeRedirectRepository {
    pub fn new(api_client: Arc<dyn ApiClient>, configuration: &CheckoutConfiguration) -> Self {
        Self {
            api_client,
            base_url: configuration.base_url().to_string(),
            client_key: configuration.client_key.clone(),
        }
    }

    pub async fn make_native_redirect(
        &self,
        request: NativeRedirectRequest,
    ) -> CustomResult<NativeRedirectResponse, RepositoryError> {
        let client_key = self.client_key.clone().expose();
        let url = build_url(
            &self.base_url,
            consts::NATIVE_REDIRECT_PATH,
            &[(consts::CLIENT_KEY_QUERY, client_key.as_str())],
        )
        .change_context(RepositoryError::InvalidUrl)?;

        let request = RequestBuilder::new()
            .method(Method::Post)
            .url(url.as_str())
            .attach_default_headers()
            .set_body(RequestContent::json(request))
            .build();

        execute_checkout_api_call(self.api_client.as_ref(), request, "native_redirect")
            .await
            .change_context(RepositoryError::RequestFailed)
    }
}
