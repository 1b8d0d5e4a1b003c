//! The `/sessions` endpoints of the Checkout API.

use std::sync::Arc;

use common_utils::{
    consts,
    request::{build_url, Method, RequestBuilder, RequestContent},
    CustomResult,
};
use domain_types::{
    errors::ApiClientError,
    payments::{ActionComponentData, BalanceCheckDetails, OrderRequest, PaymentComponentData},
    session::{
        SessionBalanceRequest, SessionBalanceResponse, SessionCancelOrderRequest,
        SessionCancelOrderResponse, SessionDetailsRequest, SessionDetailsResponse,
        SessionDisableTokenRequest, SessionDisableTokenResponse, SessionModel,
        SessionOrderRequest, SessionOrderResponse, SessionPaymentsRequest,
        SessionPaymentsResponse, SessionSetupRequest, SessionSetupResponse,
    },
    types::CheckoutConfiguration,
};
use error_stack::ResultExt;
use external_services::service::execute_checkout_api_call;
use hyperswitch_masking::{ExposeInterface, Secret};
use interfaces::api::ApiClient;
use serde::{de::DeserializeOwned, Serialize};

/// One method per session RPC. Every call is a single request, nothing is retried.
#[async_trait::async_trait]
pub trait SessionRepository: Send + Sync {
    async fn setup_session(
        &self,
        session_model: &SessionModel,
        order: Option<OrderRequest>,
    ) -> CustomResult<SessionSetupResponse, ApiClientError>;

    async fn submit_payment(
        &self,
        session_model: &SessionModel,
        payment_component_data: PaymentComponentData,
    ) -> CustomResult<SessionPaymentsResponse, ApiClientError>;

    async fn submit_details(
        &self,
        session_model: &SessionModel,
        action_component_data: ActionComponentData,
    ) -> CustomResult<SessionDetailsResponse, ApiClientError>;

    async fn check_balance(
        &self,
        session_model: &SessionModel,
        details: BalanceCheckDetails,
    ) -> CustomResult<SessionBalanceResponse, ApiClientError>;

    async fn create_order(
        &self,
        session_model: &SessionModel,
    ) -> CustomResult<SessionOrderResponse, ApiClientError>;

    async fn cancel_order(
        &self,
        session_model: &SessionModel,
        order: OrderRequest,
    ) -> CustomResult<SessionCancelOrderResponse, ApiClientError>;

    async fn disable_token(
        &self,
        session_model: &SessionModel,
        stored_payment_method_id: &str,
    ) -> CustomResult<SessionDisableTokenResponse, ApiClientError>;
}

pub struct DefaultSessionRepository {
    api_client: Arc<dyn ApiClient>,
    base_url: String,
    client_key: Secret<String>,
}

impl DefaultSessionRepository {
    pub fn new(api_client: Arc<dyn ApiClient>, configuration: &CheckoutConfiguration) -> Self {
        Self {
            api_client,
            base_url: configuration.base_url().to_string(),
            client_key: configuration.client_key.clone(),
        }
    }

    async fn post<Req, Resp>(
        &self,
        session_model: &SessionModel,
        endpoint: &str,
        body: Req,
        flow: &'static str,
    ) -> CustomResult<Resp, ApiClientError>
    where
        Req: Serialize + Send + 'static,
        Resp: DeserializeOwned,
    {
        let client_key = self.client_key.clone().expose();
        let path = format!("{}/{}/{endpoint}", consts::SESSIONS_PATH, session_model.id);
        let url = build_url(
            &self.base_url,
            &path,
            &[(consts::CLIENT_KEY_QUERY, client_key.as_str())],
        )
        .change_context(ApiClientError::UrlEncodingFailed)
        .attach_printable_lazy(|| format!("invalid session url for {flow}"))?;

        let request = RequestBuilder::new()
            .method(Method::Post)
            .url(url.as_str())
            .attach_default_headers()
            .set_body(RequestContent::json(body))
            .build();

        tracing::debug!(flow, session_id = %session_model.id, "calling session endpoint");
        execute_checkout_api_call(self.api_client.as_ref(), request, flow).await
    }
}

/// Sessions rotate `sessionData` on every call; a session without one sends an empty token.
fn session_data(session_model: &SessionModel) -> String {
    session_model.session_data.clone().unwrap_or_default()
}

#[async_trait::async_trait]
impl SessionRepository for DefaultSessionRepository {
    async fn setup_session(
        &self,
        session_model: &SessionModel,
        order: Option<OrderRequest>,
    ) -> CustomResult<SessionSetupResponse, ApiClientError> {
        let body = SessionSetupRequest {
            session_data: session_data(session_model),
            order,
        };
        self.post(session_model, "setup", body, "session_setup").await
    }

    async fn submit_payment(
        &self,
        session_model: &SessionModel,
        payment_component_data: PaymentComponentData,
    ) -> CustomResult<SessionPaymentsResponse, ApiClientError> {
        let body = SessionPaymentsRequest {
            session_data: session_data(session_model),
            payment_component_data,
        };
        self.post(session_model, "payments", body, "session_payments")
            .await
    }

    async fn submit_details(
        &self,
        session_model: &SessionModel,
        action_component_data: ActionComponentData,
    ) -> CustomResult<SessionDetailsResponse, ApiClientError> {
        let body = SessionDetailsRequest {
            session_data: session_data(session_model),
            payment_data: action_component_data.payment_data,
            details: action_component_data.details,
        };
        self.post(session_model, "paymentDetails", body, "session_details")
            .await
    }

    async fn check_balance(
        &self,
        session_model: &SessionModel,
        details: BalanceCheckDetails,
    ) -> CustomResult<SessionBalanceResponse, ApiClientError> {
        let body = SessionBalanceRequest {
            session_data: session_data(session_model),
            payment_method: details,
        };
        self.post(session_model, "paymentMethodBalance", body, "session_balance")
            .await
    }

    async fn create_order(
        &self,
        session_model: &SessionModel,
    ) -> CustomResult<SessionOrderResponse, ApiClientError> {
        let body = SessionOrderRequest {
            session_data: session_data(session_model),
        };
        self.post(session_model, "orders", body, "session_create_order")
            .await
    }

    async fn cancel_order(
        &self,
        session_model: &SessionModel,
        order: OrderRequest,
    ) -> CustomResult<SessionCancelOrderResponse, ApiClientError> {
        let body = SessionCancelOrderRequest {
            session_data: session_data(session_model),
            order,
        };
        self.post(session_model, "orders/cancel", body, "session_cancel_order")
            .await
    }

    async fn disable_token(
        &self,
        session_model: &SessionModel,
        stored_payment_method_id: &str,
    ) -> CustomResult<SessionDisableTokenResponse, ApiClientError> {
        let body = SessionDisableTokenRequest {
            session_data: session_data(session_model),
            stored_payment_method_id: stored_payment_method_id.to_string(),
        };
        self.post(session_model, "disableToken", body, "session_disable_token")
            .await
    }
}
