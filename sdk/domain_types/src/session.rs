//! Request and response bodies of the `/sessions` endpoints.

use serde::{Deserialize, Serialize};

use crate::{
    action::Action,
    payments::{
        Amount, BalanceCheckDetails, OrderRequest, OrderResponse, PaymentComponentData,
        PaymentMethodsApiResponse,
    },
};

/// Identity of a checkout session plus its rotating `sessionData` token.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionModel {
    pub id: String,
    pub session_data: Option<String>,
}

impl SessionModel {
    pub fn new(id: impl Into<String>, session_data: Option<String>) -> Self {
        Self {
            id: id.into(),
            session_data,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSetupRequest {
    pub session_data: String,
    pub order: Option<OrderRequest>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSetupResponse {
    pub id: String,
    pub session_data: String,
    pub amount: Option<Amount>,
    pub expires_at: Option<String>,
    pub payment_methods: Option<PaymentMethodsApiResponse>,
    pub return_url: Option<String>,
    pub shopper_locale: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPaymentsRequest {
    pub session_data: String,
    #[serde(flatten)]
    pub payment_component_data: PaymentComponentData,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPaymentsResponse {
    pub session_data: String,
    pub session_result: Option<String>,
    pub status: Option<String>,
    pub result_code: Option<String>,
    pub action: Option<Action>,
    pub order: Option<OrderResponse>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDetailsRequest {
    pub session_data: String,
    pub payment_data: Option<String>,
    pub details: Option<serde_json::Value>,
}

/// `/paymentDetails` answers with the same shape as `/payments`.
pub type SessionDetailsResponse = SessionPaymentsResponse;

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionBalanceRequest {
    pub session_data: String,
    pub payment_method: BalanceCheckDetails,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionBalanceResponse {
    pub session_data: String,
    pub balance: Amount,
    pub transaction_limit: Option<Amount>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionOrderRequest {
    pub session_data: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionOrderResponse {
    pub session_data: String,
    pub psp_reference: String,
    pub order_data: String,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCancelOrderRequest {
    pub session_data: String,
    pub order: OrderRequest,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCancelOrderResponse {
    pub session_data: String,
    pub status: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDisableTokenRequest {
    pub session_data: String,
    pub stored_payment_method_id: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDisableTokenResponse {
    pub session_data: String,
}

/// Outcome of a session payment that needs no further action.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionPaymentResult {
    pub session_id: String,
    pub session_result: Option<String>,
    pub session_data: Option<String>,
    pub result_code: Option<String>,
    pub order: Option<OrderResponse>,
}
