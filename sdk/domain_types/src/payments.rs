use common_utils::types::MinorUnit;
use hyperswitch_masking::Secret;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Amount {
    pub currency: Option<String>,
    pub value: MinorUnit,
}

impl Amount {
    pub fn new(currency: impl Into<String>, value: i64) -> Self {
        Self {
            currency: Some(currency.into()),
            value: MinorUnit::new(value),
        }
    }
}

/// Reference to an existing partial payment order, sent back with every follow up call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub psp_reference: String,
    pub order_data: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub psp_reference: String,
    pub order_data: String,
    pub amount: Option<Amount>,
    pub remaining_amount: Option<Amount>,
}

impl OrderResponse {
    /// An order still needs another payment while its remaining amount is positive.
    pub fn has_remaining_amount(&self) -> bool {
        self.remaining_amount
            .as_ref()
            .is_some_and(|amount| amount.value.is_greater_than(0))
    }
}

impl From<&OrderResponse> for OrderRequest {
    fn from(order: &OrderResponse) -> Self {
        Self {
            psp_reference: order.psp_reference.clone(),
            order_data: order.order_data.clone(),
        }
    }
}

/// Payment method payload produced by an input component.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentComponentData {
    pub payment_method: Option<serde_json::Value>,
    pub order: Option<OrderRequest>,
    pub amount: Option<Amount>,
    pub store_payment_method: Option<bool>,
    pub shopper_reference: Option<String>,
    pub return_url: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PaymentComponentState {
    pub data: PaymentComponentData,
    pub is_input_valid: bool,
    pub is_ready: bool,
}

impl PaymentComponentState {
    pub fn is_valid(&self) -> bool {
        self.is_input_valid && self.is_ready
    }
}

/// Details collected while handling an action, to be submitted to `/payments/details`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionComponentData {
    pub payment_data: Option<String>,
    pub details: Option<serde_json::Value>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResult {
    pub balance: Amount,
    pub transaction_limit: Option<Amount>,
}

/// Gift card or prepaid card details used for a balance check.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceCheckDetails {
    #[serde(rename = "type")]
    pub payment_method_type: String,
    pub brand: Option<String>,
    pub encrypted_card_number: Option<Secret<String>>,
    pub encrypted_security_code: Option<Secret<String>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethod {
    #[serde(rename = "type")]
    pub payment_method_type: Option<String>,
    pub name: Option<String>,
    pub brands: Option<Vec<String>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredPaymentMethod {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub payment_method_type: Option<String>,
    pub name: Option<String>,
    pub brand: Option<String>,
    pub last_four: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethodsApiResponse {
    pub payment_methods: Option<Vec<PaymentMethod>>,
    pub stored_payment_methods: Option<Vec<StoredPaymentMethod>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remaining_amount_must_be_positive() {
        let mut order = OrderResponse {
            psp_reference: "psp".to_string(),
            order_data: "data".to_string(),
            amount: None,
            remaining_amount: Some(Amount::new("EUR", 500)),
        };
        assert!(order.has_remaining_amount());

        order.remaining_amount = Some(Amount::new("EUR", 0));
        assert!(!order.has_remaining_amount());

        order.remaining_amount = None;
        assert!(!order.has_remaining_amount());
    }
}
