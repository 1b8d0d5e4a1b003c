//! One result type per session RPC. Each call produces exactly one variant.

use domain_types::{
    action::Action,
    errors::ApiClientError,
    payments::{BalanceResult, OrderResponse, PaymentMethodsApiResponse},
    session::SessionPaymentResult,
};

/// Expected failure of a session call, returned as a value.
#[derive(Debug, thiserror::Error)]
pub enum SessionCallError {
    #[error("{}", .0.current_context())]
    Request(error_stack::Report<ApiClientError>),
    /// A payment of a partially paid order was refused. The order is still open.
    #[error("Payment was refused while paying a partial order")]
    RefusedPartialPayment(SessionPaymentResult),
    #[error("Not enough balance")]
    NotEnoughBalance,
    #[error("Payment methods should not be null")]
    MissingPaymentMethods,
}

/// Common view over the per RPC results.
pub trait SessionCallResult: Sized {
    /// Name used in logs.
    const CALL: &'static str;

    fn error(&self) -> Option<&SessionCallError>;
}

/// Results of the calls a merchant can take over.
pub trait GatedCallResult: SessionCallResult {
    fn taken_over() -> Self;
}

macro_rules! impl_call_result {
    ($result:ident, $call:literal, gated) => {
        impl_call_result!($result, $call);

        impl GatedCallResult for $result {
            fn taken_over() -> Self {
                Self::TakenOver
            }
        }
    };
    ($result:ident, $call:literal) => {
        impl SessionCallResult for $result {
            const CALL: &'static str = $call;

            fn error(&self) -> Option<&SessionCallError> {
                match self {
                    Self::Error(error) => Some(error),
                    _ => None,
                }
            }
        }
    };
}

#[derive(Debug)]
pub enum PaymentsCallResult {
    Finished(SessionPaymentResult),
    NotFullyPaidOrder(SessionPaymentResult),
    Action(Action),
    Error(SessionCallError),
    TakenOver,
}

#[derive(Debug)]
pub enum DetailsCallResult {
    Finished(SessionPaymentResult),
    Action(Action),
    Error(SessionCallError),
    TakenOver,
}

#[derive(Debug)]
pub enum BalanceCallResult {
    Successful(BalanceResult),
    Error(SessionCallError),
    TakenOver,
}

#[derive(Debug)]
pub enum CreateOrderCallResult {
    Successful(OrderResponse),
    Error(SessionCallError),
    TakenOver,
}

#[derive(Debug)]
pub enum CancelOrderCallResult {
    Successful,
    Error(SessionCallError),
    TakenOver,
}

#[derive(Debug)]
pub enum UpdatePaymentMethodsCallResult {
    Successful {
        payment_methods: PaymentMethodsApiResponse,
        order: Option<OrderResponse>,
    },
    Error(SessionCallError),
    TakenOver,
}

#[derive(Debug)]
pub enum RemoveStoredPaymentMethodCallResult {
    Successful,
    Error(SessionCallError),
}

impl_call_result!(PaymentsCallResult, "payments", gated);
impl_call_result!(DetailsCallResult, "details", gated);
impl_call_result!(BalanceCallResult, "balance", gated);
impl_call_result!(CreateOrderCallResult, "create_order", gated);
impl_call_result!(CancelOrderCallResult, "cancel_order", gated);
impl_call_result!(UpdatePaymentMethodsCallResult, "update_payment_methods", gated);
impl_call_result!(RemoveStoredPaymentMethodCallResult, "remove_stored_payment_method");
