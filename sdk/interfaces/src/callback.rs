use domain_types::{
    action::Action,
    errors::CheckoutError,
    events::PermissionRequestData,
    payments::{
        ActionComponentData, BalanceCheckDetails, BalanceResult, OrderResponse,
        PaymentComponentState,
    },
    session::SessionPaymentResult,
};

/// Merchant hooks of a session backed component.
///
/// The `on_submit`, `on_additional_details`, `on_balance_check` and `on_order_request` hooks let
/// the merchant take over the matching API call. Returning `true` means the call was handled
/// outside the SDK; from then on the merchant has to handle every later call of the flow too.
pub trait SessionComponentCallback: Send + Sync {
    fn on_action(&self, action: Action);

    fn on_finished(&self, result: SessionPaymentResult);

    fn on_error(&self, error: CheckoutError);

    fn on_state_changed(&self, _state: &PaymentComponentState) {}

    fn on_submit(&self, _state: &PaymentComponentState) -> bool {
        false
    }

    fn on_additional_details(&self, _action_component_data: &ActionComponentData) -> bool {
        false
    }

    fn on_balance_check(&self, _details: &BalanceCheckDetails) -> bool {
        false
    }

    fn on_order_request(&self) -> bool {
        false
    }

    fn on_balance(&self, _result: BalanceResult) {}

    fn on_order(&self, _order: OrderResponse) {}

    fn on_loading(&self, _is_loading: bool) {}

    /// Denies the request unless overridden.
    fn on_permission_request(&self, request: PermissionRequestData) {
        request.respond(false);
    }
}
