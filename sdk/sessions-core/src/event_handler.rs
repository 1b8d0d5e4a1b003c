//! Glue between a session backed payment component, its [`SessionInteractor`] and the merchant
//! callback.

// std::sync::Mutex is fine here, the lock is never held across an .await point.
use std::sync::{Arc, Mutex, PoisonError};

use common_utils::scope::ComponentScope;
use domain_types::{
    errors::CheckoutError,
    events::PaymentComponentEvent,
    payments::{ActionComponentData, BalanceCheckDetails, PaymentComponentState},
    session::SessionModel,
};
use interfaces::{callback::SessionComponentCallback, saved_state::SavedStateStore};

use crate::{
    consts::{FLOW_TAKEN_OVER_KEY, SESSION_DATA_KEY},
    error::SessionError,
    interactor::SessionInteractor,
    repository::SessionRepository,
    result::{
        BalanceCallResult, CreateOrderCallResult, DetailsCallResult, PaymentsCallResult,
        SessionCallError,
    },
};

/// Session fields that have to outlive the hosting component.
#[derive(Clone)]
pub struct SessionSavedState {
    store: Arc<dyn SavedStateStore>,
}

impl SessionSavedState {
    pub fn new(store: Arc<dyn SavedStateStore>) -> Self {
        Self { store }
    }

    pub fn session_model(&self) -> Option<SessionModel> {
        self.store.get_as(SESSION_DATA_KEY)
    }

    pub fn update_session_model(&self, session_model: &SessionModel) {
        self.store.set_as(SESSION_DATA_KEY, Some(session_model));
    }

    pub fn is_flow_taken_over(&self) -> bool {
        self.store.get_as::<bool>(FLOW_TAKEN_OVER_KEY).unwrap_or_default()
    }

    pub fn set_flow_taken_over(&self, is_flow_taken_over: bool) {
        self.store.set_as(FLOW_TAKEN_OVER_KEY, Some(&is_flow_taken_over));
    }

    /// Builds the interactor from what was saved, falling back to `session_model` on a fresh
    /// start.
    pub fn restore_interactor(
        &self,
        repository: Arc<dyn SessionRepository>,
        session_model: SessionModel,
    ) -> SessionInteractor {
        let session_model = self.session_model().unwrap_or(session_model);
        SessionInteractor::new(repository, session_model, self.is_flow_taken_over())
    }
}

pub struct SessionComponentEventHandler {
    interactor: Arc<SessionInteractor>,
    saved_state: SessionSavedState,
    scope: Mutex<Option<ComponentScope>>,
}

impl SessionComponentEventHandler {
    pub fn new(interactor: Arc<SessionInteractor>, saved_state: SessionSavedState) -> Self {
        Self {
            interactor,
            saved_state,
            scope: Mutex::new(None),
        }
    }

    /// Starts persisting every session snapshot the interactor publishes.
    pub fn initialize(&self, scope: &ComponentScope) {
        tracing::debug!("initialize");
        let scope = scope.child();
        let saved_state = self.saved_state.clone();
        let mut session_flow = self.interactor.session_flow();
        saved_state.update_session_model(&session_flow.borrow_and_update());
        scope.launch(async move {
            while session_flow.changed().await.is_ok() {
                let session_model = session_flow.borrow_and_update().clone();
                saved_state.update_session_model(&session_model);
            }
        });

        let previous = self
            .scope
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(scope);
        if let Some(previous) = previous {
            previous.cancel();
        }
    }

    pub fn interactor(&self) -> &Arc<SessionInteractor> {
        &self.interactor
    }

    pub async fn on_payment_component_event(
        &self,
        event: PaymentComponentEvent,
        callback: Arc<dyn SessionComponentCallback>,
    ) {
        match event {
            PaymentComponentEvent::ActionDetails(action_component_data) => {
                self.on_action_details(action_component_data, callback.as_ref()).await;
            }
            PaymentComponentEvent::Error(error) => callback.on_error(error),
            PaymentComponentEvent::PermissionRequest(request) => {
                callback.on_permission_request(request);
            }
            PaymentComponentEvent::StateChanged(state) => callback.on_state_changed(&state),
            PaymentComponentEvent::Submit(state) => {
                self.on_submit(state, callback.as_ref()).await;
            }
        }
    }

    async fn on_submit(
        &self,
        state: PaymentComponentState,
        callback: &dyn SessionComponentCallback,
    ) {
        if !state.is_valid() {
            callback.on_error(CheckoutError::component("PaymentComponentState are not valid."));
            return;
        }

        callback.on_loading(true);
        let result = self
            .interactor
            .on_payments_call_requested(state, |state| callback.on_submit(state), "onSubmit")
            .await;
        callback.on_loading(false);

        match result {
            Ok(PaymentsCallResult::Action(action)) => callback.on_action(action),
            Ok(PaymentsCallResult::Finished(result))
            | Ok(PaymentsCallResult::NotFullyPaidOrder(result))
            | Ok(PaymentsCallResult::Error(SessionCallError::RefusedPartialPayment(result))) => {
                callback.on_finished(result)
            }
            Ok(PaymentsCallResult::Error(error)) => {
                callback.on_error(call_failed("Payments call failed", &error));
            }
            Ok(PaymentsCallResult::TakenOver) => self.saved_state.set_flow_taken_over(true),
            Err(report) => callback.on_error(not_implemented(report.current_context())),
        }
    }

    async fn on_action_details(
        &self,
        action_component_data: ActionComponentData,
        callback: &dyn SessionComponentCallback,
    ) {
        callback.on_loading(true);
        let result = self
            .interactor
            .on_details_call_requested(
                action_component_data,
                |data| callback.on_additional_details(data),
                "onAdditionalDetails",
            )
            .await;
        callback.on_loading(false);

        match result {
            Ok(DetailsCallResult::Action(action)) => callback.on_action(action),
            Ok(DetailsCallResult::Finished(result)) => callback.on_finished(result),
            Ok(DetailsCallResult::Error(error)) => {
                callback.on_error(call_failed("Details call failed", &error));
            }
            Ok(DetailsCallResult::TakenOver) => self.saved_state.set_flow_taken_over(true),
            Err(report) => callback.on_error(not_implemented(report.current_context())),
        }
    }

    /// Balance check of a gift card component.
    pub async fn on_balance_check(
        &self,
        details: BalanceCheckDetails,
        callback: Arc<dyn SessionComponentCallback>,
    ) {
        callback.on_loading(true);
        let result = self
            .interactor
            .check_balance(
                details,
                |details| callback.on_balance_check(details),
                "onBalanceCheck",
            )
            .await;
        callback.on_loading(false);

        match result {
            Ok(BalanceCallResult::Successful(balance)) => callback.on_balance(balance),
            Ok(BalanceCallResult::Error(error)) => {
                callback.on_error(call_failed("Balance call failed", &error));
            }
            Ok(BalanceCallResult::TakenOver) => self.saved_state.set_flow_taken_over(true),
            Err(report) => callback.on_error(not_implemented(report.current_context())),
        }
    }

    /// Order creation of a gift card component, before a partial payment.
    pub async fn on_order_request(&self, callback: Arc<dyn SessionComponentCallback>) {
        callback.on_loading(true);
        let result = self
            .interactor
            .create_order(|| callback.on_order_request(), "onOrderRequest")
            .await;
        callback.on_loading(false);

        match result {
            Ok(CreateOrderCallResult::Successful(order)) => callback.on_order(order),
            Ok(CreateOrderCallResult::Error(error)) => {
                callback.on_error(call_failed("Create order call failed", &error));
            }
            Ok(CreateOrderCallResult::TakenOver) => self.saved_state.set_flow_taken_over(true),
            Err(report) => callback.on_error(not_implemented(report.current_context())),
        }
    }

    pub fn on_cleared(&self) {
        tracing::debug!("onCleared");
        let scope = self
            .scope
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(scope) = scope {
            scope.cancel();
        }
    }
}

fn call_failed(message: &str, error: &SessionCallError) -> CheckoutError {
    match error {
        SessionCallError::Request(report) => {
            CheckoutError::Http(format!("{message}: {}", report.current_context()))
        }
        error => CheckoutError::component(format!("{message}: {error}")),
    }
}

fn not_implemented(error: &SessionError) -> CheckoutError {
    tracing::error!(%error, "session call not handled by the merchant");
    CheckoutError::component(error.to_string())
}
