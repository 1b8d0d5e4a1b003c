//! Mediates every session RPC between the merchant's hooks and the `/sessions` endpoints.

// std::sync::Mutex is fine here, the lock is never held across an .await point.
use std::{
    future::Future,
    sync::{Arc, Mutex, PoisonError},
};

use common_utils::{consts, CustomResult};
use domain_types::{
    payments::{
        ActionComponentData, BalanceCheckDetails, BalanceResult, OrderRequest, OrderResponse,
        PaymentComponentState,
    },
    session::{SessionModel, SessionPaymentResult, SessionPaymentsResponse},
};
use error_stack::report;
use tokio::sync::watch;

use crate::{
    error::SessionError,
    logger::instrument,
    repository::SessionRepository,
    result::{
        BalanceCallResult, CancelOrderCallResult, CreateOrderCallResult, DetailsCallResult,
        GatedCallResult, PaymentsCallResult, RemoveStoredPaymentMethodCallResult,
        SessionCallError, SessionCallResult, UpdatePaymentMethodsCallResult,
    },
};

/// Who performs the session calls. Only ever moves from `NotTakenOver` to `TakenOver`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FlowState {
    #[default]
    NotTakenOver,
    TakenOver,
}

pub struct SessionInteractor {
    repository: Arc<dyn SessionRepository>,
    session_model: watch::Sender<SessionModel>,
    flow_state: Mutex<FlowState>,
}

impl SessionInteractor {
    pub fn new(
        repository: Arc<dyn SessionRepository>,
        session_model: SessionModel,
        is_flow_taken_over: bool,
    ) -> Self {
        let flow_state = if is_flow_taken_over {
            FlowState::TakenOver
        } else {
            FlowState::NotTakenOver
        };
        Self {
            repository,
            session_model: watch::channel(session_model).0,
            flow_state: Mutex::new(flow_state),
        }
    }

    /// Latest session snapshot, replaced after every successful call.
    pub fn session_flow(&self) -> watch::Receiver<SessionModel> {
        self.session_model.subscribe()
    }

    pub fn session_model(&self) -> SessionModel {
        self.session_model.borrow().clone()
    }

    pub fn flow_state(&self) -> FlowState {
        *self.flow_state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_flow_taken_over(&self) -> bool {
        self.flow_state() == FlowState::TakenOver
    }

    fn take_over(&self) {
        *self.flow_state.lock().unwrap_or_else(PoisonError::into_inner) = FlowState::TakenOver;
    }

    fn update_session_data(&self, session_data: String) {
        self.session_model.send_modify(|model| {
            model.session_data = Some(session_data);
        });
    }

    /// Lets the merchant take the call first. `internal_call` is only awaited when the merchant
    /// did not handle it and never took over an earlier call.
    async fn check_if_call_was_handled<T, F>(
        &self,
        merchant_call: impl FnOnce() -> bool,
        internal_call: F,
        name: &str,
    ) -> CustomResult<T, SessionError>
    where
        T: GatedCallResult,
        F: Future<Output = T>,
    {
        if merchant_call() {
            tracing::debug!(call = T::CALL, "Flow was taken over");
            self.take_over();
            return Ok(T::taken_over());
        }

        if self.is_flow_taken_over() {
            tracing::error!(call = T::CALL, method = name, "Merchant did not handle the call");
            return Err(report!(SessionError::MethodNotImplemented {
                method: name.to_string(),
            }));
        }

        let result = internal_call.await;
        log_result(&result);
        Ok(result)
    }

    #[instrument(
        name = "session_payments",
        skip_all,
        fields(session_id = %self.session_model.borrow().id)
    )]
    pub async fn on_payments_call_requested(
        &self,
        payment_component_state: PaymentComponentState,
        merchant_call: impl FnOnce(&PaymentComponentState) -> bool,
        name: &str,
    ) -> CustomResult<PaymentsCallResult, SessionError> {
        self.check_if_call_was_handled(
            || merchant_call(&payment_component_state),
            self.make_payments_call_internal(&payment_component_state),
            name,
        )
        .await
    }

    async fn make_payments_call_internal(
        &self,
        payment_component_state: &PaymentComponentState,
    ) -> PaymentsCallResult {
        let session_model = self.session_model();
        let response = match self
            .repository
            .submit_payment(&session_model, payment_component_state.data.clone())
            .await
        {
            Ok(response) => response,
            Err(report) => return PaymentsCallResult::Error(SessionCallError::Request(report)),
        };
        self.update_session_data(response.session_data.clone());

        let action = response.action.clone();
        let result = payment_result(&session_model, response);
        let has_remaining_amount = result
            .order
            .as_ref()
            .is_some_and(OrderResponse::has_remaining_amount);

        if is_refused(result.result_code.as_deref()) && has_remaining_amount {
            PaymentsCallResult::Error(SessionCallError::RefusedPartialPayment(result))
        } else if let Some(action) = action {
            PaymentsCallResult::Action(action)
        } else if has_remaining_amount {
            PaymentsCallResult::NotFullyPaidOrder(result)
        } else {
            PaymentsCallResult::Finished(result)
        }
    }

    #[instrument(
        name = "session_details",
        skip_all,
        fields(session_id = %self.session_model.borrow().id)
    )]
    pub async fn on_details_call_requested(
        &self,
        action_component_data: ActionComponentData,
        merchant_call: impl FnOnce(&ActionComponentData) -> bool,
        name: &str,
    ) -> CustomResult<DetailsCallResult, SessionError> {
        self.check_if_call_was_handled(
            || merchant_call(&action_component_data),
            self.make_details_call_internal(&action_component_data),
            name,
        )
        .await
    }

    async fn make_details_call_internal(
        &self,
        action_component_data: &ActionComponentData,
    ) -> DetailsCallResult {
        let session_model = self.session_model();
        let response = match self
            .repository
            .submit_details(&session_model, action_component_data.clone())
            .await
        {
            Ok(response) => response,
            Err(report) => return DetailsCallResult::Error(SessionCallError::Request(report)),
        };
        self.update_session_data(response.session_data.clone());

        match response.action.clone() {
            Some(action) => DetailsCallResult::Action(action),
            None => DetailsCallResult::Finished(payment_result(&session_model, response)),
        }
    }

    #[instrument(
        name = "session_balance",
        skip_all,
        fields(session_id = %self.session_model.borrow().id)
    )]
    pub async fn check_balance(
        &self,
        details: BalanceCheckDetails,
        merchant_call: impl FnOnce(&BalanceCheckDetails) -> bool,
        name: &str,
    ) -> CustomResult<BalanceCallResult, SessionError> {
        self.check_if_call_was_handled(
            || merchant_call(&details),
            self.make_check_balance_call_internal(&details),
            name,
        )
        .await
    }

    async fn make_check_balance_call_internal(
        &self,
        details: &BalanceCheckDetails,
    ) -> BalanceCallResult {
        let session_model = self.session_model();
        let response = match self
            .repository
            .check_balance(&session_model, details.clone())
            .await
        {
            Ok(response) => response,
            Err(report) => return BalanceCallResult::Error(SessionCallError::Request(report)),
        };
        self.update_session_data(response.session_data);

        if response.balance.value.is_greater_than(0) {
            BalanceCallResult::Successful(BalanceResult {
                balance: response.balance,
                transaction_limit: response.transaction_limit,
            })
        } else {
            BalanceCallResult::Error(SessionCallError::NotEnoughBalance)
        }
    }

    #[instrument(
        name = "session_create_order",
        skip_all,
        fields(session_id = %self.session_model.borrow().id)
    )]
    pub async fn create_order(
        &self,
        merchant_call: impl FnOnce() -> bool,
        name: &str,
    ) -> CustomResult<CreateOrderCallResult, SessionError> {
        self.check_if_call_was_handled(merchant_call, self.make_create_order_call_internal(), name)
            .await
    }

    async fn make_create_order_call_internal(&self) -> CreateOrderCallResult {
        let session_model = self.session_model();
        let response = match self.repository.create_order(&session_model).await {
            Ok(response) => response,
            Err(report) => return CreateOrderCallResult::Error(SessionCallError::Request(report)),
        };
        self.update_session_data(response.session_data);

        CreateOrderCallResult::Successful(OrderResponse {
            psp_reference: response.psp_reference,
            order_data: response.order_data,
            amount: None,
            remaining_amount: None,
        })
    }

    #[instrument(
        name = "session_cancel_order",
        skip_all,
        fields(session_id = %self.session_model.borrow().id)
    )]
    pub async fn cancel_order(
        &self,
        order: OrderRequest,
        merchant_call: impl FnOnce(&OrderRequest) -> bool,
        name: &str,
    ) -> CustomResult<CancelOrderCallResult, SessionError> {
        self.check_if_call_was_handled(
            || merchant_call(&order),
            self.make_cancel_order_call_internal(&order),
            name,
        )
        .await
    }

    async fn make_cancel_order_call_internal(&self, order: &OrderRequest) -> CancelOrderCallResult {
        let session_model = self.session_model();
        match self
            .repository
            .cancel_order(&session_model, order.clone())
            .await
        {
            Ok(response) => {
                self.update_session_data(response.session_data);
                CancelOrderCallResult::Successful
            }
            Err(report) => CancelOrderCallResult::Error(SessionCallError::Request(report)),
        }
    }

    /// Refreshes the payment methods, for instance after a partial payment changed the order.
    #[instrument(
        name = "session_update_payment_methods",
        skip_all,
        fields(session_id = %self.session_model.borrow().id)
    )]
    pub async fn update_payment_methods(
        &self,
        order: Option<OrderResponse>,
        merchant_call: impl FnOnce(Option<&OrderResponse>) -> bool,
        name: &str,
    ) -> CustomResult<UpdatePaymentMethodsCallResult, SessionError> {
        self.check_if_call_was_handled(
            || merchant_call(order.as_ref()),
            self.make_update_payment_methods_call_internal(order.clone()),
            name,
        )
        .await
    }

    async fn make_update_payment_methods_call_internal(
        &self,
        order: Option<OrderResponse>,
    ) -> UpdatePaymentMethodsCallResult {
        let session_model = self.session_model();
        let order_request = order.as_ref().map(OrderRequest::from);
        let response = match self
            .repository
            .setup_session(&session_model, order_request)
            .await
        {
            Ok(response) => response,
            Err(report) => {
                return UpdatePaymentMethodsCallResult::Error(SessionCallError::Request(report))
            }
        };
        self.update_session_data(response.session_data);

        match response.payment_methods {
            Some(payment_methods) => UpdatePaymentMethodsCallResult::Successful {
                payment_methods,
                order,
            },
            None => UpdatePaymentMethodsCallResult::Error(SessionCallError::MissingPaymentMethods),
        }
    }

    /// Disables a stored payment method. The merchant cannot take this call over.
    #[instrument(
        name = "session_remove_stored_payment_method",
        skip_all,
        fields(session_id = %self.session_model.borrow().id)
    )]
    pub async fn remove_stored_payment_method(
        &self,
        stored_payment_method_id: &str,
    ) -> RemoveStoredPaymentMethodCallResult {
        let session_model = self.session_model();
        let result = match self
            .repository
            .disable_token(&session_model, stored_payment_method_id)
            .await
        {
            Ok(response) => {
                self.update_session_data(response.session_data);
                RemoveStoredPaymentMethodCallResult::Successful
            }
            Err(report) => {
                RemoveStoredPaymentMethodCallResult::Error(SessionCallError::Request(report))
            }
        };
        log_result(&result);
        result
    }
}

fn payment_result(
    session_model: &SessionModel,
    response: SessionPaymentsResponse,
) -> SessionPaymentResult {
    SessionPaymentResult {
        session_id: session_model.id.clone(),
        session_result: response.session_result,
        session_data: Some(response.session_data),
        result_code: response.result_code,
        order: response.order,
    }
}

fn is_refused(result_code: Option<&str>) -> bool {
    result_code.is_some_and(|code| code.eq_ignore_ascii_case(consts::RESULT_REFUSED))
}

fn log_result<T: SessionCallResult>(result: &T) {
    match result.error() {
        Some(error) => tracing::warn!(call = T::CALL, %error, "Session call failed"),
        None => tracing::debug!(call = T::CALL, "Session call succeeded"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use domain_types::{
        action::Action,
        errors::ApiClientError,
        payments::Amount,
        session::{
            SessionBalanceResponse, SessionCancelOrderResponse, SessionDetailsResponse,
            SessionDisableTokenResponse, SessionOrderResponse, SessionSetupResponse,
        },
    };

    use super::*;

    /// Answers payments and details with a canned response and counts the calls that reached it.
    #[derive(Default)]
    struct ScriptedRepository {
        payments: Mutex<Option<SessionPaymentsResponse>>,
        calls: AtomicUsize,
        seen_session_data: Mutex<Vec<Option<String>>>,
    }

    impl ScriptedRepository {
        fn record(&self, session_model: &SessionModel) {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen_session_data
                .lock()
                .unwrap()
                .push(session_model.session_data.clone());
        }

        fn failure<T>() -> CustomResult<T, ApiClientError> {
            Err(report!(ApiClientError::RequestNotSent("offline".to_string())))
        }
    }

    #[async_trait::async_trait]
    impl SessionRepository for ScriptedRepository {
        async fn setup_session(
            &self,
            session_model: &SessionModel,
            _order: Option<OrderRequest>,
        ) -> CustomResult<SessionSetupResponse, ApiClientError> {
            self.record(session_model);
            Self::failure()
        }

        async fn submit_payment(
            &self,
            session_model: &SessionModel,
            _payment_component_data: domain_types::payments::PaymentComponentData,
        ) -> CustomResult<SessionPaymentsResponse, ApiClientError> {
            self.record(session_model);
            self.payments.lock().unwrap().clone().map_or_else(Self::failure, Ok)
        }

        async fn submit_details(
            &self,
            session_model: &SessionModel,
            _action_component_data: ActionComponentData,
        ) -> CustomResult<SessionDetailsResponse, ApiClientError> {
            self.record(session_model);
            self.payments.lock().unwrap().clone().map_or_else(Self::failure, Ok)
        }

        async fn check_balance(
            &self,
            session_model: &SessionModel,
            _details: BalanceCheckDetails,
        ) -> CustomResult<SessionBalanceResponse, ApiClientError> {
            self.record(session_model);
            Self::failure()
        }

        async fn create_order(
            &self,
            session_model: &SessionModel,
        ) -> CustomResult<SessionOrderResponse, ApiClientError> {
            self.record(session_model);
            Self::failure()
        }

        async fn cancel_order(
            &self,
            session_model: &SessionModel,
            _order: OrderRequest,
        ) -> CustomResult<SessionCancelOrderResponse, ApiClientError> {
            self.record(session_model);
            Self::failure()
        }

        async fn disable_token(
            &self,
            session_model: &SessionModel,
            _stored_payment_method_id: &str,
        ) -> CustomResult<SessionDisableTokenResponse, ApiClientError> {
            self.record(session_model);
            Self::failure()
        }
    }

    fn payments_response(result_code: &str, remaining: Option<i64>) -> SessionPaymentsResponse {
        SessionPaymentsResponse {
            session_data: "fresh".to_string(),
            session_result: Some("result".to_string()),
            status: None,
            result_code: Some(result_code.to_string()),
            action: None,
            order: remaining.map(|value| OrderResponse {
                psp_reference: "psp".to_string(),
                order_data: "order".to_string(),
                amount: None,
                remaining_amount: Some(Amount::new("EUR", value)),
            }),
        }
    }

    fn with_action(mut response: SessionPaymentsResponse) -> SessionPaymentsResponse {
        let action = r#"{"type":"redirect","url":"https://bank.example","paymentData":"pd"}"#;
        response.action = Some(Action::from_json(action).unwrap());
        response
    }

    fn interactor(
        response: Option<SessionPaymentsResponse>,
        taken_over: bool,
    ) -> (SessionInteractor, Arc<ScriptedRepository>) {
        let repository = Arc::new(ScriptedRepository {
            payments: Mutex::new(response),
            ..Default::default()
        });
        let interactor = SessionInteractor::new(
            repository.clone(),
            SessionModel::new("CS1", Some("initial".to_string())),
            taken_over,
        );
        (interactor, repository)
    }

    #[tokio::test]
    async fn merchant_handled_call_latches_taken_over() {
        let (interactor, repository) = interactor(None, false);

        let result = interactor
            .on_payments_call_requested(PaymentComponentState::default(), |_| true, "onSubmit")
            .await
            .unwrap();

        assert!(matches!(result, PaymentsCallResult::TakenOver));
        assert_eq!(interactor.flow_state(), FlowState::TakenOver);
        assert_eq!(repository.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unhandled_call_after_take_over_is_an_error() {
        let (interactor, repository) = interactor(None, true);

        let error = interactor
            .create_order(|| false, "onOrderRequest")
            .await
            .unwrap_err();

        assert_eq!(
            error.current_context().to_string(),
            "Sessions flow was already taken over in a previous call, onOrderRequest should be implemented"
        );
        assert!(interactor.is_flow_taken_over());
        assert_eq!(repository.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn refused_partial_payment_is_an_error() {
        let (interactor, _) = interactor(Some(payments_response("REFUSED", Some(500))), false);

        let result = interactor
            .on_payments_call_requested(PaymentComponentState::default(), |_| false, "onSubmit")
            .await
            .unwrap();

        let PaymentsCallResult::Error(SessionCallError::RefusedPartialPayment(payment)) = result
        else {
            panic!("expected a refused partial payment, got {result:?}");
        };
        assert_eq!(payment.session_id, "CS1");
        assert_eq!(payment.session_data.as_deref(), Some("fresh"));
    }

    #[tokio::test]
    async fn refused_partial_payment_wins_over_an_action() {
        let response = with_action(payments_response("Refused", Some(500)));
        let (interactor, _) = interactor(Some(response), false);

        let result = interactor
            .on_payments_call_requested(PaymentComponentState::default(), |_| false, "onSubmit")
            .await
            .unwrap();

        assert!(matches!(
            result,
            PaymentsCallResult::Error(SessionCallError::RefusedPartialPayment(_))
        ));
    }

    #[tokio::test]
    async fn action_wins_over_a_remaining_amount() {
        let response = with_action(payments_response("Pending", Some(500)));
        let (interactor, _) = interactor(Some(response), false);

        let result = interactor
            .on_payments_call_requested(PaymentComponentState::default(), |_| false, "onSubmit")
            .await
            .unwrap();

        assert!(matches!(result, PaymentsCallResult::Action(Action::Redirect(_))));
    }

    #[tokio::test]
    async fn details_with_action_hand_it_back() {
        let response = with_action(payments_response("RedirectShopper", None));
        let (interactor, repository) = interactor(Some(response), false);

        let result = interactor
            .on_details_call_requested(
                ActionComponentData::default(),
                |_| false,
                "onAdditionalDetails",
            )
            .await
            .unwrap();

        let DetailsCallResult::Action(action) = result else {
            panic!("expected an action, got {result:?}");
        };
        assert_eq!(action.payment_data(), Some("pd"));
        assert_eq!(
            interactor.session_model().session_data.as_deref(),
            Some("fresh")
        );
        assert_eq!(
            *repository.seen_session_data.lock().unwrap(),
            vec![Some("initial".to_string())]
        );
    }

    #[tokio::test]
    async fn details_without_action_finish_the_payment() {
        let (interactor, _) = interactor(Some(payments_response("Authorised", None)), false);
        let session_flow = interactor.session_flow();

        let result = interactor
            .on_details_call_requested(
                ActionComponentData::default(),
                |_| false,
                "onAdditionalDetails",
            )
            .await
            .unwrap();

        let DetailsCallResult::Finished(payment) = result else {
            panic!("expected a finished payment, got {result:?}");
        };
        assert_eq!(payment.session_id, "CS1");
        assert_eq!(payment.result_code.as_deref(), Some("Authorised"));
        assert_eq!(payment.session_result.as_deref(), Some("result"));
        assert_eq!(payment.session_data.as_deref(), Some("fresh"));
        assert_eq!(session_flow.borrow().session_data.as_deref(), Some("fresh"));
    }

    #[tokio::test]
    async fn remaining_amount_keeps_the_order_open() {
        let (interactor, _) = interactor(Some(payments_response("Authorised", Some(500))), false);

        let result = interactor
            .on_payments_call_requested(PaymentComponentState::default(), |_| false, "onSubmit")
            .await
            .unwrap();

        assert!(matches!(result, PaymentsCallResult::NotFullyPaidOrder(_)));
    }

    #[tokio::test]
    async fn refused_without_order_finishes() {
        let (interactor, _) = interactor(Some(payments_response("Refused", None)), false);

        let result = interactor
            .on_payments_call_requested(PaymentComponentState::default(), |_| false, "onSubmit")
            .await
            .unwrap();

        let PaymentsCallResult::Finished(payment) = result else {
            panic!("expected a finished payment, got {result:?}");
        };
        assert_eq!(payment.result_code.as_deref(), Some("Refused"));
    }

    #[tokio::test]
    async fn successful_call_rotates_session_data() {
        let (interactor, repository) =
            interactor(Some(payments_response("Authorised", None)), false);
        let session_flow = interactor.session_flow();

        interactor
            .on_payments_call_requested(PaymentComponentState::default(), |_| false, "onSubmit")
            .await
            .unwrap();
        interactor
            .on_payments_call_requested(PaymentComponentState::default(), |_| false, "onSubmit")
            .await
            .unwrap();

        assert_eq!(session_flow.borrow().session_data.as_deref(), Some("fresh"));
        assert_eq!(
            *repository.seen_session_data.lock().unwrap(),
            vec![Some("initial".to_string()), Some("fresh".to_string())]
        );
    }

    #[tokio::test]
    async fn failed_call_keeps_session_data_and_is_not_retried() {
        let (interactor, repository) = interactor(None, false);

        let result = interactor
            .cancel_order(
                OrderRequest {
                    psp_reference: "psp".to_string(),
                    order_data: "order".to_string(),
                },
                |_| false,
                "onCancelOrder",
            )
            .await
            .unwrap();

        assert!(matches!(
            result,
            CancelOrderCallResult::Error(SessionCallError::Request(_))
        ));
        assert_eq!(repository.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            interactor.session_model().session_data.as_deref(),
            Some("initial")
        );
    }

    #[tokio::test]
    async fn removing_a_stored_payment_method_ignores_the_latch() {
        let (interactor, repository) = interactor(None, true);

        let result = interactor.remove_stored_payment_method("stored-1").await;

        assert!(matches!(result, RemoveStoredPaymentMethodCallResult::Error(_)));
        assert_eq!(repository.calls.load(Ordering::SeqCst), 1);
    }
}
