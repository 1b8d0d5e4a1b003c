#![allow(clippy::unwrap_used, clippy::panic)]

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use common_utils::{scope::ComponentScope, CustomResult};
use domain_types::{
    action::Action,
    errors::{ApiClientError, CheckoutError},
    events::PaymentComponentEvent,
    payments::{
        ActionComponentData, Amount, BalanceCheckDetails, BalanceResult, OrderRequest,
        OrderResponse, PaymentComponentData, PaymentComponentState,
    },
    session::{
        SessionBalanceResponse, SessionCancelOrderResponse, SessionDetailsResponse,
        SessionDisableTokenResponse, SessionModel, SessionOrderResponse, SessionPaymentResult,
        SessionPaymentsResponse, SessionSetupResponse,
    },
};
use error_stack::report;
use interfaces::{
    callback::SessionComponentCallback,
    saved_state::{InMemorySavedState, SavedStateStore},
};
use serde_json::json;
use sessions_core::{
    consts::{FLOW_TAKEN_OVER_KEY, SESSION_DATA_KEY},
    result::{SessionCallError, UpdatePaymentMethodsCallResult},
    FlowState, SessionComponentEventHandler, SessionInteractor, SessionRepository,
    SessionSavedState,
};

/// Serves canned responses; endpoints without one fail as if the network was down.
#[derive(Default)]
struct ScriptedRepository {
    payments: Mutex<Option<SessionPaymentsResponse>>,
    details: Mutex<Option<SessionDetailsResponse>>,
    balance: Mutex<Option<SessionBalanceResponse>>,
    setup: Mutex<Option<SessionSetupResponse>>,
    order: Mutex<Option<SessionOrderResponse>>,
    requests: Mutex<Vec<&'static str>>,
}

impl ScriptedRepository {
    fn answer<T: Clone>(
        &self,
        endpoint: &'static str,
        response: &Mutex<Option<T>>,
    ) -> CustomResult<T, ApiClientError> {
        self.requests.lock().unwrap().push(endpoint);
        response
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| report!(ApiClientError::RequestNotSent(endpoint.to_string())))
    }
}

#[async_trait::async_trait]
impl SessionRepository for ScriptedRepository {
    async fn setup_session(
        &self,
        _session_model: &SessionModel,
        _order: Option<OrderRequest>,
    ) -> CustomResult<SessionSetupResponse, ApiClientError> {
        self.answer("setup", &self.setup)
    }

    async fn submit_payment(
        &self,
        _session_model: &SessionModel,
        _payment_component_data: PaymentComponentData,
    ) -> CustomResult<SessionPaymentsResponse, ApiClientError> {
        self.answer("payments", &self.payments)
    }

    async fn submit_details(
        &self,
        _session_model: &SessionModel,
        _action_component_data: ActionComponentData,
    ) -> CustomResult<SessionDetailsResponse, ApiClientError> {
        self.answer("details", &self.details)
    }

    async fn check_balance(
        &self,
        _session_model: &SessionModel,
        _details: BalanceCheckDetails,
    ) -> CustomResult<SessionBalanceResponse, ApiClientError> {
        self.answer("balance", &self.balance)
    }

    async fn create_order(
        &self,
        _session_model: &SessionModel,
    ) -> CustomResult<SessionOrderResponse, ApiClientError> {
        self.answer("orders", &self.order)
    }

    async fn cancel_order(
        &self,
        _session_model: &SessionModel,
        _order: OrderRequest,
    ) -> CustomResult<SessionCancelOrderResponse, ApiClientError> {
        self.answer("orders/cancel", &Mutex::new(None))
    }

    async fn disable_token(
        &self,
        _session_model: &SessionModel,
        _stored_payment_method_id: &str,
    ) -> CustomResult<SessionDisableTokenResponse, ApiClientError> {
        self.answer("disableToken", &Mutex::new(None))
    }
}

#[derive(Debug, PartialEq)]
enum Callback {
    Loading(bool),
    Action,
    Finished(Option<String>),
    Error(String),
    Balance(BalanceResult),
    Order(String),
}

#[derive(Default)]
struct RecordingCallback {
    takes_over: bool,
    events: Mutex<Vec<Callback>>,
}

impl RecordingCallback {
    fn taking_over() -> Self {
        Self {
            takes_over: true,
            ..Default::default()
        }
    }

    fn record(&self, event: Callback) {
        self.events.lock().unwrap().push(event);
    }

    fn events(&self) -> Vec<Callback> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }
}

impl SessionComponentCallback for RecordingCallback {
    fn on_action(&self, _action: Action) {
        self.record(Callback::Action);
    }

    fn on_finished(&self, result: SessionPaymentResult) {
        self.record(Callback::Finished(result.result_code));
    }

    fn on_error(&self, error: CheckoutError) {
        self.record(Callback::Error(error.message().to_string()));
    }

    fn on_submit(&self, _state: &PaymentComponentState) -> bool {
        self.takes_over
    }

    fn on_balance(&self, result: BalanceResult) {
        self.record(Callback::Balance(result));
    }

    fn on_order(&self, order: OrderResponse) {
        self.record(Callback::Order(order.psp_reference));
    }

    fn on_loading(&self, is_loading: bool) {
        self.record(Callback::Loading(is_loading));
    }
}

struct Setup {
    repository: Arc<ScriptedRepository>,
    store: Arc<InMemorySavedState>,
    interactor: Arc<SessionInteractor>,
    handler: SessionComponentEventHandler,
}

fn setup(repository: ScriptedRepository) -> Setup {
    let repository = Arc::new(repository);
    let store = Arc::new(InMemorySavedState::new());
    let saved_state = SessionSavedState::new(store.clone());
    let interactor = Arc::new(saved_state.restore_interactor(
        repository.clone(),
        SessionModel::new("CS1", Some("initial".to_string())),
    ));
    let handler = SessionComponentEventHandler::new(interactor.clone(), saved_state);
    Setup {
        repository,
        store,
        interactor,
        handler,
    }
}

fn valid_state() -> PaymentComponentState {
    PaymentComponentState {
        data: PaymentComponentData::default(),
        is_input_valid: true,
        is_ready: true,
    }
}

fn payments_response(action: Option<Action>) -> SessionPaymentsResponse {
    SessionPaymentsResponse {
        session_data: "after-payments".to_string(),
        session_result: None,
        status: None,
        result_code: Some("Authorised".to_string()),
        action,
        order: None,
    }
}

fn redirect_action() -> Action {
    serde_json::from_value(json!({
        "type": "redirect",
        "paymentData": "data",
        "paymentMethodType": "ideal",
        "url": "https://example.com/redirect"
    }))
    .unwrap()
}

#[tokio::test]
async fn submit_with_action_is_routed_to_on_action() {
    let repository = ScriptedRepository {
        payments: Mutex::new(Some(payments_response(Some(redirect_action())))),
        ..Default::default()
    };
    let Setup { handler, .. } = setup(repository);
    let callback = Arc::new(RecordingCallback::default());

    handler
        .on_payment_component_event(PaymentComponentEvent::Submit(valid_state()), callback.clone())
        .await;

    assert_eq!(
        callback.events(),
        vec![
            Callback::Loading(true),
            Callback::Loading(false),
            Callback::Action
        ]
    );
}

#[tokio::test]
async fn invalid_state_is_not_submitted() {
    let Setup {
        handler,
        repository,
        ..
    } = setup(ScriptedRepository::default());
    let callback = Arc::new(RecordingCallback::default());

    handler
        .on_payment_component_event(
            PaymentComponentEvent::Submit(PaymentComponentState::default()),
            callback.clone(),
        )
        .await;

    assert_eq!(
        callback.events(),
        vec![Callback::Error("PaymentComponentState are not valid.".to_string())]
    );
    assert!(repository.requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn taken_over_flow_never_returns_to_the_sdk() {
    let Setup {
        handler,
        repository,
        store,
        interactor,
    } = setup(ScriptedRepository::default());
    let merchant = Arc::new(RecordingCallback::taking_over());

    handler
        .on_payment_component_event(PaymentComponentEvent::Submit(valid_state()), merchant.clone())
        .await;
    assert_eq!(interactor.flow_state(), FlowState::TakenOver);
    assert_eq!(store.get(FLOW_TAKEN_OVER_KEY), Some(json!(true)));

    // The details hook is not overridden, so the merchant forgot to handle it.
    handler
        .on_payment_component_event(
            PaymentComponentEvent::ActionDetails(ActionComponentData::default()),
            merchant.clone(),
        )
        .await;

    let events = merchant.events();
    assert_eq!(
        events.last(),
        Some(&Callback::Error(
            "Sessions flow was already taken over in a previous call, onAdditionalDetails should be implemented"
                .to_string()
        ))
    );
    assert!(interactor.is_flow_taken_over());
    assert!(repository.requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn restored_interactor_keeps_the_latch() {
    let store = Arc::new(InMemorySavedState::new());
    let saved_state = SessionSavedState::new(store);
    saved_state.set_flow_taken_over(true);
    saved_state.update_session_model(&SessionModel::new("CS1", Some("saved".to_string())));

    let interactor = saved_state.restore_interactor(
        Arc::new(ScriptedRepository::default()),
        SessionModel::new("CS1", Some("initial".to_string())),
    );

    assert!(interactor.is_flow_taken_over());
    assert_eq!(
        interactor.session_model().session_data.as_deref(),
        Some("saved")
    );
}

#[tokio::test]
async fn session_data_is_persisted_after_each_call() {
    let repository = ScriptedRepository {
        payments: Mutex::new(Some(payments_response(None))),
        ..Default::default()
    };
    let Setup { handler, store, .. } = setup(repository);
    let scope = ComponentScope::new();
    handler.initialize(&scope);
    let callback = Arc::new(RecordingCallback::default());

    handler
        .on_payment_component_event(PaymentComponentEvent::Submit(valid_state()), callback.clone())
        .await;

    let saved_state = SessionSavedState::new(store.clone());
    tokio::time::timeout(Duration::from_secs(1), async {
        while saved_state.session_model().and_then(|model| model.session_data)
            != Some("after-payments".to_string())
        {
            tokio::task::yield_now().await;
        }
    })
    .await
    .unwrap();
    assert!(store.contains(SESSION_DATA_KEY));
    assert_eq!(
        callback.events().last(),
        Some(&Callback::Finished(Some("Authorised".to_string())))
    );

    handler.on_cleared();
}

#[tokio::test]
async fn empty_balance_is_reported_as_an_error() {
    let repository = ScriptedRepository {
        balance: Mutex::new(Some(SessionBalanceResponse {
            session_data: "after-balance".to_string(),
            balance: Amount::new("EUR", 0),
            transaction_limit: None,
        })),
        ..Default::default()
    };
    let Setup {
        handler,
        interactor,
        ..
    } = setup(repository);
    let callback = Arc::new(RecordingCallback::default());

    handler
        .on_balance_check(
            BalanceCheckDetails {
                payment_method_type: "giftcard".to_string(),
                brand: Some("givex".to_string()),
                encrypted_card_number: None,
                encrypted_security_code: None,
            },
            callback.clone(),
        )
        .await;

    assert_eq!(
        callback.events().last(),
        Some(&Callback::Error(
            "Balance call failed: Not enough balance".to_string()
        ))
    );
    assert_eq!(
        interactor.session_model().session_data.as_deref(),
        Some("after-balance")
    );
}

#[tokio::test]
async fn positive_balance_is_handed_to_the_merchant() {
    let repository = ScriptedRepository {
        balance: Mutex::new(Some(SessionBalanceResponse {
            session_data: "after-balance".to_string(),
            balance: Amount::new("EUR", 500),
            transaction_limit: Some(Amount::new("EUR", 300)),
        })),
        ..Default::default()
    };
    let Setup { handler, .. } = setup(repository);
    let callback = Arc::new(RecordingCallback::default());

    handler
        .on_balance_check(
            BalanceCheckDetails {
                payment_method_type: "giftcard".to_string(),
                brand: Some("givex".to_string()),
                encrypted_card_number: None,
                encrypted_security_code: None,
            },
            callback.clone(),
        )
        .await;

    assert_eq!(
        callback.events().last(),
        Some(&Callback::Balance(BalanceResult {
            balance: Amount::new("EUR", 500),
            transaction_limit: Some(Amount::new("EUR", 300)),
        }))
    );
}

#[tokio::test]
async fn created_order_is_handed_to_the_merchant() {
    let repository = ScriptedRepository {
        order: Mutex::new(Some(SessionOrderResponse {
            session_data: "after-order".to_string(),
            psp_reference: "order-psp".to_string(),
            order_data: "order-data".to_string(),
        })),
        ..Default::default()
    };
    let Setup { handler, .. } = setup(repository);
    let callback = Arc::new(RecordingCallback::default());

    handler.on_order_request(callback.clone()).await;

    assert_eq!(
        callback.events().last(),
        Some(&Callback::Order("order-psp".to_string()))
    );
}

#[tokio::test]
async fn network_failure_surfaces_as_an_http_error() {
    let Setup { handler, .. } = setup(ScriptedRepository::default());
    let callback = Arc::new(RecordingCallback::default());

    handler
        .on_payment_component_event(PaymentComponentEvent::Submit(valid_state()), callback.clone())
        .await;

    let events = callback.events();
    let Some(Callback::Error(message)) = events.last() else {
        panic!("expected an error, got {events:?}");
    };
    assert!(message.starts_with("Payments call failed"));
}

#[tokio::test]
async fn payment_methods_are_required_after_an_update() {
    let repository = ScriptedRepository {
        setup: Mutex::new(Some(SessionSetupResponse {
            id: "CS1".to_string(),
            session_data: "after-setup".to_string(),
            amount: None,
            expires_at: None,
            payment_methods: None,
            return_url: None,
            shopper_locale: None,
        })),
        ..Default::default()
    };
    let Setup { interactor, .. } = setup(repository);

    let result = interactor
        .update_payment_methods(None, |_| false, "onUpdatePaymentMethods")
        .await
        .unwrap();

    assert!(matches!(
        result,
        UpdatePaymentMethodsCallResult::Error(SessionCallError::MissingPaymentMethods)
    ));
}
