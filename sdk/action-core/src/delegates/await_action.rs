use std::sync::Arc;

use common_enums::{ComponentViewType, DelegateKind};
use common_utils::{channel::EventReceiver, consts, scope::ComponentScope};
use domain_types::{
    action::{Action, AwaitAction},
    errors::CheckoutError,
    payments::ActionComponentData,
    types::CheckoutConfiguration,
};
use interfaces::{
    api::ApiClient,
    delegate::{
        ActionDelegate, DetailsEmittingDelegate, StatusPollingDelegate, ViewProvidingDelegate,
    },
    saved_state::SavedStateStore,
};
use tokio::sync::watch;

use super::{on_polled_status, DelegateCore, UNSUPPORTED_ACTION};
use crate::repositories::status::StatusRepository;

const ACTION_KEY: &str = "await.action";

/// Waits for a payment confirmed outside the app (e.g. in a banking app) by polling its status.
pub struct DefaultAwaitDelegate {
    core: DelegateCore,
    status_repository: Arc<StatusRepository>,
}

impl DefaultAwaitDelegate {
    pub fn new(
        configuration: &CheckoutConfiguration,
        saved_state: Arc<dyn SavedStateStore>,
        api_client: Arc<dyn ApiClient>,
    ) -> Self {
        Self {
            core: DelegateCore::new(ACTION_KEY, saved_state),
            status_repository: Arc::new(StatusRepository::new(api_client, configuration)),
        }
    }

    fn init_state(&self, action: &AwaitAction) {
        self.core
            .payment_data()
            .set_payment_data(action.payment_data.clone());
        let Some(payment_data) = action.payment_data.clone() else {
            tracing::error!("Payment data is null");
            self.core
                .emit_error(CheckoutError::component("Payment data is null"));
            return;
        };
        self.core.set_view(ComponentViewType::Await);

        let core = self.core.clone();
        let status_repository = self.status_repository.clone();
        self.core.launch_job(async move {
            status_repository
                .poll(payment_data, consts::DEFAULT_MAX_POLLING_DURATION, |result| {
                    on_polled_status(&core, result)
                })
                .await;
        });
    }
}

impl ActionDelegate for DefaultAwaitDelegate {
    fn kind(&self) -> DelegateKind {
        DelegateKind::Await
    }

    fn initialize(&self, scope: &ComponentScope) {
        self.core.attach(scope);
        tracing::debug!("Restoring state");
        if let Some(action) = self.core.saved_action::<AwaitAction>() {
            self.init_state(&action);
        }
    }

    fn handle_action(&self, action: &Action) {
        let Action::Await(action) = action else {
            self.core
                .emit_error(CheckoutError::component(UNSUPPORTED_ACTION));
            return;
        };
        self.core.save_action(action);
        self.init_state(action);
    }

    fn exceptions(&self) -> EventReceiver<CheckoutError> {
        self.core.exceptions()
    }

    fn on_error(&self, error: CheckoutError) {
        self.core.publish_error(error);
    }

    fn on_cleared(&self) {
        self.core.clear();
    }

    fn as_details_emitting(&self) -> Option<&dyn DetailsEmittingDelegate> {
        Some(self)
    }

    fn as_status_polling(&self) -> Option<&dyn StatusPollingDelegate> {
        Some(self)
    }

    fn as_view_providing(&self) -> Option<&dyn ViewProvidingDelegate> {
        Some(self)
    }
}

impl DetailsEmittingDelegate for DefaultAwaitDelegate {
    fn details(&self) -> EventReceiver<ActionComponentData> {
        self.core.details()
    }
}

impl StatusPollingDelegate for DefaultAwaitDelegate {
    fn refresh_status(&self) {
        if self.core.payment_data().payment_data().is_some() {
            self.status_repository.refresh();
        }
    }
}

impl ViewProvidingDelegate for DefaultAwaitDelegate {
    fn view_type(&self) -> watch::Receiver<Option<ComponentViewType>> {
        self.core.view_type()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use common_enums::{ActionType, Environment};
    use interfaces::saved_state::InMemorySavedState;
    use serde_json::json;

    use super::*;
    use crate::delegates::test_utils::ScriptedApiClient;

    fn await_action(payment_data: Option<&str>) -> Action {
        Action::Await(AwaitAction {
            action_type: ActionType::Await,
            payment_data: payment_data.map(str::to_string),
            payment_method_type: Some("mbway".to_string()),
            url: None,
        })
    }

    fn delegate(
        responses: Vec<(u16, serde_json::Value)>,
        saved_state: Arc<InMemorySavedState>,
    ) -> (Arc<ScriptedApiClient>, DefaultAwaitDelegate) {
        let client = ScriptedApiClient::new(responses);
        let delegate = DefaultAwaitDelegate::new(
            &CheckoutConfiguration::new(Environment::Test, "test_KEY"),
            saved_state,
            client.clone(),
        );
        (client, delegate)
    }

    #[tokio::test(start_paused = true)]
    async fn final_status_with_payload_emits_details() {
        let saved_state = Arc::new(InMemorySavedState::new());
        let (client, delegate) = delegate(
            vec![
                (200, json!({ "type": "pending", "resultCode": "pending" })),
                (200, json!({ "type": "complete", "resultCode": "authorised", "payload": "PL" })),
            ],
            saved_state.clone(),
        );
        let mut details = delegate.details();
        let scope = ComponentScope::new();
        delegate.initialize(&scope);

        delegate.handle_action(&await_action(Some("pd")));
        assert!(saved_state.contains(ACTION_KEY));

        let data = details.recv().await.unwrap();
        assert_eq!(data.details, Some(json!({ "payload": "PL" })));
        assert_eq!(data.payment_data.as_deref(), Some("pd"));
        assert_eq!(client.urls().len(), 2);
        assert!(!saved_state.contains(ACTION_KEY));
        assert_eq!(*delegate.view_type().borrow(), Some(ComponentViewType::Await));
    }

    #[tokio::test(start_paused = true)]
    async fn final_status_without_payload_is_an_error() {
        let (_, delegate) = delegate(
            vec![(200, json!({ "type": "complete", "resultCode": "refused" }))],
            Arc::new(InMemorySavedState::new()),
        );
        let mut exceptions = delegate.exceptions();
        delegate.initialize(&ComponentScope::new());

        delegate.handle_action(&await_action(Some("pd")));

        assert_eq!(
            exceptions.recv().await.unwrap(),
            CheckoutError::component("Payment was not completed. - refused")
        );
    }

    #[tokio::test]
    async fn missing_payment_data_is_an_error() {
        let (client, delegate) = delegate(Vec::new(), Arc::new(InMemorySavedState::new()));
        let mut exceptions = delegate.exceptions();
        delegate.initialize(&ComponentScope::new());

        delegate.handle_action(&await_action(None));

        assert_eq!(
            exceptions.recv().await.unwrap(),
            CheckoutError::component("Payment data is null")
        );
        assert!(client.urls().is_empty());
    }

    #[tokio::test]
    async fn other_actions_are_rejected() {
        let (_, delegate) = delegate(Vec::new(), Arc::new(InMemorySavedState::new()));
        let mut exceptions = delegate.exceptions();
        delegate.initialize(&ComponentScope::new());

        delegate.handle_action(&Action::from_json(r#"{"type":"voucher"}"#).unwrap());

        assert_eq!(
            exceptions.recv().await.unwrap(),
            CheckoutError::component(UNSUPPORTED_ACTION)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn initialize_resumes_polling_for_a_saved_action() {
        let saved_state = Arc::new(InMemorySavedState::new());
        let store: Arc<dyn SavedStateStore> = saved_state.clone();
        store.set(ACTION_KEY, Some(serde_json::to_value(await_action(Some("pd"))).unwrap()));

        let (_, delegate) = delegate(
            vec![(200, json!({ "type": "complete", "resultCode": "authorised", "payload": "PL" }))],
            saved_state,
        );
        let mut details = delegate.details();
        delegate.initialize(&ComponentScope::new());

        assert_eq!(
            details.recv().await.unwrap().details,
            Some(json!({ "payload": "PL" }))
        );
    }
}
