use std::sync::Arc;

use common_enums::{ActionType, ComponentViewType, DelegateKind};
use common_utils::{channel::EventReceiver, scope::ComponentScope};
use domain_types::{
    action::{Action, RedirectAction},
    errors::CheckoutError,
    payments::ActionComponentData,
    types::{CheckoutConfiguration, RedirectIntent},
};
use interfaces::{
    api::ApiClient,
    delegate::{
        ActionDelegate, DetailsEmittingDelegate, IntentHandlingDelegate, RedirectListener,
        RedirectableDelegate, ViewProvidingDelegate,
    },
    redirect::RedirectHandler,
    saved_state::SavedStateStore,
};
use tokio::sync::watch;

use super::{DelegateCore, UNSUPPORTED_ACTION};
use crate::repositories::native_redirect::{NativeRedirectRepository, NativeRedirectRequest};

const ACTION_KEY: &str = "redirect.action";
const RETURN_URL_QUERY_STRING_PARAMETER: &str = "returnUrlQueryString";

/// Sends the shopper to an external page and turns the return url into details.
pub struct DefaultRedirectDelegate {
    core: DelegateCore,
    redirect_handler: Arc<dyn RedirectHandler>,
    native_redirect_repository: Arc<NativeRedirectRepository>,
}

impl DefaultRedirectDelegate {
    pub fn new(
        configuration: &CheckoutConfiguration,
        saved_state: Arc<dyn SavedStateStore>,
        api_client: Arc<dyn ApiClient>,
        redirect_handler: Arc<dyn RedirectHandler>,
    ) -> Self {
        let core = DelegateCore::new(ACTION_KEY, saved_state);
        core.set_view(ComponentViewType::Redirect);
        Self {
            core,
            redirect_handler,
            native_redirect_repository: Arc::new(NativeRedirectRepository::new(
                api_client,
                configuration,
            )),
        }
    }

    fn init_state(&self, action: &RedirectAction) {
        match action.action_type {
            ActionType::NativeRedirect => self
                .core
                .payment_data()
                .set_native_redirect_data(action.native_redirect_data.clone()),
            _ => self
                .core
                .payment_data()
                .set_payment_data(action.payment_data.clone()),
        }
    }

    fn handle_native_redirect(&self, details: serde_json::Value) {
        let request = NativeRedirectRequest {
            redirect_data: self
                .core
                .payment_data()
                .native_redirect_data()
                .unwrap_or_default(),
            return_query_string: details
                .get(RETURN_URL_QUERY_STRING_PARAMETER)
                .and_then(serde_json::Value::as_str)
                .unwrap_or_default()
                .to_string(),
        };

        let core = self.core.clone();
        let repository = self.native_redirect_repository.clone();
        self.core.launch(async move {
            let result = repository
                .make_native_redirect(request)
                .await
                .and_then(|response| {
                    serde_json::to_value(response).map_err(|error| {
                        error_stack::report!(
                            crate::repositories::RepositoryError::UnexpectedResponse(
                                error.to_string()
                            )
                        )
                    })
                });
            match result {
                Ok(details) => core.emit_details(details),
                Err(error) => {
                    tracing::error!(?error, "native redirect failed");
                    core.emit_error(CheckoutError::from_report(
                        "Making native redirect failed",
                        &error,
                    ));
                }
            }
        });
    }
}

impl ActionDelegate for DefaultRedirectDelegate {
    fn kind(&self) -> DelegateKind {
        DelegateKind::Redirect
    }

    fn initialize(&self, scope: &ComponentScope) {
        self.core.attach(scope);
        tracing::debug!("Restoring state");
        if let Some(action) = self.core.saved_action::<RedirectAction>() {
            self.init_state(&action);
        }
    }

    fn handle_action(&self, action: &Action) {
        let Action::Redirect(action) = action else {
            self.core
                .emit_error(CheckoutError::component(UNSUPPORTED_ACTION));
            return;
        };
        self.core.save_action(action);
        self.init_state(action);

        let url = action.url.as_deref().unwrap_or_default();
        tracing::debug!(url, "makeRedirect");
        if let Err(error) = self.redirect_handler.launch_uri_redirect(url) {
            self.core.emit_error(error);
        }
    }

    fn exceptions(&self) -> EventReceiver<CheckoutError> {
        self.core.exceptions()
    }

    fn on_error(&self, error: CheckoutError) {
        self.core.emit_error(error);
    }

    fn on_cleared(&self) {
        self.redirect_handler.remove_on_redirect_listener();
        self.core.clear();
    }

    fn as_details_emitting(&self) -> Option<&dyn DetailsEmittingDelegate> {
        Some(self)
    }

    fn as_intent_handling(&self) -> Option<&dyn IntentHandlingDelegate> {
        Some(self)
    }

    fn as_view_providing(&self) -> Option<&dyn ViewProvidingDelegate> {
        Some(self)
    }

    fn as_redirectable(&self) -> Option<&dyn RedirectableDelegate> {
        Some(self)
    }
}

impl DetailsEmittingDelegate for DefaultRedirectDelegate {
    fn details(&self) -> EventReceiver<ActionComponentData> {
        self.core.details()
    }
}

impl IntentHandlingDelegate for DefaultRedirectDelegate {
    fn handle_intent(&self, intent: &RedirectIntent) {
        let details = match self.redirect_handler.parse_redirect_result(intent.data.as_ref()) {
            Ok(details) => details,
            Err(error) => return self.core.emit_error(error),
        };

        let is_native = self
            .core
            .saved_action::<RedirectAction>()
            .is_some_and(|action| action.action_type == ActionType::NativeRedirect);
        if is_native {
            self.handle_native_redirect(details);
        } else {
            self.core.emit_details(details);
        }
    }
}

impl ViewProvidingDelegate for DefaultRedirectDelegate {
    fn view_type(&self) -> watch::Receiver<Option<ComponentViewType>> {
        self.core.view_type()
    }
}

impl RedirectableDelegate for DefaultRedirectDelegate {
    fn set_on_redirect_listener(&self, listener: RedirectListener) {
        self.redirect_handler.set_on_redirect_listener(listener);
    }
}
