//! Concrete delegates, one per action family, built on a shared [`DelegateCore`].

pub mod await_action;
pub mod qr_code;
pub mod redirect;
pub mod sdk;
pub mod threeds2;
pub mod voucher;

// std::sync::Mutex is fine here, the lock is never held across an .await point.
use std::{
    ops::ControlFlow,
    sync::{Arc, Mutex, PoisonError},
};

use common_enums::ComponentViewType;
use common_utils::{
    channel::{EventChannel, EventReceiver},
    scope::ComponentScope,
};
use domain_types::{errors::CheckoutError, payments::ActionComponentData};
use interfaces::saved_state::SavedStateStore;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::json;
use tokio::sync::watch;

use crate::repositories::{payment_data::PaymentDataRepository, status::StatusResult, RepositoryError};

pub use await_action::DefaultAwaitDelegate;
pub use qr_code::DefaultQrCodeDelegate;
pub use redirect::DefaultRedirectDelegate;
pub use sdk::DefaultSdkActionDelegate;
pub use threeds2::DefaultThreeDs2Delegate;
pub use voucher::DefaultVoucherDelegate;

pub(crate) const UNSUPPORTED_ACTION: &str = "Unsupported action";
pub(crate) const PAYLOAD_DETAILS_KEY: &str = "payload";

/// State and streams every delegate carries. Cloning shares the same streams, so background
/// tasks hold a clone instead of a reference to the delegate.
#[derive(Clone)]
pub struct DelegateCore {
    action_key: &'static str,
    details: EventChannel<ActionComponentData>,
    exceptions: EventChannel<CheckoutError>,
    view_type: Arc<watch::Sender<Option<ComponentViewType>>>,
    scope: Arc<Mutex<Option<ComponentScope>>>,
    job: Arc<Mutex<Option<ComponentScope>>>,
    payment_data: Arc<PaymentDataRepository>,
    saved_state: Arc<dyn SavedStateStore>,
}

impl DelegateCore {
    pub fn new(action_key: &'static str, saved_state: Arc<dyn SavedStateStore>) -> Self {
        let (view_type, _) = watch::channel(None);
        Self {
            action_key,
            details: EventChannel::default(),
            exceptions: EventChannel::default(),
            view_type: Arc::new(view_type),
            scope: Arc::new(Mutex::new(None)),
            job: Arc::new(Mutex::new(None)),
            payment_data: Arc::new(PaymentDataRepository::default()),
            saved_state,
        }
    }

    /// Runs the delegate's tasks in a child of `parent`, cancelling whatever ran before.
    pub fn attach(&self, parent: &ComponentScope) {
        let previous = self
            .scope
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(parent.child());
        if let Some(previous) = previous {
            previous.cancel();
        }
    }

    fn current_scope(&self) -> Option<ComponentScope> {
        self.scope
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Launches `future` in the delegate scope. Reports an error when the delegate was never
    /// initialised.
    pub fn launch<F>(&self, future: F) -> bool
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        match self.current_scope() {
            Some(scope) => {
                scope.launch(future);
                true
            }
            None => {
                tracing::error!(key = self.action_key, "delegate used before initialize");
                self.emit_error(CheckoutError::component(
                    "Delegate has not been initialized with a scope",
                ));
                false
            }
        }
    }

    /// Like [`DelegateCore::launch`] but replaces the previously launched job, used for status
    /// polling which only ever runs once per delegate.
    pub fn launch_job<F>(&self, future: F) -> bool
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let Some(scope) = self.current_scope() else {
            return self.launch(future);
        };
        let job = scope.child();
        job.launch(future);
        let previous = self
            .job
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(job);
        if let Some(previous) = previous {
            previous.cancel();
        }
        true
    }

    pub fn payment_data(&self) -> &PaymentDataRepository {
        &self.payment_data
    }

    pub fn action_component_data(&self, details: serde_json::Value) -> ActionComponentData {
        ActionComponentData {
            payment_data: self.payment_data.payment_data(),
            details: Some(details),
        }
    }

    /// Publishes details for `/payments/details`. The flow is over, so the saved action goes.
    pub fn emit_details(&self, details: serde_json::Value) {
        let data = self.action_component_data(details);
        self.details.emit(data);
        self.clear_saved_action();
    }

    pub fn emit_error(&self, error: CheckoutError) {
        tracing::debug!(key = self.action_key, %error, "delegate error");
        self.exceptions.emit(error);
        self.clear_saved_action();
    }

    /// Publishes an error without ending the flow.
    pub fn publish_error(&self, error: CheckoutError) {
        self.exceptions.emit(error);
    }

    pub fn set_view(&self, view_type: ComponentViewType) {
        self.view_type.send_replace(Some(view_type));
    }

    pub fn save_action<T: Serialize>(&self, action: &T) {
        self.saved_state.set_as(self.action_key, Some(action));
    }

    pub fn saved_action<T: DeserializeOwned>(&self) -> Option<T> {
        self.saved_state.get_as(self.action_key)
    }

    pub fn clear_saved_action(&self) {
        self.saved_state.set(self.action_key, None);
    }

    pub fn saved_state(&self) -> &Arc<dyn SavedStateStore> {
        &self.saved_state
    }

    pub fn details(&self) -> EventReceiver<ActionComponentData> {
        self.details.subscribe()
    }

    pub fn exceptions(&self) -> EventReceiver<CheckoutError> {
        self.exceptions.subscribe()
    }

    pub fn view_type(&self) -> watch::Receiver<Option<ComponentViewType>> {
        self.view_type.subscribe()
    }

    /// Cancels every task of the delegate and forgets the scope.
    pub fn clear(&self) {
        for slot in [&self.job, &self.scope] {
            if let Some(scope) = slot.lock().unwrap_or_else(PoisonError::into_inner).take() {
                scope.cancel();
            }
        }
    }
}

/// Shared reaction of polling delegates to a status update.
pub(crate) fn on_polled_status(core: &DelegateCore, result: StatusResult) -> ControlFlow<()> {
    match result {
        Ok(response) if response.is_final_result() => {
            match response.payload.filter(|payload| !payload.is_empty()) {
                // Refused payments still go to /details so the merchant gets the full result.
                Some(payload) => core.emit_details(json!({ PAYLOAD_DETAILS_KEY: payload })),
                None => core.emit_error(CheckoutError::component(format!(
                    "Payment was not completed. - {}",
                    response.result_code.unwrap_or_default()
                ))),
            }
            ControlFlow::Break(())
        }
        Ok(response) => {
            tracing::trace!(result_code = ?response.result_code, "status changed");
            ControlFlow::Continue(())
        }
        Err(error) => match error.current_context() {
            RepositoryError::MaxPollingDurationExceeded => {
                core.emit_error(CheckoutError::component(error.current_context().to_string()));
                ControlFlow::Break(())
            }
            _ => {
                tracing::error!(?error, "Error while polling status");
                core.emit_error(CheckoutError::from_report("Error while polling status", &error));
                ControlFlow::Continue(())
            }
        },
    }
}

#[cfg(test)]
pub(crate) mod test_utils {
    //! Fakes shared by the delegate tests.
    #![allow(clippy::unwrap_used)]

    use std::{
        collections::VecDeque,
        sync::{Arc, Mutex},
    };

    use common_utils::{
        request::{Request, Response},
        CustomResult,
    };
    use domain_types::errors::ApiClientError;
    use interfaces::api::ApiClient;

    /// Answers requests in order with canned JSON bodies and records the urls it saw.
    #[derive(Default)]
    pub struct ScriptedApiClient {
        responses: Mutex<VecDeque<(u16, serde_json::Value)>>,
        pub urls: Mutex<Vec<String>>,
    }

    impl ScriptedApiClient {
        pub fn new(responses: Vec<(u16, serde_json::Value)>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                urls: Mutex::new(Vec::new()),
            })
        }

        pub fn urls(&self) -> Vec<String> {
            self.urls.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl ApiClient for ScriptedApiClient {
        async fn execute(
            &self,
            request: Request,
        ) -> CustomResult<Result<Response, Response>, ApiClientError> {
            self.urls.lock().unwrap().push(request.url.clone());
            let (status, body) = self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or((200, serde_json::json!({ "resultCode": "pending" })));
            let response = Response::json(status, &body);
            if (200..300).contains(&status) {
                Ok(Ok(response))
            } else {
                Ok(Err(response))
            }
        }
    }
}
