//! Single entry point for every action type.
//!
//! [`DefaultGenericActionDelegate`] owns one set of output streams for its whole lifetime. Each
//! action is routed to a concrete delegate whose streams are forwarded into that set, so the
//! hosting component subscribes once no matter how many delegates come and go.

// std::sync::Mutex is fine here, the lock is never held across an .await point.
use std::sync::{Arc, Mutex, PoisonError};

use common_enums::{ComponentViewType, DelegateKind};
use common_utils::{
    channel::{EventChannel, EventReceiver},
    scope::ComponentScope,
    CustomResult,
};
use domain_types::{
    action::Action,
    errors::{ActionError, CheckoutError},
    events::PermissionRequestData,
    payments::ActionComponentData,
    types::{CheckoutConfiguration, RedirectIntent},
};
use interfaces::{
    delegate::{ActionDelegate, RedirectListener},
    saved_state::SavedStateStore,
};
use tokio::sync::watch;

use crate::{
    host::ActionHost,
    observer::{ActionEventCallback, ActionObserverRepository},
    provider::{DelegateFactory, HostDelegateFactory},
};

pub const ACTION_KEY: &str = "ACTION_KEY";

#[derive(Default)]
struct State {
    scope: Option<ComponentScope>,
    delegate: Option<Arc<dyn ActionDelegate>>,
    subscriptions: Option<ComponentScope>,
    on_redirect: Option<RedirectListener>,
}

pub struct DefaultGenericActionDelegate {
    saved_state: Arc<dyn SavedStateStore>,
    factory: Arc<dyn DelegateFactory>,
    observers: ActionObserverRepository,
    details: EventChannel<ActionComponentData>,
    exceptions: EventChannel<CheckoutError>,
    permissions: EventChannel<PermissionRequestData>,
    view_type: Arc<watch::Sender<Option<ComponentViewType>>>,
    state: Mutex<State>,
}

impl DefaultGenericActionDelegate {
    pub fn new(
        configuration: CheckoutConfiguration,
        saved_state: Arc<dyn SavedStateStore>,
        host: ActionHost,
    ) -> Self {
        Self::with_factory(
            saved_state,
            Arc::new(HostDelegateFactory::new(configuration, host)),
        )
    }

    pub fn with_factory(
        saved_state: Arc<dyn SavedStateStore>,
        factory: Arc<dyn DelegateFactory>,
    ) -> Self {
        Self {
            saved_state,
            factory,
            observers: ActionObserverRepository::new(),
            details: EventChannel::default(),
            exceptions: EventChannel::default(),
            permissions: EventChannel::default(),
            view_type: Arc::new(watch::channel(None).0),
            state: Mutex::new(State::default()),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Binds the orchestrator to its host scope and rebuilds the delegate of a saved action.
    pub fn initialize(&self, scope: &ComponentScope) -> CustomResult<(), ActionError> {
        tracing::debug!("initialize");
        let has_delegate = {
            let mut state = self.state();
            state.scope = Some(scope.clone());
            state.delegate.is_some()
        };

        tracing::debug!("Restoring state");
        match self.saved_state.get_as::<Action>(ACTION_KEY) {
            Some(action) if !has_delegate => self.create_delegate_and_observe(&action).map(|_| ()),
            _ => Ok(()),
        }
    }

    /// Routes `action` to its delegate. Unknown action types are returned as an error.
    pub fn handle_action(&self, action: &Action) -> CustomResult<(), ActionError> {
        self.saved_state.set_as(ACTION_KEY, Some(action));

        let delegate = match self.continued_threeds2_delegate(action) {
            Some(delegate) => {
                tracing::debug!("Continuing the handling of 3ds2 challenge with old flow.");
                delegate
            }
            None => self
                .create_delegate_and_observe(action)
                .inspect_err(|_| self.saved_state.set(ACTION_KEY, None))?,
        };
        delegate.handle_action(action);
        Ok(())
    }

    /// The fingerprint and challenge of the older 3DS2 flow arrive as two actions but must share
    /// one 3DS2 transaction, so the challenge goes to the delegate that ran the fingerprint.
    fn continued_threeds2_delegate(&self, action: &Action) -> Option<Arc<dyn ActionDelegate>> {
        if !matches!(action, Action::Threeds2Challenge(_)) {
            return None;
        }
        self.state()
            .delegate
            .clone()
            .filter(|delegate| delegate.kind() == DelegateKind::ThreeDs2)
    }

    fn create_delegate_and_observe(
        &self,
        action: &Action,
    ) -> CustomResult<Arc<dyn ActionDelegate>, ActionError> {
        let delegate = self.factory.create(action, self.saved_state.clone())?;
        tracing::debug!(kind = %delegate.kind(), "Created delegate");

        let (scope, previous, previous_subscriptions, on_redirect) = {
            let mut state = self.state();
            (
                state.scope.clone(),
                state.delegate.replace(delegate.clone()),
                state.subscriptions.take(),
                state.on_redirect.clone(),
            )
        };
        if let Some(subscriptions) = previous_subscriptions {
            subscriptions.cancel();
        }
        if let Some(previous) = previous {
            previous.on_cleared();
        }

        if let (Some(redirectable), Some(listener)) = (delegate.as_redirectable(), on_redirect) {
            redirectable.set_on_redirect_listener(listener);
        }

        let Some(scope) = scope else {
            tracing::error!("handleAction called before initialize");
            self.exceptions.emit(CheckoutError::component(
                "Delegate has not been initialized with a scope",
            ));
            return Ok(delegate);
        };
        let subscriptions = self.observe_delegate(delegate.as_ref(), &scope);
        self.state().subscriptions = Some(subscriptions);
        delegate.initialize(&scope);

        Ok(delegate)
    }

    /// Forwards every stream `delegate` has into the orchestrator's own. Runs before the
    /// delegate is initialized so errors raised while restoring are forwarded too.
    fn observe_delegate(
        &self,
        delegate: &dyn ActionDelegate,
        scope: &ComponentScope,
    ) -> ComponentScope {
        let subscriptions = scope.child();

        if let Some(details_emitting) = delegate.as_details_emitting() {
            tracing::debug!("Observing details");
            subscriptions.launch(forward(details_emitting.details(), self.details.clone()));
        }

        tracing::debug!("Observing exceptions");
        subscriptions.launch(forward(delegate.exceptions(), self.exceptions.clone()));

        if let Some(permission_requesting) = delegate.as_permission_requesting() {
            tracing::debug!("Observing permission requests");
            subscriptions.launch(forward(
                permission_requesting.permission_requests(),
                self.permissions.clone(),
            ));
        }

        if let Some(view_providing) = delegate.as_view_providing() {
            tracing::debug!("Observing view flow");
            let mut view_type = view_providing.view_type();
            let output = self.view_type.clone();
            output.send_replace(*view_type.borrow_and_update());
            subscriptions.launch(async move {
                while view_type.changed().await.is_ok() {
                    output.send_replace(*view_type.borrow_and_update());
                }
            });
        }

        subscriptions
    }

    pub fn handle_intent(&self, intent: &RedirectIntent) {
        let Some(delegate) = self.delegate() else {
            self.exceptions.emit(CheckoutError::component(
                "handleIntent should not be called before handleAction",
            ));
            return;
        };
        match delegate.as_intent_handling() {
            Some(intent_handling) => {
                tracing::debug!("Handling intent");
                intent_handling.handle_intent(intent);
            }
            None => {
                self.exceptions.emit(CheckoutError::component(
                    "Cannot handle intent with the current component",
                ));
            }
        }
    }

    pub fn refresh_status(&self) {
        let Some(delegate) = self.delegate() else {
            return;
        };
        if let Some(status_polling) = delegate.as_status_polling() {
            tracing::debug!("Refreshing status");
            status_polling.refresh_status();
        }
    }

    pub fn set_on_redirect_listener(&self, listener: RedirectListener) {
        let delegate = {
            let mut state = self.state();
            state.on_redirect = Some(listener.clone());
            state.delegate.clone()
        };
        if let Some(redirectable) = delegate.as_deref().and_then(|d| d.as_redirectable()) {
            redirectable.set_on_redirect_listener(listener);
        }
    }

    pub fn on_error(&self, error: CheckoutError) {
        match self.delegate() {
            Some(delegate) => delegate.on_error(error),
            None => {
                self.exceptions.emit(error);
            }
        }
    }

    /// Feeds details, errors and permission requests to `callback` until
    /// [`DefaultGenericActionDelegate::remove_observer`] is called or `scope` is cancelled.
    pub fn observe(&self, scope: &ComponentScope, callback: ActionEventCallback) {
        self.observers.add_observers(
            Some(self.details()),
            self.exceptions(),
            Some(self.permission_requests()),
            scope,
            callback,
        );
    }

    pub fn remove_observer(&self) {
        self.observers.remove_observers();
    }

    pub fn on_cleared(&self) {
        tracing::debug!("onCleared");
        self.remove_observer();
        let (delegate, subscriptions) = {
            let mut state = self.state();
            state.scope = None;
            state.on_redirect = None;
            (state.delegate.take(), state.subscriptions.take())
        };
        if let Some(subscriptions) = subscriptions {
            subscriptions.cancel();
        }
        if let Some(delegate) = delegate {
            delegate.on_cleared();
        }
    }

    /// Currently active delegate, if an action was handled.
    pub fn delegate(&self) -> Option<Arc<dyn ActionDelegate>> {
        self.state().delegate.clone()
    }

    pub fn details(&self) -> EventReceiver<ActionComponentData> {
        self.details.subscribe()
    }

    pub fn exceptions(&self) -> EventReceiver<CheckoutError> {
        self.exceptions.subscribe()
    }

    pub fn permission_requests(&self) -> EventReceiver<PermissionRequestData> {
        self.permissions.subscribe()
    }

    pub fn view_type(&self) -> watch::Receiver<Option<ComponentViewType>> {
        self.view_type.subscribe()
    }
}

async fn forward<T: Clone>(mut receiver: EventReceiver<T>, output: EventChannel<T>) {
    while let Some(value) = receiver.recv().await {
        output.emit(value);
    }
}
