//! Handlers for server issued actions and the optional capabilities they expose.

use std::sync::Arc;

use common_enums::{ComponentViewType, DelegateKind};
use common_utils::{channel::EventReceiver, scope::ComponentScope};
use domain_types::{
    action::Action,
    errors::CheckoutError,
    events::PermissionRequestData,
    payments::ActionComponentData,
    types::RedirectIntent,
};
use tokio::sync::watch;

/// Invoked right before the shopper leaves the app for a redirect.
pub type RedirectListener = Arc<dyn Fn() + Send + Sync>;

/// Handles one action type. Every delegate publishes errors; the rest is opt in through the
/// `as_*` accessors, which return `None` unless the delegate has that capability.
pub trait ActionDelegate: Send + Sync {
    fn kind(&self) -> DelegateKind;

    /// Binds the delegate to the lifetime of the hosting component.
    fn initialize(&self, scope: &ComponentScope);

    fn handle_action(&self, action: &Action);

    fn exceptions(&self) -> EventReceiver<CheckoutError>;

    /// Publishes an error raised by the host on the delegate's exception stream.
    fn on_error(&self, error: CheckoutError);

    fn on_cleared(&self);

    fn as_details_emitting(&self) -> Option<&dyn DetailsEmittingDelegate> {
        None
    }

    fn as_intent_handling(&self) -> Option<&dyn IntentHandlingDelegate> {
        None
    }

    fn as_status_polling(&self) -> Option<&dyn StatusPollingDelegate> {
        None
    }

    fn as_permission_requesting(&self) -> Option<&dyn PermissionRequestingDelegate> {
        None
    }

    fn as_view_providing(&self) -> Option<&dyn ViewProvidingDelegate> {
        None
    }

    fn as_redirectable(&self) -> Option<&dyn RedirectableDelegate> {
        None
    }
}

pub trait DetailsEmittingDelegate: Send + Sync {
    fn details(&self) -> EventReceiver<ActionComponentData>;
}

pub trait IntentHandlingDelegate: Send + Sync {
    fn handle_intent(&self, intent: &RedirectIntent);
}

pub trait StatusPollingDelegate: Send + Sync {
    /// Requests an immediate status check instead of waiting for the next poll.
    fn refresh_status(&self);
}

pub trait PermissionRequestingDelegate: Send + Sync {
    fn permission_requests(&self) -> EventReceiver<PermissionRequestData>;
}

pub trait ViewProvidingDelegate: Send + Sync {
    fn view_type(&self) -> watch::Receiver<Option<ComponentViewType>>;
}

pub trait RedirectableDelegate: Send + Sync {
    fn set_on_redirect_listener(&self, listener: RedirectListener);
}
