//! Values published to the hosting component.

use std::sync::{Arc, Mutex, PoisonError};

use common_enums::RequiredPermission;
use tokio::sync::oneshot;

use crate::{
    errors::CheckoutError,
    payments::{ActionComponentData, PaymentComponentState},
};

/// A delegate needs the host to grant a permission before it can continue.
///
/// The host answers through [`PermissionRequestData::respond`]; dropping the request counts as a
/// denial.
#[derive(Clone, Debug)]
pub struct PermissionRequestData {
    pub required_permission: RequiredPermission,
    responder: Arc<Mutex<Option<oneshot::Sender<bool>>>>,
}

impl PermissionRequestData {
    pub fn new(required_permission: RequiredPermission) -> (Self, oneshot::Receiver<bool>) {
        let (sender, receiver) = oneshot::channel();
        (
            Self {
                required_permission,
                responder: Arc::new(Mutex::new(Some(sender))),
            },
            receiver,
        )
    }

    /// Answers the request. Only the first answer is delivered.
    pub fn respond(&self, granted: bool) {
        let sender = self
            .responder
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(sender) = sender {
            let _ = sender.send(granted);
        }
    }
}

/// Everything an action component reports to its host, in the order it happened.
#[derive(Clone, Debug)]
pub enum ActionComponentEvent {
    ActionDetails(ActionComponentData),
    Error(CheckoutError),
    PermissionRequest(PermissionRequestData),
}

/// Everything a payment component reports to its session event handler.
#[derive(Clone, Debug)]
pub enum PaymentComponentEvent {
    Submit(PaymentComponentState),
    ActionDetails(ActionComponentData),
    StateChanged(PaymentComponentState),
    Error(CheckoutError),
    PermissionRequest(PermissionRequestData),
}
