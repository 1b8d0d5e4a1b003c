//! Drains an action component's output streams into the host's callback.

// std::sync::Mutex is fine here, the lock is never held across an .await point.
use std::sync::{Arc, Mutex, PoisonError};

use common_utils::{channel::EventReceiver, scope::ComponentScope};
use domain_types::{
    errors::CheckoutError,
    events::{ActionComponentEvent, PermissionRequestData},
    payments::ActionComponentData,
};

pub type ActionEventCallback = Arc<dyn Fn(ActionComponentEvent) + Send + Sync>;

/// Keeps at most one set of observers alive. Adding observers replaces the previous set.
#[derive(Debug, Default)]
pub struct ActionObserverRepository {
    observers: Mutex<Option<ComponentScope>>,
}

impl ActionObserverRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_observers(
        &self,
        details: Option<EventReceiver<ActionComponentData>>,
        exceptions: EventReceiver<CheckoutError>,
        permissions: Option<EventReceiver<PermissionRequestData>>,
        scope: &ComponentScope,
        callback: ActionEventCallback,
    ) {
        self.remove_observers();
        let observers = scope.child();

        if let Some(details) = details {
            observers.launch(forward(details, callback.clone(), ActionComponentEvent::ActionDetails));
        }
        observers.launch(forward(exceptions, callback.clone(), ActionComponentEvent::Error));
        if let Some(permissions) = permissions {
            observers.launch(forward(
                permissions,
                callback,
                ActionComponentEvent::PermissionRequest,
            ));
        }

        *self.observers.lock().unwrap_or_else(PoisonError::into_inner) = Some(observers);
    }

    pub fn remove_observers(&self) {
        let observers = self
            .observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(observers) = observers {
            tracing::debug!("removing observers");
            observers.cancel();
        }
    }

    pub fn is_observing(&self) -> bool {
        self.observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|observers| !observers.is_cancelled())
    }
}

async fn forward<T: Clone>(
    mut receiver: EventReceiver<T>,
    callback: ActionEventCallback,
    event: fn(T) -> ActionComponentEvent,
) {
    while let Some(value) = receiver.recv().await {
        callback(event(value));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use common_utils::channel::EventChannel;
    use tokio::sync::mpsc;

    use super::*;

    fn recording_callback() -> (ActionEventCallback, mpsc::UnboundedReceiver<ActionComponentEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let callback: ActionEventCallback = Arc::new(move |event| {
            let _ = sender.send(event);
        });
        (callback, receiver)
    }

    #[tokio::test]
    async fn events_reach_the_callback_until_removed() {
        let scope = ComponentScope::new();
        let details = EventChannel::<ActionComponentData>::default();
        let exceptions = EventChannel::<CheckoutError>::default();
        let repository = ActionObserverRepository::new();
        let (callback, mut events) = recording_callback();

        repository.add_observers(
            Some(details.subscribe()),
            exceptions.subscribe(),
            None,
            &scope,
            callback,
        );
        assert!(repository.is_observing());

        exceptions.emit(CheckoutError::component("boom"));
        match events.recv().await.unwrap() {
            ActionComponentEvent::Error(error) => assert_eq!(error.message(), "boom"),
            other => panic!("unexpected event {other:?}"),
        }

        details.emit(ActionComponentData::default());
        assert!(matches!(
            events.recv().await.unwrap(),
            ActionComponentEvent::ActionDetails(_)
        ));

        repository.remove_observers();
        assert!(!repository.is_observing());
        tokio::task::yield_now().await;
        exceptions.emit(CheckoutError::component("ignored"));
        tokio::task::yield_now().await;
        assert!(events.try_recv().is_err());
    }
}
