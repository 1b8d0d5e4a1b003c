use std::sync::Arc;

use common_enums::{ComponentViewType, DelegateKind};
use common_utils::{channel::EventReceiver, scope::ComponentScope};
use domain_types::{
    action::{Action, SdkAction},
    errors::CheckoutError,
    payments::ActionComponentData,
};
use interfaces::{
    delegate::{ActionDelegate, DetailsEmittingDelegate, ViewProvidingDelegate},
    saved_state::SavedStateStore,
    sdk::NativeSdkLauncher,
};
use tokio::sync::watch;

use super::{DelegateCore, UNSUPPORTED_ACTION};

const ACTION_KEY: &str = "sdk.action";

/// Hands `sdk` actions (e.g. a wallet app flow) to the payment method's native SDK.
pub struct DefaultSdkActionDelegate {
    core: DelegateCore,
    sdk_launcher: Arc<dyn NativeSdkLauncher>,
}

impl DefaultSdkActionDelegate {
    pub fn new(
        saved_state: Arc<dyn SavedStateStore>,
        sdk_launcher: Arc<dyn NativeSdkLauncher>,
    ) -> Self {
        let core = DelegateCore::new(ACTION_KEY, saved_state);
        core.set_view(ComponentViewType::Sdk);
        Self { core, sdk_launcher }
    }
}

impl ActionDelegate for DefaultSdkActionDelegate {
    fn kind(&self) -> DelegateKind {
        DelegateKind::Sdk
    }

    fn initialize(&self, scope: &ComponentScope) {
        self.core.attach(scope);
        if let Some(action) = self.core.saved_action::<SdkAction>() {
            self.core
                .payment_data()
                .set_payment_data(action.payment_data);
        }
    }

    fn handle_action(&self, action: &Action) {
        let Action::Sdk(action) = action else {
            self.core
                .emit_error(CheckoutError::component(UNSUPPORTED_ACTION));
            return;
        };
        if action.sdk_data.is_none() {
            self.core
                .emit_error(CheckoutError::component("SDK data is missing"));
            return;
        }
        self.core.save_action(action);
        self.core
            .payment_data()
            .set_payment_data(action.payment_data.clone());

        let core = self.core.clone();
        let sdk_launcher = self.sdk_launcher.clone();
        let action = action.clone();
        self.core.launch(async move {
            match sdk_launcher.launch(&action).await {
                Ok(details) => core.emit_details(details),
                Err(error) => core.emit_error(error),
            }
        });
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

    fn as_view_providing(&self) -> Option<&dyn ViewProvidingDelegate> {
        Some(self)
    }
}

impl DetailsEmittingDelegate for DefaultSdkActionDelegate {
    fn details(&self) -> EventReceiver<ActionComponentData> {
        self.core.details()
    }
}

impl ViewProvidingDelegate for DefaultSdkActionDelegate {
    fn view_type(&self) -> watch::Receiver<Option<ComponentViewType>> {
        self.core.view_type()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use interfaces::saved_state::InMemorySavedState;
    use serde_json::json;

    use super::*;

    struct EchoLauncher;

    #[async_trait::async_trait]
    impl NativeSdkLauncher for EchoLauncher {
        async fn launch(&self, action: &SdkAction) -> Result<serde_json::Value, CheckoutError> {
            match &action.sdk_data {
                Some(data) if data.get("fail").is_some() => {
                    Err(CheckoutError::component("wallet closed"))
                }
                Some(data) => Ok(json!({ "returned": data })),
                None => Err(CheckoutError::component("no data")),
            }
        }
    }

    fn delegate() -> DefaultSdkActionDelegate {
        let delegate =
            DefaultSdkActionDelegate::new(Arc::new(InMemorySavedState::new()), Arc::new(EchoLauncher));
        delegate.initialize(&ComponentScope::new());
        delegate
    }

    #[tokio::test]
    async fn sdk_result_is_emitted_as_details() {
        let delegate = delegate();
        let mut details = delegate.details();

        delegate.handle_action(
            &Action::from_json(
                r#"{"type":"sdk","paymentMethodType":"wechatpaySDK","paymentData":"pd","sdkData":{"appid":"wx"}}"#,
            )
            .unwrap(),
        );

        let data = details.recv().await.unwrap();
        assert_eq!(data.details, Some(json!({ "returned": { "appid": "wx" } })));
        assert_eq!(data.payment_data.as_deref(), Some("pd"));
        assert_eq!(*delegate.view_type().borrow(), Some(ComponentViewType::Sdk));
    }

    #[tokio::test]
    async fn sdk_failure_is_an_error() {
        let delegate = delegate();
        let mut exceptions = delegate.exceptions();

        delegate.handle_action(
            &Action::from_json(r#"{"type":"sdk","sdkData":{"fail":true}}"#).unwrap(),
        );

        assert_eq!(
            exceptions.recv().await.unwrap(),
            CheckoutError::component("wallet closed")
        );
    }
}
