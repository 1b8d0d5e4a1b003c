//! Type keyed routing of actions to the delegate able to handle them.

use std::sync::Arc;

use common_utils::CustomResult;
use domain_types::{action::Action, errors::ActionError, types::CheckoutConfiguration};
use error_stack::report;
use interfaces::{delegate::ActionDelegate, saved_state::SavedStateStore};

use crate::{
    delegates::{
        DefaultAwaitDelegate, DefaultQrCodeDelegate, DefaultRedirectDelegate,
        DefaultSdkActionDelegate, DefaultThreeDs2Delegate, DefaultVoucherDelegate,
    },
    host::ActionHost,
};

#[derive(Clone, Copy, Debug, Default)]
pub struct ActionDelegateProvider;

impl ActionDelegateProvider {
    /// Builds a fresh delegate for `action`. Fails only for action types the SDK does not know.
    pub fn get_delegate(
        action: &Action,
        configuration: &CheckoutConfiguration,
        saved_state: Arc<dyn SavedStateStore>,
        host: &ActionHost,
    ) -> CustomResult<Arc<dyn ActionDelegate>, ActionError> {
        let delegate: Arc<dyn ActionDelegate> = match action {
            Action::Await(_) => Arc::new(DefaultAwaitDelegate::new(
                configuration,
                saved_state,
                host.api_client.clone(),
            )),
            Action::QrCode(_) => Arc::new(DefaultQrCodeDelegate::new(
                configuration,
                saved_state,
                host.api_client.clone(),
                host.redirect_handler.clone(),
            )),
            Action::Redirect(_) => Arc::new(DefaultRedirectDelegate::new(
                configuration,
                saved_state,
                host.api_client.clone(),
                host.redirect_handler.clone(),
            )),
            Action::Threeds2Fingerprint(_)
            | Action::Threeds2Challenge(_)
            | Action::Threeds2(_) => Arc::new(DefaultThreeDs2Delegate::new(
                configuration,
                saved_state,
                host.api_client.clone(),
                host.redirect_handler.clone(),
                host.threeds2_service.clone(),
            )),
            Action::Voucher(_) => Arc::new(DefaultVoucherDelegate::new(saved_state)),
            Action::Sdk(_) => Arc::new(DefaultSdkActionDelegate::new(
                saved_state,
                host.sdk_launcher.clone(),
            )),
            Action::Unknown(unknown) => {
                tracing::error!(action_type = %unknown.action_type, "unsupported action type");
                return Err(report!(ActionError::UnsupportedActionType(
                    unknown.action_type.clone()
                )));
            }
        };
        tracing::debug!(kind = ?delegate.kind(), "created action delegate");
        Ok(delegate)
    }
}

/// Creates delegates for the generic orchestrator.
pub trait DelegateFactory: Send + Sync {
    fn create(
        &self,
        action: &Action,
        saved_state: Arc<dyn SavedStateStore>,
    ) -> CustomResult<Arc<dyn ActionDelegate>, ActionError>;
}

/// [`ActionDelegateProvider`] bound to one configuration and host.
#[derive(Clone, Debug)]
pub struct HostDelegateFactory {
    configuration: CheckoutConfiguration,
    host: ActionHost,
}

impl HostDelegateFactory {
    pub fn new(configuration: CheckoutConfiguration, host: ActionHost) -> Self {
        Self {
            configuration,
            host,
        }
    }
}

impl DelegateFactory for HostDelegateFactory {
    fn create(
        &self,
        action: &Action,
        saved_state: Arc<dyn SavedStateStore>,
    ) -> CustomResult<Arc<dyn ActionDelegate>, ActionError> {
        ActionDelegateProvider::get_delegate(action, &self.configuration, saved_state, &self.host)
    }
}
