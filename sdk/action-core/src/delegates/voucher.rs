use std::sync::Arc;

use common_enums::{ComponentViewType, DelegateKind};
use common_utils::{channel::EventReceiver, scope::ComponentScope};
use domain_types::{
    action::{Action, VoucherAction},
    errors::CheckoutError,
    payments::Amount,
};
use interfaces::{
    delegate::{ActionDelegate, ViewProvidingDelegate},
    saved_state::SavedStateStore,
};
use tokio::sync::watch;

use super::{DelegateCore, UNSUPPORTED_ACTION};

const ACTION_KEY: &str = "voucher.action";

/// How the shopper keeps the voucher.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VoucherStoreAction {
    DownloadPdf(String),
    SaveAsImage,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoucherInformationField {
    pub label: &'static str,
    pub value: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VoucherOutputData {
    pub is_valid: bool,
    pub payment_method_type: Option<String>,
    pub expires_at: Option<String>,
    pub reference: Option<String>,
    pub total_amount: Option<Amount>,
    pub store_action: Option<VoucherStoreAction>,
    pub information_fields: Vec<VoucherInformationField>,
}

/// Methods with an extended voucher layout get the full view, the rest the simple one.
fn voucher_view_type(payment_method_type: &str) -> ComponentViewType {
    match payment_method_type {
        "multibanco" | "oxxo" => ComponentViewType::FullVoucher,
        pm if pm.starts_with("boletobancario") || pm.starts_with("econtext") => {
            ComponentViewType::FullVoucher
        }
        _ => ComponentViewType::SimpleVoucher,
    }
}

fn information_fields(action: &VoucherAction) -> Vec<VoucherInformationField> {
    [
        ("entity", &action.entity),
        ("alternative_reference", &action.alternative_reference),
        ("merchant_name", &action.merchant_name),
        ("issuer", &action.issuer),
        ("instructions_url", &action.instructions_url),
    ]
    .into_iter()
    .filter_map(|(label, value)| {
        value.clone().map(|value| VoucherInformationField { label, value })
    })
    .collect()
}

/// Shows an offline payment voucher. Nothing is submitted afterwards, the shopper pays outside
/// the app.
pub struct DefaultVoucherDelegate {
    core: DelegateCore,
    output_data: watch::Sender<VoucherOutputData>,
}

impl DefaultVoucherDelegate {
    pub fn new(saved_state: Arc<dyn SavedStateStore>) -> Self {
        Self {
            core: DelegateCore::new(ACTION_KEY, saved_state),
            output_data: watch::channel(VoucherOutputData::default()).0,
        }
    }

    pub fn output_data(&self) -> watch::Receiver<VoucherOutputData> {
        self.output_data.subscribe()
    }

    fn init_state(&self, action: &VoucherAction) {
        let Some(payment_method_type) = action.payment_method_type.as_deref() else {
            self.core.emit_error(CheckoutError::component(
                "Payment method type is missing from the voucher action",
            ));
            return;
        };
        let view_type = voucher_view_type(payment_method_type);
        self.core.set_view(view_type);

        let store_action = action
            .download_url
            .clone()
            .or_else(|| action.url.clone())
            .map_or(VoucherStoreAction::SaveAsImage, VoucherStoreAction::DownloadPdf);
        let information_fields = match view_type {
            ComponentViewType::FullVoucher => information_fields(action),
            _ => Vec::new(),
        };
        self.output_data.send_replace(VoucherOutputData {
            is_valid: true,
            payment_method_type: action.payment_method_type.clone(),
            expires_at: action.expires_at.clone(),
            reference: action.reference.clone(),
            total_amount: action.total_amount.clone(),
            store_action: Some(store_action),
            information_fields,
        });
    }
}

impl ActionDelegate for DefaultVoucherDelegate {
    fn kind(&self) -> DelegateKind {
        DelegateKind::Voucher
    }

    fn initialize(&self, scope: &ComponentScope) {
        self.core.attach(scope);
        if let Some(action) = self.core.saved_action::<VoucherAction>() {
            self.init_state(&action);
        }
    }

    fn handle_action(&self, action: &Action) {
        let Action::Voucher(action) = action else {
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

    fn as_view_providing(&self) -> Option<&dyn ViewProvidingDelegate> {
        Some(self)
    }
}

impl ViewProvidingDelegate for DefaultVoucherDelegate {
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

    fn delegate() -> DefaultVoucherDelegate {
        let delegate = DefaultVoucherDelegate::new(Arc::new(InMemorySavedState::new()));
        delegate.initialize(&ComponentScope::new());
        delegate
    }

    #[tokio::test]
    async fn boleto_gets_the_full_view_and_a_pdf() {
        let delegate = delegate();
        delegate.handle_action(
            &Action::from_json(
                &json!({
                    "type": "voucher",
                    "paymentMethodType": "boletobancario",
                    "url": "https://test.adyen.com/voucher.pdf",
                    "reference": "123",
                    "totalAmount": { "currency": "BRL", "value": 1000 }
                })
                .to_string(),
            )
            .unwrap(),
        );

        assert_eq!(
            *delegate.view_type().borrow(),
            Some(ComponentViewType::FullVoucher)
        );
        let output = delegate.output_data().borrow().clone();
        assert_eq!(
            output.store_action,
            Some(VoucherStoreAction::DownloadPdf(
                "https://test.adyen.com/voucher.pdf".to_string()
            ))
        );
        assert_eq!(output.total_amount, Some(Amount::new("BRL", 1000)));
    }

    #[tokio::test]
    async fn bacs_without_url_is_saved_as_image() {
        let delegate = delegate();
        delegate.handle_action(
            &Action::from_json(r#"{"type":"voucher","paymentMethodType":"directdebit_GB"}"#)
                .unwrap(),
        );

        assert_eq!(
            *delegate.view_type().borrow(),
            Some(ComponentViewType::SimpleVoucher)
        );
        assert_eq!(
            delegate.output_data().borrow().store_action,
            Some(VoucherStoreAction::SaveAsImage)
        );
    }

    #[tokio::test]
    async fn missing_payment_method_is_rejected() {
        let delegate = delegate();
        let mut exceptions = delegate.exceptions();
        delegate.handle_action(
            &Action::from_json(r#"{"type":"voucher","reference":"1"}"#).unwrap(),
        );

        assert_eq!(
            exceptions.recv().await.unwrap(),
            CheckoutError::component("Payment method type is missing from the voucher action")
        );
        assert_eq!(*delegate.view_type().borrow(), None);
    }
}
