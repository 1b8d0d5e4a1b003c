use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::{Duration, SystemTime},
};

use common_enums::{ComponentViewType, DelegateKind, RequiredPermission};
use common_utils::{
    channel::{EventChannel, EventReceiver},
    consts,
    request::{build_url, Method, RequestBuilder},
    scope::ComponentScope,
};
use domain_types::{
    action::{Action, QrCodeAction},
    errors::CheckoutError,
    events::PermissionRequestData,
    payments::ActionComponentData,
    types::{CheckoutConfiguration, RedirectIntent},
};
use interfaces::{
    api::ApiClient,
    delegate::{
        ActionDelegate, DetailsEmittingDelegate, IntentHandlingDelegate,
        PermissionRequestingDelegate, StatusPollingDelegate, ViewProvidingDelegate,
    },
    redirect::RedirectHandler,
    saved_state::SavedStateStore,
};
use tokio::sync::watch;

use super::{on_polled_status, DelegateCore, UNSUPPORTED_ACTION};
use crate::repositories::status::StatusRepository;

const ACTION_KEY: &str = "qr_code.action";

const PIX: &str = "pix";
const PAY_NOW: &str = "paynow";
const UPI_QR: &str = "upi_qr";

/// Payment methods whose QR code is shown in app. Everything else is a redirect.
const VIEWABLE_PAYMENT_METHODS: [&str; 3] = [PIX, PAY_NOW, UPI_QR];

const PAY_NOW_MAX_POLLING_DURATION: Duration = Duration::from_secs(3 * 60);
const UPI_MAX_POLLING_DURATION: Duration = Duration::from_secs(5 * 60);
const TIMER_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QrCodeOutputData {
    /// The payment reached a final status.
    pub is_valid: bool,
    pub payment_method_type: Option<String>,
    pub qr_code_data: Option<String>,
    pub qr_image_url: Option<String>,
}

/// Time left before polling gives up.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TimerData {
    pub millis_until_finished: u64,
    pub progress_percentage: u8,
}

pub struct DefaultQrCodeDelegate {
    core: DelegateCore,
    base_url: String,
    api_client: Arc<dyn ApiClient>,
    status_repository: Arc<StatusRepository>,
    redirect_handler: Arc<dyn RedirectHandler>,
    permissions: EventChannel<PermissionRequestData>,
    output_data: Arc<watch::Sender<QrCodeOutputData>>,
    timer: Arc<watch::Sender<TimerData>>,
}

impl DefaultQrCodeDelegate {
    pub fn new(
        configuration: &CheckoutConfiguration,
        saved_state: Arc<dyn SavedStateStore>,
        api_client: Arc<dyn ApiClient>,
        redirect_handler: Arc<dyn RedirectHandler>,
    ) -> Self {
        Self {
            core: DelegateCore::new(ACTION_KEY, saved_state),
            base_url: configuration.base_url().to_string(),
            status_repository: Arc::new(StatusRepository::new(
                api_client.clone(),
                configuration,
            )),
            api_client,
            redirect_handler,
            permissions: EventChannel::default(),
            output_data: Arc::new(watch::channel(QrCodeOutputData::default()).0),
            timer: Arc::new(watch::channel(TimerData::default()).0),
        }
    }

    pub fn output_data(&self) -> watch::Receiver<QrCodeOutputData> {
        self.output_data.subscribe()
    }

    pub fn timer(&self) -> watch::Receiver<TimerData> {
        self.timer.subscribe()
    }

    fn init_state(&self, action: &QrCodeAction) {
        self.core
            .payment_data()
            .set_payment_data(action.payment_data.clone());
        let Some(payment_data) = action.payment_data.clone() else {
            tracing::error!("Payment data is null");
            self.core
                .emit_error(CheckoutError::component("Payment data is null"));
            return;
        };

        let payment_method_type = action.payment_method_type.as_deref().unwrap_or_default();
        if !is_viewable(action) {
            self.core.set_view(ComponentViewType::QrCodeRedirect);
            return;
        }

        let (view_type, max_polling_duration) = match payment_method_type {
            PAY_NOW => (ComponentViewType::FullQrCode, PAY_NOW_MAX_POLLING_DURATION),
            UPI_QR => (ComponentViewType::FullQrCode, UPI_MAX_POLLING_DURATION),
            _ => (
                ComponentViewType::SimpleQrCode,
                consts::DEFAULT_MAX_POLLING_DURATION,
            ),
        };
        self.core.set_view(view_type);
        self.output_data.send_replace(QrCodeOutputData {
            is_valid: false,
            payment_method_type: action.payment_method_type.clone(),
            qr_code_data: action.qr_code_data.clone(),
            qr_image_url: action
                .qr_code_data
                .as_deref()
                .and_then(|data| self.qr_image_url(data)),
        });

        let core = self.core.clone();
        let status_repository = self.status_repository.clone();
        let output_data = self.output_data.clone();
        let timer = self.timer.clone();
        self.core.launch_job(async move {
            let polling = status_repository.poll(payment_data, max_polling_duration, |result| {
                if let Ok(response) = &result {
                    let is_valid = response.is_final_result();
                    output_data.send_modify(|data| data.is_valid = is_valid);
                }
                on_polled_status(&core, result)
            });
            tokio::select! {
                _ = polling => {}
                _ = count_down(&timer, max_polling_duration) => {}
            }
        });
    }

    fn qr_image_url(&self, qr_code_data: &str) -> Option<String> {
        build_url(
            &self.base_url,
            consts::QR_CODE_IMAGE_PATH,
            &[
                ("barcodeType", "qrCode"),
                ("fileType", "png"),
                ("data", qr_code_data),
            ],
        )
        .inspect_err(|error| tracing::warn!(%error, "unable to build qr image url"))
        .ok()
        .map(String::from)
    }

    /// Saves the QR code image to `directory` once the host grants storage access.
    pub async fn download_qr_image(&self, directory: &Path) -> Result<PathBuf, CheckoutError> {
        let output = self.output_data.borrow().clone();
        let image_url = output
            .qr_image_url
            .ok_or_else(|| CheckoutError::component("QR code image is not available"))?;

        let (request, granted) =
            PermissionRequestData::new(RequiredPermission::WriteExternalStorage);
        self.permissions.emit(request);
        if !granted.await.unwrap_or(false) {
            return Err(CheckoutError::Permission(
                "Storage permission was not granted".to_string(),
            ));
        }

        let request = RequestBuilder::new()
            .method(Method::Get)
            .url(&image_url)
            .build();
        let image = self
            .api_client
            .execute(request)
            .await
            .map_err(|report| CheckoutError::from_report("Failed to download QR code", &report))?
            .map_err(|response| {
                CheckoutError::Http(format!(
                    "Failed to download QR code - {}",
                    response.status_code
                ))
            })?;

        let timestamp = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or_default();
        let path = directory.join(format!(
            "{}-{timestamp}.png",
            output.payment_method_type.unwrap_or_default()
        ));
        tokio::fs::write(&path, &image.response)
            .await
            .map_err(|error| CheckoutError::component(format!("Failed to save QR code: {error}")))?;
        Ok(path)
    }
}

fn is_viewable(action: &QrCodeAction) -> bool {
    VIEWABLE_PAYMENT_METHODS.contains(&action.payment_method_type.as_deref().unwrap_or_default())
}

async fn count_down(timer: &watch::Sender<TimerData>, total: Duration) {
    let start = tokio::time::Instant::now();
    let total_millis = total.as_millis().max(1);
    loop {
        let left = total.saturating_sub(start.elapsed()).as_millis();
        timer.send_replace(TimerData {
            millis_until_finished: u64::try_from(left).unwrap_or(u64::MAX),
            progress_percentage: u8::try_from(left * 100 / total_millis).unwrap_or(100),
        });
        if left == 0 {
            // Polling reports the timeout, keep this branch pending.
            std::future::pending::<()>().await;
        }
        tokio::time::sleep(TIMER_INTERVAL).await;
    }
}

impl ActionDelegate for DefaultQrCodeDelegate {
    fn kind(&self) -> DelegateKind {
        DelegateKind::QrCode
    }

    fn initialize(&self, scope: &ComponentScope) {
        self.core.attach(scope);
        if let Some(action) = self.core.saved_action::<QrCodeAction>() {
            self.init_state(&action);
        }
    }

    fn handle_action(&self, action: &Action) {
        let Action::QrCode(action) = action else {
            self.core
                .emit_error(CheckoutError::component(UNSUPPORTED_ACTION));
            return;
        };
        self.core.save_action(action);
        self.init_state(action);
        if action.payment_data.is_some() && !is_viewable(action) {
            tracing::debug!("Action does not require a view, redirecting.");
            if let Err(error) = self
                .redirect_handler
                .launch_uri_redirect(action.url.as_deref().unwrap_or_default())
            {
                self.core.emit_error(error);
            }
        }
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

    fn as_intent_handling(&self) -> Option<&dyn IntentHandlingDelegate> {
        Some(self)
    }

    fn as_status_polling(&self) -> Option<&dyn StatusPollingDelegate> {
        Some(self)
    }

    fn as_permission_requesting(&self) -> Option<&dyn PermissionRequestingDelegate> {
        Some(self)
    }

    fn as_view_providing(&self) -> Option<&dyn ViewProvidingDelegate> {
        Some(self)
    }
}

impl DetailsEmittingDelegate for DefaultQrCodeDelegate {
    fn details(&self) -> EventReceiver<ActionComponentData> {
        self.core.details()
    }
}

impl IntentHandlingDelegate for DefaultQrCodeDelegate {
    fn handle_intent(&self, intent: &RedirectIntent) {
        match self.redirect_handler.parse_redirect_result(intent.data.as_ref()) {
            Ok(details) => self.core.emit_details(details),
            Err(error) => self.core.emit_error(error),
        }
    }
}

impl StatusPollingDelegate for DefaultQrCodeDelegate {
    fn refresh_status(&self) {
        if self.core.payment_data().payment_data().is_some() {
            self.status_repository.refresh();
        }
    }
}

impl PermissionRequestingDelegate for DefaultQrCodeDelegate {
    fn permission_requests(&self) -> EventReceiver<PermissionRequestData> {
        self.permissions.subscribe()
    }
}

impl ViewProvidingDelegate for DefaultQrCodeDelegate {
    fn view_type(&self) -> watch::Receiver<Option<ComponentViewType>> {
        self.core.view_type()
    }
}
