//! 3D Secure 2 native flow: device fingerprint, optional challenge, result details.
//!
//! The SDK transaction created while fingerprinting is kept in memory; the challenge step
//! reuses it, which is why the orchestrator keeps this delegate alive across a
//! `threeDS2Challenge` follow up.

// std::sync::Mutex is fine here, the lock is never held across an .await point.
use std::sync::{Arc, Mutex, PoisonError};

use common_enums::{ComponentViewType, DelegateKind, ThreeDs2SubType};
use common_utils::{
    channel::EventReceiver,
    ext_traits::{encode_base64_json, StringExt},
    scope::ComponentScope,
};
use domain_types::{
    action::{Action, Threeds2Action},
    errors::CheckoutError,
    payments::ActionComponentData,
    threeds2::{
        AuthenticationRequestParameters, ChallengeParameters, ChallengeResult,
        ChallengeResultPayload, ChallengeToken, FingerprintPayload, FingerprintToken,
        SubmitFingerprintResult, ThreeDs2ConfigParameters,
    },
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
    threeds2::{ThreeDs2Service, ThreeDs2Transaction},
};
use serde_json::json;
use tokio::sync::watch;

use super::{DelegateCore, UNSUPPORTED_ACTION};
use crate::repositories::submit_fingerprint::SubmitFingerprintRepository;

const ACTION_KEY: &str = "threeds2.action";
const AUTHORIZATION_TOKEN_KEY: &str = "authorization_token";

const FINGERPRINT_DETAILS_KEY: &str = "threeds2.fingerprint";
const CHALLENGE_DETAILS_KEY: &str = "threeds2.challengeResult";
const THREEDS_RESULT_KEY: &str = "threeDSResult";

const DEFAULT_CHALLENGE_TIME_OUT_MINUTES: u32 = 10;
const PROTOCOL_VERSION_2_1_0: &str = "2.1.0";

pub struct DefaultThreeDs2Delegate {
    inner: Arc<Inner>,
}

struct Inner {
    core: DelegateCore,
    requestor_app_url: Option<String>,
    shopper_locale: Option<String>,
    submit_fingerprint_repository: SubmitFingerprintRepository,
    redirect_handler: Arc<dyn RedirectHandler>,
    threeds2_service: Arc<dyn ThreeDs2Service>,
    current_transaction: Mutex<Option<Arc<dyn ThreeDs2Transaction>>>,
}

impl DefaultThreeDs2Delegate {
    pub fn new(
        configuration: &CheckoutConfiguration,
        saved_state: Arc<dyn SavedStateStore>,
        api_client: Arc<dyn ApiClient>,
        redirect_handler: Arc<dyn RedirectHandler>,
        threeds2_service: Arc<dyn ThreeDs2Service>,
    ) -> Self {
        let core = DelegateCore::new(ACTION_KEY, saved_state);
        core.set_view(ComponentViewType::ThreeDs2);
        Self {
            inner: Arc::new(Inner {
                core,
                requestor_app_url: configuration.three_ds_requestor_app_url.clone(),
                shopper_locale: configuration.shopper_locale.clone(),
                submit_fingerprint_repository: SubmitFingerprintRepository::new(
                    api_client,
                    configuration,
                ),
                redirect_handler,
                threeds2_service,
                current_transaction: Mutex::new(None),
            }),
        }
    }
}

impl Inner {
    fn handle_action(self: &Arc<Self>, action: &Action) {
        let Some(payment_data) = (match action {
            Action::Threeds2Fingerprint(a) => Some(a.payment_data.clone()),
            Action::Threeds2Challenge(a) => Some(a.payment_data.clone()),
            Action::Threeds2(a) => Some(a.payment_data.clone()),
            _ => None,
        }) else {
            self.core
                .publish_error(CheckoutError::component(UNSUPPORTED_ACTION));
            return;
        };
        self.core.payment_data().set_payment_data(payment_data);

        match action {
            Action::Threeds2Fingerprint(action) => match non_empty(&action.token) {
                Some(token) => self.identify_shopper(token.to_string(), false),
                None => self
                    .core
                    .publish_error(CheckoutError::component("Fingerprint token not found.")),
            },
            Action::Threeds2Challenge(action) => match non_empty(&action.token) {
                Some(token) => self.challenge_shopper(token),
                None => self
                    .core
                    .publish_error(CheckoutError::component("Challenge token not found.")),
            },
            Action::Threeds2(action) => self.handle_threeds2_action(action),
            _ => {}
        }
    }

    fn handle_threeds2_action(self: &Arc<Self>, action: &Threeds2Action) {
        let Some(token) = non_empty(&action.token) else {
            return self
                .core
                .publish_error(CheckoutError::component("3DS2 token not found."));
        };
        let Some(subtype) = action.subtype else {
            return self
                .core
                .publish_error(CheckoutError::component("3DS2 Action subtype not found."));
        };

        // Needed once the challenge is done, possibly after the host was recreated.
        self.core
            .saved_state()
            .set_as(AUTHORIZATION_TOKEN_KEY, action.authorisation_token.as_ref());

        match subtype {
            ThreeDs2SubType::Fingerprint => self.identify_shopper(token.to_string(), true),
            ThreeDs2SubType::Challenge => self.challenge_shopper(token),
        }
    }

    fn identify_shopper(self: &Arc<Self>, encoded_token: String, submit_automatically: bool) {
        tracing::debug!(submit_automatically, "identifyShopper");

        let token: FingerprintToken = match encoded_token.parse_base64_struct("FingerprintToken") {
            Ok(token) => token,
            Err(error) => {
                return self.core.publish_error(CheckoutError::from_report(
                    "Failed to decode fingerprint token",
                    &error,
                ));
            }
        };
        let (Some(directory_server_id), Some(directory_server_public_key)) = (
            token.directory_server_id.clone(),
            token.directory_server_public_key.clone(),
        ) else {
            tracing::debug!("directoryServerId or directoryServerPublicKey is null.");
            return self
                .core
                .publish_error(CheckoutError::component("Failed to create ConfigParameters."));
        };
        let parameters = ThreeDs2ConfigParameters {
            directory_server_id,
            directory_server_public_key,
            directory_server_root_certificates: token.directory_server_root_certificates.clone(),
        };

        let this = Arc::clone(self);
        self.core.launch(async move {
            // Never reuse SDK state from an earlier transaction.
            this.close_transaction();

            tracing::debug!("initialize 3DS2 SDK");
            if let Err(failure) = this
                .threeds2_service
                .initialize(parameters, this.shopper_locale.clone())
                .await
            {
                tracing::warn!(%failure, "3DS2 SDK initialisation failed");
                this.emit_result_details(
                    failure.transaction_status,
                    failure.additional_details,
                );
                return;
            }

            let Some(transaction) = this.create_transaction(&token) else {
                return;
            };
            let Some(parameters) = transaction.authentication_request_parameters() else {
                return this.core.publish_error(CheckoutError::component(
                    "Failed to retrieve 3DS2 authentication parameters",
                ));
            };
            let encoded_fingerprint = match encode_fingerprint(&parameters) {
                Ok(encoded) => encoded,
                Err(error) => return this.core.publish_error(error),
            };

            if submit_automatically {
                this.submit_fingerprint(&encoded_fingerprint).await;
            } else {
                this.core
                    .emit_details(json!({ FINGERPRINT_DETAILS_KEY: encoded_fingerprint }));
            }
        });
    }

    fn create_transaction(&self, token: &FingerprintToken) -> Option<Arc<dyn ThreeDs2Transaction>> {
        let Some(message_version) = token.three_ds_message_version.as_deref() else {
            self.core.publish_error(CheckoutError::component(
                "Failed to create 3DS2 Transaction. Missing threeDSMessageVersion inside fingerprintToken.",
            ));
            return None;
        };

        tracing::debug!("create transaction");
        let directory_server_id = token.directory_server_id.as_deref().unwrap_or_default();
        match self
            .threeds2_service
            .create_transaction(directory_server_id, message_version)
        {
            Ok(transaction) => {
                *self
                    .current_transaction
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner) = Some(transaction.clone());
                Some(transaction)
            }
            Err(error) => {
                self.core.publish_error(CheckoutError::component(format!(
                    "Failed to create 3DS2 Transaction - {}",
                    error.message()
                )));
                None
            }
        }
    }

    async fn submit_fingerprint(self: &Arc<Self>, encoded_fingerprint: &str) {
        let result = self
            .submit_fingerprint_repository
            .submit_fingerprint(encoded_fingerprint, self.core.payment_data().payment_data())
            .await;

        let result = match result {
            Ok(result) => result,
            Err(error) => {
                tracing::error!(?error, "Unable to submit fingerprint");
                return self.core.publish_error(CheckoutError::from_report(
                    "Unable to submit fingerprint",
                    &error,
                ));
            }
        };

        // Details of this flow must reach the merchant without paymentData.
        self.core.payment_data().set_payment_data(None);
        match result {
            SubmitFingerprintResult::Completed(details) => self.core.emit_details(details),
            SubmitFingerprintResult::Redirect(action) => {
                let url = action.url.as_deref().unwrap_or_default();
                tracing::debug!(url, "makeRedirect");
                if let Err(error) = self.redirect_handler.launch_uri_redirect(url) {
                    self.core.publish_error(error);
                }
            }
            SubmitFingerprintResult::Threeds2(action) => {
                self.handle_action(&Action::Threeds2(action));
            }
        }
    }

    fn challenge_shopper(self: &Arc<Self>, encoded_token: &str) {
        tracing::debug!("challengeShopper");
        let Some(transaction) = self
            .current_transaction
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
        else {
            return self.core.publish_error(CheckoutError::Authentication3ds2(
                "Failed to make challenge, missing reference to initial transaction.".to_string(),
            ));
        };

        let token: ChallengeToken = match encoded_token.parse_base64_struct("ChallengeToken") {
            Ok(token) => token,
            Err(error) => {
                return self.core.publish_error(CheckoutError::from_report(
                    "JSON parsing of ChallengeToken failed",
                    &error,
                ));
            }
        };
        let parameters = self.challenge_parameters(token);

        let this = Arc::clone(self);
        self.core.launch(async move {
            match transaction
                .do_challenge(parameters, DEFAULT_CHALLENGE_TIME_OUT_MINUTES)
                .await
            {
                Ok(result) => this.on_completion(result),
                Err(error) => {
                    tracing::error!(%error, "Error starting challenge");
                    this.core.publish_error(CheckoutError::component(format!(
                        "Error starting challenge - {}",
                        error.message()
                    )));
                    this.close_transaction();
                }
            }
        });
    }

    fn challenge_parameters(&self, token: ChallengeToken) -> ChallengeParameters {
        // Introduced in 2.2.0, older protocols may reject it.
        let three_ds_requestor_app_url = match token.message_version.as_deref() {
            Some(PROTOCOL_VERSION_2_1_0) => None,
            _ => self.requestor_app_url.clone(),
        };
        ChallengeParameters {
            three_ds_server_transaction_id: token.three_ds_server_trans_id,
            acs_transaction_id: token.acs_trans_id,
            acs_ref_number: token.acs_reference_number,
            acs_signed_content: token.acs_signed_content,
            three_ds_requestor_app_url,
        }
    }

    fn on_completion(&self, result: ChallengeResult) {
        match result {
            ChallengeResult::Completed { transaction_status } => {
                tracing::debug!("challenge completed");
                self.emit_result_details(transaction_status, None);
            }
            ChallengeResult::Cancelled { .. } => {
                tracing::debug!("challenge cancelled");
                self.core
                    .publish_error(CheckoutError::Cancelled3ds2("Challenge canceled.".to_string()));
            }
            ChallengeResult::Timeout {
                transaction_status,
                additional_details,
            } => {
                tracing::debug!("challenge timed out");
                self.emit_result_details(transaction_status, additional_details);
            }
            ChallengeResult::Error {
                transaction_status,
                additional_details,
            } => {
                tracing::debug!("challenge failed");
                self.emit_result_details(transaction_status, additional_details);
            }
        }
        self.close_transaction();
    }

    /// `threeDSResult` when an authorisation token was handed out with the action,
    /// `threeds2.challengeResult` otherwise.
    fn emit_result_details(&self, transaction_status: String, error_details: Option<String>) {
        let authorisation_token = self
            .core
            .saved_state()
            .get_as::<String>(AUTHORIZATION_TOKEN_KEY);
        let key = if authorisation_token.is_some() {
            THREEDS_RESULT_KEY
        } else {
            CHALLENGE_DETAILS_KEY
        };
        let payload = ChallengeResultPayload {
            trans_status: transaction_status,
            authorisation_token,
            error_details,
        };
        match encode_base64_json(&payload) {
            Ok(encoded) => self.core.emit_details(json!({ key: encoded })),
            Err(error) => self.core.publish_error(CheckoutError::from_report(
                "Failed to create challenge details",
                &error,
            )),
        }
    }

    fn close_transaction(&self) {
        let transaction = self
            .current_transaction
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(transaction) = transaction {
            transaction.close();
        }
        self.threeds2_service.cleanup();
    }
}

fn non_empty(token: &Option<String>) -> Option<&str> {
    token.as_deref().filter(|token| !token.is_empty())
}

fn encode_fingerprint(parameters: &AuthenticationRequestParameters) -> Result<String, CheckoutError> {
    let ephemeral_public_key = serde_json::from_str(&parameters.sdk_ephemeral_public_key)
        .map_err(|_| CheckoutError::component("Failed to create encoded fingerprint"))?;
    let payload = FingerprintPayload {
        sdk_app_id: parameters.sdk_app_id.clone(),
        sdk_enc_data: parameters.device_data.clone(),
        sdk_ephem_pub_key: ephemeral_public_key,
        sdk_reference_number: parameters.sdk_reference_number.clone(),
        sdk_trans_id: parameters.sdk_transaction_id.clone(),
        message_version: parameters.message_version.clone(),
    };
    encode_base64_json(&payload)
        .map_err(|error| CheckoutError::from_report("Failed to create encoded fingerprint", &error))
}

impl ActionDelegate for DefaultThreeDs2Delegate {
    fn kind(&self) -> DelegateKind {
        DelegateKind::ThreeDs2
    }

    fn initialize(&self, scope: &ComponentScope) {
        self.inner.core.attach(scope);
    }

    fn handle_action(&self, action: &Action) {
        self.inner.handle_action(action);
    }

    fn exceptions(&self) -> EventReceiver<CheckoutError> {
        self.inner.core.exceptions()
    }

    fn on_error(&self, error: CheckoutError) {
        self.inner.core.publish_error(error);
    }

    fn on_cleared(&self) {
        self.inner.redirect_handler.remove_on_redirect_listener();
        self.inner.core.clear();
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

impl DetailsEmittingDelegate for DefaultThreeDs2Delegate {
    fn details(&self) -> EventReceiver<ActionComponentData> {
        self.inner.core.details()
    }
}

impl IntentHandlingDelegate for DefaultThreeDs2Delegate {
    fn handle_intent(&self, intent: &RedirectIntent) {
        match self
            .inner
            .redirect_handler
            .parse_redirect_result(intent.data.as_ref())
        {
            Ok(details) => self.inner.core.emit_details(details),
            Err(error) => self.inner.core.publish_error(error),
        }
    }
}

impl ViewProvidingDelegate for DefaultThreeDs2Delegate {
    fn view_type(&self) -> watch::Receiver<Option<ComponentViewType>> {
        self.inner.core.view_type()
    }
}

impl RedirectableDelegate for DefaultThreeDs2Delegate {
    fn set_on_redirect_listener(&self, listener: RedirectListener) {
        self.inner.redirect_handler.set_on_redirect_listener(listener);
    }
}
