//! Payment status polling for actions that complete outside the app.

use std::{ops::ControlFlow, sync::Arc, time::Duration};

use common_utils::{
    consts,
    request::{build_url, Method, RequestBuilder, RequestContent},
    CustomResult,
};
use domain_types::{
    status::{StatusRequest, StatusResponse},
    types::CheckoutConfiguration,
};
use error_stack::{report, ResultExt};
use external_services::{service::execute_checkout_api_call, shared_metrics};
use hyperswitch_masking::{ExposeInterface, Secret};
use interfaces::api::ApiClient;
use tokio::{sync::Notify, time::Instant};

use super::RepositoryError;

pub type StatusResult = CustomResult<StatusResponse, RepositoryError>;

pub struct StatusRepository {
    api_client: Arc<dyn ApiClient>,
    base_url: String,
    client_key: Secret<String>,
    refresh: Notify,
}

impl StatusRepository {
    pub fn new(api_client: Arc<dyn ApiClient>, configuration: &CheckoutConfiguration) -> Self {
        Self {
            api_client,
            base_url: configuration.base_url().to_string(),
            client_key: configuration.client_key.clone(),
            refresh: Notify::new(),
        }
    }

    pub async fn fetch_status(&self, payment_data: &str) -> StatusResult {
        let client_key = self.client_key.clone().expose();
        let url = build_url(
            &self.base_url,
            consts::STATUS_PATH,
            &[(consts::TOKEN_QUERY, client_key.as_str())],
        )
        .change_context(RepositoryError::InvalidUrl)?;

        let request = RequestBuilder::new()
            .method(Method::Post)
            .url(url.as_str())
            .attach_default_headers()
            .set_body(RequestContent::json(StatusRequest {
                payment_data: payment_data.to_string(),
            }))
            .build();

        execute_checkout_api_call(self.api_client.as_ref(), request, "status")
            .await
            .change_context(RepositoryError::RequestFailed)
    }

    /// Polls until a final result, until `on_status` breaks, or until `max_polling_duration` is
    /// exceeded (reported to `on_status` as [`RepositoryError::MaxPollingDurationExceeded`]).
    ///
    /// Polls every two seconds during the first minute and every ten seconds afterwards;
    /// [`StatusRepository::refresh`] cuts the current wait short.
    pub async fn poll<F>(&self, payment_data: String, max_polling_duration: Duration, mut on_status: F)
    where
        F: FnMut(StatusResult) -> ControlFlow<()> + Send,
    {
        let start = Instant::now();
        loop {
            let result = self.fetch_status(&payment_data).await;
            let is_final = matches!(&result, Ok(response) if response.is_final_result());
            shared_metrics::STATUS_POLLS_TOTAL
                .with_label_values(&[match &result {
                    Ok(_) if is_final => "final",
                    Ok(_) => "pending",
                    Err(_) => "error",
                }])
                .inc();

            if on_status(result).is_break() || is_final {
                return;
            }

            let elapsed = start.elapsed();
            let delay = if elapsed <= consts::POLLING_THRESHOLD {
                consts::POLLING_DELAY_FAST
            } else if elapsed <= max_polling_duration {
                consts::POLLING_DELAY_SLOW
            } else {
                tracing::debug!(?elapsed, "status polling exceeded its max duration");
                let timeout = on_status(Err(report!(RepositoryError::MaxPollingDurationExceeded)));
                if timeout.is_continue() {
                    tracing::debug!("ignoring a request to keep polling past the max duration");
                }
                return;
            };

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = self.refresh.notified() => {
                    tracing::debug!("status refresh requested");
                }
            }
        }
    }

    /// Triggers the next poll right away.
    pub fn refresh(&self) {
        self.refresh.notify_one();
    }
}
