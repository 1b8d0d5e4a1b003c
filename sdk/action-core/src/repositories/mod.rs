pub mod native_redirect;
pub mod payment_data;
pub mod status;
pub mod submit_fingerprint;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RepositoryError {
    #[error("Request to the checkout api failed")]
    RequestFailed,
    #[error("Unable to build the request url")]
    InvalidUrl,
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
    #[error("Max polling time has been exceeded.")]
    MaxPollingDurationExceeded,
}
