use common_utils::{
    request::{Request, Response},
    CustomResult,
};
use domain_types::errors::ApiClientError;

/// Transport used for every call to the Checkout API.
///
/// `Ok(Ok(_))` is a success response, `Ok(Err(_))` an error response the server sent, and `Err(_)`
/// a failure to reach the server or read its answer.
#[async_trait::async_trait]
pub trait ApiClient: Send + Sync {
    async fn execute(
        &self,
        request: Request,
    ) -> CustomResult<Result<Response, Response>, ApiClientError>;
}
